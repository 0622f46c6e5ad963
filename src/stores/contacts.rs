//! Contacts store — collectors, galleries, and curators.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stores::backend::{Record, RecordBackend, StoreError, StoreState, with_state};

/// What kind of relationship a contact represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactCategory {
    Collector,
    Gallery,
    Curator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub category: ContactCategory,
    pub organization: Option<String>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub avatar_url: Option<String>,
}

impl Record for Contact {
    const COLLECTION: &'static str = "contacts";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for a new contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub category: ContactCategory,
    pub organization: Option<String>,
    pub avatar_url: Option<String>,
}

impl NewContact {
    fn into_contact(self) -> Contact {
        Contact {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            category: self.category,
            organization: self.organization,
            last_contact_date: None,
            avatar_url: self.avatar_url,
        }
    }
}

/// CRUD facade over the contacts collection.
#[derive(Clone)]
pub struct ContactsStore {
    backend: Arc<dyn RecordBackend<Contact>>,
    session: Session,
    state: Arc<Mutex<StoreState<Contact>>>,
}

impl ContactsStore {
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend<Contact>>, session: Session) -> Self {
        Self { backend, session, state: Arc::new(Mutex::new(StoreState::default())) }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Contact> {
        with_state(&self.state, |s| s.list.clone())
    }

    #[must_use]
    pub fn current(&self) -> Option<Contact> {
        with_state(&self.state, |s| s.current.clone())
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        with_state(&self.state, |s| s.loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        with_state(&self.state, |s| s.error.clone())
    }

    /// Fetched contacts in one category, list order preserved.
    #[must_use]
    pub fn by_category(&self, category: ContactCategory) -> Vec<Contact> {
        with_state(&self.state, |s| {
            s.list.iter().filter(|c| c.category == category).cloned().collect()
        })
    }

    fn begin(&self) {
        with_state(&self.state, |s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(&self, error: Option<String>) {
        with_state(&self.state, |s| {
            s.loading = false;
            s.error = error;
        });
    }

    /// Load the full contact list. Requires a signed-in user.
    ///
    /// # Errors
    ///
    /// `StoreError::NotAuthenticated` without a session user; backend errors
    /// are recorded on the store and re-raised.
    pub async fn fetch_all(&self) -> Result<Vec<Contact>, StoreError> {
        if !self.session.is_authenticated() {
            with_state(&self.state, |s| s.error = Some("no signed-in user".to_owned()));
            return Err(StoreError::NotAuthenticated);
        }
        self.begin();
        match self.backend.list().await {
            Ok(contacts) => {
                tracing::debug!(count = contacts.len(), "contacts fetched");
                with_state(&self.state, |s| s.list = contacts.clone());
                self.finish(None);
                Ok(contacts)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Load one contact into `current`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Contact, StoreError> {
        self.begin();
        with_state(&self.state, |s| s.current = None);
        match self.backend.get(id).await {
            Ok(contact) => {
                with_state(&self.state, |s| s.current = Some(contact.clone()));
                self.finish(None);
                Ok(contact)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Create a contact and put it at the front of the list.
    ///
    /// # Errors
    ///
    /// Backend errors are recorded and re-raised.
    pub async fn add(&self, new: NewContact) -> Result<Contact, StoreError> {
        self.begin();
        match self.backend.create(new.into_contact()).await {
            Ok(contact) => {
                with_state(&self.state, |s| s.list.insert(0, contact.clone()));
                self.finish(None);
                Ok(contact)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Replace a contact wholesale.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn update(&self, contact: Contact) -> Result<Contact, StoreError> {
        self.begin();
        match self.backend.update(contact).await {
            Ok(updated) => {
                with_state(&self.state, |s| {
                    if let Some(slot) = s.list.iter_mut().find(|c| c.id == updated.id) {
                        *slot = updated.clone();
                    }
                    if s.current.as_ref().is_some_and(|c| c.id == updated.id) {
                        s.current = Some(updated.clone());
                    }
                });
                self.finish(None);
                Ok(updated)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stamp a contact's last-contact date to now.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn record_touch(&self, id: &str) -> Result<Contact, StoreError> {
        let mut contact = self.backend.get(id).await?;
        contact.last_contact_date = Some(Utc::now());
        self.update(contact).await
    }

    /// Delete a contact and drop it from the list.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.begin();
        match self.backend.delete(id).await {
            Ok(()) => {
                with_state(&self.state, |s| {
                    s.list.retain(|c| c.id != id);
                    if s.current.as_ref().is_some_and(|c| c.id == id) {
                        s.current = None;
                    }
                });
                self.finish(None);
                Ok(())
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "contacts_test.rs"]
mod tests;
