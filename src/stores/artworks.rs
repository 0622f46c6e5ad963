//! Artworks store — the artist's inventory with a status lifecycle.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stores::backend::{Record, RecordBackend, StoreError, StoreState, with_state};

/// Lifecycle status of an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkStatus {
    Concept,
    Wip,
    ForSale,
    Sold,
    Exhibition,
}

/// Physical dimensions as entered by the artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub unit: String,
}

/// One entry in an artwork's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ArtworkStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    pub id: String,
    pub title: String,
    pub medium: String,
    /// Price in minor currency units.
    pub price: i64,
    pub status: ArtworkStatus,
    pub dimensions: Option<Dimensions>,
    pub primary_image_url: Option<String>,
    pub status_history: Vec<StatusChange>,
}

impl Record for Artwork {
    const COLLECTION: &'static str = "artworks";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for a new artwork. New pieces always start as concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtwork {
    pub title: String,
    pub medium: String,
    pub price: i64,
    pub dimensions: Option<Dimensions>,
    pub primary_image_url: Option<String>,
}

impl NewArtwork {
    fn into_artwork(self) -> Artwork {
        let status = ArtworkStatus::Concept;
        Artwork {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            medium: self.medium,
            price: self.price,
            status,
            dimensions: self.dimensions,
            primary_image_url: self.primary_image_url,
            status_history: vec![StatusChange { status, changed_at: Utc::now() }],
        }
    }
}

/// CRUD facade over the artworks collection.
#[derive(Clone)]
pub struct ArtworksStore {
    backend: Arc<dyn RecordBackend<Artwork>>,
    session: Session,
    state: Arc<Mutex<StoreState<Artwork>>>,
}

impl ArtworksStore {
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend<Artwork>>, session: Session) -> Self {
        Self { backend, session, state: Arc::new(Mutex::new(StoreState::default())) }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Artwork> {
        with_state(&self.state, |s| s.list.clone())
    }

    #[must_use]
    pub fn current(&self) -> Option<Artwork> {
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

    /// Load the full artwork list. Requires a signed-in user.
    ///
    /// # Errors
    ///
    /// `StoreError::NotAuthenticated` without a session user; backend errors
    /// are recorded on the store and re-raised.
    pub async fn fetch_all(&self) -> Result<Vec<Artwork>, StoreError> {
        if !self.session.is_authenticated() {
            with_state(&self.state, |s| s.error = Some("no signed-in user".to_owned()));
            return Err(StoreError::NotAuthenticated);
        }
        self.begin();
        match self.backend.list().await {
            Ok(artworks) => {
                tracing::debug!(count = artworks.len(), "artworks fetched");
                with_state(&self.state, |s| s.list = artworks.clone());
                self.finish(None);
                Ok(artworks)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Load one artwork into `current`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Artwork, StoreError> {
        self.begin();
        with_state(&self.state, |s| s.current = None);
        match self.backend.get(id).await {
            Ok(artwork) => {
                with_state(&self.state, |s| s.current = Some(artwork.clone()));
                self.finish(None);
                Ok(artwork)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Create an artwork and put it at the front of the list.
    ///
    /// # Errors
    ///
    /// Backend errors are recorded and re-raised.
    pub async fn add(&self, new: NewArtwork) -> Result<Artwork, StoreError> {
        self.begin();
        match self.backend.create(new.into_artwork()).await {
            Ok(artwork) => {
                with_state(&self.state, |s| s.list.insert(0, artwork.clone()));
                self.finish(None);
                Ok(artwork)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Replace an artwork wholesale.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn update(&self, artwork: Artwork) -> Result<Artwork, StoreError> {
        self.begin();
        match self.backend.update(artwork).await {
            Ok(updated) => {
                self.replace_in_state(&updated);
                self.finish(None);
                Ok(updated)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Move an artwork to a new status, appending to its history.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn update_status(&self, id: &str, status: ArtworkStatus) -> Result<Artwork, StoreError> {
        let mut artwork = self.backend.get(id).await?;
        artwork.status = status;
        artwork.status_history.push(StatusChange { status, changed_at: Utc::now() });
        self.update(artwork).await
    }

    /// Delete an artwork and drop it from the list.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.begin();
        match self.backend.delete(id).await {
            Ok(()) => {
                with_state(&self.state, |s| {
                    s.list.retain(|a| a.id != id);
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

    fn replace_in_state(&self, updated: &Artwork) {
        with_state(&self.state, |s| {
            if let Some(slot) = s.list.iter_mut().find(|a| a.id == updated.id) {
                *slot = updated.clone();
            }
            if s.current.as_ref().is_some_and(|c| c.id == updated.id) {
                s.current = Some(updated.clone());
            }
        });
    }
}

#[cfg(test)]
#[path = "artworks_test.rs"]
mod tests;
