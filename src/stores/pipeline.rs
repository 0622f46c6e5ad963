//! Sales pipeline store — deals moving through fixed stages.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stores::backend::{Record, RecordBackend, StoreError, StoreState, with_state};

/// Stage of a deal, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Inquiry,
    Negotiation,
    Invoice,
    Paid,
    Delivered,
}

impl DealStage {
    /// The following stage, or `None` at the end of the pipeline.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Inquiry => Some(Self::Negotiation),
            Self::Negotiation => Some(Self::Invoice),
            Self::Invoice => Some(Self::Paid),
            Self::Paid => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether money has been received for a deal in this stage.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::Delivered)
    }
}

/// A deal linking one artwork to one contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub artwork_id: String,
    pub contact_id: String,
    pub stage: DealStage,
    /// Agreed amount in minor currency units.
    pub amount: i64,
    pub updated_at: DateTime<Utc>,
}

impl Record for Deal {
    const COLLECTION: &'static str = "deals";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for a new deal. Deals always open as inquiries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeal {
    pub artwork_id: String,
    pub contact_id: String,
    pub amount: i64,
}

impl NewDeal {
    fn into_deal(self) -> Deal {
        Deal {
            id: uuid::Uuid::new_v4().to_string(),
            artwork_id: self.artwork_id,
            contact_id: self.contact_id,
            stage: DealStage::Inquiry,
            amount: self.amount,
            updated_at: Utc::now(),
        }
    }
}

/// CRUD facade over the deals collection.
#[derive(Clone)]
pub struct PipelineStore {
    backend: Arc<dyn RecordBackend<Deal>>,
    session: Session,
    state: Arc<Mutex<StoreState<Deal>>>,
}

impl PipelineStore {
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend<Deal>>, session: Session) -> Self {
        Self { backend, session, state: Arc::new(Mutex::new(StoreState::default())) }
    }

    #[must_use]
    pub fn list(&self) -> Vec<Deal> {
        with_state(&self.state, |s| s.list.clone())
    }

    #[must_use]
    pub fn current(&self) -> Option<Deal> {
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

    /// Fetched deals in one stage, list order preserved.
    #[must_use]
    pub fn by_stage(&self, stage: DealStage) -> Vec<Deal> {
        with_state(&self.state, |s| s.list.iter().filter(|d| d.stage == stage).cloned().collect())
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

    /// Load the full deal list. Requires a signed-in user.
    ///
    /// # Errors
    ///
    /// `StoreError::NotAuthenticated` without a session user; backend errors
    /// are recorded on the store and re-raised.
    pub async fn fetch_all(&self) -> Result<Vec<Deal>, StoreError> {
        if !self.session.is_authenticated() {
            with_state(&self.state, |s| s.error = Some("no signed-in user".to_owned()));
            return Err(StoreError::NotAuthenticated);
        }
        self.begin();
        match self.backend.list().await {
            Ok(deals) => {
                tracing::debug!(count = deals.len(), "deals fetched");
                with_state(&self.state, |s| s.list = deals.clone());
                self.finish(None);
                Ok(deals)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Load one deal into `current`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Deal, StoreError> {
        self.begin();
        with_state(&self.state, |s| s.current = None);
        match self.backend.get(id).await {
            Ok(deal) => {
                with_state(&self.state, |s| s.current = Some(deal.clone()));
                self.finish(None);
                Ok(deal)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Open a deal and put it at the front of the list.
    ///
    /// # Errors
    ///
    /// Backend errors are recorded and re-raised.
    pub async fn add(&self, new: NewDeal) -> Result<Deal, StoreError> {
        self.begin();
        match self.backend.create(new.into_deal()).await {
            Ok(deal) => {
                with_state(&self.state, |s| s.list.insert(0, deal.clone()));
                self.finish(None);
                Ok(deal)
            }
            Err(e) => {
                self.finish(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Replace a deal wholesale, refreshing its timestamp.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn update(&self, mut deal: Deal) -> Result<Deal, StoreError> {
        deal.updated_at = Utc::now();
        self.begin();
        match self.backend.update(deal).await {
            Ok(updated) => {
                with_state(&self.state, |s| {
                    if let Some(slot) = s.list.iter_mut().find(|d| d.id == updated.id) {
                        *slot = updated.clone();
                    }
                    if s.current.as_ref().is_some_and(|d| d.id == updated.id) {
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

    /// Move a deal one stage forward. A delivered deal stays put.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn advance_stage(&self, id: &str) -> Result<Deal, StoreError> {
        let mut deal = self.backend.get(id).await?;
        let Some(next) = deal.stage.next() else {
            return Ok(deal);
        };
        deal.stage = next;
        self.update(deal).await
    }

    /// Delete a deal and drop it from the list.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.begin();
        match self.backend.delete(id).await {
            Ok(()) => {
                with_state(&self.state, |s| {
                    s.list.retain(|d| d.id != id);
                    if s.current.as_ref().is_some_and(|d| d.id == id) {
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
#[path = "pipeline_test.rs"]
mod tests;
