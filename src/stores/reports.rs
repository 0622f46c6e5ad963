//! Reports store — aggregate business figures across artworks and deals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::session::Session;
use crate::stores::artworks::{Artwork, ArtworkStatus};
use crate::stores::backend::{RecordBackend, StoreError};
use crate::stores::pipeline::{Deal, DealStage};

/// Snapshot of the business computed from current records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessSummary {
    pub artworks_total: usize,
    pub artworks_by_status: HashMap<ArtworkStatus, usize>,
    /// Combined price of every unsold artwork, minor units.
    pub inventory_value: i64,
    /// Combined price of sold artworks, minor units.
    pub sold_value: i64,
    pub deals_total: usize,
    pub deals_by_stage: HashMap<DealStage, usize>,
    /// Combined amount of deals that have not yet settled, minor units.
    pub open_pipeline_value: i64,
}

/// Read-only store deriving [`BusinessSummary`] from the record backends.
#[derive(Clone)]
pub struct ReportsStore {
    artworks: Arc<dyn RecordBackend<Artwork>>,
    deals: Arc<dyn RecordBackend<Deal>>,
    session: Session,
    last: Arc<Mutex<Option<BusinessSummary>>>,
}

impl ReportsStore {
    #[must_use]
    pub fn new(
        artworks: Arc<dyn RecordBackend<Artwork>>,
        deals: Arc<dyn RecordBackend<Deal>>,
        session: Session,
    ) -> Self {
        Self { artworks, deals, session, last: Arc::new(Mutex::new(None)) }
    }

    /// The most recently computed summary, if any.
    #[must_use]
    pub fn last_summary(&self) -> Option<BusinessSummary> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recompute the summary from live records. Requires a signed-in user.
    ///
    /// # Errors
    ///
    /// `StoreError::NotAuthenticated` without a session user; backend errors
    /// are re-raised.
    pub async fn summary(&self) -> Result<BusinessSummary, StoreError> {
        if !self.session.is_authenticated() {
            return Err(StoreError::NotAuthenticated);
        }
        let artworks = self.artworks.list().await?;
        let deals = self.deals.list().await?;
        let summary = summarize(&artworks, &deals);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
        Ok(summary)
    }
}

fn summarize(artworks: &[Artwork], deals: &[Deal]) -> BusinessSummary {
    let mut summary = BusinessSummary { artworks_total: artworks.len(), deals_total: deals.len(), ..Default::default() };

    for artwork in artworks {
        *summary.artworks_by_status.entry(artwork.status).or_default() += 1;
        if artwork.status == ArtworkStatus::Sold {
            summary.sold_value += artwork.price;
        } else {
            summary.inventory_value += artwork.price;
        }
    }

    for deal in deals {
        *summary.deals_by_stage.entry(deal.stage).or_default() += 1;
        if !deal.stage.is_settled() {
            summary.open_pipeline_value += deal.amount;
        }
    }

    summary
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
