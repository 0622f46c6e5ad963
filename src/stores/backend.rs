//! Pluggable data access for record collections.
//!
//! DESIGN
//! ======
//! Stores depend on the [`RecordBackend`] seam rather than a concrete data
//! source. A backend can be the in-memory [`MemoryBackend`] (dev, tests) or
//! the REST-backed [`HttpBackend`], which routes through the [`ApiClient`] so
//! the bearer/401 interceptor contract applies to every record request.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::api::{ApiClient, ApiError};

/// A record type living in a named collection.
pub trait Record: Clone + Send + Sync + 'static {
    /// Collection name, also the REST path segment (`/artworks`, ...).
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The operation requires a signed-in user.
    #[error("no signed-in user")]
    NotAuthenticated,
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Data access for one record collection.
#[async_trait]
pub trait RecordBackend<T: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, StoreError>;
    async fn get(&self, id: &str) -> Result<T, StoreError>;
    async fn create(&self, record: T) -> Result<T, StoreError>;
    async fn update(&self, record: T) -> Result<T, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// In-memory backend preserving insertion order.
pub struct MemoryBackend<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> Default for MemoryBackend<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryBackend<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { records: RwLock::new(Vec::new()) }
    }

    /// Seed with an initial dataset.
    #[must_use]
    pub fn with_records(records: Vec<T>) -> Self {
        Self { records: RwLock::new(records) }
    }
}

#[async_trait]
impl<T: Record> RecordBackend<T> for MemoryBackend<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<T, StoreError> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { collection: T::COLLECTION, id: id.to_owned() })
    }

    async fn create(&self, record: T) -> Result<T, StoreError> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, StoreError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| StoreError::NotFound { collection: T::COLLECTION, id: record.id().to_owned() })?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(StoreError::NotFound { collection: T::COLLECTION, id: id.to_owned() });
        }
        Ok(())
    }
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

/// REST backend: `GET/POST /{collection}`, `GET/PUT/DELETE /{collection}/{id}`.
pub struct HttpBackend<T> {
    api: ApiClient,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpBackend<T> {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, _record: PhantomData }
    }
}

#[async_trait]
impl<T> RecordBackend<T> for HttpBackend<T>
where
    T: Record + Serialize + DeserializeOwned,
{
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.api.get(&format!("/{}", T::COLLECTION)).await?)
    }

    async fn get(&self, id: &str) -> Result<T, StoreError> {
        match self.api.get(&format!("/{}/{id}", T::COLLECTION)).await {
            Ok(record) => Ok(record),
            Err(ApiError::Status { status: 404, .. }) => {
                Err(StoreError::NotFound { collection: T::COLLECTION, id: id.to_owned() })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, record: T) -> Result<T, StoreError> {
        Ok(self.api.post(&format!("/{}", T::COLLECTION), &record).await?)
    }

    async fn update(&self, record: T) -> Result<T, StoreError> {
        let path = format!("/{}/{}", T::COLLECTION, record.id());
        match self.api.put(&path, &record).await {
            Ok(updated) => Ok(updated),
            Err(ApiError::Status { status: 404, .. }) => {
                Err(StoreError::NotFound { collection: T::COLLECTION, id: record.id().to_owned() })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self.api.delete(&format!("/{}/{id}", T::COLLECTION)).await {
            Ok(()) => Ok(()),
            Err(ApiError::Status { status: 404, .. }) => {
                Err(StoreError::NotFound { collection: T::COLLECTION, id: id.to_owned() })
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// SHARED STORE STATE
// =============================================================================

/// List/current/loading/error block every store carries.
pub(crate) struct StoreState<T> {
    pub list: Vec<T>,
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self { list: Vec::new(), current: None, loading: false, error: None }
    }
}

/// Short scoped lock over a store's state block.
pub(crate) fn with_state<T, R>(
    state: &std::sync::Mutex<StoreState<T>>,
    f: impl FnOnce(&mut StoreState<T>) -> R,
) -> R {
    let mut guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    f(&mut guard)
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;
