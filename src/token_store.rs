//! Bearer-token persistence across restarts.
//!
//! The adapter is a durable key/value slot: `load` tolerates absence and
//! corruption (it returns `None`, never an error), and `save`/`clear` are
//! write-through.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Durable token slot. Failures to persist are logged, not surfaced; a lost
/// token only costs a re-login.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, token: &str);
    async fn load(&self) -> Option<String>;
    async fn clear(&self);
}

#[derive(Serialize, Deserialize)]
struct PersistedToken {
    token: String,
}

/// File-backed token store.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(error = %e, path = %self.path.display(), "token directory creation failed");
                    return;
                }
            }
        }
        let persisted = PersistedToken { token: token.to_owned() };
        match serde_json::to_string(&persisted) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&self.path, json).await {
                    tracing::warn!(error = %e, path = %self.path.display(), "token persist failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "token serialization failed"),
        }
    }

    async fn load(&self) -> Option<String> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        let persisted: PersistedToken = serde_json::from_str(&raw).ok()?;
        Some(persisted.token)
    }

    async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, path = %self.path.display(), "token removal failed"),
        }
    }
}

/// In-memory token store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &str) {
        *self.slot.lock().await = Some(token.to_owned());
    }

    async fn load(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;
