//! Session state holder — the process-wide record of authentication state.
//!
//! DESIGN
//! ======
//! A [`Session`] is a cheap clonable handle over shared state: the current
//! user identity, the bearer token, a last-operation error, and a `loading`
//! flag carried on a watch channel. `loading` starts true and flips false on
//! the first identity-change notification, which is what the navigation
//! guard awaits before deciding a transition.
//!
//! Token lifecycle is tied to user presence: the token is set only alongside
//! a user and both are cleared together. A signed-out notification clears
//! state; it never fabricates an identity.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::identity::{AuthError, IdentityEvent, IdentityProvider, UserIdentity};
use crate::token_store::TokenStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Bad credentials or provider rejection during login/register/reset.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),
    /// Provider-side sign-out failed; local state is cleared regardless.
    #[error("sign-out failed: {0}")]
    SignOut(String),
    /// The identity stream never delivered its first notification in time.
    #[error("session did not resolve within {0:?}")]
    ResolveTimeout(Duration),
}

#[derive(Default)]
struct SessionState {
    user: Option<UserIdentity>,
    token: Option<String>,
    error: Option<String>,
}

/// Shared session handle. All mutations go through its own operations; reads
/// are synchronous so the request interceptor can consult the token without
/// a suspension point.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    loading_tx: Arc<watch::Sender<bool>>,
    loading_rx: watch::Receiver<bool>,
    provider: Arc<dyn IdentityProvider>,
    tokens: Arc<dyn TokenStore>,
}

impl Session {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, tokens: Arc<dyn TokenStore>) -> Self {
        let (loading_tx, loading_rx) = watch::channel(true);
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            loading_tx: Arc::new(loading_tx),
            loading_rx,
            provider,
            tokens,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.with_state(|s| s.user.clone())
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.with_state(|s| s.token.clone())
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.with_state(|s| s.error.clone())
    }

    /// True until the first identity-change notification arrives.
    #[must_use]
    pub fn loading(&self) -> bool {
        *self.loading_rx.borrow()
    }

    /// True iff a user identity is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.with_state(|s| s.user.is_some())
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        self.with_state(|s| s.error = Some(message.into()));
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Subscribe to the identity-change stream and keep the session in sync
    /// with it. The first notification, whatever it carries, resolves the
    /// `loading` flag; later notifications keep updating user and token.
    pub async fn begin_session(&self) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let session = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.apply_identity_event(event).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "identity stream lagged, catching up");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.provider.resolve_initial().await;
        handle
    }

    async fn apply_identity_event(&self, event: IdentityEvent) {
        match event {
            Some(user) => {
                tracing::info!(email = %user.email, "identity present");
                self.with_state(|s| s.user = Some(user));
                if self.token().is_none() {
                    match self.provider.fetch_token().await {
                        Ok(token) => {
                            self.with_state(|s| s.token = Some(token.clone()));
                            self.tokens.save(&token).await;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "token fetch after identity change failed");
                            self.record_error(e.to_string());
                        }
                    }
                }
            }
            None => {
                tracing::info!("identity absent, clearing session");
                self.with_state(|s| {
                    s.user = None;
                    s.token = None;
                });
                self.tokens.clear().await;
            }
        }
        // Idempotent: only the first notification actually flips the flag.
        self.loading_tx.send_replace(false);
    }

    /// Wait until the first identity notification has resolved the session,
    /// or fail after `timeout`. The bound makes a dead identity stream an
    /// explicit failure instead of an indefinite hang.
    pub async fn wait_until_resolved(&self, timeout: Duration) -> Result<(), SessionError> {
        let mut rx = self.loading_rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|loading| !*loading)).await {
            Ok(Ok(_)) => Ok(()),
            // Sender dropped without resolving; treat like a timeout.
            Ok(Err(_)) => Err(SessionError::ResolveTimeout(timeout)),
            Err(_) => Err(SessionError::ResolveTimeout(timeout)),
        }
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Sign in with email and password. On success the fresh provider token
    /// is held and persisted.
    ///
    /// # Errors
    ///
    /// `SessionError::Authentication` on bad credentials or provider
    /// rejection; the session `error` field carries the message.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, SessionError> {
        self.loading_tx.send_replace(true);
        self.with_state(|s| s.error = None);

        let outcome = self.sign_in_and_fetch_token(email, password).await;
        self.loading_tx.send_replace(false);

        match outcome {
            Ok((user, token)) => {
                self.with_state(|s| {
                    s.user = Some(user.clone());
                    s.token = Some(token.clone());
                });
                self.tokens.save(&token).await;
                Ok(user)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(SessionError::Authentication(e))
            }
        }
    }

    async fn sign_in_and_fetch_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserIdentity, String), AuthError> {
        let user = self.provider.sign_in(email, password).await?;
        let token = self.provider.fetch_token().await?;
        Ok((user, token))
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// `SessionError::Authentication` if the provider rejects the request.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, SessionError> {
        self.loading_tx.send_replace(true);
        self.with_state(|s| s.error = None);

        let outcome = async {
            let user = self.provider.register(email, password, display_name).await?;
            let token = self.provider.fetch_token().await?;
            Ok::<_, AuthError>((user, token))
        }
        .await;
        self.loading_tx.send_replace(false);

        match outcome {
            Ok((user, token)) => {
                self.with_state(|s| {
                    s.user = Some(user.clone());
                    s.token = Some(token.clone());
                });
                self.tokens.save(&token).await;
                Ok(user)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(SessionError::Authentication(e))
            }
        }
    }

    /// End the session. Local user, token, and the persisted token are
    /// cleared whether or not the provider sign-out succeeds.
    ///
    /// # Errors
    ///
    /// `SessionError::SignOut` if the provider call failed; the cleanup has
    /// still happened.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.with_state(|s| s.error = None);
        let signed_out = self.provider.sign_out().await;

        // Guaranteed cleanup, regardless of the provider outcome.
        self.with_state(|s| {
            s.user = None;
            s.token = None;
        });
        self.tokens.clear().await;
        self.loading_tx.send_replace(false);

        match signed_out {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "provider sign-out failed, local session cleared anyway");
                self.record_error(e.to_string());
                Err(SessionError::SignOut(e.to_string()))
            }
        }
    }

    /// Request a password-reset email.
    ///
    /// # Errors
    ///
    /// `SessionError::Authentication` if the provider rejects the address.
    pub async fn reset_password(&self, email: &str) -> Result<(), SessionError> {
        self.with_state(|s| s.error = None);
        match self.provider.send_password_reset(email).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record_error(e.to_string());
                Err(SessionError::Authentication(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
