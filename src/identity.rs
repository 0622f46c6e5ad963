//! Identity provider seam — sign-in, sign-out, token issuance, and the
//! identity-change event stream.
//!
//! DESIGN
//! ======
//! The session never talks to a concrete auth backend directly; it consumes
//! the [`IdentityProvider`] trait. Two implementations ship in-crate:
//! [`RestIdentityProvider`] against a REST identity API, and
//! [`DevIdentityProvider`], an in-memory account registry for development
//! and tests. Identity changes (sign-in, sign-out, initial resolution) are
//! broadcast so the session can react exactly the way it would to a
//! push-based auth SDK.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::token_store::TokenStore;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Identity record for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider-assigned user id.
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Identity-change notification: `Some` on sign-in, `None` on sign-out.
pub type IdentityEvent = Option<UserIdentity>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    AccountExists(String),
    #[error("no account for {0}")]
    UnknownAccount(String),
    #[error("no token available")]
    TokenUnavailable,
    #[error("identity provider rejected the request: {0}")]
    Provider(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// External identity provider consumed by the session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError>;

    /// End the provider-side session. Local state is cleared by the caller
    /// regardless of the outcome.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Request a password-reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Current bearer token for the signed-in identity.
    async fn fetch_token(&self) -> Result<String, AuthError>;

    /// Subscribe to identity-change notifications.
    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent>;

    /// Resolve the startup identity state and emit it as the first
    /// notification. Called once after the session subscribes.
    async fn resolve_initial(&self);
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// REST PROVIDER
// =============================================================================

#[derive(Debug, Deserialize)]
struct SignInResponse {
    user: UserIdentity,
    token: String,
}

/// Identity provider backed by a REST identity API.
///
/// Sign-in and registration return `{ user, token }`; the held token is
/// replayed through [`IdentityProvider::fetch_token`]. Startup resolution
/// validates any persisted token against `GET /auth/me` and emits the
/// result as the first identity-change notification.
pub struct RestIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    current: Mutex<Option<String>>,
    events: broadcast::Sender<IdentityEvent>,
}

impl RestIdentityProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { http, base_url: base_url.into(), tokens, current: Mutex::new(None), events }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn set_current(&self, token: Option<String>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn emit(&self, event: IdentityEvent) {
        // No receivers is fine; the session may not have subscribed yet.
        let _ = self.events.send(event);
    }

    async fn credential_call(&self, path: &str, body: &serde_json::Value) -> Result<UserIdentity, AuthError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            let signed_in: SignInResponse = resp
                .json()
                .await
                .map_err(|e| AuthError::Provider(format!("unexpected response: {e}")))?;
            self.set_current(Some(signed_in.token));
            self.emit(Some(signed_in.user.clone()));
            Ok(signed_in.user)
        } else if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST {
            Err(AuthError::InvalidCredentials)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(AuthError::Provider(format!("{status}: {body}")))
        }
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "display_name": display_name,
        });
        self.credential_call("/auth/register", &body).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.credential_call("/auth/login", &body).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.current();
        self.set_current(None);
        self.emit(None);

        let Some(token) = token else { return Ok(()) };
        let resp = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        if resp.status().is_success() || resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(AuthError::Provider(format!("sign-out failed: {}", resp.status())))
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.url("/auth/password-reset"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(AuthError::UnknownAccount(email.to_owned()))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(AuthError::Provider(format!("{status}: {body}")))
        }
    }

    async fn fetch_token(&self) -> Result<String, AuthError> {
        self.current().ok_or(AuthError::TokenUnavailable)
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }

    async fn resolve_initial(&self) {
        let Some(token) = self.tokens.load().await else {
            self.emit(None);
            return;
        };

        let me = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(&token)
            .send()
            .await;
        match me {
            Ok(resp) if resp.status().is_success() => match resp.json::<UserIdentity>().await {
                Ok(user) => {
                    self.set_current(Some(token));
                    self.emit(Some(user));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored token validation returned malformed user");
                    self.emit(None);
                }
            },
            Ok(resp) => {
                tracing::info!(status = %resp.status(), "stored token rejected, starting signed out");
                self.emit(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity API unreachable during startup resolution");
                self.emit(None);
            }
        }
    }
}

// =============================================================================
// DEV PROVIDER
// =============================================================================

struct DevAccount {
    password: String,
    user: UserIdentity,
}

/// In-memory identity provider for development and tests.
///
/// There is no fallback identity: accounts must be registered, sign-in is
/// checked against the stored password, and a signed-out state stays
/// signed out.
pub struct DevIdentityProvider {
    accounts: Mutex<HashMap<String, DevAccount>>,
    current: Mutex<Option<(UserIdentity, String)>>,
    events: broadcast::Sender<IdentityEvent>,
}

impl Default for DevIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DevIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { accounts: Mutex::new(HashMap::new()), current: Mutex::new(None), events }
    }

    /// Seed an account without signing it in.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, display_name: &str) -> Self {
        let account = DevAccount {
            password: password.to_owned(),
            user: UserIdentity {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_owned(),
                display_name: Some(display_name.to_owned()),
                photo_url: None,
            },
        };
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(email.to_owned(), account);
        self
    }

    fn emit(&self, event: IdentityEvent) {
        let _ = self.events.send(event);
    }

    fn set_current(&self, user: UserIdentity) -> UserIdentity {
        let token = generate_token();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some((user.clone(), token));
        self.emit(Some(user.clone()));
        user
    }
}

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<UserIdentity, AuthError> {
        let user = {
            let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(email) {
                return Err(AuthError::AccountExists(email.to_owned()));
            }
            let fallback_name = email.split('@').next().unwrap_or("user");
            let user = UserIdentity {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_owned(),
                display_name: Some(display_name.unwrap_or(fallback_name).to_owned()),
                photo_url: None,
            };
            accounts.insert(email.to_owned(), DevAccount { password: password.to_owned(), user: user.clone() });
            user
        };
        Ok(self.set_current(user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let user = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let account = accounts.get(email).ok_or(AuthError::InvalidCredentials)?;
            if account.password != password {
                return Err(AuthError::InvalidCredentials);
            }
            account.user.clone()
        };
        Ok(self.set_current(user))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.emit(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let known = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(email);
        if known {
            tracing::info!(email, "password reset requested (dev provider, no email sent)");
            Ok(())
        } else {
            Err(AuthError::UnknownAccount(email.to_owned()))
        }
    }

    async fn fetch_token(&self) -> Result<String, AuthError> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, token)| token.clone())
            .ok_or(AuthError::TokenUnavailable)
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }

    async fn resolve_initial(&self) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(user, _)| user.clone());
        self.emit(current);
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
