//! ArtConnect application core.
//!
//! ARCHITECTURE
//! ============
//! Headless core of a single-page app for managing art-business records.
//! Everything hangs off an [`AppContext`] built by constructor injection:
//! a [`Session`] tracks the signed-in user and bearer token, an
//! [`ApiClient`] attaches the token to outgoing requests and forces a
//! logout on 401 responses, and a [`Router`] gates route transitions on
//! authentication state. Record stores (artworks, contacts, pipeline,
//! reports) sit on a pluggable [`RecordBackend`] seam so an in-memory
//! dataset and a real REST backend are interchangeable.
//!
//! UI rendering is deliberately absent; this crate is the state and
//! plumbing layer a view layer would drive.

pub mod api;
pub mod config;
pub mod context;
pub mod guard;
pub mod identity;
pub mod routes;
pub mod session;
pub mod stores;
pub mod token_store;

pub use api::{ApiClient, ApiError};
pub use config::AppConfig;
pub use context::{AppContext, ContextError};
pub use guard::{RouteDecision, Router};
pub use identity::{AuthError, IdentityProvider, UserIdentity};
pub use routes::{Route, RouteName, RouteTable};
pub use session::{Session, SessionError};
pub use stores::backend::{Record, RecordBackend, StoreError};
pub use token_store::TokenStore;
