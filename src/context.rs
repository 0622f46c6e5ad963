//! Application context — constructor-injected wiring for the whole core.
//!
//! DESIGN
//! ======
//! There are no process-wide singletons; every collaborator is built here
//! and handed down. The wiring order matters: the token store feeds the
//! identity provider, the session owns both, the router guards on the
//! session, and the API client gets the router's login-redirect hook so a
//! 401 lands the user on the login view. Stores sit on top and only see
//! their backend seam.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::guard::Router;
use crate::identity::{DevIdentityProvider, IdentityProvider, RestIdentityProvider};
use crate::routes::RouteTable;
use crate::session::Session;
use crate::stores::artworks::{Artwork, ArtworksStore};
use crate::stores::backend::{HttpBackend, MemoryBackend};
use crate::stores::contacts::{Contact, ContactsStore};
use crate::stores::pipeline::{Deal, PipelineStore};
use crate::stores::reports::ReportsStore;
use crate::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// The assembled application core.
#[derive(Clone)]
pub struct AppContext {
    config: AppConfig,
    session: Session,
    router: Router,
    api: ApiClient,
    artworks: ArtworksStore,
    contacts: ContactsStore,
    pipeline: PipelineStore,
    reports: ReportsStore,
}

impl AppContext {
    /// Wire the core against the REST backend named by `config`.
    ///
    /// # Errors
    ///
    /// `ContextError::HttpClient` if the HTTP client cannot be constructed.
    pub fn new(config: AppConfig) -> Result<Self, ContextError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContextError::HttpClient(e.to_string()))?;
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path.clone()));
        let provider: Arc<dyn IdentityProvider> =
            Arc::new(RestIdentityProvider::new(http.clone(), config.api_base_url.clone(), Arc::clone(&tokens)));
        let (session, router, api) = Self::core(&config, http, provider, tokens);

        let artworks_backend: Arc<HttpBackend<Artwork>> = Arc::new(HttpBackend::new(api.clone()));
        let contacts_backend: Arc<HttpBackend<Contact>> = Arc::new(HttpBackend::new(api.clone()));
        let deals_backend: Arc<HttpBackend<Deal>> = Arc::new(HttpBackend::new(api.clone()));

        Ok(Self {
            artworks: ArtworksStore::new(artworks_backend.clone(), session.clone()),
            contacts: ContactsStore::new(contacts_backend, session.clone()),
            pipeline: PipelineStore::new(deals_backend.clone(), session.clone()),
            reports: ReportsStore::new(artworks_backend, deals_backend, session.clone()),
            config,
            session,
            router,
            api,
        })
    }

    /// Wire the core against in-memory collaborators. Used for development
    /// and tests; nothing leaves the process.
    #[must_use]
    pub fn in_memory(config: AppConfig, provider: DevIdentityProvider) -> Self {
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let (session, router, api) = Self::core(&config, reqwest::Client::new(), Arc::new(provider), tokens);

        let artworks_backend = Arc::new(MemoryBackend::<Artwork>::new());
        let deals_backend = Arc::new(MemoryBackend::<Deal>::new());

        Self {
            artworks: ArtworksStore::new(artworks_backend.clone(), session.clone()),
            contacts: ContactsStore::new(Arc::new(MemoryBackend::<Contact>::new()), session.clone()),
            pipeline: PipelineStore::new(deals_backend.clone(), session.clone()),
            reports: ReportsStore::new(artworks_backend, deals_backend, session.clone()),
            config,
            session,
            router,
            api,
        }
    }

    fn core(
        config: &AppConfig,
        http: reqwest::Client,
        provider: Arc<dyn IdentityProvider>,
        tokens: Arc<dyn TokenStore>,
    ) -> (Session, Router, ApiClient) {
        let session = Session::new(provider, tokens);
        let router = Router::new(RouteTable::default(), session.clone(), config.guard_resolve_timeout);
        let api =
            ApiClient::new(http, config.api_base_url.clone(), session.clone(), router.login_redirect_hook());
        (session, router, api)
    }

    /// Begin the session lifecycle and land on the initial route. Returns
    /// the identity-stream listener task.
    pub async fn start(&self) -> JoinHandle<()> {
        tracing::info!(api = %self.config.api_base_url, "application core starting");
        let listener = self.session.begin_session().await;
        self.router.navigate("/").await;
        listener
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn artworks(&self) -> &ArtworksStore {
        &self.artworks
    }

    #[must_use]
    pub fn contacts(&self) -> &ContactsStore {
        &self.contacts
    }

    #[must_use]
    pub fn pipeline(&self) -> &PipelineStore {
        &self.pipeline
    }

    #[must_use]
    pub fn reports(&self) -> &ReportsStore {
        &self.reports
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
