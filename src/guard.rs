//! Router with an authentication-gated navigation guard.
//!
//! DESIGN
//! ======
//! Every transition request runs the same two-step machine: wait for the
//! session to resolve, then decide. The wait is bounded; a session that
//! never resolves redirects to login with a recorded error instead of
//! hanging the transition forever. Each invocation ends in exactly one of:
//! allow, redirect to the authenticated landing route, or redirect to login.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::routes::{DEFAULT_LANDING, LOGIN_PATH, Route, RouteTable};
use crate::session::Session;

/// Terminal outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLanding,
    RedirectToLogin,
}

/// Pure decision rule over auth state and target route metadata.
#[must_use]
pub fn decide(is_authenticated: bool, target: &Route) -> RouteDecision {
    if is_authenticated && target.name.is_auth_entry() {
        return RouteDecision::RedirectToLanding;
    }
    if target.meta.requires_auth && !is_authenticated {
        return RouteDecision::RedirectToLogin;
    }
    RouteDecision::Allow
}

/// Application router: route table, session, and current location.
#[derive(Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    session: Session,
    resolve_timeout: Duration,
    location_tx: Arc<watch::Sender<String>>,
    location_rx: watch::Receiver<String>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, session: Session, resolve_timeout: Duration) -> Self {
        let (location_tx, location_rx) = watch::channel(LOGIN_PATH.to_owned());
        Self {
            table: Arc::new(table),
            session,
            resolve_timeout,
            location_tx: Arc::new(location_tx),
            location_rx,
        }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Path currently displayed.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.location_rx.borrow().clone()
    }

    /// Watch the current location, e.g. for a view layer.
    #[must_use]
    pub fn watch_location(&self) -> watch::Receiver<String> {
        self.location_rx.clone()
    }

    /// Evaluate the guard for a target route without applying the outcome.
    pub async fn evaluate(&self, target: &Route) -> RouteDecision {
        if let Err(e) = self.session.wait_until_resolved(self.resolve_timeout).await {
            tracing::warn!(error = %e, path = target.path, "session did not resolve, redirecting to login");
            self.session.record_error(e.to_string());
            return RouteDecision::RedirectToLogin;
        }
        decide(self.session.is_authenticated(), target)
    }

    /// Request a transition to `to`. Runs the guard and moves the current
    /// location to the allowed or redirected path, which is returned.
    pub async fn navigate(&self, to: &str) -> (RouteDecision, String) {
        let target = self.table.match_path(to);
        let decision = self.evaluate(target).await;
        let path = match decision {
            RouteDecision::Allow => {
                // Store the canonical path for the landing alias `/`.
                if to == "/" { DEFAULT_LANDING.to_owned() } else { to.to_owned() }
            }
            RouteDecision::RedirectToLanding => DEFAULT_LANDING.to_owned(),
            RouteDecision::RedirectToLogin => LOGIN_PATH.to_owned(),
        };
        tracing::debug!(to, ?decision, "navigation decided");
        self.location_tx.send_replace(path.clone());
        (decision, path)
    }

    /// Hook for the request interceptor: jump straight to the login view.
    /// Login is public, so no guard pass is needed; the jump is skipped when
    /// the login view is already showing, so concurrent 401s redirect once.
    #[must_use]
    pub fn login_redirect_hook(&self) -> Arc<dyn Fn() + Send + Sync> {
        let location_tx = Arc::clone(&self.location_tx);
        Arc::new(move || {
            let moved = location_tx.send_if_modified(|current| {
                if current == LOGIN_PATH {
                    false
                } else {
                    LOGIN_PATH.clone_into(current);
                    true
                }
            });
            if moved {
                tracing::info!("unauthorized response, redirected to login");
            }
        })
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
