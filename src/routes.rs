//! Static route table: paths, view identifiers, and auth/layout metadata.
//!
//! Routes are defined once at startup and never mutated; the navigation
//! guard looks them up per transition. `{param}` segments match any single
//! non-empty path segment.

/// Default landing route for an authenticated user.
pub const DEFAULT_LANDING: &str = "/app/dashboard";
/// Route the guard redirects unauthenticated users to.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    ArtworksList,
    ArtworkCreate,
    ArtworkDetail,
    ContactsList,
    ContactCreate,
    ContactDetail,
    Pipeline,
    Reports,
    NotFound,
}

impl RouteName {
    /// Auth-entry routes an already-authenticated user is bounced away from.
    #[must_use]
    pub fn is_auth_entry(self) -> bool {
        matches!(self, Self::Login | Self::Register | Self::ForgotPassword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Auth,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub layout: Layout,
}

/// A single route descriptor. `view` names the view component a UI layer
/// would render; this crate only carries it as an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: RouteName,
    pub view: &'static str,
    pub meta: RouteMeta,
}

const AUTH_META: RouteMeta = RouteMeta { requires_auth: false, layout: Layout::Auth };
const APP_META: RouteMeta = RouteMeta { requires_auth: true, layout: Layout::Default };

const ROUTES: &[Route] = &[
    Route { path: "/login", name: RouteName::Login, view: "LoginView", meta: AUTH_META },
    Route { path: "/register", name: RouteName::Register, view: "RegisterView", meta: AUTH_META },
    Route {
        path: "/forgot-password",
        name: RouteName::ForgotPassword,
        view: "ForgotPasswordView",
        meta: AUTH_META,
    },
    Route { path: "/app/dashboard", name: RouteName::Dashboard, view: "DashboardView", meta: APP_META },
    Route { path: "/app/artworks", name: RouteName::ArtworksList, view: "ArtworksListView", meta: APP_META },
    Route {
        path: "/app/artworks/new",
        name: RouteName::ArtworkCreate,
        view: "ArtworkCreateView",
        meta: APP_META,
    },
    Route {
        path: "/app/artworks/{id}",
        name: RouteName::ArtworkDetail,
        view: "ArtworkDetailView",
        meta: APP_META,
    },
    Route { path: "/app/contacts", name: RouteName::ContactsList, view: "ContactsListView", meta: APP_META },
    Route {
        path: "/app/contacts/new",
        name: RouteName::ContactCreate,
        view: "ContactCreateView",
        meta: APP_META,
    },
    Route {
        path: "/app/contacts/{id}",
        name: RouteName::ContactDetail,
        view: "ContactDetailView",
        meta: APP_META,
    },
    Route { path: "/app/pipeline", name: RouteName::Pipeline, view: "PipelineView", meta: APP_META },
    Route { path: "/app/reports", name: RouteName::Reports, view: "ReportsView", meta: APP_META },
    // Catch-all; rendered inside the default layout but public.
    Route {
        path: "/{*rest}",
        name: RouteName::NotFound,
        view: "NotFoundView",
        meta: RouteMeta { requires_auth: false, layout: Layout::Default },
    },
];

/// Immutable route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: &'static [Route],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self { routes: ROUTES }
    }
}

impl RouteTable {
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.routes
    }

    #[must_use]
    pub fn by_name(&self, name: RouteName) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Resolve a concrete path to its route. `/` resolves to the landing
    /// route; anything unmatched falls through to the not-found route.
    #[must_use]
    pub fn match_path(&self, path: &str) -> &Route {
        let path = if path == "/" { DEFAULT_LANDING } else { path };
        self.routes
            .iter()
            .find(|route| route.name != RouteName::NotFound && pattern_matches(route.path, path))
            .unwrap_or_else(|| &self.routes[self.routes.len() - 1])
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments
        .iter()
        .zip(&path_segments)
        .all(|(pat, seg)| (is_param(pat) && !seg.is_empty()) || pat == seg)
}

fn is_param(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
