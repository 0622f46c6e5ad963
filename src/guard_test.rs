use super::*;

use crate::identity::DevIdentityProvider;
use crate::routes::RouteName;
use crate::token_store::MemoryTokenStore;

fn router_with_session() -> (Router, Session) {
    let provider = Arc::new(DevIdentityProvider::new().with_account("ana@example.com", "hunter2", "Ana"));
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = Session::new(provider, tokens);
    let router = Router::new(RouteTable::default(), session.clone(), Duration::from_secs(1));
    (router, session)
}

async fn resolved_router() -> (Router, Session) {
    let (router, session) = router_with_session();
    let _handle = session.begin_session().await;
    session.wait_until_resolved(Duration::from_secs(1)).await.unwrap();
    (router, session)
}

// =============================================================================
// decide — pure rules
// =============================================================================

#[test]
fn unauthenticated_public_route_allowed() {
    let table = RouteTable::default();
    let login = table.by_name(RouteName::Login).unwrap();
    assert_eq!(decide(false, login), RouteDecision::Allow);
}

#[test]
fn unauthenticated_protected_route_redirects_to_login() {
    let table = RouteTable::default();
    for name in [RouteName::Dashboard, RouteName::ArtworksList, RouteName::Reports] {
        let route = table.by_name(name).unwrap();
        assert_eq!(decide(false, route), RouteDecision::RedirectToLogin);
    }
}

#[test]
fn authenticated_auth_entry_redirects_to_landing() {
    let table = RouteTable::default();
    for name in [RouteName::Login, RouteName::Register, RouteName::ForgotPassword] {
        let route = table.by_name(name).unwrap();
        assert_eq!(decide(true, route), RouteDecision::RedirectToLanding);
    }
}

#[test]
fn authenticated_protected_route_allowed() {
    let table = RouteTable::default();
    let dashboard = table.by_name(RouteName::Dashboard).unwrap();
    assert_eq!(decide(true, dashboard), RouteDecision::Allow);
}

#[test]
fn not_found_allowed_for_everyone() {
    let table = RouteTable::default();
    let not_found = table.by_name(RouteName::NotFound).unwrap();
    assert_eq!(decide(false, not_found), RouteDecision::Allow);
    assert_eq!(decide(true, not_found), RouteDecision::Allow);
}

// =============================================================================
// navigate
// =============================================================================

#[tokio::test]
async fn unauthenticated_dashboard_redirects_to_login() {
    let (router, _session) = resolved_router().await;
    let (decision, path) = router.navigate("/app/dashboard").await;
    assert_eq!(decision, RouteDecision::RedirectToLogin);
    assert_eq!(path, LOGIN_PATH);
    assert_eq!(router.current_path(), LOGIN_PATH);
}

#[tokio::test]
async fn authenticated_login_redirects_to_landing() {
    let (router, session) = resolved_router().await;
    session.login("ana@example.com", "hunter2").await.unwrap();
    let (decision, path) = router.navigate("/login").await;
    assert_eq!(decision, RouteDecision::RedirectToLanding);
    assert_eq!(path, DEFAULT_LANDING);
}

#[tokio::test]
async fn authenticated_dashboard_allowed() {
    let (router, session) = resolved_router().await;
    session.login("ana@example.com", "hunter2").await.unwrap();
    let (decision, path) = router.navigate("/app/dashboard").await;
    assert_eq!(decision, RouteDecision::Allow);
    assert_eq!(path, "/app/dashboard");
}

#[tokio::test]
async fn root_alias_lands_on_dashboard_when_authenticated() {
    let (router, session) = resolved_router().await;
    session.login("ana@example.com", "hunter2").await.unwrap();
    let (decision, path) = router.navigate("/").await;
    assert_eq!(decision, RouteDecision::Allow);
    assert_eq!(path, DEFAULT_LANDING);
}

#[tokio::test]
async fn unknown_path_allowed_as_not_found() {
    let (router, _session) = resolved_router().await;
    let (decision, path) = router.navigate("/does/not/exist").await;
    assert_eq!(decision, RouteDecision::Allow);
    assert_eq!(path, "/does/not/exist");
}

// =============================================================================
// await-session behavior
// =============================================================================

#[tokio::test]
async fn navigation_suspends_until_first_identity_notification() {
    let (router, session) = router_with_session();

    let pending = tokio::spawn({
        let router = router.clone();
        async move { router.navigate("/app/dashboard").await }
    });

    // Still loading: the guard must not have decided yet.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!pending.is_finished());

    // First notification carries no identity -> redirect to login.
    let _handle = session.begin_session().await;
    let (decision, path) = pending.await.unwrap();
    assert_eq!(decision, RouteDecision::RedirectToLogin);
    assert_eq!(path, LOGIN_PATH);
}

#[tokio::test]
async fn resolve_timeout_redirects_to_login_with_recorded_error() {
    let provider = Arc::new(DevIdentityProvider::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = Session::new(provider, tokens);
    // Session never begins: the stream never fires.
    let router = Router::new(RouteTable::default(), session.clone(), Duration::from_millis(20));

    let (decision, path) = router.navigate("/app/dashboard").await;
    assert_eq!(decision, RouteDecision::RedirectToLogin);
    assert_eq!(path, LOGIN_PATH);
    assert!(session.error().unwrap().contains("did not resolve"));
}

// =============================================================================
// login_redirect_hook
// =============================================================================

#[tokio::test]
async fn redirect_hook_moves_location_to_login() {
    let (router, session) = resolved_router().await;
    session.login("ana@example.com", "hunter2").await.unwrap();
    router.navigate("/app/artworks").await;
    assert_eq!(router.current_path(), "/app/artworks");

    (router.login_redirect_hook())();
    assert_eq!(router.current_path(), LOGIN_PATH);
}

#[tokio::test]
async fn redirect_hook_is_a_no_op_when_already_on_login() {
    let (router, _session) = resolved_router().await;
    let mut location = router.watch_location();
    location.mark_unchanged();

    let hook = router.login_redirect_hook();
    hook();
    hook();
    assert_eq!(router.current_path(), LOGIN_PATH);
    // No change notification was produced by the duplicate redirects.
    assert!(!location.has_changed().unwrap());
}
