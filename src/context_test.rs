use super::*;

use crate::guard::RouteDecision;
use crate::routes::{DEFAULT_LANDING, LOGIN_PATH};
use crate::stores::artworks::NewArtwork;

fn dev_context() -> AppContext {
    let provider = DevIdentityProvider::new().with_account("ana@example.com", "hunter2", "Ana");
    AppContext::in_memory(AppConfig::default(), provider)
}

#[tokio::test]
async fn start_resolves_session_and_lands_signed_out_users_on_login() {
    let ctx = dev_context();
    assert!(ctx.session().loading());

    let listener = ctx.start().await;
    assert!(!ctx.session().loading());
    assert_eq!(ctx.router().current_path(), LOGIN_PATH);
    listener.abort();
}

#[tokio::test]
async fn signed_in_user_lands_on_dashboard() {
    let ctx = dev_context();
    let listener = ctx.start().await;
    ctx.session().login("ana@example.com", "hunter2").await.unwrap();

    let (decision, path) = ctx.router().navigate("/").await;
    assert_eq!(decision, RouteDecision::Allow);
    assert_eq!(path, DEFAULT_LANDING);

    let (decision, _) = ctx.router().navigate("/login").await;
    assert_eq!(decision, RouteDecision::RedirectToLanding);
    listener.abort();
}

#[tokio::test]
async fn stores_share_the_context_session() {
    let ctx = dev_context();
    let listener = ctx.start().await;

    // Signed out: every store refuses to fetch.
    assert!(ctx.artworks().fetch_all().await.is_err());
    assert!(ctx.contacts().fetch_all().await.is_err());
    assert!(ctx.pipeline().fetch_all().await.is_err());

    ctx.session().login("ana@example.com", "hunter2").await.unwrap();
    assert!(ctx.artworks().fetch_all().await.unwrap().is_empty());
    listener.abort();
}

#[tokio::test]
async fn reports_see_records_added_through_stores() {
    let ctx = dev_context();
    let listener = ctx.start().await;
    ctx.session().login("ana@example.com", "hunter2").await.unwrap();

    ctx.artworks()
        .add(NewArtwork {
            title: "Morning Light".to_owned(),
            medium: "Watercolor".to_owned(),
            price: 7_500_000,
            dimensions: None,
            primary_image_url: None,
        })
        .await
        .unwrap();

    let summary = ctx.reports().summary().await.unwrap();
    assert_eq!(summary.artworks_total, 1);
    assert_eq!(summary.inventory_value, 7_500_000);
    listener.abort();
}

#[tokio::test]
async fn context_clones_share_state() {
    let ctx = dev_context();
    let listener = ctx.start().await;
    let clone = ctx.clone();
    clone.session().login("ana@example.com", "hunter2").await.unwrap();
    assert!(ctx.session().is_authenticated());
    listener.abort();
}

#[test]
fn rest_context_builds_from_default_config() {
    let ctx = AppContext::new(AppConfig::default()).unwrap();
    assert_eq!(ctx.config().api_base_url, "http://localhost:3000/api");
}
