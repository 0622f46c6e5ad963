use super::*;

use crate::identity::DevIdentityProvider;
use crate::stores::backend::MemoryBackend;
use crate::token_store::MemoryTokenStore;

async fn signed_in_session() -> Session {
    let provider = Arc::new(DevIdentityProvider::new().with_account("ana@example.com", "hunter2", "Ana"));
    let session = Session::new(provider, Arc::new(MemoryTokenStore::new()));
    session.login("ana@example.com", "hunter2").await.unwrap();
    session
}

fn deal(id: &str, stage: DealStage, amount: i64) -> Deal {
    Deal {
        id: id.to_owned(),
        artwork_id: format!("artwork-{id}"),
        contact_id: format!("contact-{id}"),
        stage,
        amount,
        updated_at: Utc::now(),
    }
}

fn seeded_backend() -> Arc<MemoryBackend<Deal>> {
    Arc::new(MemoryBackend::with_records(vec![
        deal("d1", DealStage::Inquiry, 20_000_000),
        deal("d2", DealStage::Invoice, 15_000_000),
        deal("d3", DealStage::Delivered, 30_000_000),
    ]))
}

// =============================================================================
// STAGE ORDERING
// =============================================================================

#[test]
fn stages_chain_in_pipeline_order() {
    assert_eq!(DealStage::Inquiry.next(), Some(DealStage::Negotiation));
    assert_eq!(DealStage::Negotiation.next(), Some(DealStage::Invoice));
    assert_eq!(DealStage::Invoice.next(), Some(DealStage::Paid));
    assert_eq!(DealStage::Paid.next(), Some(DealStage::Delivered));
    assert_eq!(DealStage::Delivered.next(), None);
}

#[test]
fn only_paid_and_delivered_are_settled() {
    assert!(DealStage::Paid.is_settled());
    assert!(DealStage::Delivered.is_settled());
    assert!(!DealStage::Inquiry.is_settled());
    assert!(!DealStage::Negotiation.is_settled());
    assert!(!DealStage::Invoice.is_settled());
}

// =============================================================================
// STORE ACTIONS
// =============================================================================

#[tokio::test]
async fn fetch_all_requires_authentication() {
    let session = Session::new(Arc::new(DevIdentityProvider::new()), Arc::new(MemoryTokenStore::new()));
    let store = PipelineStore::new(seeded_backend(), session);
    assert!(matches!(store.fetch_all().await.unwrap_err(), StoreError::NotAuthenticated));
}

#[tokio::test]
async fn fetch_all_populates_list() {
    let store = PipelineStore::new(seeded_backend(), signed_in_session().await);
    assert_eq!(store.fetch_all().await.unwrap().len(), 3);
    assert!(store.error().is_none());
}

#[tokio::test]
async fn by_stage_filters_fetched_list() {
    let store = PipelineStore::new(seeded_backend(), signed_in_session().await);
    store.fetch_all().await.unwrap();
    assert_eq!(store.by_stage(DealStage::Invoice).len(), 1);
    assert!(store.by_stage(DealStage::Paid).is_empty());
}

#[tokio::test]
async fn add_opens_as_inquiry() {
    let store = PipelineStore::new(Arc::new(MemoryBackend::new()), signed_in_session().await);
    let added = store
        .add(NewDeal {
            artwork_id: "a1".to_owned(),
            contact_id: "c1".to_owned(),
            amount: 12_000_000,
        })
        .await
        .unwrap();
    assert_eq!(added.stage, DealStage::Inquiry);
    assert_eq!(store.list().first().unwrap().id, added.id);
}

#[tokio::test]
async fn advance_stage_moves_one_step_and_refreshes_timestamp() {
    let backend = seeded_backend();
    let store = PipelineStore::new(backend.clone(), signed_in_session().await);
    let before = backend.get("d1").await.unwrap().updated_at;

    let advanced = store.advance_stage("d1").await.unwrap();
    assert_eq!(advanced.stage, DealStage::Negotiation);
    assert!(advanced.updated_at >= before);

    let stored = backend.get("d1").await.unwrap();
    assert_eq!(stored.stage, DealStage::Negotiation);
}

#[tokio::test]
async fn advance_stage_is_a_no_op_when_delivered() {
    let backend = seeded_backend();
    let store = PipelineStore::new(backend.clone(), signed_in_session().await);
    let before = backend.get("d3").await.unwrap().updated_at;

    let unchanged = store.advance_stage("d3").await.unwrap();
    assert_eq!(unchanged.stage, DealStage::Delivered);
    assert_eq!(backend.get("d3").await.unwrap().updated_at, before);
}

#[tokio::test]
async fn advance_stage_unknown_id_fails() {
    let store = PipelineStore::new(seeded_backend(), signed_in_session().await);
    assert!(matches!(store.advance_stage("nope").await.unwrap_err(), StoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_from_list() {
    let store = PipelineStore::new(seeded_backend(), signed_in_session().await);
    store.fetch_all().await.unwrap();
    store.delete("d2").await.unwrap();
    assert_eq!(store.list().len(), 2);
}

#[test]
fn stage_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&DealStage::Inquiry).unwrap(), r#""inquiry""#);
    assert_eq!(serde_json::to_string(&DealStage::Paid).unwrap(), r#""paid""#);
}
