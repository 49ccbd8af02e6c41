//! End-to-end lifecycle: ingestion, dedup, contradiction chains, scope
//! isolation, forgetting and restore.

mod common;

use engram::models::{CreateFactRequest, IngestBatchRequest, IngestRequest};
use engram::services::EXPIRY_FORGET_REASON;
use engram::store::FactStore;
use pretty_assertions::assert_eq;

fn ingest(text: &str) -> IngestRequest {
    IngestRequest {
        text: text.to_string(),
        force_is_core: None,
        tags: Vec::new(),
        source_doc_id: None,
    }
}

fn ingest_tagged(text: &str, tag: &str) -> IngestRequest {
    IngestRequest {
        tags: vec![tag.to_string()],
        ..ingest(text)
    }
}

#[tokio::test]
async fn test_ingest_extracts_and_saves_facts() {
    let (engine, _store, _server) = common::test_engine().await;

    let response = engine
        .ingest
        .extract_and_save("u1", ingest("I work at Acme Corp. I'm allergic to peanuts."))
        .await
        .unwrap();

    let contents: Vec<&str> = response.facts.iter().map(|f| f.content.as_str()).collect();
    assert!(contents.contains(&"User works at Acme Corp"));
    assert!(contents.contains(&"User is allergic to peanuts"));
    for fact in &response.facts {
        assert_eq!(fact.version, 1);
        assert!(fact.is_latest);
        assert!(!fact.embedding.is_empty());
    }
    assert!(!response.title.is_empty());
    assert!(!response.summary.is_empty());
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let (engine, _store, _server) = common::test_engine().await;

    let first = engine
        .ingest
        .extract_and_save("u1", ingest("I'm allergic to peanuts."))
        .await
        .unwrap();
    assert_eq!(first.facts.len(), 1);

    let second = engine
        .ingest
        .extract_and_save("u1", ingest("I'm allergic to peanuts."))
        .await
        .unwrap();
    assert!(second.facts.is_empty());
}

#[tokio::test]
async fn test_numeric_contradiction_builds_version_chain() {
    let (engine, store, _server) = common::test_engine().await;

    let first = engine
        .ingest
        .extract_and_save("u1", ingest("Our revenue target is $5M."))
        .await
        .unwrap();
    let original = &first.facts[0];
    assert_eq!(original.content, "Revenue target is $5M");

    let second = engine
        .ingest
        .extract_and_save("u1", ingest("Update: our revenue target is now $6.2M."))
        .await
        .unwrap();
    let updated = &second.facts[0];

    assert_eq!(updated.version, 2);
    assert_eq!(updated.previous_version.as_deref(), Some(original.id.as_str()));
    assert!(updated.is_latest);

    let superseded = store.get_fact_by_id(&original.id).await.unwrap().unwrap();
    assert!(!superseded.is_latest);
    // superseded content is preserved, never edited in place
    assert_eq!(superseded.content, "Revenue target is $5M");
}

#[tokio::test]
async fn test_oversized_batch_rejected_before_any_write() {
    let (engine, store, _server) = common::test_engine().await;

    let batch = IngestBatchRequest {
        items: vec![ingest("I work at Acme Corp."); 101],
    };
    let err = engine
        .ingest
        .extract_and_save_batch("u1", batch)
        .await
        .unwrap_err();
    assert!(matches!(err, engram::EngramError::Validation(_)));
    assert!(store.list_facts_by_owner("u1", 10).await.unwrap().is_empty());

    let responses = engine
        .ingest
        .extract_and_save_batch(
            "u1",
            IngestBatchRequest {
                items: vec![ingest("I work at Acme Corp."), ingest("I live in Lisbon.")],
            },
        )
        .await
        .unwrap();
    assert_eq!(responses.len(), 2);
}

#[tokio::test]
async fn test_tag_scopes_keep_contradictions_apart() {
    let (engine, store, _server) = common::test_engine().await;

    let a = engine
        .ingest
        .extract_and_save("u1", ingest_tagged("Our revenue target is $5M.", "project-a"))
        .await
        .unwrap();
    let b = engine
        .ingest
        .extract_and_save("u1", ingest_tagged("Our revenue target is $9M.", "project-b"))
        .await
        .unwrap();

    assert_eq!(a.facts[0].version, 1);
    assert_eq!(b.facts[0].version, 1);
    let a_fact = store.get_fact_by_id(&a.facts[0].id).await.unwrap().unwrap();
    assert!(a_fact.is_latest);
}

#[tokio::test]
async fn test_tag_scopes_survive_the_semantic_sweep() {
    let (engine, store, _server) = common::test_engine().await;

    let a = engine
        .ingest
        .extract_and_save("u1", ingest_tagged("I live in Lisbon.", "project-a"))
        .await
        .unwrap();
    // reworded location update, but in a disjoint scope
    let b = engine
        .ingest
        .extract_and_save("u1", ingest_tagged("I moved to Porto.", "project-b"))
        .await
        .unwrap();

    let a_fact = store.get_fact_by_id(&a.facts[0].id).await.unwrap().unwrap();
    assert!(a_fact.is_latest);
    let b_fact = store.get_fact_by_id(&b.facts[0].id).await.unwrap().unwrap();
    assert!(b_fact.is_latest);
    assert_eq!(b_fact.version, 1);
}

#[tokio::test]
async fn test_semantic_sweep_catches_reworded_update() {
    let (engine, store, _server) = common::test_engine().await;

    let first = engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon."))
        .await
        .unwrap();
    assert_eq!(first.facts[0].content, "User lives in Lisbon");

    // no update-indicator word, so the lexical path alone would miss this
    let second = engine
        .ingest
        .extract_and_save("u1", ingest("I moved to Porto."))
        .await
        .unwrap();
    assert_eq!(second.facts[0].content, "User lives in Porto");

    let old = store.get_fact_by_id(&first.facts[0].id).await.unwrap().unwrap();
    assert!(!old.is_latest);
    let new = store
        .get_fact_by_id(&second.facts[0].id)
        .await
        .unwrap()
        .unwrap();
    assert!(new.is_latest);
}

#[tokio::test]
async fn test_direct_create_update_and_history() {
    let (engine, _store, _server) = common::test_engine().await;

    let created = engine
        .facts
        .create(
            "u1",
            CreateFactRequest {
                content: "User works at Acme Corp".to_string(),
                is_core: Some(true),
                kind: None,
                tags: Vec::new(),
                expires_at: None,
                metadata: None,
            },
        )
        .await
        .unwrap();
    assert!(created.is_core);

    let updated = engine
        .facts
        .update(&created.id, "User works at Initech")
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.previous_version.as_deref(), Some(created.id.as_str()));

    let history = engine.facts.history(&updated.id).await.unwrap();
    let contents: Vec<&str> = history.iter().map(|f| f.content.as_str()).collect();
    assert_eq!(contents, vec!["User works at Initech", "User works at Acme Corp"]);
}

#[tokio::test]
async fn test_forget_restore_never_resurrects_latest() {
    let (engine, store, _server) = common::test_engine().await;

    let created = engine
        .facts
        .create(
            "u1",
            CreateFactRequest {
                content: "User works at Acme Corp".to_string(),
                is_core: None,
                kind: None,
                tags: Vec::new(),
                expires_at: None,
                metadata: None,
            },
        )
        .await
        .unwrap();
    engine
        .facts
        .update(&created.id, "User works at Initech")
        .await
        .unwrap();

    engine.facts.forget(&created.id, Some("manual")).await.unwrap();
    let forgotten = store.get_fact_by_id(&created.id).await.unwrap().unwrap();
    assert!(forgotten.is_forgotten);
    assert_eq!(forgotten.forget_reason.as_deref(), Some("manual"));

    engine.facts.restore(&created.id).await.unwrap();
    let restored = store.get_fact_by_id(&created.id).await.unwrap().unwrap();
    assert!(!restored.is_forgotten);
    // superseded stays superseded
    assert!(!restored.is_latest);
}

#[tokio::test]
async fn test_promote_demote_and_purge() {
    let (engine, store, _server) = common::test_engine().await;

    let created = engine
        .facts
        .create(
            "u1",
            CreateFactRequest {
                content: "User lives in Lisbon".to_string(),
                is_core: Some(true),
                kind: None,
                tags: Vec::new(),
                expires_at: None,
                metadata: None,
            },
        )
        .await
        .unwrap();
    assert!(created.is_core);

    engine.facts.demote(&created.id).await.unwrap();
    assert!(!store.get_fact_by_id(&created.id).await.unwrap().unwrap().is_core);

    engine.facts.promote(&created.id).await.unwrap();
    assert!(store.get_fact_by_id(&created.id).await.unwrap().unwrap().is_core);

    engine.facts.purge(&created.id).await.unwrap();
    assert!(store.get_fact_by_id(&created.id).await.unwrap().is_none());
    assert!(engine.facts.purge(&created.id).await.is_err());
}

#[tokio::test]
async fn test_expired_events_are_swept_with_reason() {
    let (engine, store, _server) = common::test_engine().await;

    let request = CreateFactRequest {
        content: "Standup meeting happened already".to_string(),
        is_core: None,
        kind: Some(engram::models::FactKind::Event),
        tags: Vec::new(),
        expires_at: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
        metadata: None,
    };
    let created = engine.facts.create("u1", request).await.unwrap();

    let swept = engine.sweeper.run_once().await.unwrap();
    assert_eq!(swept, 1);

    let fact = store.get_fact_by_id(&created.id).await.unwrap().unwrap();
    assert!(fact.is_forgotten);
    assert_eq!(fact.forget_reason.as_deref(), Some(EXPIRY_FORGET_REASON));
}
