//! Query-time behavior through the search service: ranking order, history
//! mode, filters, and the embedding cache.

mod common;

use engram::models::{FilterCondition, SearchFactsRequest, SearchFilters};
use engram::models::IngestRequest;
use pretty_assertions::assert_eq;
use serde_json::json;

fn query(q: &str) -> SearchFactsRequest {
    SearchFactsRequest {
        q: q.to_string(),
        ..SearchFactsRequest::default()
    }
}

fn ingest(text: &str) -> IngestRequest {
    IngestRequest {
        text: text.to_string(),
        force_is_core: None,
        tags: Vec::new(),
        source_doc_id: None,
    }
}

#[tokio::test]
async fn test_search_returns_relevant_facts_first() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon. I'm allergic to peanuts."))
        .await
        .unwrap();

    let response = engine.search.search("u1", query("lisbon city")).await.unwrap();
    assert!(response.total >= 1);
    assert_eq!(response.results[0].content, "User lives in Lisbon");
    assert!(response.results[0].score > 0.0);
}

#[tokio::test]
async fn test_search_is_owner_scoped() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon."))
        .await
        .unwrap();

    let response = engine.search.search("u2", query("lisbon")).await.unwrap();
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn test_superseded_versions_hidden_unless_history_requested() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("Our revenue target is $5M."))
        .await
        .unwrap();
    engine
        .ingest
        .extract_and_save("u1", ingest("Our revenue target is now $6.2M."))
        .await
        .unwrap();

    let response = engine
        .search
        .search("u1", query("revenue target"))
        .await
        .unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].content, "Revenue target is $6.2M");
    assert!(response.results[0].is_latest);

    let mut with_history = query("revenue target");
    with_history.include_history = Some(true);
    let response = engine.search.search("u1", with_history).await.unwrap();
    assert_eq!(response.total, 2);
    // the superseded version ranks below the current one
    assert_eq!(response.results[0].content, "Revenue target is $6.2M");
    assert_eq!(response.results[1].content, "Revenue target is $5M");
    assert!(response.results[0].score > response.results[1].score);
}

#[tokio::test]
async fn test_forgotten_facts_never_surface() {
    let (engine, _store, _server) = common::test_engine().await;

    let saved = engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon."))
        .await
        .unwrap();
    engine
        .facts
        .forget(&saved.facts[0].id, Some("user request"))
        .await
        .unwrap();

    let response = engine.search.search("u1", query("lisbon")).await.unwrap();
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn test_declarative_filters_narrow_results_and_fail_open() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon. I work at Acme Corp."))
        .await
        .unwrap();

    let mut filtered = query("lisbon acme");
    filtered.filters = Some(SearchFilters {
        and: Some(vec![FilterCondition {
            key: "content".to_string(),
            value: json!("Lisbon"),
            negate: None,
            filter_type: Some("string_contains".to_string()),
            numeric_operator: None,
            case_insensitive: None,
        }]),
        or: None,
    });
    let response = engine.search.search("u1", filtered).await.unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].content, "User lives in Lisbon");

    // an unknown filter type must not reject anything
    let mut open = query("lisbon acme");
    open.filters = Some(SearchFilters {
        and: Some(vec![FilterCondition {
            key: "content".to_string(),
            value: json!("x"),
            negate: None,
            filter_type: Some("fuzzy_match".to_string()),
            numeric_operator: None,
            case_insensitive: None,
        }]),
        or: None,
    });
    let open_response = engine.search.search("u1", open).await.unwrap();
    assert!(open_response.total >= 2);
}

#[tokio::test]
async fn test_rerank_request_ignored_unless_enabled_in_config() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon."))
        .await
        .unwrap();

    // the config carries no rerank toggle, so the per-request flag is a no-op
    let request = SearchFactsRequest {
        rerank: Some(true),
        ..query("lisbon")
    };
    let response = engine.search.search("u1", request).await.unwrap();
    assert!(response.total >= 1);
    assert!(response.results.iter().all(|r| r.rerank_score.is_none()));
}

#[tokio::test]
async fn test_query_embedding_cache_serves_repeat_queries() {
    let (engine, _store, server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save("u1", ingest("I live in Lisbon."))
        .await
        .unwrap();
    let requests_after_ingest = server.received_requests().await.unwrap().len();

    engine.search.search("u1", query("lisbon")).await.unwrap();
    engine.search.search("u1", query("lisbon")).await.unwrap();
    engine.search.search("u1", query("LISBON  ")).await.unwrap();

    let total_requests = server.received_requests().await.unwrap().len();
    // three searches, one embedding call: the cache key is trimmed+lowercased
    assert_eq!(total_requests - requests_after_ingest, 1);
}

#[tokio::test]
async fn test_empty_query_is_rejected() {
    let (engine, _store, _server) = common::test_engine().await;
    assert!(engine.search.search("u1", query("   ")).await.is_err());
}

#[tokio::test]
async fn test_limit_truncates() {
    let (engine, _store, _server) = common::test_engine().await;

    engine
        .ingest
        .extract_and_save(
            "u1",
            ingest("I live in Lisbon. I work at Acme Corp. I'm allergic to peanuts."),
        )
        .await
        .unwrap();

    let mut limited = query("lisbon acme peanuts");
    limited.limit = Some(1);
    let response = engine.search.search("u1", limited).await.unwrap();
    assert_eq!(response.results.len(), 1);
}
