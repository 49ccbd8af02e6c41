//! Shared fixtures: a deterministic mock embedding endpoint and a config
//! pointing at it. The responder maps each input text to a topic bucket, so
//! related contents come out similar and unrelated ones do not.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use engram::config::{Config, EmbeddingsConfig, MemoryConfig, QueryCacheConfig};
use engram::store::{FactStore, InMemoryBackend};
use engram::Engine;

const DIMENSIONS: usize = 8;

const TOPIC_BUCKETS: [&[&str]; 4] = [
    &["lives", "live", "lisbon", "porto", "city"],
    &["works", "work", "acme", "initech", "employer"],
    &["revenue", "target", "budget"],
    &["allergic", "allergy", "peanuts", "shellfish"],
];

fn topic_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    let mut vector = vec![0.0_f32; DIMENSIONS];
    for (i, words) in TOPIC_BUCKETS.iter().enumerate() {
        if words.iter().any(|w| text.contains(w)) {
            vector[i] = 1.0;
        }
    }
    // content-dependent tail so no two texts embed identically
    let hash: u32 = text.bytes().fold(0_u32, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as u32)
    });
    vector[TOPIC_BUCKETS.len() + (hash as usize % (DIMENSIONS - TOPIC_BUCKETS.len()))] = 0.3;
    vector
}

struct TopicEmbedder;

impl Respond for TopicEmbedder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(v) => v,
            Err(_) => return ResponseTemplate::new(400),
        };
        let Some(inputs) = body["input"].as_array() else {
            return ResponseTemplate::new(400);
        };
        let data: Vec<Value> = inputs
            .iter()
            .map(|input| {
                json!({ "embedding": topic_vector(input.as_str().unwrap_or_default()) })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

pub async fn mock_embedding_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(TopicEmbedder)
        .mount(&server)
        .await;
    server
}

pub fn test_config(embeddings_base_url: &str) -> Config {
    Config {
        embeddings: EmbeddingsConfig {
            model: "openai/text-embedding-3-small".to_string(),
            dimensions: DIMENSIONS,
            batch_size: 16,
            api_key: Some("test-key".to_string()),
            base_url: Some(embeddings_base_url.to_string()),
            timeout_secs: 5,
            max_retries: 0,
        },
        memory: MemoryConfig {
            contradiction_scan_window: 200,
            semantic_contradiction_threshold: 0.85,
            default_event_expiry_days: 7,
            forgetting_check_interval_secs: 3600,
        },
        query_cache: QueryCacheConfig {
            capacity: 500,
            ttl_secs: 300,
        },
        // no LLM: extraction exercises the regex rules, rerank the fallback
        llm: None,
    }
}

pub async fn test_engine() -> (Engine, Arc<dyn FactStore>, MockServer) {
    let server = mock_embedding_server().await;
    let store: Arc<dyn FactStore> = Arc::new(InMemoryBackend::new());
    let engine = Engine::new(&test_config(&server.uri()), store.clone())
        .expect("engine construction");
    (engine, store, server)
}
