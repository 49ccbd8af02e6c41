use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::consistency::ConsistencyManager;
use crate::embeddings::{EmbeddingProvider, QueryEmbeddingCache};
use crate::error::Result;
use crate::extract::FactExtractor;
use crate::llm::LlmProvider;
use crate::services::{FactService, ForgettingSweeper, IngestService, SearchService};
use crate::store::FactStore;

/// Top-level wiring of the pipeline: providers, consistency manager, and the
/// exposed services, all sharing one store.
pub struct Engine {
    pub llm: Arc<LlmProvider>,
    pub embeddings: Arc<EmbeddingProvider>,
    pub ingest: IngestService,
    pub search: SearchService,
    pub facts: FactService,
    pub sweeper: ForgettingSweeper,
}

impl Engine {
    pub fn new(config: &Config, store: Arc<dyn FactStore>) -> Result<Self> {
        let embeddings = Arc::new(EmbeddingProvider::new(&config.embeddings)?);
        let llm = Arc::new(LlmProvider::new(config.llm.as_ref()));

        let consistency = Arc::new(ConsistencyManager::new(
            store.clone(),
            config.memory.contradiction_scan_window,
            config.memory.semantic_contradiction_threshold,
        ));
        let extractor = FactExtractor::new(llm.clone(), config.memory.default_event_expiry_days);
        let query_cache = QueryEmbeddingCache::new(
            config.query_cache.capacity,
            Duration::from_secs(config.query_cache.ttl_secs),
        );

        Ok(Self {
            ingest: IngestService::new(
                embeddings.clone(),
                llm.clone(),
                extractor,
                consistency.clone(),
            ),
            search: SearchService::new(
                store.clone(),
                embeddings.clone(),
                llm.clone(),
                query_cache,
            ),
            facts: FactService::new(store.clone(), embeddings.clone(), consistency),
            sweeper: ForgettingSweeper::new(store),
            llm,
            embeddings,
        })
    }
}
