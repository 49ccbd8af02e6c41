use std::sync::Arc;
use std::time::Instant;

use crate::embeddings::{EmbeddingProvider, QueryEmbeddingCache};
use crate::error::{EngramError, Result};
use crate::llm::{prompts, LlmProvider};
use crate::models::{SearchFactsRequest, SearchFactsResponse};
use crate::ranking::{apply_filters, RankingEngine, RankingOptions};
use crate::store::FactStore;

const DEFAULT_LIMIT: u32 = 10;
const DEFAULT_THRESHOLD: f32 = 0.3;
/// Fetch more than the requested limit so dedup and filters have slack.
const CANDIDATE_FETCH_FLOOR: u32 = 50;

pub struct SearchService {
    store: Arc<dyn FactStore>,
    embeddings: Arc<EmbeddingProvider>,
    llm: Arc<LlmProvider>,
    query_cache: QueryEmbeddingCache,
    ranking: RankingEngine,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn FactStore>,
        embeddings: Arc<EmbeddingProvider>,
        llm: Arc<LlmProvider>,
        query_cache: QueryEmbeddingCache,
    ) -> Self {
        let ranking = RankingEngine::new(llm.clone());
        Self {
            store,
            embeddings,
            llm,
            query_cache,
            ranking,
        }
    }

    pub async fn search(
        &self,
        owner_id: &str,
        request: SearchFactsRequest,
    ) -> Result<SearchFactsResponse> {
        let started = Instant::now();
        if request.q.trim().is_empty() {
            return Err(EngramError::Validation("Query must not be empty".into()));
        }

        let limit = request.limit.unwrap_or(DEFAULT_LIMIT).max(1);
        let threshold = request.threshold.unwrap_or(DEFAULT_THRESHOLD);

        let expanded_query = if request.expand_query.unwrap_or(false) {
            self.expand_query(&request.q).await
        } else {
            None
        };
        let query_text = expanded_query.as_deref().unwrap_or(&request.q);

        let embedding = self.query_embedding(query_text).await?;

        let hits = self
            .store
            .search_similar_facts(
                owner_id,
                &embedding,
                limit.max(CANDIDATE_FETCH_FLOOR),
                threshold,
                request.tag.as_deref(),
                false,
            )
            .await?;

        let mut results = self
            .ranking
            .rank(
                &request.q,
                hits,
                RankingOptions {
                    include_history: request.include_history.unwrap_or(false),
                    rerank: request.rerank.unwrap_or(false) && self.rerank_enabled(),
                    limit: limit as usize,
                },
            )
            .await;

        if let Some(filters) = &request.filters {
            results = apply_filters(results, filters);
        }

        let timing = started.elapsed().as_millis() as u64;
        tracing::debug!(
            owner_id,
            query = %request.q,
            results = results.len(),
            timing_ms = timing,
            "Search complete"
        );

        Ok(SearchFactsResponse {
            total: results.len() as u32,
            results,
            timing,
            expanded_query,
        })
    }

    /// Reranking is opt-in per request and must also be enabled in config,
    /// mirroring the query-expansion toggle.
    fn rerank_enabled(&self) -> bool {
        self.llm.config().is_some_and(|c| c.enable_rerank)
    }

    /// Query embeddings go through the process-local TTL cache; a miss embeds
    /// and populates it.
    async fn query_embedding(&self, query: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.query_cache.get(query) {
            tracing::debug!("Query embedding cache hit");
            return Ok(cached);
        }
        let embedding = self.embeddings.embed(query).await?;
        self.query_cache.put(query, embedding.clone());
        Ok(embedding)
    }

    /// Optional LLM query expansion. Failure falls back to the original query.
    async fn expand_query(&self, query: &str) -> Option<String> {
        let config = self.llm.config()?;
        if !config.enable_query_expansion || !self.llm.is_available() {
            return None;
        }

        match self
            .llm
            .complete(&prompts::query_expansion_prompt(query), None)
            .await
        {
            Ok(expanded) => {
                let expanded = expanded.trim();
                if expanded.is_empty() {
                    None
                } else {
                    Some(expanded.to_string())
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query expansion failed, using original query");
                None
            }
        }
    }
}
