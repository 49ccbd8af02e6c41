use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::extract::normalize_content;
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::{FactSearchHit, FactSearchResult};

/// How many of the top-ranked results are offered to the LLM reranker.
const RERANK_WINDOW: usize = 20;
/// Dedup window over the normalized content prefix.
const DEDUP_PREFIX_GRAPHEMES: usize = 100;

const SUPERSEDED_MULTIPLIER: f32 = 0.3;
const LATEST_MULTIPLIER: f32 = 1.3;
const RERANK_ORIGINAL_WEIGHT: f32 = 0.4;
const RERANK_SCORE_WEIGHT: f32 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub include_history: bool,
    pub rerank: bool,
    pub limit: usize,
}

/// Orders vector-search hits for presentation: status and recency
/// adjustment, prefix dedup, optional LLM rerank, truncation.
pub struct RankingEngine {
    llm: Arc<LlmProvider>,
}

impl RankingEngine {
    pub fn new(llm: Arc<LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn rank(
        &self,
        query: &str,
        hits: Vec<FactSearchHit>,
        options: RankingOptions,
    ) -> Vec<FactSearchResult> {
        let now = Utc::now();
        let mut results: Vec<FactSearchResult> = hits
            .into_iter()
            .filter(|hit| !hit.fact.is_forgotten)
            .filter(|hit| options.include_history || hit.fact.is_latest)
            .map(|hit| {
                let status = if !hit.fact.is_latest {
                    SUPERSEDED_MULTIPLIER
                } else {
                    LATEST_MULTIPLIER
                };
                let age_days = (now - hit.fact.updated_at.max(hit.fact.created_at)).num_days();
                let score =
                    (hit.similarity * status * recency_multiplier(age_days)).clamp(0.0, 1.0);

                FactSearchResult {
                    id: hit.fact.id,
                    content: hit.fact.content,
                    kind: hit.fact.kind,
                    is_core: hit.fact.is_core,
                    is_latest: hit.fact.is_latest,
                    version: hit.fact.version,
                    tags: hit.fact.tags,
                    similarity: hit.similarity,
                    score,
                    rerank_score: None,
                    metadata: hit.fact.metadata,
                    updated_at: hit.fact.updated_at,
                }
            })
            .collect();

        results = dedup_by_prefix(results);
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        if options.rerank && !results.is_empty() {
            self.rerank_top(query, &mut results).await;
            results.sort_by(|a, b| b.score.total_cmp(&a.score));
        }

        results.truncate(options.limit);
        results
    }

    /// Rerank the head of the list via an LLM relevance call, blending the
    /// returned scores with the originals. Any failure falls back to a
    /// keyword-overlap boost; ranking never errors.
    async fn rerank_top(&self, query: &str, results: &mut [FactSearchResult]) {
        let window = results.len().min(RERANK_WINDOW);
        let head = &mut results[..window];

        let scores = match self.llm_rerank_scores(query, head).await {
            Some(scores) => scores,
            None => {
                tracing::debug!("Rerank unavailable, using keyword-overlap fallback");
                head.iter()
                    .map(|r| keyword_overlap(query, &r.content))
                    .collect()
            }
        };

        for (result, rerank) in head.iter_mut().zip(scores) {
            result.rerank_score = Some(rerank);
            result.score = (RERANK_ORIGINAL_WEIGHT * result.score
                + RERANK_SCORE_WEIGHT * rerank)
                .clamp(0.0, 1.0);
        }
    }

    async fn llm_rerank_scores(&self, query: &str, head: &[FactSearchResult]) -> Option<Vec<f32>> {
        if !self.llm.is_available() {
            return None;
        }
        let contents: Vec<&str> = head.iter().map(|r| r.content.as_str()).collect();
        let prompt = prompts::rerank_prompt(query, &contents);

        // small numeric output, so cap it alongside the zero temperature
        let options = CompletionOptions {
            max_tokens: Some(256),
            ..CompletionOptions::deterministic()
        };
        let value = match self.llm.complete_json(&prompt, Some(&options)).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Rerank call failed");
                return None;
            }
        };
        let scores: Vec<f32> = value
            .as_array()?
            .iter()
            .filter_map(Value::as_f64)
            .map(|s| s.clamp(0.0, 1.0) as f32)
            .collect();
        if scores.len() != head.len() {
            tracing::warn!(
                expected = head.len(),
                got = scores.len(),
                "Rerank returned wrong score count"
            );
            return None;
        }
        Some(scores)
    }
}

/// `1 + 0.5 × (1 − min(ageDays, 365)/365)`: fresh facts approach 1.5x, facts
/// a year or more old get no boost.
fn recency_multiplier(age_days: i64) -> f32 {
    let age = age_days.max(0).min(365) as f32;
    1.0 + 0.5 * (1.0 - age / 365.0)
}

/// Collapse results whose normalized content shares its first 100 graphemes.
/// First occurrence wins; callers sort afterwards.
fn dedup_by_prefix(results: Vec<FactSearchResult>) -> Vec<FactSearchResult> {
    let mut seen: Vec<String> = Vec::new();
    results
        .into_iter()
        .filter(|r| {
            let normalized = normalize_content(&r.content);
            let prefix: String = normalized
                .graphemes(true)
                .take(DEDUP_PREFIX_GRAPHEMES)
                .collect();
            if seen.contains(&prefix) {
                false
            } else {
                seen.push(prefix);
                true
            }
        })
        .collect()
}

/// Share of the query's substantive terms that appear in the content.
fn keyword_overlap(query: &str, content: &str) -> f32 {
    let query_terms: Vec<String> = normalize_content(query)
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect();
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_normalized = normalize_content(content);
    let content_terms: Vec<&str> = content_normalized.split_whitespace().collect();
    let matched = query_terms
        .iter()
        .filter(|t| content_terms.contains(&t.as_str()))
        .count();
    matched as f32 / query_terms.len() as f32
}
