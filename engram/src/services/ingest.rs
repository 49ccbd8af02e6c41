use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::consistency::{ConsistencyManager, Reconciliation};
use crate::embeddings::EmbeddingProvider;
use crate::error::{EngramError, Result};
use crate::extract::FactExtractor;
use crate::llm::{prompts, LlmProvider};
use crate::models::{IngestBatchRequest, IngestRequest, IngestResponse, MemoryFact};
use crate::normalize::normalize_text;

use super::facts::new_fact_id;

const FALLBACK_TITLE_LEN: usize = 80;
const FALLBACK_SUMMARY_LEN: usize = 200;

/// The full ingestion pipeline: normalize, extract, classify, embed,
/// reconcile, and annotate with a title and summary.
pub struct IngestService {
    embeddings: Arc<EmbeddingProvider>,
    llm: Arc<LlmProvider>,
    extractor: FactExtractor,
    consistency: Arc<ConsistencyManager>,
}

impl IngestService {
    pub fn new(
        embeddings: Arc<EmbeddingProvider>,
        llm: Arc<LlmProvider>,
        extractor: FactExtractor,
        consistency: Arc<ConsistencyManager>,
    ) -> Self {
        Self {
            embeddings,
            llm,
            extractor,
            consistency,
        }
    }

    pub async fn extract_and_save(
        &self,
        owner_id: &str,
        request: IngestRequest,
    ) -> Result<IngestResponse> {
        request
            .validate()
            .map_err(|e| EngramError::Validation(e.to_string()))?;

        let now = Utc::now();
        let normalized = normalize_text(&request.text, now);
        let mut candidates = self.extractor.extract(&normalized, now).await;

        if let Some(force) = request.force_is_core {
            for candidate in candidates.iter_mut() {
                candidate.is_core = force;
            }
        }

        let contents: Vec<&str> = candidates.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embeddings.embed_batch(&contents).await;

        let mut saved = Vec::new();
        for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
            let mut fact =
                MemoryFact::new(new_fact_id(), owner_id.to_string(), candidate.content);
            fact.is_core = candidate.is_core;
            fact.kind = candidate.kind;
            fact.confidence = Some(candidate.confidence);
            fact.expires_at = candidate.expires_at;
            fact.tags = request.tags.clone();
            fact.source_doc_id = request.source_doc_id.clone();
            fact.embedding = embedding;

            match self.consistency.reconcile_and_save(fact).await? {
                Reconciliation::Duplicate { existing_id } => {
                    tracing::debug!(existing_id = %existing_id, "Skipped duplicate fact");
                }
                Reconciliation::Created { fact } => {
                    self.consistency.semantic_sweep(&fact).await?;
                    saved.push(fact);
                }
            }
        }

        let (title, summary) = self.title_and_summary(&request.text).await;
        tracing::info!(
            owner_id,
            facts = saved.len(),
            "Ingestion complete"
        );

        Ok(IngestResponse {
            facts: saved,
            title,
            summary,
        })
    }

    /// Batch ingestion. The item cap and every item's own limits are
    /// validated up front, so an oversized batch never writes anything.
    pub async fn extract_and_save_batch(
        &self,
        owner_id: &str,
        batch: IngestBatchRequest,
    ) -> Result<Vec<IngestResponse>> {
        batch
            .validate()
            .map_err(|e| EngramError::Validation(e.to_string()))?;

        let mut responses = Vec::with_capacity(batch.items.len());
        for item in batch.items {
            responses.push(self.extract_and_save(owner_id, item).await?);
        }
        Ok(responses)
    }

    /// Title/summary via the LLM, with a deterministic truncation fallback.
    async fn title_and_summary(&self, text: &str) -> (String, String) {
        if self.llm.is_available() {
            let prompt = prompts::title_summary_prompt(text);
            match self.llm.complete_json(&prompt, None).await {
                Ok(value) => {
                    let title = value.get("title").and_then(|v| v.as_str());
                    let summary = value.get("summary").and_then(|v| v.as_str());
                    if let (Some(title), Some(summary)) = (title, summary) {
                        return (title.to_string(), summary.to_string());
                    }
                    tracing::warn!("Title/summary response missing fields, using fallback");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Title/summary call failed, using fallback");
                }
            }
        }
        fallback_title_summary(text)
    }
}

/// First sentence (truncated) as the title, leading text as the summary.
fn fallback_title_summary(text: &str) -> (String, String) {
    let trimmed = text.trim();
    let first_sentence = trimmed
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(trimmed)
        .trim_end_matches(['.', '!', '?'])
        .trim();

    (
        truncate_chars(first_sentence, FALLBACK_TITLE_LEN),
        truncate_chars(trimmed, FALLBACK_SUMMARY_LEN),
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
