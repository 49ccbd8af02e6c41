use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::models::{FactCandidate, FactKind};

use super::classify::classify_candidate;
use super::filter::filter_noise;
use super::rules::supplement_candidates;
use super::dedup_candidates;

/// Turns normalized text into a classified, deduplicated, noise-filtered
/// candidate list. LLM extraction failures degrade to the regex rules alone;
/// extraction never surfaces an error to the caller.
pub struct FactExtractor {
    llm: Arc<LlmProvider>,
    default_event_expiry_days: i64,
}

impl FactExtractor {
    pub fn new(llm: Arc<LlmProvider>, default_event_expiry_days: i64) -> Self {
        Self {
            llm,
            default_event_expiry_days,
        }
    }

    pub async fn extract(&self, normalized_text: &str, now: DateTime<Utc>) -> Vec<FactCandidate> {
        let mut candidates = match self.extract_via_llm(normalized_text).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "LLM extraction failed, using regex rules only");
                Vec::new()
            }
        };

        // The supplement always runs; the LLM under-extracts known families.
        let supplements = supplement_candidates(normalized_text, &candidates);
        candidates.extend(supplements);

        for candidate in candidates.iter_mut() {
            classify_candidate(candidate, now, self.default_event_expiry_days);
        }

        filter_noise(dedup_candidates(candidates))
    }

    async fn extract_via_llm(&self, text: &str) -> crate::error::Result<Vec<FactCandidate>> {
        let prompt = prompts::fact_extraction_prompt(text);
        let value = self
            .llm
            .complete_json(&prompt, Some(&CompletionOptions::deterministic()))
            .await?;
        Ok(parse_llm_candidates(&value))
    }
}

/// Parse the extraction response leniently: the value should be an array of
/// objects, but malformed entries are skipped rather than failing the batch.
pub(crate) fn parse_llm_candidates(value: &Value) -> Vec<FactCandidate> {
    let Some(items) = value.as_array() else {
        tracing::warn!("Extraction response was not a JSON array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let content = item.get("content")?.as_str()?.trim();
            if content.is_empty() {
                return None;
            }
            let mut candidate = FactCandidate::new(content);
            if let Some(kind) = item.get("kind").and_then(Value::as_str) {
                candidate.kind = kind.parse().unwrap_or(FactKind::Fact);
            }
            if let Some(permanent) = item.get("is_permanent").and_then(Value::as_bool) {
                candidate.is_core = permanent;
            }
            if let Some(confidence) = item.get("confidence").and_then(Value::as_f64) {
                candidate.confidence = confidence.clamp(0.0, 1.0);
            }
            if let Some(entities) = item.get("entities").and_then(Value::as_array) {
                candidate.entities = entities
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
            Some(candidate)
        })
        .collect()
}
