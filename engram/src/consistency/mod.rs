//! Write-time dedup and contradiction handling, driving the version chain.
//!
//! Two independent paths: a lexical scan over a bounded window of the owner's
//! recent facts, and a post-save embedding sweep. Neither replaces the other.

mod property;
mod semantic;

pub use property::{contradicts, numeric_token, property_key};
pub use semantic::{extract_signature, signatures_match, Attribute, Signature};

use std::sync::Arc;

use crate::error::Result;
use crate::extract::normalize_content;
use crate::models::MemoryFact;
use crate::store::FactStore;

/// Outcome of reconciling a new fact against the owner's existing facts.
#[derive(Debug)]
pub enum Reconciliation {
    /// The content already exists within scope; no new row was written.
    Duplicate { existing_id: String },
    /// The fact was written, possibly superseding an older version.
    Created { fact: MemoryFact },
}

pub struct ConsistencyManager {
    store: Arc<dyn FactStore>,
    scan_window: usize,
    semantic_threshold: f32,
}

impl ConsistencyManager {
    pub fn new(store: Arc<dyn FactStore>, scan_window: usize, semantic_threshold: f32) -> Self {
        Self {
            store,
            scan_window,
            semantic_threshold,
        }
    }

    /// Lexical write path: scan the owner's recent facts within tag scope for
    /// an exact duplicate or a contradicted property, then persist. At most
    /// one contradiction is acted on per call.
    pub async fn reconcile_and_save(&self, mut fact: MemoryFact) -> Result<Reconciliation> {
        let recent = self
            .store
            .list_facts_by_owner(&fact.owner_id, self.scan_window)
            .await?;
        let normalized = normalize_content(&fact.content);

        for existing in recent.iter().filter(|e| fact.shares_scope_with(e)) {
            if normalize_content(&existing.content) == normalized {
                tracing::debug!(
                    existing_id = %existing.id,
                    "Duplicate content within scope, skipping write"
                );
                return Ok(Reconciliation::Duplicate {
                    existing_id: existing.id.clone(),
                });
            }
        }

        let contradicted = recent
            .iter()
            .filter(|e| e.is_latest && fact.shares_scope_with(e))
            .find(|e| contradicts(&fact.content, &e.content));

        if let Some(old) = contradicted {
            tracing::info!(
                superseded_id = %old.id,
                version = old.version + 1,
                "Contradiction detected, superseding previous version"
            );
            self.store.mark_fact_not_latest(&old.id).await?;
            fact.version = old.version + 1;
            fact.previous_version = Some(old.id.clone());
        }

        self.store.create_fact(&fact).await?;
        Ok(Reconciliation::Created { fact })
    }

    /// Semantic path, called after the fact is saved with its embedding.
    /// Returns the ids of facts superseded by the sweep.
    pub async fn semantic_sweep(&self, fact: &MemoryFact) -> Result<Vec<String>> {
        if fact.embedding.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .store
            .search_similar_facts(
                &fact.owner_id,
                &fact.embedding,
                20,
                self.semantic_threshold,
                None,
                false,
            )
            .await?;

        let mut superseded = Vec::new();
        for hit in hits {
            let candidate = hit.fact;
            if candidate.id == fact.id || !candidate.is_latest {
                continue;
            }
            if !fact.shares_scope_with(&candidate) {
                continue;
            }
            if normalize_content(&candidate.content) == normalize_content(&fact.content) {
                continue;
            }
            if signatures_match(&fact.content, &candidate.content) {
                tracing::info!(
                    superseded_id = %candidate.id,
                    similarity = hit.similarity,
                    "Semantic sweep superseding earlier fact"
                );
                self.store.mark_fact_not_latest(&candidate.id).await?;
                superseded.push(candidate.id);
            }
        }
        Ok(superseded)
    }
}
