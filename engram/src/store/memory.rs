use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{EngramError, Result};
use crate::models::{FactKind, FactSearchHit, MemoryFact};
use crate::store::FactStore;

/// In-process reference backend: a `RwLock`-guarded map with brute-force
/// cosine search. Suitable for tests and single-node deployments; anything
/// larger should plug a real vector store into [`FactStore`].
#[derive(Default)]
pub struct InMemoryBackend {
    facts: RwLock<HashMap<String, MemoryFact>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl FactStore for InMemoryBackend {
    async fn create_fact(&self, fact: &MemoryFact) -> Result<()> {
        let mut facts = self.facts.write().await;
        facts.insert(fact.id.clone(), fact.clone());
        Ok(())
    }

    async fn get_fact_by_id(&self, id: &str) -> Result<Option<MemoryFact>> {
        let facts = self.facts.read().await;
        Ok(facts.get(id).cloned())
    }

    async fn get_facts_by_ids(&self, ids: &[String]) -> Result<Vec<MemoryFact>> {
        let facts = self.facts.read().await;
        Ok(ids.iter().filter_map(|id| facts.get(id).cloned()).collect())
    }

    async fn update_fact(&self, fact: &MemoryFact) -> Result<()> {
        let mut facts = self.facts.write().await;
        if !facts.contains_key(&fact.id) {
            return Err(EngramError::NotFound(format!("fact {}", fact.id)));
        }
        let mut updated = fact.clone();
        updated.updated_at = Utc::now();
        facts.insert(fact.id.clone(), updated);
        Ok(())
    }

    async fn mark_fact_not_latest(&self, id: &str) -> Result<()> {
        let mut facts = self.facts.write().await;
        let fact = facts
            .get_mut(id)
            .ok_or_else(|| EngramError::NotFound(format!("fact {id}")))?;
        fact.is_latest = false;
        fact.updated_at = Utc::now();
        Ok(())
    }

    async fn forget_fact(&self, id: &str, reason: Option<&str>) -> Result<()> {
        let mut facts = self.facts.write().await;
        let fact = facts
            .get_mut(id)
            .ok_or_else(|| EngramError::NotFound(format!("fact {id}")))?;
        fact.is_forgotten = true;
        fact.forget_reason = reason.map(String::from);
        fact.updated_at = Utc::now();
        Ok(())
    }

    async fn restore_fact(&self, id: &str) -> Result<()> {
        let mut facts = self.facts.write().await;
        let fact = facts
            .get_mut(id)
            .ok_or_else(|| EngramError::NotFound(format!("fact {id}")))?;
        // Restoring clears the forgotten flag only; a superseded fact stays
        // superseded.
        fact.is_forgotten = false;
        fact.forget_reason = None;
        fact.updated_at = Utc::now();
        Ok(())
    }

    async fn set_fact_core(&self, id: &str, is_core: bool) -> Result<()> {
        let mut facts = self.facts.write().await;
        let fact = facts
            .get_mut(id)
            .ok_or_else(|| EngramError::NotFound(format!("fact {id}")))?;
        fact.is_core = is_core;
        fact.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_fact(&self, id: &str) -> Result<bool> {
        let mut facts = self.facts.write().await;
        Ok(facts.remove(id).is_some())
    }

    async fn list_facts_by_owner(&self, owner_id: &str, limit: usize) -> Result<Vec<MemoryFact>> {
        let facts = self.facts.read().await;
        let mut owned: Vec<MemoryFact> = facts
            .values()
            .filter(|f| f.owner_id == owner_id && !f.is_forgotten)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn list_facts_by_kind(
        &self,
        owner_id: &str,
        kind: FactKind,
        limit: usize,
    ) -> Result<Vec<MemoryFact>> {
        let facts = self.facts.read().await;
        let mut owned: Vec<MemoryFact> = facts
            .values()
            .filter(|f| f.owner_id == owner_id && f.kind == kind && !f.is_forgotten)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn list_facts_by_tag(
        &self,
        owner_id: &str,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<MemoryFact>> {
        let facts = self.facts.read().await;
        let mut owned: Vec<MemoryFact> = facts
            .values()
            .filter(|f| {
                f.owner_id == owner_id && !f.is_forgotten && f.tags.iter().any(|t| t == tag)
            })
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn get_expiry_candidates(&self, before: DateTime<Utc>) -> Result<Vec<MemoryFact>> {
        let facts = self.facts.read().await;
        Ok(facts
            .values()
            .filter(|f| !f.is_forgotten && f.expires_at.map(|e| e < before).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn update_fact_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        let mut facts = self.facts.write().await;
        let fact = facts
            .get_mut(id)
            .ok_or_else(|| EngramError::NotFound(format!("fact {id}")))?;
        fact.embedding = embedding.to_vec();
        Ok(())
    }

    async fn search_similar_facts(
        &self,
        owner_id: &str,
        embedding: &[f32],
        limit: u32,
        threshold: f32,
        tag: Option<&str>,
        include_forgotten: bool,
    ) -> Result<Vec<FactSearchHit>> {
        let facts = self.facts.read().await;
        let mut hits: Vec<FactSearchHit> = facts
            .values()
            .filter(|f| f.owner_id == owner_id)
            .filter(|f| include_forgotten || !f.is_forgotten)
            .filter(|f| tag.map(|t| f.tags.iter().any(|ft| ft == t)).unwrap_or(true))
            .filter_map(|f| {
                let similarity = cosine_similarity(embedding, &f.embedding);
                (similarity >= threshold).then(|| FactSearchHit {
                    fact: f.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit as usize);
        Ok(hits)
    }
}
