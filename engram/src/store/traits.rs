use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{FactKind, FactSearchHit, MemoryFact};

/// CRUD, indexed-query, and vector-search operations for memory facts.
///
/// The persistent store and vector index live behind this trait; production
/// deployments plug in their own backend, while [`crate::store::InMemoryBackend`]
/// provides the in-process reference implementation.
#[async_trait]
pub trait FactStore: Send + Sync {
    async fn create_fact(&self, fact: &MemoryFact) -> Result<()>;
    async fn get_fact_by_id(&self, id: &str) -> Result<Option<MemoryFact>>;
    async fn get_facts_by_ids(&self, ids: &[String]) -> Result<Vec<MemoryFact>>;
    async fn update_fact(&self, fact: &MemoryFact) -> Result<()>;

    /// Flip a fact's `is_latest` flag to false. The flag never transitions
    /// back; superseded facts stay superseded.
    async fn mark_fact_not_latest(&self, id: &str) -> Result<()>;

    async fn forget_fact(&self, id: &str, reason: Option<&str>) -> Result<()>;
    async fn restore_fact(&self, id: &str) -> Result<()>;
    async fn set_fact_core(&self, id: &str, is_core: bool) -> Result<()>;

    /// Hard delete. Returns false when the id was not present.
    async fn delete_fact(&self, id: &str) -> Result<bool>;

    /// The owner's non-forgotten facts, most recently updated first.
    /// Backs the bounded lexical contradiction scan.
    async fn list_facts_by_owner(&self, owner_id: &str, limit: usize) -> Result<Vec<MemoryFact>>;
    async fn list_facts_by_kind(
        &self,
        owner_id: &str,
        kind: FactKind,
        limit: usize,
    ) -> Result<Vec<MemoryFact>>;
    async fn list_facts_by_tag(
        &self,
        owner_id: &str,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<MemoryFact>>;

    /// Non-forgotten facts whose `expires_at` is before the given instant.
    async fn get_expiry_candidates(&self, before: DateTime<Utc>) -> Result<Vec<MemoryFact>>;

    async fn update_fact_embedding(&self, id: &str, embedding: &[f32]) -> Result<()>;

    /// Approximate-nearest-neighbor search with an equality pre-filter on
    /// owner and (optionally) a tag.
    async fn search_similar_facts(
        &self,
        owner_id: &str,
        embedding: &[f32],
        limit: u32,
        threshold: f32,
        tag: Option<&str>,
        include_forgotten: bool,
    ) -> Result<Vec<FactSearchHit>>;
}
