use std::sync::Arc;

use nanoid::nanoid;
use validator::Validate;

use crate::consistency::{ConsistencyManager, Reconciliation};
use crate::embeddings::EmbeddingProvider;
use crate::error::{EngramError, Result};
use crate::models::{CreateFactRequest, MemoryFact};
use crate::store::FactStore;

pub fn new_fact_id() -> String {
    format!("fact_{}", nanoid!(12))
}

/// Direct fact lifecycle operations, bypassing extraction. Callers bring
/// finished content; the service still embeds and reconciles it.
pub struct FactService {
    store: Arc<dyn FactStore>,
    embeddings: Arc<EmbeddingProvider>,
    consistency: Arc<ConsistencyManager>,
}

impl FactService {
    pub fn new(
        store: Arc<dyn FactStore>,
        embeddings: Arc<EmbeddingProvider>,
        consistency: Arc<ConsistencyManager>,
    ) -> Self {
        Self {
            store,
            embeddings,
            consistency,
        }
    }

    pub async fn get(&self, id: &str) -> Result<MemoryFact> {
        self.store
            .get_fact_by_id(id)
            .await?
            .ok_or_else(|| EngramError::NotFound(format!("Fact not found: {id}")))
    }

    /// Create a fact directly. The content still goes through the lexical
    /// consistency path, so duplicates collapse and contradictions chain.
    pub async fn create(&self, owner_id: &str, request: CreateFactRequest) -> Result<MemoryFact> {
        request
            .validate()
            .map_err(|e| EngramError::Validation(e.to_string()))?;

        let mut fact = MemoryFact::new(new_fact_id(), owner_id.to_string(), request.content);
        if let Some(is_core) = request.is_core {
            fact.is_core = is_core;
        }
        if let Some(kind) = request.kind {
            fact.kind = kind;
        }
        fact.tags = request.tags;
        fact.expires_at = request.expires_at;
        if let Some(metadata) = request.metadata {
            fact.metadata = metadata;
        }
        fact.embedding = self.embeddings.embed(&fact.content).await?;

        match self.consistency.reconcile_and_save(fact).await? {
            Reconciliation::Duplicate { existing_id } => self.get(&existing_id).await,
            Reconciliation::Created { fact } => {
                self.consistency.semantic_sweep(&fact).await?;
                Ok(fact)
            }
        }
    }

    /// Replace a fact's content with a new version on its chain. The old row
    /// keeps its content and drops `is_latest`; the new row points back at it.
    pub async fn update(&self, id: &str, content: &str) -> Result<MemoryFact> {
        if content.trim().is_empty() {
            return Err(EngramError::Validation("Content must not be empty".into()));
        }
        let old = self.get(id).await?;

        let mut new_fact = MemoryFact::new(new_fact_id(), old.owner_id.clone(), content.to_string());
        new_fact.is_core = old.is_core;
        new_fact.kind = old.kind;
        new_fact.tags = old.tags.clone();
        new_fact.metadata = old.metadata.clone();
        new_fact.source_doc_id = old.source_doc_id.clone();
        new_fact.version = old.version + 1;
        new_fact.previous_version = Some(old.id.clone());
        new_fact.embedding = self.embeddings.embed(content).await?;

        self.store.mark_fact_not_latest(&old.id).await?;
        self.store.create_fact(&new_fact).await?;
        Ok(new_fact)
    }

    pub async fn forget(&self, id: &str, reason: Option<&str>) -> Result<()> {
        self.get(id).await?;
        self.store.forget_fact(id, reason).await
    }

    /// Clears the forgotten flag. A superseded fact stays superseded; restore
    /// never resurrects `is_latest`.
    pub async fn restore(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.store.restore_fact(id).await
    }

    pub async fn promote(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.store.set_fact_core(id, true).await
    }

    pub async fn demote(&self, id: &str) -> Result<()> {
        self.get(id).await?;
        self.store.set_fact_core(id, false).await
    }

    /// Hard delete. The only way a fact leaves the store.
    pub async fn purge(&self, id: &str) -> Result<()> {
        let deleted = self.store.delete_fact(id).await?;
        if !deleted {
            return Err(EngramError::NotFound(format!("Fact not found: {id}")));
        }
        tracing::info!(fact_id = id, "Fact purged");
        Ok(())
    }

    pub async fn history(&self, id: &str) -> Result<Vec<MemoryFact>> {
        let mut chain = vec![self.get(id).await?];
        while let Some(previous_id) = chain
            .last()
            .and_then(|f| f.previous_version.clone())
        {
            match self.store.get_fact_by_id(&previous_id).await? {
                Some(previous) => chain.push(previous),
                None => break,
            }
        }
        Ok(chain)
    }
}
