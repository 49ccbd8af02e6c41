use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{FactKind, Metadata};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFact {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    /// Permanence class: true = static/biographical, false = contextual.
    pub is_core: bool,
    pub kind: FactKind,
    /// True while this fact is the current value for its slot; flipped to
    /// false exactly once, when superseded.
    pub is_latest: bool,
    pub is_forgotten: bool,
    pub forget_reason: Option<String>,
    pub version: i32,
    /// Previous node in the version chain, oldest to newest.
    pub previous_version: Option<String>,
    /// Scoping labels partitioning dedup/contradiction; empty = global scope.
    pub tags: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub confidence: Option<f64>,
    pub source_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryFact {
    pub fn new(id: String, owner_id: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            content,
            is_core: false,
            kind: FactKind::default(),
            is_latest: true,
            is_forgotten: false,
            forget_reason: None,
            version: 1,
            previous_version: None,
            tags: Vec::new(),
            expires_at: None,
            confidence: None,
            source_doc_id: None,
            embedding: Vec::new(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Two facts share a dedup/contradiction scope when their tag sets
    /// overlap, or both are untagged (global scope).
    pub fn shares_scope_with(&self, other: &MemoryFact) -> bool {
        if self.tags.is_empty() && other.tags.is_empty() {
            return true;
        }
        self.tags.iter().any(|t| other.tags.contains(t))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFactRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub is_core: Option<bool>,
    pub kind: Option<FactKind>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    /// When set, overrides the classifier's permanence decision for every
    /// extracted fact.
    pub force_is_core: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source_doc_id: Option<String>,
}

/// A batch of ingestion items, capped before any store mutation happens.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestBatchRequest {
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<IngestRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub facts: Vec<MemoryFact>,
    pub title: String,
    pub summary: String,
}

/// A candidate fact produced by extraction, before classification and
/// consistency checks.
#[derive(Debug, Clone, PartialEq)]
pub struct FactCandidate {
    pub content: String,
    pub is_core: bool,
    pub kind: FactKind,
    pub confidence: f64,
    /// Named entities mentioned by the candidate, when extraction spotted any.
    pub entities: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl FactCandidate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_core: false,
            kind: FactKind::Fact,
            confidence: 0.8,
            entities: Vec::new(),
            expires_at: None,
        }
    }
}
