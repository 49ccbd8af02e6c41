use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FactKind, Metadata};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchFactsRequest {
    pub q: String,
    pub tag: Option<String>,
    pub threshold: Option<f32>,
    pub filters: Option<SearchFilters>,
    pub limit: Option<u32>,
    pub rerank: Option<bool>,
    #[serde(rename = "expandQuery")]
    pub expand_query: Option<bool>,
    /// Include superseded fact versions in the results.
    ///
    /// JSON name: `includeHistory`. When omitted or false, only facts with
    /// `is_latest = true` are returned. Treat `None` as `false`.
    #[serde(default)]
    #[serde(rename = "includeHistory")]
    pub include_history: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(rename = "AND")]
    pub and: Option<Vec<FilterCondition>>,
    #[serde(rename = "OR")]
    pub or: Option<Vec<FilterCondition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCondition {
    pub key: String,
    pub value: serde_json::Value,
    pub negate: Option<bool>,
    pub filter_type: Option<String>,
    pub numeric_operator: Option<String>,
    pub case_insensitive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFactsResponse {
    pub results: Vec<FactSearchResult>,
    pub total: u32,
    pub timing: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSearchResult {
    pub id: String,
    pub content: String,
    pub kind: FactKind,
    #[serde(rename = "isCore")]
    pub is_core: bool,
    #[serde(rename = "isLatest")]
    pub is_latest: bool,
    pub version: i32,
    pub tags: Vec<String>,
    pub similarity: f32,
    /// Score after status/recency adjustment and optional rerank blending.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "rerankScore")]
    pub rerank_score: Option<f32>,
    pub metadata: Metadata,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Raw hit returned by the store's vector search, before ranking.
#[derive(Debug, Clone)]
pub struct FactSearchHit {
    pub fact: crate::models::MemoryFact,
    pub similarity: f32,
}
