use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub embeddings: EmbeddingsConfig,
    pub memory: MemoryConfig,
    pub query_cache: QueryCacheConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Knobs for the write-path consistency checks and the forgetting sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// How many of the owner's most recent facts the lexical contradiction
    /// scan inspects per write.
    pub contradiction_scan_window: usize,
    /// Cosine similarity floor for the embedding-based contradiction pass.
    pub semantic_contradiction_threshold: f32,
    /// Expiry applied to event facts that carry no explicit time.
    pub default_event_expiry_days: i64,
    pub forgetting_check_interval_secs: u64,
}

/// Process-local query embedding cache. Advisory only: a miss is always safe
/// to recompute.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryCacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    // Enable LLM rerank of the top search results (opt-in)
    pub enable_rerank: bool,
    // Enable query expansion before embedding (opt-in)
    pub enable_query_expansion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "openai/text-embedding-3-small".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 1536),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 64),
                api_key: env::var("EMBEDDING_API_KEY").ok(),
                base_url: env::var("EMBEDDING_BASE_URL").ok(),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", 30),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", 3),
            },
            memory: MemoryConfig {
                contradiction_scan_window: parse_env_or("CONTRADICTION_SCAN_WINDOW", 200),
                semantic_contradiction_threshold: parse_env_or(
                    "SEMANTIC_CONTRADICTION_THRESHOLD",
                    0.85,
                ),
                default_event_expiry_days: parse_env_or("DEFAULT_EVENT_EXPIRY_DAYS", 7),
                forgetting_check_interval_secs: parse_env_or("FORGETTING_CHECK_INTERVAL", 3600),
            },
            query_cache: QueryCacheConfig {
                capacity: parse_env_or("QUERY_CACHE_CAPACITY", 500),
                ttl_secs: parse_env_or("QUERY_CACHE_TTL_SECS", 300),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
                enable_rerank: parse_env_or("ENABLE_RERANK", false),
                enable_query_expansion: parse_env_or("ENABLE_QUERY_EXPANSION", false),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into a (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
