mod api;
mod cache;
mod provider;

pub use api::{default_base_url, ApiConfig, EmbeddingApiClient};
pub use cache::QueryEmbeddingCache;
pub use provider::EmbeddingProvider;
