use futures::future::join_all;

use crate::config::EmbeddingsConfig;
use crate::embeddings::api::{default_base_url, ApiConfig, EmbeddingApiClient};
use crate::error::{EngramError, Result};

/// Embedding access for the rest of the crate.
///
/// Wraps the OpenAI-compatible `/embeddings` endpoint and owns the
/// degradation policy: a failed item yields a zero vector instead of
/// aborting the batch, and a failed batch call falls back to per-item calls.
#[derive(Clone)]
pub struct EmbeddingProvider {
    client: EmbeddingApiClient,
    dimensions: usize,
    batch_size: usize,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (provider, model) = match config.model.split_once('/') {
            Some((prefix, rest)) => (prefix, rest),
            None => ("openai", config.model.as_str()),
        };

        let api_config = ApiConfig {
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(provider).to_string()),
            api_key: config.api_key.clone(),
            model: model.to_string(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        };

        Ok(Self {
            client: EmbeddingApiClient::new(api_config)?,
            dimensions: config.dimensions,
            batch_size: config.batch_size,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Zero vector of the configured dimension, used as the failure/empty
    /// guard value.
    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimensions]
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(self.zero_vector());
        }

        let mut embeddings = self.client.embed(&[text]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| EngramError::Embedding("No embedding returned".to_string()))?;
        self.check_dimensions(&embedding)?;
        Ok(embedding)
    }

    /// Stored vectors and query vectors must agree on dimensionality, so a
    /// provider returning the wrong width is an error, not a silent store.
    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(EngramError::Embedding(format!(
                "Expected {} dimensions, provider returned {}",
                self.dimensions,
                embedding.len()
            )));
        }
        Ok(())
    }

    /// Embed many texts, never failing the whole call.
    ///
    /// Tries one batched request per `batch_size` chunk; if a chunk fails,
    /// retries its items individually (fired concurrently), substituting a
    /// zero vector for any item that still fails.
    pub async fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        let mut results = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size.max(1)) {
            match self.client.embed(chunk).await {
                Ok(embeddings)
                    if embeddings.len() == chunk.len()
                        && embeddings.iter().all(|e| self.check_dimensions(e).is_ok()) =>
                {
                    results.extend(embeddings);
                }
                Ok(embeddings) => {
                    tracing::warn!(
                        expected = chunk.len(),
                        got = embeddings.len(),
                        "Embedding batch returned wrong shape, retrying per item"
                    );
                    results.extend(self.embed_items(chunk).await);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Embedding batch call failed, retrying per item");
                    results.extend(self.embed_items(chunk).await);
                }
            }
        }

        results
    }

    async fn embed_items(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        let futures = texts.iter().map(|text| self.embed(text));
        join_all(futures)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, result)| match result {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(item = i, error = %e, "Embedding item failed, using zero vector");
                    self.zero_vector()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> EmbeddingsConfig {
        EmbeddingsConfig {
            model: "openai/text-embedding-3-small".to_string(),
            dimensions: 3,
            batch_size: 2,
            api_key: Some("test-key".to_string()),
            base_url: Some(base_url.to_string()),
            timeout_secs: 5,
            max_retries: 0,
        }
    }

    fn embedding_body(vectors: &[Vec<f32>]) -> serde_json::Value {
        json!({
            "data": vectors
                .iter()
                .map(|v| json!({ "embedding": v }))
                .collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn test_embed_single_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(embedding_body(&[vec![3.0, 0.0, 4.0]])),
            )
            .mount(&server)
            .await;

        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let embedding = provider.embed("User likes tea").await.unwrap();
        // Normalized by the client
        assert!((embedding[0] - 0.6).abs() < 1e-6);
        assert!((embedding[2] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embed_empty_text_returns_zero_vector() {
        let server = MockServer::start().await;
        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let embedding = provider.embed("   ").await.unwrap();
        assert_eq!(embedding, vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_batch_failure_falls_back_to_zero_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let embeddings = provider.embed_batch(&["a", "b", "c"]).await;
        assert_eq!(embeddings.len(), 3);
        for embedding in embeddings {
            assert_eq!(embedding, vec![0.0, 0.0, 0.0]);
        }
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimensionality() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(embedding_body(&[vec![1.0, 0.0]])),
            )
            .mount(&server)
            .await;

        // config expects 3 dimensions, the provider returns 2
        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let err = provider.embed("User likes tea").await.unwrap_err();
        assert!(matches!(err, EngramError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_embed_batch_wrong_dimensionality_falls_back_to_zero_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[
                vec![1.0, 0.0],
                vec![0.0, 1.0],
            ])))
            .mount(&server)
            .await;

        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let embeddings = provider.embed_batch(&["a", "b"]).await;
        assert_eq!(embeddings.len(), 2);
        for embedding in embeddings {
            assert_eq!(embedding, vec![0.0, 0.0, 0.0]);
        }
    }

    #[tokio::test]
    async fn test_embed_batch_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
            ])))
            .mount(&server)
            .await;

        let provider = EmbeddingProvider::new(&config(&server.uri())).unwrap();
        let embeddings = provider.embed_batch(&["a", "b"]).await;
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(embeddings[1], vec![0.0, 1.0, 0.0]);
    }
}
