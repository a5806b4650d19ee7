//! Embedder backed by the internal sentence-embedding HTTP service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::matching::traits::{MatchError, QueryEmbedder, Result};
use crate::domain::matching::types::Vector;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f64>,
}

/// Calls `POST {base_url}/embed` with `{"text": ...}` and reads `{"embedding": [...]}`.
///
/// No retries: a failed call surfaces as [`MatchError::EmbeddingUnavailable`]
/// and the caller decides whether to try again.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MatchError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embed", base_url.trim_end_matches('/')),
            model: model.into(),
            dimensions,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(MatchError::EmbeddingUnavailable(
                "cannot embed empty text".into(),
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "Embedding request failed");
                MatchError::EmbeddingUnavailable(e.to_string())
            })?;

        let body: EmbedResponse = response.json().await.map_err(|e| {
            warn!(endpoint = %self.endpoint, error = %e, "Invalid embedding response");
            MatchError::EmbeddingUnavailable(format!("invalid response: {e}"))
        })?;

        if body.embedding.is_empty() {
            return Err(MatchError::EmbeddingUnavailable(
                "service returned an empty embedding".into(),
            ));
        }

        Ok(Vector::new(body.embedding))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(url: &str) -> HttpEmbedder {
        HttpEmbedder::new(url, "all-MiniLM-L6-v2", 384, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            embedder("http://embeddings:8001/").endpoint(),
            "http://embeddings:8001/embed"
        );
        assert_eq!(embedder("http://embeddings:8001").model(), "all-MiniLM-L6-v2");
    }

    #[tokio::test]
    async fn empty_text_is_unavailable() {
        let err = embedder("http://127.0.0.1:9").embed("   ").await.unwrap_err();
        assert!(matches!(err, MatchError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let err = embedder("http://127.0.0.1:9")
            .embed("senior rust engineer")
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::EmbeddingUnavailable(_)));
    }
}
