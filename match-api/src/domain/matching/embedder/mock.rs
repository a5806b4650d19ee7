//! Mock embedder implementation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::matching::traits::{MatchError, QueryEmbedder, Result};
use crate::domain::matching::types::Vector;

/// Mock embedder that returns configurable vectors, or fails every call.
#[derive(Clone)]
pub struct MockEmbedder {
    responses: Arc<Vec<Vec<f64>>>,
    failure: Option<String>,
    call_count: Arc<AtomicUsize>,
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock that always returns the same vector.
    pub fn returning(vector: Vec<f64>) -> Self {
        let dims = vector.len();
        Self {
            responses: Arc::new(vec![vector]),
            failure: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions: dims,
        }
    }

    /// Create a mock that returns vectors in sequence, wrapping around.
    pub fn with_sequence(vectors: Vec<Vec<f64>>) -> Self {
        let dims = vectors.first().map(|v| v.len()).unwrap_or(2);
        Self {
            responses: Arc::new(vectors),
            failure: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions: dims,
        }
    }

    /// Create a mock whose every call fails with `EmbeddingUnavailable`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Arc::new(Vec::new()),
            failure: Some(message.into()),
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions: 2,
        }
    }

    /// Get the number of times `embed` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueryEmbedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vector> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(MatchError::EmbeddingUnavailable(message.clone()));
        }
        let response = &self.responses[idx % self.responses.len()];
        Ok(Vector::new(response.clone()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returning_always_same_vector() {
        let embedder = MockEmbedder::returning(vec![1.0, 0.0]);
        let a = embedder.embed("a").await.unwrap();
        let b = embedder.embed("b").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(embedder.dimensions(), 2);
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn sequence_wraps_around() {
        let embedder = MockEmbedder::with_sequence(vec![vec![1.0], vec![2.0]]);
        assert_eq!(embedder.embed("1").await.unwrap().as_slice(), &[1.0]);
        assert_eq!(embedder.embed("2").await.unwrap().as_slice(), &[2.0]);
        assert_eq!(embedder.embed("3").await.unwrap().as_slice(), &[1.0]);
    }

    #[tokio::test]
    async fn failing_counts_calls() {
        let embedder = MockEmbedder::failing("timeout");
        assert!(matches!(
            embedder.embed("x").await,
            Err(MatchError::EmbeddingUnavailable(_))
        ));
        assert_eq!(embedder.call_count(), 1);
        embedder.reset();
        assert_eq!(embedder.call_count(), 0);
    }
}
