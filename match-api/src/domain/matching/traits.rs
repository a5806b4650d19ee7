//! Trait definitions for matching domain abstractions.
//!
//! These traits enable dependency injection and easy testing through mocking.

use async_trait::async_trait;

use super::types::{
    EntityKind, PortfolioCandidate, ProjectCandidate, SkillCandidate, TalentCandidate, Vector,
};
use crate::domain::models::{EntityId, UserId};

/// Error type for matching operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    #[error("Unknown filter key: {key}")]
    UnknownFilterKey { key: String },

    #[error("Invalid value for filter {key}: {message}")]
    InvalidFilterValue { key: String, message: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        entity: Option<EntityId>,
    },

    #[error("Malformed vector: {reason}")]
    MalformedVector {
        entity: Option<EntityId>,
        reason: String,
    },

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("{kind} {id} has no embeddings generated yet")]
    SourceNotEmbedded { kind: EntityKind, id: EntityId },

    #[error("Matching request was cancelled")]
    Cancelled,

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MatchError {
    fn from(e: sqlx::Error) -> Self {
        MatchError::Repository(e.to_string())
    }
}

impl MatchError {
    pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        MatchError::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    /// Attach an entity id to data-integrity errors raised before the owner was known.
    pub fn for_entity(self, id: EntityId) -> Self {
        match self {
            MatchError::DimensionMismatch {
                expected,
                actual,
                entity: None,
            } => MatchError::DimensionMismatch {
                expected,
                actual,
                entity: Some(id),
            },
            MatchError::MalformedVector {
                entity: None,
                reason,
            } => MatchError::MalformedVector {
                entity: Some(id),
                reason,
            },
            other => other,
        }
    }

    /// Whether this is an internal data-integrity or infrastructure fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            MatchError::DimensionMismatch { .. }
                | MatchError::MalformedVector { .. }
                | MatchError::Repository(_)
                | MatchError::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;

/// Turns free-text queries into embedding vectors.
///
/// Abstracts the embedding provider so the matcher never depends on a
/// concrete model. Failures of any kind (timeouts, unavailable service,
/// empty input) are reported as [`MatchError::EmbeddingUnavailable`].
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    /// Generate the embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Dimensionality of the vectors this embedder returns.
    fn dimensions(&self) -> usize;

    /// Model label, informational only.
    fn model(&self) -> &str;
}

/// Read access to the entities the matcher scores.
///
/// Pools are already scoped by the store (e.g. "open projects"); the matcher
/// applies structured filters and thresholds itself.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn talent(&self, id: EntityId) -> Result<Option<TalentCandidate>>;

    async fn project(&self, id: EntityId) -> Result<Option<ProjectCandidate>>;

    async fn portfolio(&self, id: EntityId) -> Result<Option<PortfolioCandidate>>;

    async fn skill(&self, id: EntityId) -> Result<Option<SkillCandidate>>;

    /// All talent profiles eligible for matching.
    async fn talent_pool(&self) -> Result<Vec<TalentCandidate>>;

    /// Projects with status `open`.
    async fn open_project_pool(&self) -> Result<Vec<ProjectCandidate>>;

    async fn portfolio_pool(&self) -> Result<Vec<PortfolioCandidate>>;

    async fn skill_pool(&self) -> Result<Vec<SkillCandidate>>;

    /// Projects the given user has already applied to.
    async fn applied_project_ids(&self, talent_user: UserId) -> Result<Vec<EntityId>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // Verify traits are object-safe (can be used as trait objects)
    fn _assert_embedder_object_safe(_: &dyn QueryEmbedder) {}
    fn _assert_repository_object_safe(_: &dyn CandidateRepository) {}

    #[test]
    fn for_entity_fills_missing_id_only() {
        let id = EntityId::new(Uuid::from_u128(7));
        let err = MatchError::DimensionMismatch {
            expected: 384,
            actual: 2,
            entity: None,
        }
        .for_entity(id);
        assert!(matches!(
            err,
            MatchError::DimensionMismatch { entity: Some(e), .. } if e == id
        ));

        let other = EntityId::new(Uuid::from_u128(8));
        let err = MatchError::MalformedVector {
            entity: Some(other),
            reason: "x".into(),
        }
        .for_entity(id);
        assert!(matches!(
            err,
            MatchError::MalformedVector { entity: Some(e), .. } if e == other
        ));
    }

    #[test]
    fn internal_classification() {
        assert!(MatchError::Repository("down".into()).is_internal());
        assert!(!MatchError::EmbeddingUnavailable("timeout".into()).is_internal());
        assert!(!MatchError::invalid_argument("limit", "must be positive").is_internal());
    }
}
