//! Talent Matching - embedding-similarity ranking over talents, projects,
//! portfolios and skills.
//!
//! Every entity carries one or more precomputed embedding vectors (JSON
//! arrays of 384 doubles). A matching request:
//!
//! 1. resolves a query vector (free text through a [`QueryEmbedder`], or a
//!    source entity's stored embedding),
//! 2. loads a candidate pool from a [`CandidateRepository`],
//! 3. hands both to the [`MatchRanker`]: structured filters, vector presence,
//!    clamped cosine scoring, threshold, sort (score desc, id asc), limit.
//!
//! # Architecture
//!
//! - [`QueryEmbedder`] - Text embedding generation (HTTP service, mocks)
//! - [`CandidateRepository`] - Candidate pools and lookups (PostgreSQL, mocks)
//! - [`MatchRanker`] - The pure ranking pipeline, run on the blocking pool
//! - [`MatchingService`] - The public operations used by the HTTP handlers
//!
//! # Example
//!
//! ```ignore
//! use match_api::domain::matching::{MatchingService, MatchingConfig, MatchRequest};
//!
//! let service = MatchingService::new(embedder, repository, MatchingConfig::default());
//! let results = service
//!     .search_talents("senior rust engineer", MatchRequest::new(20, 0.5)?)
//!     .await?;
//! ```

mod cancellation;
mod codec;
mod filter;
mod insights;
mod ranker;
mod request;
mod results;
mod service;
mod similarity;
#[cfg(test)]
pub(crate) mod testing;
mod traits;
mod types;

pub mod embedder;
pub mod repository;

pub use codec::VectorCodec;
pub use filter::FilterSet;
pub use ranker::MatchRanker;
pub use request::MatchRequest;
pub use results::{
    ProjectTalentMatches, Recommendations, RelatedSkills, SimilarPortfolios, TalentProjectMatches,
    TalentSearchResults,
};
pub use service::{MatchingConfig, MatchingService};
pub use traits::{CandidateRepository, MatchError, QueryEmbedder};
pub use types::{
    EmbeddingField, EntityKind, PortfolioCandidate, ProjectCandidate, SkillCandidate,
    TalentCandidate, DEFAULT_DIMENSIONS,
};
