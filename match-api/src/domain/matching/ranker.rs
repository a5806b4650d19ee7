//! The ranking pipeline: filter, score, threshold, sort, truncate.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::cancellation::CancellationToken;
use super::filter::{CandidateFilter, FilterSet};
use super::similarity;
use super::traits::{MatchError, Result};
use super::types::{EmbeddingField, Vector};
use crate::domain::models::EntityId;

/// One weighted component of a candidate's overall score.
pub enum ScoreTerm<C> {
    /// Cosine similarity between `query` and the candidate's `field` embedding.
    Vector {
        label: String,
        query: Vector,
        field: EmbeddingField,
        weight: f64,
    },
    /// A non-vector score in `[0, 1]` computed from the candidate's attributes.
    Attribute {
        label: String,
        weight: f64,
        score: Box<dyn Fn(&C) -> f64 + Send + Sync>,
    },
}

impl<C> fmt::Debug for ScoreTerm<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreTerm::Vector {
                label,
                field,
                weight,
                query,
            } => f
                .debug_struct("Vector")
                .field("label", label)
                .field("field", field)
                .field("weight", weight)
                .field("dims", &query.dims())
                .finish(),
            ScoreTerm::Attribute { label, weight, .. } => f
                .debug_struct("Attribute")
                .field("label", label)
                .field("weight", weight)
                .finish(),
        }
    }
}

/// The weighted terms a candidate is scored by.
///
/// The overall score is the weighted mean of the term scores. With a single
/// vector term it is just the clamped cosine similarity.
#[derive(Debug)]
pub struct ScoringPlan<C> {
    terms: Vec<ScoreTerm<C>>,
}

impl<C> Default for ScoringPlan<C> {
    fn default() -> Self {
        Self { terms: Vec::new() }
    }
}

impl<C> ScoringPlan<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan with one vector term of weight 1.0, labelled by the field's short name.
    pub fn single(field: EmbeddingField, query: Vector) -> Self {
        Self::new().vector(field.short_name(), query, field, 1.0)
    }

    pub fn vector(
        mut self,
        label: impl Into<String>,
        query: Vector,
        field: EmbeddingField,
        weight: f64,
    ) -> Self {
        self.terms.push(ScoreTerm::Vector {
            label: label.into(),
            query,
            field,
            weight,
        });
        self
    }

    pub fn attribute(
        mut self,
        label: impl Into<String>,
        weight: f64,
        score: impl Fn(&C) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.terms.push(ScoreTerm::Attribute {
            label: label.into(),
            weight,
            score: Box::new(score),
        });
        self
    }

    pub fn terms(&self) -> &[ScoreTerm<C>] {
        &self.terms
    }

    fn vector_fields(&self) -> impl Iterator<Item = EmbeddingField> + '_ {
        self.terms.iter().filter_map(|t| match t {
            ScoreTerm::Vector { field, .. } => Some(*field),
            ScoreTerm::Attribute { .. } => None,
        })
    }
}

/// A candidate that survived ranking, with its score and per-term breakdown.
#[derive(Debug, Clone)]
pub struct RankedMatch<C> {
    pub candidate: C,
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

/// Per-request counters, logged and exposed for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankStats {
    pub pool_size: usize,
    /// Dropped because the candidate is the source entity itself
    pub excluded: usize,
    pub filtered_out: usize,
    pub missing_embedding: usize,
    pub below_threshold: usize,
    /// Matches before truncation to the limit
    pub matched: usize,
}

#[derive(Debug, Clone)]
pub struct RankOutcome<C> {
    pub matches: Vec<RankedMatch<C>>,
    pub stats: RankStats,
}

/// Ranks a candidate pool against a scoring plan.
///
/// Pure and synchronous: no I/O and no shared mutable state, so independent
/// requests can rank in parallel.
#[derive(Debug, Clone)]
pub struct MatchRanker {
    dimensions: usize,
    min_similarity: f64,
    limit: usize,
    exclude: Option<EntityId>,
    cancellation: Option<CancellationToken>,
}

impl MatchRanker {
    pub fn new(dimensions: usize, min_similarity: f64, limit: usize) -> Self {
        Self {
            dimensions,
            min_similarity,
            limit,
            exclude: None,
            cancellation: None,
        }
    }

    /// Never return the entity with this id (the source of a similarity search).
    pub fn excluding(mut self, id: EntityId) -> Self {
        self.exclude = Some(id);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn rank<C>(
        &self,
        pool: Vec<C>,
        filters: &FilterSet,
        plan: &ScoringPlan<C>,
    ) -> Result<RankOutcome<C>>
    where
        C: CandidateFilter,
    {
        filters.validate_for(C::KIND)?;
        self.check_query_dimensions(plan)?;

        let mut stats = RankStats {
            pool_size: pool.len(),
            ..Default::default()
        };
        let mut matches = Vec::new();

        for candidate in pool {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                return Err(MatchError::Cancelled);
            }

            let id = candidate.id();
            if self.exclude == Some(id) {
                stats.excluded += 1;
                continue;
            }

            if !candidate.matches(filters)? {
                stats.filtered_out += 1;
                continue;
            }

            let embeddings = candidate.embeddings();
            if plan.vector_fields().any(|field| !embeddings.has(field)) {
                stats.missing_embedding += 1;
                continue;
            }

            let (score, breakdown) = score_candidate(&candidate, plan)?;
            if score < self.min_similarity {
                stats.below_threshold += 1;
                continue;
            }

            matches.push(RankedMatch {
                candidate,
                score,
                breakdown,
            });
        }

        matches.sort_by(compare_matches);
        stats.matched = matches.len();
        matches.truncate(self.limit);

        debug!(
            pool = stats.pool_size,
            excluded = stats.excluded,
            filtered_out = stats.filtered_out,
            missing_embedding = stats.missing_embedding,
            below_threshold = stats.below_threshold,
            matched = stats.matched,
            returned = matches.len(),
            "Ranking completed"
        );

        Ok(RankOutcome { matches, stats })
    }

    /// A query vector of the wrong size is a configuration fault; fail before scanning.
    fn check_query_dimensions<C>(&self, plan: &ScoringPlan<C>) -> Result<()> {
        for term in plan.terms() {
            if let ScoreTerm::Vector { query, .. } = term {
                if query.dims() != self.dimensions {
                    return Err(MatchError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: query.dims(),
                        entity: None,
                    });
                }
            }
        }
        Ok(())
    }
}

fn score_candidate<C: CandidateFilter>(
    candidate: &C,
    plan: &ScoringPlan<C>,
) -> Result<(f64, BTreeMap<String, f64>)> {
    let mut breakdown = BTreeMap::new();
    let mut components = Vec::with_capacity(plan.terms().len());

    for term in plan.terms() {
        let (label, score, weight) = match term {
            ScoreTerm::Vector {
                label,
                query,
                field,
                weight,
            } => {
                let Some(vector) = candidate.embeddings().get(*field) else {
                    continue;
                };
                let score = similarity::score(query.as_slice(), vector.as_slice())
                    .map_err(|e| e.for_entity(candidate.id()))?;
                (label, score, *weight)
            }
            ScoreTerm::Attribute {
                label,
                weight,
                score,
            } => (label, score(candidate).clamp(0.0, 1.0), *weight),
        };
        breakdown.insert(label.clone(), score);
        components.push((score, weight));
    }

    Ok((similarity::weighted(&components), breakdown))
}

/// Descending score, then ascending id.
fn compare_matches<C: CandidateFilter>(a: &RankedMatch<C>, b: &RankedMatch<C>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.id().cmp(&b.candidate.id()))
}
