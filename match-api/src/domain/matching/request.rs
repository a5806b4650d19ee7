use super::filter::FilterSet;
use super::traits::{MatchError, Result};

/// Caller-supplied knobs shared by every matching operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub filters: FilterSet,
    pub limit: usize,
    pub min_similarity: f64,
}

impl MatchRequest {
    pub fn new(limit: usize, min_similarity: f64) -> Result<Self> {
        if limit == 0 {
            return Err(MatchError::invalid_argument("limit", "must be at least 1"));
        }
        if !min_similarity.is_finite() || !(0.0..=1.0).contains(&min_similarity) {
            return Err(MatchError::invalid_argument(
                "min_similarity",
                "must be between 0 and 1",
            ));
        }
        Ok(Self {
            filters: FilterSet::new(),
            limit,
            min_similarity,
        })
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Clamp the limit to an operation's ceiling.
    pub(crate) fn clamped_limit(&self, max: usize) -> usize {
        self.limit.min(max)
    }
}
