//! Similarity scoring between embedding vectors.

use serde::Serialize;
use strum::Display;

use super::traits::{MatchError, Result};

/// Cosine similarity clamped to `[0, 1]`.
///
/// Zero vectors score `0.0`. Negative cosine values carry no relevance for
/// matching and are clamped to zero.
pub fn score(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
            entity: None,
        });
    }

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return Ok(0.0);
    }

    // Scaled by the largest component so the sums stay finite and non-zero.
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !cosine.is_finite() {
        return Ok(0.0);
    }
    Ok(cosine.clamp(0.0, 1.0))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |max, x| max.max(x.abs()))
}

/// Weighted mean of component scores: `sum(w * s) / sum(w)`.
///
/// Returns `0.0` for an empty input or a zero weight sum.
pub fn weighted(components: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = components.iter().map(|(_, w)| w).sum();
    if components.is_empty() || total_weight == 0.0 {
        return 0.0;
    }
    components.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight
}

/// Human-readable quality band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchQuality {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Moderate,
    Poor,
}

impl MatchQuality {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => MatchQuality::Excellent,
            s if s >= 0.8 => MatchQuality::VeryGood,
            s if s >= 0.7 => MatchQuality::Good,
            s if s >= 0.6 => MatchQuality::Fair,
            s if s >= 0.5 => MatchQuality::Moderate,
            _ => MatchQuality::Poor,
        }
    }
}
