//! JSON array encoding for stored embedding vectors.

use serde_json::Value;

use super::traits::{MatchError, Result};
use super::types::Vector;

/// Encodes and decodes embedding vectors as JSON arrays of doubles.
///
/// Every decoded vector must have exactly `dimensions` components.
#[derive(Debug, Clone, Copy)]
pub struct VectorCodec {
    dimensions: usize,
}

impl VectorCodec {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Parse a stored JSON value into a vector.
    pub fn decode(&self, raw: &Value) -> Result<Vector> {
        let items = raw.as_array().ok_or_else(|| MatchError::MalformedVector {
            entity: None,
            reason: format!("expected a JSON array, got {}", json_type(raw)),
        })?;

        let values = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_f64().ok_or_else(|| MatchError::MalformedVector {
                    entity: None,
                    reason: format!("element {i} is {}, not a number", json_type(item)),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() != self.dimensions {
            return Err(MatchError::DimensionMismatch {
                expected: self.dimensions,
                actual: values.len(),
                entity: None,
            });
        }

        Ok(Vector::new(values))
    }

    /// Inverse of [`decode`](Self::decode).
    pub fn encode(&self, vector: &Vector) -> Value {
        Value::from(vector.as_slice().to_vec())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
