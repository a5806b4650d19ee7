//! Request validation shared by the matching handlers.
//!
//! Problems are collected per field so a single 422 response can report all of them.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{ApiError, FieldErrors};

pub const QUERY_MIN_CHARS: usize = 2;
pub const QUERY_MAX_CHARS: usize = 500;

/// Decode an optional JSON body. An empty body yields `T::default()`.
pub fn parse_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_field("body", e.to_string()))
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Required free-text query, trimmed before its length is checked.
    pub fn query(&mut self, value: Option<&str>) -> String {
        let Some(query) = value.map(str::trim).filter(|q| !q.is_empty()) else {
            self.reject("query", "The query field is required.");
            return String::new();
        };

        let chars = query.chars().count();
        if chars < QUERY_MIN_CHARS {
            self.reject(
                "query",
                format!("The query must be at least {QUERY_MIN_CHARS} characters."),
            );
        } else if chars > QUERY_MAX_CHARS {
            self.reject(
                "query",
                format!("The query may not be greater than {QUERY_MAX_CHARS} characters."),
            );
        }
        query.to_string()
    }

    pub fn limit(&mut self, value: Option<i64>, default: usize, max: usize) -> usize {
        let Some(limit) = value else {
            return default.min(max);
        };
        if limit < 1 {
            self.reject("limit", "The limit must be at least 1.");
            return default;
        }
        match usize::try_from(limit) {
            Ok(limit) if limit <= max => limit,
            _ => {
                self.reject("limit", format!("The limit may not be greater than {max}."));
                default
            }
        }
    }

    pub fn min_similarity(&mut self, value: Option<f64>, default: f64) -> f64 {
        match value {
            None => default,
            Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => v,
            Some(_) => {
                self.reject("min_similarity", "The min similarity must be between 0 and 1.");
                default
            }
        }
    }

    /// Filters must be a JSON object; `null` or absence means no filters.
    pub fn filters(&mut self, value: Option<Value>) -> Map<String, Value> {
        match value {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                self.reject("filters", "The filters must be an object.");
                Map::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }
}
