use std::{collections::BTreeMap, fmt};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::matching::MatchError;

const REDACTED: &str = "An error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmbeddingUnavailable,
    SourceNotEmbedded,
    RequestCancelled,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

/// Field name to messages, as returned under `errors` for validation failures.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<ErrorCode>,
    errors: Option<FieldErrors>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            errors: None,
            detail: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a diagnostic detail; only exposed when `debug` is set.
    pub fn with_detail(mut self, detail: impl Into<String>, debug: bool) -> Self {
        self.detail = Some(if debug {
            detail.into()
        } else {
            REDACTED.to_string()
        });
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// 422 with per-field messages.
    pub fn validation(errors: FieldErrors) -> Self {
        let mut err = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed");
        err.errors = Some(errors);
        err
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::validation(BTreeMap::from([(field.into(), vec![message.into()])]))
    }

    /// Map a matching failure onto the HTTP surface.
    ///
    /// Internal failures are logged here and their detail is redacted unless `debug`.
    pub fn from_match(err: MatchError, debug: bool) -> Self {
        match err {
            MatchError::InvalidArgument { field, message } => Self::invalid_field(field, message),
            MatchError::UnknownFilterKey { ref key } => {
                Self::invalid_field(format!("filters.{key}"), err.to_string())
            }
            MatchError::InvalidFilterValue { ref key, .. } => {
                Self::invalid_field(format!("filters.{key}"), err.to_string())
            }
            MatchError::NotFound { .. } => Self::not_found(err.to_string()),
            MatchError::SourceNotEmbedded { .. } => {
                Self::conflict(err.to_string()).with_code(ErrorCode::SourceNotEmbedded)
            }
            MatchError::EmbeddingUnavailable(ref reason) => {
                tracing::warn!("Embedding service unavailable: {}", reason);
                Self::service_unavailable("Search is temporarily unavailable, please try again")
                    .with_code(ErrorCode::EmbeddingUnavailable)
            }
            MatchError::Cancelled => Self::service_unavailable(err.to_string())
                .with_code(ErrorCode::RequestCancelled),
            MatchError::DimensionMismatch { .. }
            | MatchError::MalformedVector { .. }
            | MatchError::Repository(_)
            | MatchError::Internal(_) => {
                tracing::error!("Matching failed: {:?}", err);
                Self::internal("Matching failed").with_detail(err.to_string(), debug)
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            errors: self.errors,
            error: self.detail,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}
