//! Common error types and handling for Gantry
//!
//! Every error carries exactly one HTTP status. Callers never catch these
//! internally; they propagate to the boundary where [`Problem`] renders a
//! stable JSON payload for clients.

use axum::{
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Header used to correlate failures to business features without parsing
/// the response body.
pub const FEATURE_CODE_HEADER: &str = "feature-code";

/// Delimiter separating a human-readable message from an optional internal
/// error code embedded at the end of it. See [`with_code`] / [`split_code`].
pub const CODE_DELIMITER: &str = " ~ ";

/// Common error type for the Gantry utility library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Locked: {0}")]
    Locked(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Precondition required: {0}")]
    PreconditionRequired(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Authorization(_) => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Gone(_) => StatusCode::GONE,
            Error::Locked(_) => StatusCode::LOCKED,
            Error::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Error::PreconditionRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            Error::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short title for API responses
    pub fn title(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "Unexpected Error",
            Error::Database(_) => "Database Error",
            Error::Serialization(_) => "Serialization Error",
            Error::Authentication(_) => "Authentication Error",
            Error::Authorization(_) => "Authorization Error",
            Error::Validation(_) => "Validation Error",
            Error::NotFound(_) => "Not Found",
            Error::Conflict(_) => "Conflict",
            Error::Gone(_) => "Gone",
            Error::Locked(_) => "Locked",
            Error::PreconditionFailed(_) => "Precondition Failed",
            Error::PreconditionRequired(_) => "Precondition Required",
            Error::RateLimit(_) => "Rate Limit Exceeded",
            Error::Internal(_) => "Internal Error",
        }
    }

    /// Type name of a wrapped collaborator error, when one exists
    pub fn nested_type(&self) -> Option<&'static str> {
        match self {
            Error::Database(_) => Some("sqlx::Error"),
            Error::Serialization(_) => Some("serde_json::Error"),
            Error::Unexpected(_) => Some("anyhow::Error"),
            _ => None,
        }
    }
}

/// Embed an internal error code at the end of a message.
///
/// The code travels inside the message so that every error variant can carry
/// one without widening the enum; [`split_code`] recovers it on read.
pub fn with_code(message: &str, code: &str) -> String {
    format!("{message}{CODE_DELIMITER}{code}")
}

/// Split a message produced by [`with_code`] back into `(message, code)`.
///
/// Messages without the delimiter come back unchanged with no code.
pub fn split_code(message: &str) -> (&str, Option<&str>) {
    match message.rsplit_once(CODE_DELIMITER) {
        Some((msg, code)) if !code.is_empty() => (msg, Some(code)),
        _ => (message, None),
    }
}

/// Structured problem payload returned to clients on every failure.
///
/// The shape is stable regardless of which internal error triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(skip)]
    feature_code: Option<String>,
}

impl Problem {
    pub fn from_error(err: &Error) -> Self {
        let display = err.to_string();
        let (detail, code) = split_code(&display);
        Self {
            title: err.title().to_string(),
            status: err.status_code().as_u16(),
            detail: detail.to_string(),
            internal_error_code: code.map(str::to_string),
            exception: err.nested_type().map(str::to_string),
            feature_code: None,
        }
    }

    /// Attach a `Feature-Code` header to the rendered response
    pub fn with_feature_code(mut self, code: impl Into<String>) -> Self {
        self.feature_code = Some(code.into());
        self
    }
}

impl From<&Error> for Problem {
    fn from(err: &Error) -> Self {
        Problem::from_error(err)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let feature_code = self.feature_code.clone();

        let mut response = (status, Json(self)).into_response();
        if let Some(code) = feature_code {
            if let Ok(value) = code.parse() {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(FEATURE_CODE_HEADER), value);
            }
        }
        response
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log internal errors with full context
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
        }

        Problem::from_error(&self).into_response()
    }
}
