//! Typed error handling for shape-rs
//!
//! Two kinds of failures exist:
//!
//! - [`QueryError`]: a problem found while parsing a query string. These are
//!   *recorded* on the [`ParsedQuery`](crate::core::query::ParsedQuery) and never
//!   returned as `Err`; the caller decides whether to reject the request.
//! - [`ShapeError`]: real `Err` values, either a configuration contract violation
//!   at startup ([`ConfigError`]) or a payload the presenter cannot shape
//!   ([`PresenterError`]).
//!
//! # Example
//!
//! ```rust,ignore
//! let query = ParsedQuery::parse(Some("_include=name&_exclude=email"));
//! if !query.is_valid() {
//!     for error in &query.errors {
//!         println!("{}: {}", error.code, error.message);
//!     }
//! }
//! ```

use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Machine-readable code of a recorded query error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorCode {
    /// Both `_include` and `_exclude` were supplied
    AmbiguousMode,

    /// An operator suffix was not recognized
    ///
    /// Only produced by strict filter conventions; the dotted-suffix parser falls
    /// back to `eq` instead.
    UnknownOperation,

    /// The raw query string could not be URL-decoded
    MalformedQuery,
}

impl QueryErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryErrorCode::AmbiguousMode => "ambiguous_mode",
            QueryErrorCode::UnknownOperation => "unknown_operation",
            QueryErrorCode::MalformedQuery => "malformed_query",
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem recorded while parsing a query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryError {
    /// Error code for programmatic handling
    pub code: QueryErrorCode,

    /// Human-readable error message
    pub message: String,

    /// The query fragment the error refers to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl QueryError {
    pub fn new(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// The error recorded when inclusion and exclusion directives are mixed
    pub fn ambiguous_mode() -> Self {
        Self::new(
            QueryErrorCode::AmbiguousMode,
            "Ambiguous mode - do not set both _include and _exclude",
        )
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{} ({}): {}", self.code, reference, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Startup-time configuration contract violations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A presenter was built without an attribute enumerator
    #[error("presenter{} has no attribute enumerator", entity_suffix(.entity))]
    MissingAttributes { entity: Option<String> },

    /// The same entity type was registered twice
    #[error("presenter for entity '{entity}' is already registered")]
    DuplicateEntity { entity: String },
}

fn entity_suffix(entity: &Option<String>) -> String {
    entity
        .as_ref()
        .map(|entity| format!(" for entity '{}'", entity))
        .unwrap_or_default()
}

// =============================================================================
// Presenter Errors
// =============================================================================

/// Payloads a presenter cannot shape
#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    /// The payload was neither an object nor an array of objects
    #[error("expected {expected}, found {found}")]
    InvalidPayload {
        expected: &'static str,
        found: &'static str,
    },
}

// =============================================================================
// Crate Error
// =============================================================================

/// The main error type for shape-rs
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Presenter(#[from] PresenterError),
}

impl ShapeError {
    /// Get the HTTP status code a request handler should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShapeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShapeError::Presenter(PresenterError::InvalidPayload { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ShapeError::Config(ConfigError::MissingAttributes { .. }) => "MISSING_ATTRIBUTES",
            ShapeError::Config(ConfigError::DuplicateEntity { .. }) => "DUPLICATE_ENTITY",
            ShapeError::Presenter(PresenterError::InvalidPayload { .. }) => "INVALID_PAYLOAD",
        }
    }
}

/// Short name of a JSON value's kind, for error messages
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
