//! Axum extractors for query directives
//!
//! [`ParsedQuery`] can be taken directly as a handler argument. Extraction never
//! rejects: a malformed query still produces a `ParsedQuery`, and the handler
//! decides what to do when [`ParsedQuery::is_valid`] is false.
//!
//! ```rust,ignore
//! async fn list_users(query: ParsedQuery) -> Response {
//!     if !query.is_valid() {
//!         return (StatusCode::UNPROCESSABLE_ENTITY, Json(query.errors)).into_response();
//!     }
//!     // ...
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::core::query::ParsedQuery;

impl<S> FromRequestParts<S> for ParsedQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ParsedQuery::parse(parts.uri.query()))
    }
}
