//! # Shape-RS
//!
//! The data-shaping layer of a generic REST resource framework.
//!
//! ## Features
//!
//! - **Query Directives**: `_include`, `_exclude`, `_link`, `_embed` and filter
//!   predicates (`age.gte=18`) parsed from the query string, errors accumulated
//!   instead of failing the request
//! - **Layered Projections**: include/exclude rules per direction and per
//!   operation, where inclusion always wins over exclusion
//! - **Memoized Resolution**: one cached attribute set per `(direction, operation)`,
//!   safe to share across requests
//! - **Configuration-Based**: define presenter rules via YAML configuration
//! - **Axum Integration**: take a [`ParsedQuery`](core::query::ParsedQuery) directly as a handler argument
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shape::prelude::*;
//!
//! impl_model!(User {
//!     id: u64,
//!     name: String,
//!     password_hash: String,
//! });
//!
//! let presenter = Presenter::builder()
//!     .with_model::<User>()
//!     .with_exclude(RuleLayers::new().all(["password_hash"]))
//!     .build()?;
//!
//! let query = ParsedQuery::parse(Some("_include=name&age.gte=18"));
//! let record = presenter.render(&user, "get");
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod projection;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Attributes, Model},
        error::{ConfigError, PresenterError, QueryError, QueryErrorCode, ShapeError},
        field::{FieldPath, parse_field},
        operator::{OperatorKind, is_operator, map_operator},
        query::{FilterPredicate, ModeDirective, ParsedQuery, QueryMode, parse_query},
    };

    // === Macros ===
    pub use crate::{impl_model, model_attributes};

    // === Projection ===
    pub use crate::projection::{
        Direction, Presenter, PresenterBuilder, PresenterRegistry, Projected, Record,
    };

    // === Config ===
    pub use crate::config::{
        DirectionLayers, PresenterConfig, ProjectionConfig, ProjectionRuleSet, RuleLayers,
    };

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
}
