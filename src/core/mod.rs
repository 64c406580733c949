//! Core module containing the query and field primitives of the framework

pub mod entity;
pub mod error;
pub mod extractors;
pub mod field;
pub mod operator;
pub mod query;

pub use entity::{Attributes, Model};
pub use error::{ConfigError, PresenterError, QueryError, QueryErrorCode, ShapeError};
pub use field::{FieldPath, parse_field};
pub use operator::{OperatorKind, is_operator, map_operator};
pub use query::{FilterPredicate, ModeDirective, ParsedQuery, QueryMode, parse_query};
