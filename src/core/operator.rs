//! Comparison operators accepted in filter specifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of comparison operators a filter may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorKind {
    #[default]
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
    NotLike,
}

impl OperatorKind {
    /// Every operator, in registry order
    pub const ALL: [OperatorKind; 8] = [
        OperatorKind::Eq,
        OperatorKind::Ne,
        OperatorKind::Lt,
        OperatorKind::Gt,
        OperatorKind::Lte,
        OperatorKind::Gte,
        OperatorKind::Like,
        OperatorKind::NotLike,
    ];

    /// The token used for this operator in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Eq => "eq",
            OperatorKind::Ne => "ne",
            OperatorKind::Lt => "lt",
            OperatorKind::Gt => "gt",
            OperatorKind::Lte => "lte",
            OperatorKind::Gte => "gte",
            OperatorKind::Like => "like",
            OperatorKind::NotLike => "notlike",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up an operator by its query-string token
///
/// Returns `None` for empty input and for any token outside the registry.
///
/// ```
/// use shape::core::operator::{map_operator, OperatorKind};
///
/// assert_eq!(map_operator("gte"), Some(OperatorKind::Gte));
/// assert_eq!(map_operator("between"), None);
/// ```
pub fn map_operator(token: &str) -> Option<OperatorKind> {
    if token.is_empty() {
        return None;
    }

    OperatorKind::ALL
        .into_iter()
        .find(|operator| operator.as_str() == token)
}

/// Whether the token names a known operator
pub fn is_operator(token: &str) -> bool {
    map_operator(token).is_some()
}
