//! Property projection: which attributes an entity exposes or accepts
//!
//! A [`Presenter`] is built once per entity type at startup and shared across
//! requests. For every `(direction, operation)` pair it resolves the attribute
//! set from the model's declared attributes and a layered
//! [`ProjectionRuleSet`](crate::config::ProjectionRuleSet), memoizing the result.
//!
//! - [`Direction::Render`]: entity → wire-bound record (missing values become `null`)
//! - [`Direction::Parse`]: inbound record → accepted attributes (nothing is invented)

pub mod presenter;
pub mod registry;
pub mod resolver;

pub use presenter::{Presenter, PresenterBuilder};
pub use registry::PresenterRegistry;
pub use resolver::{ProjectionKey, ProjectionResolver};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which way data flows through a presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Outbound: entity to response
    Render,

    /// Inbound: request body to accepted attributes
    Parse,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Render => "render",
            Direction::Parse => "parse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered attribute name → value mapping
pub type Record = IndexMap<String, Value>;

/// Output of a presenter: one record or a sequence of records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projected {
    One(Record),
    Many(Vec<Record>),
}

impl Projected {
    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            Projected::One(_) => 1,
            Projected::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records, as a sequence
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Projected::One(record) => vec![record],
            Projected::Many(records) => records,
        }
    }
}
