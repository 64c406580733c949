//! Projection configuration loading and management
//!
//! Include and exclude rules are layered. Each [`RuleLayers`] holds four lists:
//!
//! ```yaml
//! exclude:
//!   all: [password_hash]        # every direction, every operation
//!   create: [id]                # every direction, operation "create"
//!   render:
//!     all: [internal_notes]     # render direction, every operation
//!     list: [biography]         # render direction, operation "list"
//!   parse:
//!     update: [email]           # parse direction, operation "update"
//! ```
//!
//! `all`, `render` and `parse` are reserved; every other key is an operation.

use crate::projection::Direction;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule lists scoped to one direction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionLayers {
    /// Applies to every operation in this direction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,

    /// Applies to one operation in this direction
    #[serde(flatten)]
    pub operations: BTreeMap<String, Vec<String>>,
}

/// One side (include or exclude) of a rule set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLayers {
    /// Applies always
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,

    /// Applies within the render direction only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<DirectionLayers>,

    /// Applies within the parse direction only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<DirectionLayers>,

    /// Applies to one operation across both directions
    #[serde(flatten)]
    pub operations: BTreeMap<String, Vec<String>>,
}

impl RuleLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add names to the global `all` layer
    pub fn all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add names to the global layer of one operation
    pub fn operation<I, S>(mut self, operation: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations
            .entry(operation.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add names to the `all` layer of one direction
    pub fn direction_all<I, S>(mut self, direction: Direction, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direction_mut(direction)
            .all
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add names to the layer of one operation within one direction
    pub fn direction_operation<I, S>(mut self, direction: Direction, operation: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direction_mut(direction)
            .operations
            .entry(operation.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Rules scoped to one direction, if any
    pub fn for_direction(&self, direction: Direction) -> Option<&DirectionLayers> {
        match direction {
            Direction::Render => self.render.as_ref(),
            Direction::Parse => self.parse.as_ref(),
        }
    }

    /// The four layers applying to a `(direction, operation)` pair, coarsest first
    ///
    /// Order: global all, global operation, direction all, direction operation.
    /// Missing layers are empty.
    pub fn layers(&self, direction: Direction, operation: &str) -> [&[String]; 4] {
        let scoped = self.for_direction(direction);

        [
            self.all.as_slice(),
            names_for(&self.operations, operation),
            scoped.map(|d| d.all.as_slice()).unwrap_or_default(),
            scoped
                .map(|d| names_for(&d.operations, operation))
                .unwrap_or_default(),
        ]
    }

    fn direction_mut(&mut self, direction: Direction) -> &mut DirectionLayers {
        match direction {
            Direction::Render => self.render.get_or_insert_with(Default::default),
            Direction::Parse => self.parse.get_or_insert_with(Default::default),
        }
    }
}

fn names_for<'a>(operations: &'a BTreeMap<String, Vec<String>>, operation: &str) -> &'a [String] {
    operations
        .get(operation)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Include and exclude rules of one presenter
///
/// Inclusion is additive and exclusion subtractive; absence of either side means
/// no addition or no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<RuleLayers>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RuleLayers>,
}

impl ProjectionRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, include: RuleLayers) -> Self {
        self.include = Some(include);
        self
    }

    pub fn with_exclude(mut self, exclude: RuleLayers) -> Self {
        self.exclude = Some(exclude);
        self
    }
}

/// Configuration for one entity's presenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenterConfig {
    /// Entity type (e.g., "user")
    pub entity: String,

    /// Declared attributes; when absent they come from the entity's model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,

    /// Include and exclude rules
    #[serde(flatten)]
    pub rules: ProjectionRuleSet,
}

/// Complete configuration for the projection system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// List of presenter configurations
    #[serde(default)]
    pub presenters: Vec<PresenterConfig>,
}

impl ProjectionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Merge several configurations
    ///
    /// Presenters keep their first-seen position; a later configuration for the
    /// same entity replaces the earlier one.
    pub fn merge(configs: Vec<ProjectionConfig>) -> Self {
        let mut presenters: Vec<PresenterConfig> = Vec::new();

        for presenter in configs.into_iter().flat_map(|c| c.presenters) {
            match presenters.iter_mut().find(|p| p.entity == presenter.entity) {
                Some(existing) => *existing = presenter,
                None => presenters.push(presenter),
            }
        }

        Self { presenters }
    }

    /// Find the configuration of an entity type
    pub fn find(&self, entity: &str) -> Option<&PresenterConfig> {
        self.presenters.iter().find(|p| p.entity == entity)
    }
}
