//! Dotted field references

use serde::{Deserialize, Serialize};

/// A dotted attribute reference split into its leaf name and containing path
///
/// `"a.b.c"` becomes `name = "c"`, `path = ["a", "b"]`. The path is ordered
/// outermost-first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    /// Leaf attribute name
    pub name: String,

    /// Containing segments, outermost first (empty for top-level fields)
    pub path: Vec<String>,
}

impl FieldPath {
    /// Build a field path from its parts
    pub fn new(name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    /// Parse a dotted reference
    ///
    /// # Examples
    ///
    /// ```
    /// use shape::core::field::FieldPath;
    ///
    /// let field = FieldPath::parse("a.b.c");
    /// assert_eq!(field.name, "c");
    /// assert_eq!(field.path, vec!["a", "b"]);
    ///
    /// assert!(FieldPath::parse("c").is_top_level());
    /// ```
    pub fn parse(raw: &str) -> Self {
        Self::from_segments(raw.split('.').map(str::to_string).collect())
    }

    /// Build a field path from already split segments, the last one being the leaf
    pub(crate) fn from_segments(mut segments: Vec<String>) -> Self {
        let name = segments.pop().unwrap_or_default();
        Self {
            name,
            path: segments,
        }
    }

    /// Whether this reference points at a top-level attribute
    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.path {
            write!(f, "{}.", segment)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Split a dotted field reference into a [`FieldPath`]
pub fn parse_field(raw: &str) -> FieldPath {
    FieldPath::parse(raw)
}
