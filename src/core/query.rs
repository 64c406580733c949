//! Query directive parsing
//!
//! Turns a raw query string into a [`ParsedQuery`]: the caller's field selection
//! mode, relation link/embed directives and filter predicates.
//!
//! # Format
//!
//! ```text
//! GET /users?_include=name,email                 explicit selection
//! GET /users?_exclude=password_hash              implicit selection
//! GET /users?_link=company&_embed=owner.address  relation directives
//! GET /users?age.gte=18&status=active,pending    filters (operator suffix, default eq)
//! ```
//!
//! Parsing never fails: problems are recorded in [`ParsedQuery::errors`] and
//! every other key is still processed.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::error::{QueryError, QueryErrorCode};
use crate::core::field::FieldPath;
use crate::core::operator::{OperatorKind, map_operator};

/// Reserved key selecting attributes explicitly
pub const INCLUDE_KEY: &str = "_include";
/// Reserved key removing attributes from the default selection
pub const EXCLUDE_KEY: &str = "_exclude";
/// Reserved key requesting relation links
pub const LINK_KEY: &str = "_link";
/// Reserved key requesting embedded relations
pub const EMBED_KEY: &str = "_embed";

/// How the query overrides the attribute selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// No selection directive was given
    #[default]
    Default,

    /// Only the listed fields are wanted (`_include`)
    Explicit,

    /// Every field except the listed ones is wanted (`_exclude`)
    Implicit,
}

/// A reserved key that sets the selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeDirective {
    Include,
    Exclude,
}

impl ModeDirective {
    /// The mode this directive establishes
    pub fn mode(&self) -> QueryMode {
        match self {
            ModeDirective::Include => QueryMode::Explicit,
            ModeDirective::Exclude => QueryMode::Implicit,
        }
    }
}

/// Apply a mode directive to the current mode
///
/// The first directive sets the mode; a directive agreeing with the current
/// mode keeps it. A conflicting directive leaves the mode unchanged and yields
/// an `ambiguous_mode` error.
pub fn transition(current: QueryMode, directive: ModeDirective) -> (QueryMode, Option<QueryError>) {
    let target = directive.mode();
    if current == QueryMode::Default || current == target {
        (target, None)
    } else {
        (current, Some(QueryError::ambiguous_mode()))
    }
}

/// One filter term taken from the query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPredicate {
    /// Leaf attribute name
    pub name: String,

    /// Containing path, outermost first
    pub path: Vec<String>,

    /// Comparison operator
    pub operation: OperatorKind,

    /// Literal value as written in the query
    pub value: String,
}

impl FilterPredicate {
    pub fn new(field: &FieldPath, operation: OperatorKind, value: impl Into<String>) -> Self {
        Self {
            name: field.name.clone(),
            path: field.path.clone(),
            operation,
            value: value.into(),
        }
    }

    /// The attribute this predicate applies to
    pub fn field(&self) -> FieldPath {
        FieldPath::new(self.name.clone(), self.path.clone())
    }
}

/// Split a filter specifier (`age.gte`) into its field and operator
///
/// A trailing segment is taken as the operator only when the key has more than
/// one segment and the segment is a known operator. Otherwise the whole key is
/// the field and the operator is `eq`.
pub fn parse_filter_specifier(specifier: &str) -> (FieldPath, OperatorKind) {
    let mut segments: Vec<String> = specifier.split('.').map(str::to_string).collect();

    if segments.len() > 1 {
        if let Some(operation) = segments.last().and_then(|last| map_operator(last)) {
            segments.pop();
            return (FieldPath::from_segments(segments), operation);
        }
    }

    (FieldPath::from_segments(segments), OperatorKind::Eq)
}

/// The caller's shaping and filtering intent for one request
///
/// Built once from the raw query string and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Selection mode
    pub mode: QueryMode,

    /// Fields listed by `_include`
    pub include_fields: Vec<FieldPath>,

    /// Fields listed by `_exclude`
    pub exclude_fields: Vec<FieldPath>,

    /// Relations listed by `_link`
    pub link_relations: Vec<FieldPath>,

    /// Relations listed by `_embed`
    pub embed_relations: Vec<FieldPath>,

    /// Filter predicates, in encounter order
    pub filters: Vec<FilterPredicate>,

    /// Decoded arguments (key -> every value), in first-appearance order
    #[serde(skip)]
    pub arguments: IndexMap<String, Vec<String>>,

    /// False iff at least one error was recorded
    pub valid: bool,

    /// Problems found while parsing
    pub errors: Vec<QueryError>,
}

impl Default for ParsedQuery {
    fn default() -> Self {
        Self {
            mode: QueryMode::Default,
            include_fields: Vec::new(),
            exclude_fields: Vec::new(),
            link_relations: Vec::new(),
            embed_relations: Vec::new(),
            filters: Vec::new(),
            arguments: IndexMap::new(),
            valid: true,
            errors: Vec::new(),
        }
    }
}

impl ParsedQuery {
    /// Parse a raw query string
    ///
    /// Absent or empty input yields an empty, valid query.
    ///
    /// ```
    /// use shape::core::query::{ParsedQuery, QueryMode};
    ///
    /// let query = ParsedQuery::parse(Some("_include=name,email&age.gte=18"));
    /// assert_eq!(query.mode, QueryMode::Explicit);
    /// assert_eq!(query.include_fields.len(), 2);
    /// assert_eq!(query.filters[0].value, "18");
    /// ```
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();

        let Some(raw) = raw.map(|raw| raw.strip_prefix('?').unwrap_or(raw)) else {
            return query;
        };
        if raw.is_empty() {
            return query;
        }

        match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            Ok(pairs) => {
                let literal_replacement = raw.contains(char::REPLACEMENT_CHARACTER);
                for (key, value) in pairs {
                    if key.is_empty() {
                        continue;
                    }
                    // Percent-escapes that are not UTF-8 decode to U+FFFD.
                    if !literal_replacement
                        && (key.contains(char::REPLACEMENT_CHARACTER)
                            || value.contains(char::REPLACEMENT_CHARACTER))
                    {
                        query.errors.push(
                            QueryError::new(
                                QueryErrorCode::MalformedQuery,
                                "Query parameter is not valid UTF-8 once decoded",
                            )
                            .with_reference(key),
                        );
                        continue;
                    }
                    query.arguments.entry(key).or_default().push(value);
                }
            }
            Err(e) => {
                query.errors.push(
                    QueryError::new(QueryErrorCode::MalformedQuery, e.to_string())
                        .with_reference(raw),
                );
            }
        }

        let arguments = std::mem::take(&mut query.arguments);
        for (key, values) in &arguments {
            query.apply(key, values);
        }
        query.arguments = arguments;
        query.valid = query.errors.is_empty();

        if !query.valid {
            tracing::debug!(
                errors = query.errors.len(),
                "query string parsed with errors"
            );
        }

        query
    }

    /// Whether no error was recorded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Apply the selection mode to a list of top-level attribute names
    ///
    /// Only top-level fields take part: explicit mode keeps the names listed in
    /// `_include`, implicit mode drops the names listed in `_exclude`. Nested
    /// references (`owner.name`) are left to the serializer. Input order is
    /// preserved.
    pub fn select<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names.into_iter().map(|name| name.as_ref().to_string());

        match self.mode {
            QueryMode::Default => names.collect(),
            QueryMode::Explicit => names
                .filter(|name| {
                    self.include_fields
                        .iter()
                        .any(|f| f.is_top_level() && &f.name == name)
                })
                .collect(),
            QueryMode::Implicit => names
                .filter(|name| {
                    !self
                        .exclude_fields
                        .iter()
                        .any(|f| f.is_top_level() && &f.name == name)
                })
                .collect(),
        }
    }

    fn apply(&mut self, key: &str, values: &[String]) {
        match key {
            INCLUDE_KEY => self.apply_mode(ModeDirective::Include, values),
            EXCLUDE_KEY => self.apply_mode(ModeDirective::Exclude, values),
            LINK_KEY => self
                .link_relations
                .extend(tokens(values).map(FieldPath::parse)),
            EMBED_KEY => self
                .embed_relations
                .extend(tokens(values).map(FieldPath::parse)),
            specifier => {
                let (field, operation) = parse_filter_specifier(specifier);
                tracing::trace!(%field, %operation, "filter directive");
                self.filters.extend(
                    tokens(values).map(|value| FilterPredicate::new(&field, operation, value)),
                );
            }
        }
    }

    fn apply_mode(&mut self, directive: ModeDirective, values: &[String]) {
        let (mode, error) = transition(self.mode, directive);
        self.mode = mode;

        if let Some(error) = error {
            self.errors.push(error);
            return;
        }

        let fields = tokens(values).map(FieldPath::parse);
        match directive {
            ModeDirective::Include => self.include_fields.extend(fields),
            ModeDirective::Exclude => self.exclude_fields.extend(fields),
        }
    }
}

/// Split every value on `,`, skipping empty tokens
fn tokens(values: &[String]) -> impl Iterator<Item = &str> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .filter(|token| !token.is_empty())
}

/// Parse a raw query string into a [`ParsedQuery`]
pub fn parse_query(raw: Option<&str>) -> ParsedQuery {
    ParsedQuery::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, path: &[&str]) -> FieldPath {
        FieldPath::new(name, path.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_absent_and_empty_queries() {
        for raw in [None, Some(""), Some("?")] {
            let query = ParsedQuery::parse(raw);
            assert_eq!(query.mode, QueryMode::Default);
            assert!(query.include_fields.is_empty());
            assert!(query.exclude_fields.is_empty());
            assert!(query.filters.is_empty());
            assert!(query.is_valid());
        }
    }

    #[test]
    fn test_transition_table() {
        use ModeDirective::*;
        use QueryMode::*;

        assert_eq!(transition(Default, Include), (Explicit, None));
        assert_eq!(transition(Default, Exclude), (Implicit, None));
        assert_eq!(transition(Explicit, Include), (Explicit, None));
        assert_eq!(transition(Implicit, Exclude), (Implicit, None));

        let (mode, error) = transition(Explicit, Exclude);
        assert_eq!(mode, Explicit);
        assert_eq!(error.map(|e| e.code), Some(QueryErrorCode::AmbiguousMode));

        let (mode, error) = transition(Implicit, Include);
        assert_eq!(mode, Implicit);
        assert!(error.is_some());
    }

    #[test]
    fn test_include_sets_explicit_mode() {
        let query = ParsedQuery::parse(Some("_include=one,two.three"));
        assert_eq!(query.mode, QueryMode::Explicit);
        assert_eq!(
            query.include_fields,
            vec![field("one", &[]), field("three", &["two"])]
        );
    }

    #[test]
    fn test_exclude_sets_implicit_mode() {
        let query = ParsedQuery::parse(Some("_exclude=one&_exclude=two"));
        assert_eq!(query.mode, QueryMode::Implicit);
        assert_eq!(query.exclude_fields, vec![field("one", &[]), field("two", &[])]);
        assert!(query.is_valid());
    }

    #[test]
    fn test_include_and_exclude_is_ambiguous() {
        let query = ParsedQuery::parse(Some("_include=x&_exclude=y"));
        assert!(!query.is_valid());
        assert_eq!(query.errors.len(), 1);
        assert_eq!(query.errors[0].code, QueryErrorCode::AmbiguousMode);
        assert!(query.errors[0].reference.is_none());

        assert_eq!(query.mode, QueryMode::Explicit);
        assert_eq!(query.include_fields, vec![field("x", &[])]);
        assert!(query.exclude_fields.is_empty());
    }

    #[test]
    fn test_parsing_continues_after_error() {
        let query = ParsedQuery::parse(Some("_exclude=y&_include=x&_link=owner&status=active"));
        assert_eq!(query.errors.len(), 1);
        assert_eq!(query.mode, QueryMode::Implicit);
        assert_eq!(query.link_relations, vec![field("owner", &[])]);
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn test_link_and_embed_relations() {
        let query = ParsedQuery::parse(Some("_link=five.two&_embed=owner,company.address"));
        assert_eq!(query.link_relations, vec![field("two", &["five"])]);
        assert_eq!(
            query.embed_relations,
            vec![field("owner", &[]), field("address", &["company"])]
        );
        assert_eq!(query.mode, QueryMode::Default);
        assert!(query.is_valid());
    }

    #[test]
    fn test_filter_with_operator_suffix() {
        let query = ParsedQuery::parse(Some("age.gte=18"));
        assert_eq!(
            query.filters,
            vec![FilterPredicate {
                name: "age".to_string(),
                path: vec![],
                operation: OperatorKind::Gte,
                value: "18".to_string(),
            }]
        );
    }

    #[test]
    fn test_bare_filter_defaults_to_eq() {
        let query = ParsedQuery::parse(Some("status=active"));
        assert_eq!(query.filters[0].name, "status");
        assert_eq!(query.filters[0].operation, OperatorKind::Eq);
        assert_eq!(query.filters[0].value, "active");
    }

    #[test]
    fn test_unknown_suffix_is_part_of_the_field() {
        let query = ParsedQuery::parse(Some("owner.name=bob"));
        assert!(query.is_valid());
        assert_eq!(query.filters[0].field(), field("name", &["owner"]));
        assert_eq!(query.filters[0].operation, OperatorKind::Eq);
    }

    #[test]
    fn test_nested_filter_with_operator() {
        let (path, operation) = parse_filter_specifier("owner.address.city.like");
        assert_eq!(path, field("city", &["owner", "address"]));
        assert_eq!(operation, OperatorKind::Like);
    }

    #[test]
    fn test_single_segment_operator_name_is_a_field() {
        let (path, operation) = parse_filter_specifier("like");
        assert_eq!(path, field("like", &[]));
        assert_eq!(operation, OperatorKind::Eq);
    }

    #[test]
    fn test_repeated_filters_are_all_kept() {
        let query = ParsedQuery::parse(Some("status=active,pending&status=active"));
        let values: Vec<_> = query.filters.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["active", "pending", "active"]);
        assert!(query.filters.iter().all(|f| f.name == "status"));
    }

    #[test]
    fn test_values_are_url_decoded() {
        let query = ParsedQuery::parse(Some("name.like=John%20D%2A&city=New+York"));
        assert_eq!(query.filters[0].value, "John D*");
        assert_eq!(query.filters[1].value, "New York");
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        let query = ParsedQuery::parse(Some("_include=a,,b&status="));
        assert_eq!(query.include_fields, vec![field("a", &[]), field("b", &[])]);
        assert!(query.filters.is_empty());
        assert_eq!(query.arguments["status"], vec![String::new()]);
    }

    #[test]
    fn test_select_by_mode() {
        let names = ["id", "name", "email", "owner"];

        let query = ParsedQuery::parse(None);
        assert_eq!(query.select(names), vec!["id", "name", "email", "owner"]);

        let query = ParsedQuery::parse(Some("_include=email,id,owner.name"));
        assert_eq!(query.select(names), vec!["id", "email"]);

        let query = ParsedQuery::parse(Some("_exclude=email,owner.name"));
        assert_eq!(query.select(names), vec!["id", "name", "owner"]);
    }

    #[test]
    fn test_select_ignores_nested_includes() {
        let query = ParsedQuery::parse(Some("_include=owner.name"));
        assert!(query.select(["id", "owner"]).is_empty());
    }

    #[test]
    fn test_valid_flag_tracks_errors() {
        assert!(ParsedQuery::default().valid);
        assert!(ParsedQuery::parse(Some("_include=a")).valid);

        let query = ParsedQuery::parse(Some("_include=a&_exclude=b"));
        assert!(!query.valid);
        assert!(!query.is_valid());

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["valid"], false);
    }

    #[test]
    fn test_undecodable_escape_is_malformed() {
        let query = ParsedQuery::parse(Some("status=%FF&name=bob"));

        assert!(!query.is_valid());
        assert_eq!(query.errors.len(), 1);
        assert_eq!(query.errors[0].code, QueryErrorCode::MalformedQuery);
        assert_eq!(query.errors[0].reference.as_deref(), Some("status"));

        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].name, "name");
        assert!(!query.arguments.contains_key("status"));
    }

    #[test]
    fn test_literal_replacement_character_is_accepted() {
        let query = ParsedQuery::parse(Some("name=\u{FFFD}"));
        assert!(query.is_valid());
        assert_eq!(query.filters[0].value, "\u{FFFD}");
    }
}
