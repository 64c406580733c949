//! Presenters shape entities on the way out and payloads on the way in

use std::sync::Arc;

use serde_json::Value;

use super::{Direction, Projected, Record, resolver::ProjectionResolver};
use crate::config::{PresenterConfig, ProjectionRuleSet, RuleLayers};
use crate::core::entity::{Attributes, Model};
use crate::core::error::{ConfigError, PresenterError, json_kind};

/// Builder for [`Presenter`]
///
/// An attribute enumerator (`with_model` or `with_attributes`) is mandatory.
///
/// # Example
///
/// ```ignore
/// let presenter = Presenter::builder()
///     .with_entity("user")
///     .with_model::<User>()
///     .with_exclude(RuleLayers::new().all(["password_hash"]))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct PresenterBuilder {
    entity: Option<String>,
    attributes: Option<Vec<String>>,
    rules: ProjectionRuleSet,
}

impl PresenterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the entity type (used in logs and errors)
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Take declared attributes from a model type
    pub fn with_model<M: Model>(mut self) -> Self {
        self.attributes = Some(M::attribute_names().iter().map(|s| s.to_string()).collect());
        self
    }

    /// Declare attributes explicitly, in declaration order
    pub fn with_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rules(mut self, rules: ProjectionRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_include(mut self, include: RuleLayers) -> Self {
        self.rules.include = Some(include);
        self
    }

    pub fn with_exclude(mut self, exclude: RuleLayers) -> Self {
        self.rules.exclude = Some(exclude);
        self
    }

    /// Apply a loaded presenter configuration
    ///
    /// Attributes listed in the configuration replace any set so far.
    pub fn with_config(mut self, config: &PresenterConfig) -> Self {
        self.entity = Some(config.entity.clone());
        if let Some(attributes) = &config.attributes {
            self.attributes = Some(attributes.clone());
        }
        self.rules = config.rules.clone();
        self
    }

    pub fn build(self) -> Result<Presenter, ConfigError> {
        let Some(attributes) = self.attributes else {
            return Err(ConfigError::MissingAttributes {
                entity: self.entity,
            });
        };

        Ok(Presenter {
            entity: self.entity,
            resolver: ProjectionResolver::new(attributes, self.rules),
        })
    }
}

/// Shapes one entity type's data per direction and operation
#[derive(Debug)]
pub struct Presenter {
    entity: Option<String>,
    resolver: ProjectionResolver,
}

impl Presenter {
    pub fn builder() -> PresenterBuilder {
        PresenterBuilder::new()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn resolver(&self) -> &ProjectionResolver {
        &self.resolver
    }

    /// Attribute set for a `(direction, operation)` pair
    pub fn resolve(&self, direction: Direction, operation: &str) -> Arc<[String]> {
        self.resolver.resolve(direction, operation)
    }

    /// See [`ProjectionResolver::derivations`]
    pub fn derivations(&self) -> usize {
        self.resolver.derivations()
    }

    /// Render one entity
    ///
    /// Every resolved attribute appears in the record; attributes the entity
    /// does not have are rendered as `null`.
    pub fn render<E: Attributes + ?Sized>(&self, entity: &E, operation: &str) -> Record {
        self.resolve(Direction::Render, operation)
            .iter()
            .map(|name| {
                let value = entity.attribute(name).unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect()
    }

    /// Render a sequence of entities, preserving order
    pub fn render_many<E: Attributes>(&self, entities: &[E], operation: &str) -> Vec<Record> {
        entities
            .iter()
            .map(|entity| self.render(entity, operation))
            .collect()
    }

    /// Render a JSON object or an array of JSON objects
    pub fn render_value(&self, data: &Value, operation: &str) -> Result<Projected, PresenterError> {
        self.shape_value(data, |object| self.render(object, operation))
    }

    /// Keep only the accepted attributes of an inbound payload
    ///
    /// Accepted attributes missing from the payload are omitted, never invented.
    pub fn parse<E: Attributes + ?Sized>(&self, data: &E, operation: &str) -> Record {
        self.resolve(Direction::Parse, operation)
            .iter()
            .filter_map(|name| data.attribute(name).map(|value| (name.clone(), value)))
            .collect()
    }

    /// Parse a sequence of payloads, preserving order
    pub fn parse_many<E: Attributes>(&self, data: &[E], operation: &str) -> Vec<Record> {
        data.iter().map(|item| self.parse(item, operation)).collect()
    }

    /// Parse a JSON object or an array of JSON objects
    pub fn parse_value(&self, data: &Value, operation: &str) -> Result<Projected, PresenterError> {
        self.shape_value(data, |object| self.parse(object, operation))
    }

    fn shape_value<F>(&self, data: &Value, shape: F) -> Result<Projected, PresenterError>
    where
        F: Fn(&serde_json::Map<String, Value>) -> Record,
    {
        match data {
            Value::Object(object) => Ok(Projected::One(shape(object))),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(shape(object)),
                    other => Err(PresenterError::InvalidPayload {
                        expected: "object",
                        found: json_kind(other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Projected::Many),
            other => Err(PresenterError::InvalidPayload {
                expected: "object or array of objects",
                found: json_kind(other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Account;

    impl Model for Account {
        fn attribute_names() -> &'static [&'static str] {
            &["one", "two"]
        }
    }

    fn presenter() -> Presenter {
        Presenter::builder().with_model::<Account>().build().unwrap()
    }

    #[test]
    fn test_build_without_attributes_fails() {
        let result = Presenter::builder().with_entity("account").build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingAttributes { entity: Some(ref e) }) if e == "account"
        ));
    }

    #[test]
    fn test_render_single_entity() {
        let record = presenter().render(&json!({ "one": "Test", "three": "hidden" }), "get");

        assert_eq!(record.len(), 2);
        assert_eq!(record["one"], json!("Test"));
        assert_eq!(record["two"], Value::Null);
        assert!(!record.contains_key("three"));
    }

    #[test]
    fn test_render_keeps_resolved_order() {
        let presenter = Presenter::builder()
            .with_attributes(["b", "a"])
            .with_include(RuleLayers::new().all(["c"]))
            .build()
            .unwrap();
        let record = presenter.render(&json!({ "a": 1, "b": 2, "c": 3 }), "get");

        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_render_many_is_element_wise() {
        let presenter = presenter();
        let a = json!({ "one": "A" });
        let b = json!({ "one": "B", "two": 2 });

        let records = presenter.render_many(&[a.clone(), b.clone()], "get");
        assert_eq!(records, vec![presenter.render(&a, "get"), presenter.render(&b, "get")]);
    }

    #[test]
    fn test_parse_drops_unaccepted_and_never_invents() {
        let presenter = Presenter::builder()
            .with_model::<Account>()
            .with_exclude(RuleLayers::new().direction_all(Direction::Parse, ["two"]))
            .build()
            .unwrap();

        let record = presenter.parse(&json!({ "one": 1, "two": 2 }), "create");
        assert_eq!(record, Record::from([("one".to_string(), json!(1))]));

        let record = presenter.parse(&json!({ "two": 2 }), "create");
        assert!(record.is_empty());
    }

    #[test]
    fn test_parse_keeps_explicit_null() {
        let record = presenter().parse(&json!({ "one": null }), "update");
        assert_eq!(record.get("one"), Some(&Value::Null));
        assert!(!record.contains_key("two"));
    }

    #[test]
    fn test_value_variants() {
        let presenter = presenter();

        let one = presenter.render_value(&json!({ "one": 1 }), "get").unwrap();
        assert!(matches!(one, Projected::One(_)));

        let many = presenter
            .parse_value(&json!([{ "one": 1 }, { "two": 2 }]), "create")
            .unwrap();
        assert_eq!(many.len(), 2);

        let error = presenter.render_value(&json!("nope"), "get").unwrap_err();
        assert!(matches!(
            error,
            PresenterError::InvalidPayload { found: "string", .. }
        ));

        let error = presenter.parse_value(&json!([{ "one": 1 }, 3]), "create").unwrap_err();
        assert!(matches!(
            error,
            PresenterError::InvalidPayload { expected: "object", found: "number" }
        ));
    }

    #[test]
    fn test_projected_serializes_untagged() {
        let presenter = presenter();
        let many = presenter.render_value(&json!([{ "one": 1, "two": 2 }]), "get").unwrap();

        let json = serde_json::to_string(&many).unwrap();
        assert_eq!(json, r#"[{"one":1,"two":2}]"#);
    }
}
