//! Registry of presenters, one per entity type

use std::collections::HashMap;
use std::sync::Arc;

use super::presenter::Presenter;
use crate::config::ProjectionConfig;
use crate::core::error::ConfigError;

/// Presenters for all entity types of an application
///
/// Built once at startup; presenters are handed out as `Arc` so request
/// handlers share their projection caches.
#[derive(Debug, Default)]
pub struct PresenterRegistry {
    presenters: HashMap<String, Arc<Presenter>>,
}

impl PresenterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            presenters: HashMap::new(),
        }
    }

    /// Build a registry from configuration
    ///
    /// Presenters that do not list `attributes` take them from `lookup`, keyed by
    /// entity type. Attributes missing from both fail with
    /// [`ConfigError::MissingAttributes`].
    pub fn from_config<F>(config: &ProjectionConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<Vec<String>>,
    {
        let mut registry = Self::new();

        for presenter_config in &config.presenters {
            let mut builder = Presenter::builder();
            if presenter_config.attributes.is_none() {
                if let Some(attributes) = lookup(&presenter_config.entity) {
                    builder = builder.with_attributes(attributes);
                }
            }

            let presenter = builder.with_config(presenter_config).build()?;
            registry.register(presenter_config.entity.clone(), presenter)?;
        }

        Ok(registry)
    }

    /// Register a presenter for an entity type
    pub fn register(
        &mut self,
        entity: impl Into<String>,
        presenter: Presenter,
    ) -> Result<Arc<Presenter>, ConfigError> {
        let entity = entity.into();
        if self.presenters.contains_key(&entity) {
            return Err(ConfigError::DuplicateEntity { entity });
        }

        tracing::debug!(
            entity = %entity,
            attributes = presenter.resolver().attributes().len(),
            "registered presenter"
        );

        let presenter = Arc::new(presenter);
        self.presenters.insert(entity, Arc::clone(&presenter));
        Ok(presenter)
    }

    /// Get the presenter of an entity type
    pub fn get(&self, entity: &str) -> Option<Arc<Presenter>> {
        self.presenters.get(entity).cloned()
    }

    /// Get all registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.presenters.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Direction;

    const YAML: &str = r#"
presenters:
  - entity: user
    attributes: [id, name, password_hash]
    exclude:
      all: [password_hash]
  - entity: car
    attributes: [id, brand]
"#;

    #[test]
    fn test_from_config() {
        let config = ProjectionConfig::from_yaml_str(YAML).unwrap();
        let registry = PresenterRegistry::from_config(&config, |_| None).unwrap();

        let mut types = registry.entity_types();
        types.sort();
        assert_eq!(types, vec!["car", "user"]);

        let user = registry.get("user").unwrap();
        assert_eq!(&*user.resolve(Direction::Render, "get"), ["id", "name"]);
        assert!(registry.get("order").is_none());
    }

    #[test]
    fn test_config_without_attributes_fails() {
        let config = ProjectionConfig::from_yaml_str("presenters:\n  - entity: user\n").unwrap();
        let lookup = |entity: &str| (entity == "car").then(|| vec!["id".to_string()]);

        let error = PresenterRegistry::from_config(&config, lookup).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::MissingAttributes { entity: Some(ref e) } if e == "user"
        ));
    }

    #[test]
    fn test_config_without_attributes_uses_lookup() {
        let config = ProjectionConfig::from_yaml_str(
            "presenters:\n  - entity: user\n    exclude:\n      all: [id]\n",
        )
        .unwrap();
        let lookup = |entity: &str| {
            (entity == "user").then(|| vec!["id".to_string(), "name".to_string()])
        };

        let registry = PresenterRegistry::from_config(&config, lookup).unwrap();
        let user = registry.get("user").unwrap();
        assert_eq!(&*user.resolve(Direction::Render, "get"), ["name"]);
    }

    #[test]
    fn test_configured_attributes_take_precedence_over_lookup() {
        let config = ProjectionConfig::from_yaml_str(YAML).unwrap();
        let lookup = |_: &str| Some(vec!["other".to_string()]);

        let registry = PresenterRegistry::from_config(&config, lookup).unwrap();
        let car = registry.get("car").unwrap();
        assert_eq!(&*car.resolve(Direction::Parse, "create"), ["id", "brand"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = PresenterRegistry::new();
        let presenter = || Presenter::builder().with_attributes(["id"]).build().unwrap();

        registry.register("user", presenter()).unwrap();
        let error = registry.register("user", presenter()).unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateEntity { .. }));
    }

    #[test]
    fn test_presenters_are_shared() {
        let mut registry = PresenterRegistry::new();
        let presenter = Presenter::builder().with_attributes(["id"]).build().unwrap();
        registry.register("user", presenter).unwrap();

        registry.get("user").unwrap().resolve(Direction::Render, "get");
        registry.get("user").unwrap().resolve(Direction::Render, "get");
        assert_eq!(registry.get("user").unwrap().derivations(), 1);
    }
}
