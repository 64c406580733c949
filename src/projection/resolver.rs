//! Memoized resolution of projection rules
//!
//! Resolution starts from the declared attributes, removes the four exclude
//! layers, then appends the four include layers. Inclusion runs strictly after
//! exclusion, so a name both excluded and included is always kept.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::Direction;
use crate::config::ProjectionRuleSet;

/// Cache key of one resolved projection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub direction: Direction,
    pub operation: String,
}

impl ProjectionKey {
    pub fn new(direction: Direction, operation: impl Into<String>) -> Self {
        Self {
            direction,
            operation: operation.into(),
        }
    }
}

/// Resolves and caches attribute sets per `(direction, operation)`
///
/// Safe to share between threads. Two threads missing the cache for the same
/// key may both derive it; the first insert wins and the results are identical.
#[derive(Debug)]
pub struct ProjectionResolver {
    attributes: Vec<String>,
    rules: ProjectionRuleSet,
    cache: RwLock<HashMap<ProjectionKey, Arc<[String]>>>,
    derivations: AtomicUsize,
}

impl ProjectionResolver {
    /// Create a resolver from declared attributes (in declaration order) and rules
    pub fn new(attributes: Vec<String>, rules: ProjectionRuleSet) -> Self {
        Self {
            attributes,
            rules,
            cache: RwLock::new(HashMap::new()),
            derivations: AtomicUsize::new(0),
        }
    }

    /// Declared attributes
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn rules(&self) -> &ProjectionRuleSet {
        &self.rules
    }

    /// Attribute set for a `(direction, operation)` pair
    pub fn resolve(&self, direction: Direction, operation: &str) -> Arc<[String]> {
        let key = ProjectionKey::new(direction, operation);

        if let Some(names) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(names);
        }

        let derived: Arc<[String]> = self.derive(direction, operation).into();

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(key).or_insert(derived))
    }

    /// Number of times a projection was derived instead of served from cache
    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::Relaxed)
    }

    fn derive(&self, direction: Direction, operation: &str) -> Vec<String> {
        self.derivations.fetch_add(1, Ordering::Relaxed);

        let mut names = self.attributes.clone();

        if let Some(exclude) = &self.rules.exclude {
            for layer in exclude.layers(direction, operation) {
                names.retain(|name| !layer.contains(name));
            }
        }

        if let Some(include) = &self.rules.include {
            for layer in include.layers(direction, operation) {
                for name in layer {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
        }

        tracing::debug!(
            %direction,
            operation,
            attributes = names.len(),
            "derived projection"
        );

        names
    }
}
