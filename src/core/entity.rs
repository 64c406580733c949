//! Entity traits: the collaborators a presenter reads from
//!
//! A presenter needs two things from the domain model:
//! - the ordered list of declared attribute names ([`Model`])
//! - a get-by-name accessor on an entity instance ([`Attributes`])

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Declared attributes of an entity type, in declaration order
pub trait Model {
    /// Names of the attributes declared by the domain model
    fn attribute_names() -> &'static [&'static str];
}

/// Get-by-name access to an entity instance's current values
pub trait Attributes {
    /// Current value of the named attribute, or `None` if the entity has no such attribute
    fn attribute(&self, name: &str) -> Option<Value>;
}

impl Attributes for Map<String, Value> {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Attributes for IndexMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Attributes for Value {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|object| object.attribute(name))
    }
}

impl<T: Attributes + ?Sized> Attributes for &T {
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }
}
