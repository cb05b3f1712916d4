//! Binding registry mapping binding names to forms and mapping functions.

use std::collections::HashMap;
use std::fmt;

use crate::data::FormData;
use crate::error::MappingError;
use crate::forms::FormKind;
use crate::value::Structure;

/// Mapping from raw submission data to the nested structure of a form.
pub type MapFn = fn(&FormData) -> Result<Structure, MappingError>;

/// A named rule adapting one class of raw submissions to a typed form.
#[derive(Clone)]
pub struct Binding {
    name: String,
    kind: FormKind,
    map_data: MapFn,
}

impl Binding {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FormKind, map_data: MapFn) -> Self {
        Self {
            name: name.into(),
            kind,
            map_data,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The form this binding produces, which also selects its handler.
    #[must_use]
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    /// Run the mapping function.
    pub fn map(&self, data: &FormData) -> Result<Structure, MappingError> {
        (self.map_data)(data)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Registry of bindings, keyed by exact name.
///
/// Built once at startup and then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, Binding>,
}

impl BindingRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in bindings.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for binding in crate::bindings::standard_bindings() {
            registry.register(binding);
        }
        registry
    }

    /// Register a binding, replacing any binding with the same name.
    pub fn register(&mut self, binding: Binding) {
        if let Some(previous) = self.bindings.insert(binding.name.clone(), binding) {
            tracing::warn!(binding = %previous.name, "binding replaced");
        }
    }

    /// Builder form of [`BindingRegistry::register`].
    #[must_use]
    pub fn with(mut self, binding: Binding) -> Self {
        self.register(binding);
        self
    }

    /// Look up a binding by exact name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Registered binding names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(_: &FormData) -> Result<Structure, MappingError> {
        Ok(Structure::new().with("sprayingForm", Structure::new().with("evaluation", "ok")))
    }

    #[test]
    fn test_register_and_resolve() {
        let registry =
            BindingRegistry::new().with(Binding::new("custom", FormKind::Spraying, constant));

        let binding = registry.resolve("custom").unwrap();
        assert_eq!(binding.name(), "custom");
        assert_eq!(binding.kind(), FormKind::Spraying);

        let data = FormData::from_payload(&json!({"data": {}})).unwrap();
        assert_eq!(binding.map(&data).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = BindingRegistry::standard();
        assert!(registry.resolve("location").is_some());
        assert!(registry.resolve("Location").is_none());
        assert!(registry.resolve("location ").is_none());
        assert!(registry.resolve("loc").is_none());
    }

    #[test]
    fn test_standard_names() {
        let registry = BindingRegistry::standard();
        assert_eq!(
            registry.names(),
            vec!["duplicate_location", "location", "spraying"]
        );
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let registry = BindingRegistry::standard()
            .with(Binding::new("location", FormKind::Spraying, constant));
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.resolve("location").map(Binding::kind),
            Some(FormKind::Spraying)
        );
    }
}
