//! Contextual bindings: overrides that apply only while a specific concrete
//! is being built.

use std::any::Any;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::internal::Map;
use crate::key::Key;
use crate::registration::Concrete;

/// `(building concrete, needed abstract) -> implementation`
#[derive(Default)]
pub(crate) struct ContextualBindings {
    map: Map<Key, Map<Key, Concrete>>,
}

impl ContextualBindings {
    pub(crate) fn add(&mut self, concrete: Key, needs: Key, implementation: Concrete) {
        self.map.entry(concrete).or_default().insert(needs, implementation);
    }

    pub(crate) fn find(&self, building: &Key, needs: &Key) -> Option<Concrete> {
        self.map.get(building).and_then(|m| m.get(needs)).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.values().map(Map::len).sum()
    }
}

/// Fluent builder returned by [`Container::when`].
///
/// ```rust
/// use ferrous_container::{Concrete, Container, Key};
///
/// let container = Container::new();
/// container.set("greeting", "hello").unwrap();
/// container
///     .when("Controller").unwrap()
///     .needs("greeting")
///     .give(Concrete::constant("bonjour"))
///     .unwrap();
/// ```
#[must_use = "a contextual binding is only recorded by `give`"]
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    concrete: Key,
    needs: Option<Key>,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c Container, concrete: Key) -> Self {
        Self {
            container,
            concrete,
            needs: None,
        }
    }

    /// The abstract whose resolution is overridden.
    pub fn needs(mut self, abstract_key: impl Into<Key>) -> Self {
        self.needs = Some(abstract_key.into());
        self
    }

    /// Commits the override.
    pub fn give(self, implementation: impl Into<Concrete>) -> DiResult<()> {
        let needs = self.needs.ok_or_else(|| {
            DiError::BindingResolution(format!(
                "Contextual binding for [{}] is missing its `needs` target",
                self.concrete
            ))
            .logged()
        })?;
        self.container
            .add_contextual_binding(self.concrete, needs, implementation.into())
    }

    /// Commits a fixed value as the override.
    pub fn give_value<T: Any + Send + Sync>(self, value: T) -> DiResult<()> {
        self.give(Concrete::constant(value))
    }
}
