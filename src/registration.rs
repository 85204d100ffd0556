//! Binding registration types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::injectable::Injectable;
use crate::internal::{Map, Set};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::parameters::Parameters;

/// Type-erased Arc for storage
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Erased factory invoked with the container and the active overrides.
pub type FactoryFn = Arc<dyn Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync>;

/// What an abstract resolves to.
///
/// `Abstract` delegates to another identifier (or, when it names the
/// identifier being resolved, to reflective construction). `Factory` is
/// invoked directly.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Concrete, Container, Key};
///
/// struct Mailer { host: &'static str }
///
/// let container = Container::new();
/// container.bind("mailer.default", Concrete::factory(|_| Ok(Mailer { host: "smtp" }))).unwrap();
/// container.bind("mailer", Key::from("mailer.default")).unwrap();
///
/// let mailer = container.make_as::<Mailer>("mailer").unwrap();
/// assert_eq!(mailer.host, "smtp");
/// ```
#[derive(Clone)]
pub enum Concrete {
    Abstract(Key),
    Factory(FactoryFn),
}

impl Concrete {
    /// Factory producing a `T` from the container.
    pub fn factory<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(move |container, _| {
            f(container).map(|value| Arc::new(value) as AnyArc)
        }))
    }

    /// Factory that also sees the active parameter overrides.
    pub fn factory_with<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> DiResult<T> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(move |container, params| {
            f(container, params).map(|value| Arc::new(value) as AnyArc)
        }))
    }

    /// Factory returning an already erased instance.
    pub fn factory_any<F>(f: F) -> Self
    where
        F: Fn(&Container, &Parameters) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(f))
    }

    /// Factory for a trait object; the `Arc<T>` is stored inside the erased handle.
    pub fn factory_dyn<T, F>(f: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        Concrete::Factory(Arc::new(move |container, _| {
            f(container).map(|value| Arc::new(value) as AnyArc)
        }))
    }

    /// Factory that hands out the same value every time.
    pub fn constant<T: Any + Send + Sync>(value: T) -> Self {
        let value: AnyArc = Arc::new(value);
        Concrete::Factory(Arc::new(move |_, _| Ok(value.clone())))
    }

    /// Delegates to an injectable type, carrying its constructor.
    pub fn of<T: Injectable>() -> Self {
        Concrete::Abstract(Key::injectable::<T>())
    }

    pub fn as_abstract(&self) -> Option<&Key> {
        match self {
            Concrete::Abstract(key) => Some(key),
            Concrete::Factory(_) => None,
        }
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Abstract(key) => f.debug_tuple("Abstract").field(key).finish(),
            Concrete::Factory(_) => f.write_str("Factory(<closure>)"),
        }
    }
}

impl From<Key> for Concrete {
    fn from(key: Key) -> Self {
        Concrete::Abstract(key)
    }
}

impl From<FactoryFn> for Concrete {
    fn from(factory: FactoryFn) -> Self {
        Concrete::Factory(factory)
    }
}

/// Registered binding for one abstract
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) factory: FactoryFn,
    pub(crate) lifetime: Lifetime,
    /// Identifier the binding delegates to, when it was not a closure
    pub(crate) target: Option<Key>,
}

/// Bindings, cached instances and resolved markers
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) bindings: Map<Key, Binding>,
    pub(crate) instances: Map<Key, AnyArc>,
    pub(crate) resolved: Set<Key>,
}

impl Registry {
    pub(crate) fn is_shared(&self, key: &Key) -> bool {
        self.instances.contains_key(key)
            || self
                .bindings
                .get(key)
                .map(|b| b.lifetime.is_shared())
                .unwrap_or(false)
    }

    /// Drops the instance, binding and resolved marker for `key`.
    pub(crate) fn forget(&mut self, key: &Key) {
        self.bindings.remove(key);
        self.instances.remove(key);
        self.resolved.remove(key);
    }

    pub(crate) fn clear(&mut self) {
        self.bindings.clear();
        self.instances.clear();
        self.resolved.clear();
    }
}

/// Downcasts an erased instance to a concrete type.
pub fn downcast<T: Any + Send + Sync>(instance: AnyArc) -> DiResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::type_mismatch(std::any::type_name::<T>()))
}

/// Unwraps a trait object stored as `Arc<Arc<T>>`.
pub fn downcast_dyn<T: ?Sized + Send + Sync + 'static>(instance: AnyArc) -> DiResult<Arc<T>> {
    instance
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::type_mismatch(std::any::type_name::<T>()))
}
