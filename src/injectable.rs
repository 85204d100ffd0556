//! Constructor introspection.
//!
//! A type opts into self-construction by implementing [`Injectable`]: it
//! lists its constructor parameters in declared order and builds itself
//! from the resolved [`Arguments`]. The container needs nothing else about
//! the type.
//!
//! Each [`Parameter`] has a name, an optional declared abstract (a typed
//! dependency) and an optional default value. Parameters without a declared
//! abstract are primitives: they are filled from overrides, from a
//! contextual binding keyed by the parameter name, or from their default.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::{downcast, downcast_dyn, AnyArc};

/// A type the container can construct on its own.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Arguments, Container, DiResult, Injectable, Parameter};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &Arguments) -> DiResult<Self> {
///         Ok(Clock)
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
///     workers: usize,
/// }
///
/// impl Injectable for Scheduler {
///     fn dependencies() -> Vec<Parameter> {
///         vec![
///             Parameter::typed::<Clock>("clock"),
///             Parameter::primitive("workers").default_value(4usize),
///         ]
///     }
///
///     fn construct(args: &Arguments) -> DiResult<Self> {
///         Ok(Scheduler {
///             clock: args.get("clock")?,
///             workers: args.cloned("workers")?,
///         })
///     }
/// }
///
/// let container = Container::new();
/// let scheduler = container.make_type::<Scheduler>().unwrap();
/// assert_eq!(scheduler.workers, 4);
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    /// Constructor parameters in declared order.
    fn dependencies() -> Vec<Parameter> {
        Vec::new()
    }

    fn construct(args: &Arguments) -> DiResult<Self>;
}

/// Erased constructor of an [`Injectable`] type.
#[derive(Clone, Copy)]
pub struct Blueprint {
    type_id: TypeId,
    type_name: &'static str,
    dependencies: fn() -> Vec<Parameter>,
    construct: fn(&Arguments) -> DiResult<AnyArc>,
}

impl Blueprint {
    pub fn of<T: Injectable>() -> Self {
        fn construct_erased<T: Injectable>(args: &Arguments) -> DiResult<AnyArc> {
            T::construct(args).map(|value| Arc::new(value) as AnyArc)
        }

        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: T::dependencies,
            construct: construct_erased::<T>,
        }
    }

    pub fn key(&self) -> Key {
        Key::Type(self.type_id, self.type_name, Some(*self))
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn dependencies(&self) -> Vec<Parameter> {
        (self.dependencies)()
    }

    pub fn construct(&self, args: &Arguments) -> DiResult<AnyArc> {
        (self.construct)(args)
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint").field("type", &self.type_name).finish()
    }
}

/// One constructor (or callable) parameter.
#[derive(Clone)]
pub struct Parameter {
    name: Cow<'static, str>,
    declared: Option<Key>,
    blueprint: Option<Blueprint>,
    default: Option<AnyArc>,
}

impl Parameter {
    /// A dependency on an injectable type; unbound types self-construct.
    pub fn typed<T: Injectable>(name: impl Into<Cow<'static, str>>) -> Self {
        let blueprint = Blueprint::of::<T>();
        Self {
            name: name.into(),
            declared: Some(blueprint.key()),
            blueprint: Some(blueprint),
            default: None,
        }
    }

    /// A dependency on a type or trait object that must be bound.
    pub fn bound<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::keyed(name, Key::of::<T>())
    }

    /// A dependency on an arbitrary abstract identifier.
    pub fn keyed(name: impl Into<Cow<'static, str>>, key: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            declared: Some(key.into()),
            blueprint: None,
            default: None,
        }
    }

    /// A parameter with no declared type.
    pub fn primitive(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            declared: None,
            blueprint: None,
            default: None,
        }
    }

    pub fn default_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    pub fn default_any(mut self, value: AnyArc) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn owned_name(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    pub fn declared(&self) -> Option<&Key> {
        self.declared.as_ref()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn default(&self) -> Option<&AnyArc> {
        self.default.as_ref()
    }

    pub fn is_primitive(&self) -> bool {
        self.declared.is_none()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Resolved values for a parameter list, in declared order.
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<(Cow<'static, str>, AnyArc)>,
}

impl Arguments {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: Cow<'static, str>, value: AnyArc) {
        self.values.push((name, value));
    }

    /// Erased value for `name`.
    pub fn get_any(&self, name: &str) -> Option<&AnyArc> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let value = self
            .get_any(name)
            .cloned()
            .ok_or_else(|| DiError::missing_argument(name))?;
        downcast::<T>(value)
    }

    /// Trait-object argument stored as `Arc<Arc<T>>`.
    pub fn get_dyn<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        let value = self
            .get_any(name)
            .cloned()
            .ok_or_else(|| DiError::missing_argument(name))?;
        downcast_dyn::<T>(value)
    }

    pub fn cloned<T: Any + Send + Sync + Clone>(&self, name: &str) -> DiResult<T> {
        self.get::<T>(name).map(|value| (*value).clone())
    }

    /// Value at declared position `index`.
    pub fn at(&self, index: usize) -> Option<&AnyArc> {
        self.values.get(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnyArc)> {
        self.values.iter().map(|(n, v)| (n.as_ref(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(n, _)| n))
            .finish()
    }
}

/// Implements [`Injectable`] for a struct whose fields are `Arc`s of
/// injectable dependencies.
///
/// ```rust
/// use ferrous_container::{injectable, Container};
/// use std::sync::Arc;
///
/// struct Config;
/// injectable!(Config {});
///
/// struct Repository {
///     config: Arc<Config>,
/// }
/// injectable!(Repository { config: Config });
///
/// let container = Container::new();
/// let repo = container.make_type::<Repository>().unwrap();
/// let _config: &Config = &repo.config;
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty { $($field:ident : $dep:ty),* $(,)? }) => {
        impl $crate::Injectable for $ty {
            fn dependencies() -> ::std::vec::Vec<$crate::Parameter> {
                vec![$($crate::Parameter::typed::<$dep>(stringify!($field))),*]
            }

            #[allow(unused_variables)]
            fn construct(args: &$crate::Arguments) -> $crate::DiResult<Self> {
                Ok(Self { $($field: args.get::<$dep>(stringify!($field))?),* })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;
    impl Injectable for Leaf {
        fn construct(_: &Arguments) -> DiResult<Self> {
            Ok(Leaf)
        }
    }

    #[test]
    fn typed_parameter_carries_blueprint() {
        let param = Parameter::typed::<Leaf>("leaf");
        assert_eq!(param.declared(), Some(&Key::of::<Leaf>()));
        assert_eq!(param.blueprint().map(Blueprint::type_id), Some(TypeId::of::<Leaf>()));
        assert!(!param.is_primitive());
    }

    #[test]
    fn primitive_parameter_has_no_declared_key() {
        let param = Parameter::primitive("port").default_value(80u16);
        assert!(param.is_primitive());
        assert!(param.default().is_some());
    }

    #[test]
    fn arguments_lookup_by_name() {
        let mut args = Arguments::default();
        args.push("a".into(), Arc::new(1u8));
        args.push("b".into(), Arc::new(String::from("two")));

        assert_eq!(args.cloned::<u8>("a").unwrap(), 1);
        assert_eq!(args.get::<String>("b").unwrap().as_str(), "two");
        assert_eq!(args.get::<u8>("b").err(), Some(DiError::TypeMismatch("u8")));
        assert!(args.get::<u8>("c").unwrap_err().is_binding_resolution());
        assert!(args.at(1).is_some());
    }

    #[test]
    fn blueprint_constructs_erased_instance() {
        let blueprint = Blueprint::of::<Leaf>();
        let instance = blueprint.construct(&Arguments::default()).unwrap();
        assert!(instance.downcast::<Leaf>().is_ok());
        assert!(blueprint.dependencies().is_empty());
    }
}
