//! Method bindings and call targets.
//!
//! A method binding maps a `Type@method` key to a callback receiving the
//! resolved receiver instance. Keys are parsed once, when the binding or call
//! target is created; nothing re-splits strings at call time.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::injectable::{Arguments, Parameter};
use crate::internal::Map;
use crate::key::Key;
use crate::registration::AnyArc;

/// `Type@method`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub target: Key,
    pub method: Cow<'static, str>,
}

impl MethodKey {
    pub fn new(target: impl Into<Key>, method: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
        }
    }

    /// Method key on a type receiver.
    pub fn of<T: ?Sized + 'static>(method: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Key::of::<T>(), method)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.target, self.method)
    }
}

impl FromStr for MethodKey {
    type Err = DiError;

    /// Parses `Type@method`; a missing or empty method segment is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((target, method)) if !target.is_empty() && !method.is_empty() => Ok(Self::new(
                Key::named(target.to_string()),
                method.to_string(),
            )),
            _ => Err(DiError::method_not_specified(s)),
        }
    }
}

/// Callback bound to a method key.
pub type MethodCallback = Arc<dyn Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync>;

/// Callback that also receives its injected arguments.
pub type InjectedMethodCallback =
    Arc<dyn Fn(AnyArc, &Arguments, &Container) -> DiResult<AnyArc> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum MethodBinding {
    Plain(MethodCallback),
    Injected {
        parameters: Arc<[Parameter]>,
        callback: InjectedMethodCallback,
    },
}

#[derive(Default)]
pub(crate) struct MethodBindings {
    map: Map<MethodKey, MethodBinding>,
}

impl MethodBindings {
    pub(crate) fn insert(&mut self, key: MethodKey, binding: MethodBinding) {
        self.map.insert(key, binding);
    }

    pub(crate) fn get(&self, key: &MethodKey) -> Option<MethodBinding> {
        self.map.get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &MethodKey) -> bool {
        self.map.contains_key(key)
    }
}

/// A plain callable with declared parameters.
///
/// ```rust
/// use ferrous_container::{Callable, CallTarget, Container, Parameter, Parameters};
///
/// let container = Container::new();
/// container.set("base", 40i64).unwrap();
///
/// let add = Callable::returning(
///     vec![Parameter::keyed("base", "base"), Parameter::primitive("delta")],
///     |args| Ok(*args.get::<i64>("base")? + *args.get::<i64>("delta")?),
/// );
///
/// let out = container
///     .call(CallTarget::from(add), Parameters::new().with("delta", 2i64), None)
///     .unwrap();
/// assert_eq!(*out.downcast::<i64>().unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Callable {
    parameters: Arc<[Parameter]>,
    body: Arc<dyn Fn(&Arguments, &Container) -> DiResult<AnyArc> + Send + Sync>,
}

impl Callable {
    pub fn new<F>(parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(&Arguments, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into(),
            body: Arc::new(body),
        }
    }

    /// Callable whose result is erased for the caller.
    pub fn returning<T, F>(parameters: Vec<Parameter>, body: F) -> Self
    where
        T: std::any::Any + Send + Sync,
        F: Fn(&Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(parameters, move |args, _| {
            body(args).map(|value| Arc::new(value) as AnyArc)
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, args: &Arguments, container: &Container) -> DiResult<AnyArc> {
        (self.body)(args, container)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Receiver of a method call.
#[derive(Clone)]
pub enum Receiver {
    /// Resolved through the container first
    Abstract(Key),
    Instance(AnyArc),
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Abstract(key) => f.debug_tuple("Abstract").field(key).finish(),
            Receiver::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// What `Container::call` invokes.
#[derive(Clone, Debug)]
pub enum CallTarget {
    Callable(Callable),
    Method {
        receiver: Receiver,
        method: Option<Cow<'static, str>>,
    },
}

impl CallTarget {
    /// Parses `Type@method` or a bare `Type` (method supplied later as default).
    pub fn parse(target: &str) -> Self {
        match target.split_once('@') {
            Some((ty, method)) => CallTarget::Method {
                receiver: Receiver::Abstract(Key::named(ty.to_string())),
                method: (!method.is_empty()).then(|| Cow::Owned(method.to_string())),
            },
            None => CallTarget::Method {
                receiver: Receiver::Abstract(Key::named(target.to_string())),
                method: None,
            },
        }
    }

    /// `[type, method]` pair.
    pub fn method(receiver: impl Into<Key>, method: impl Into<Cow<'static, str>>) -> Self {
        CallTarget::Method {
            receiver: Receiver::Abstract(receiver.into()),
            method: Some(method.into()),
        }
    }

    /// `[instance, method]` pair.
    pub fn on_instance(instance: AnyArc, method: impl Into<Cow<'static, str>>) -> Self {
        CallTarget::Method {
            receiver: Receiver::Instance(instance),
            method: Some(method.into()),
        }
    }
}

impl From<Callable> for CallTarget {
    fn from(callable: Callable) -> Self {
        CallTarget::Callable(callable)
    }
}

impl From<MethodKey> for CallTarget {
    fn from(key: MethodKey) -> Self {
        CallTarget::Method {
            receiver: Receiver::Abstract(key.target),
            method: Some(key.method),
        }
    }
}

impl From<&str> for CallTarget {
    fn from(target: &str) -> Self {
        CallTarget::parse(target)
    }
}
