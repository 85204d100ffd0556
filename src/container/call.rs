//! Call dispatch and method bindings.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

use super::Container;
use crate::error::{DiError, DiResult};
use crate::injectable::{Arguments, Parameter};
use crate::key::Key;
use crate::method::{CallTarget, Callable, MethodBinding, MethodKey, Receiver};
use crate::parameters::Parameters;
use crate::registration::{downcast, AnyArc};

impl Container {
    /// Binds `key` to a callback invoked with `(instance, container)`.
    pub fn bind_method<F>(&self, key: MethodKey, callback: F)
    where
        F: Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.insert_method_binding(key, MethodBinding::Plain(Arc::new(callback)));
    }

    /// Typed [`bind_method`](Self::bind_method): the receiver is downcast to `T`.
    pub fn bind_method_as<T, R, F>(&self, key: MethodKey, callback: F)
    where
        T: Any + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(Arc<T>, &Container) -> DiResult<R> + Send + Sync + 'static,
    {
        self.bind_method(key, move |instance, container| {
            let receiver = downcast::<T>(instance)?;
            callback(receiver, container).map(|value| Arc::new(value) as AnyArc)
        });
    }

    /// Method binding whose own parameters are injected before it runs.
    pub fn bind_method_with<F>(&self, key: MethodKey, parameters: Vec<Parameter>, callback: F)
    where
        F: Fn(AnyArc, &Arguments, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.insert_method_binding(
            key,
            MethodBinding::Injected {
                parameters: parameters.into(),
                callback: Arc::new(callback),
            },
        );
    }

    fn insert_method_binding(&self, key: MethodKey, binding: MethodBinding) {
        #[cfg(feature = "tracing")]
        debug!(method = %key, "method binding registered");

        self.methods.borrow_mut().insert(key, binding);
    }

    pub fn has_method_binding(&self, key: &MethodKey) -> bool {
        self.methods.borrow().contains(key)
    }

    /// Invokes the binding for `key` on `instance`.
    pub fn call_method_binding(&self, key: &MethodKey, instance: AnyArc) -> DiResult<AnyArc> {
        let binding = self
            .methods
            .borrow()
            .get(key)
            .ok_or_else(|| DiError::unbound_method(&key.to_string()))?;
        self.invoke_method_binding(binding, instance, Parameters::new())
    }

    /// Calls a callable or a bound method, injecting its dependencies.
    ///
    /// `Type@method` targets and `[type, method]` pairs resolve the receiver
    /// through the container first. A target without a method uses
    /// `default_method`, failing with `MethodNotSpecified` when there is none.
    pub fn call(
        &self,
        target: impl Into<CallTarget>,
        parameters: Parameters,
        default_method: Option<&str>,
    ) -> DiResult<AnyArc> {
        match target.into() {
            CallTarget::Callable(callable) => self.call_callable(&callable, parameters),
            CallTarget::Method { receiver, method } => {
                let method = match method {
                    Some(method) => method,
                    None => match default_method {
                        Some(default) => Cow::Owned(default.to_string()),
                        None => return Err(DiError::method_not_specified(&receiver_name(&receiver))),
                    },
                };

                let (instance, declared) = match receiver {
                    Receiver::Abstract(key) => (self.make(key.clone())?, Some(key)),
                    Receiver::Instance(instance) => (instance, None),
                };

                let runtime = runtime_key(&instance);
                let candidates = declared
                    .into_iter()
                    .chain(std::iter::once(runtime))
                    .map(|target| MethodKey::new(target, method.clone()));

                let mut tried = None;
                for key in candidates {
                    let binding = self.methods.borrow().get(&key);
                    if let Some(binding) = binding {
                        return self.invoke_method_binding(binding, instance, parameters);
                    }
                    tried.get_or_insert(key);
                }

                let tried = tried.map(|key| key.to_string()).unwrap_or_default();
                Err(DiError::unbound_method(&tried))
            }
        }
    }

    /// Deferred [`call`](Self::call) of a callable.
    pub fn wrap(
        &self,
        callable: Callable,
        parameters: Parameters,
    ) -> impl Fn() -> DiResult<AnyArc> + '_ {
        move || self.call_callable(&callable, parameters.clone())
    }

    fn call_callable(&self, callable: &Callable, parameters: Parameters) -> DiResult<AnyArc> {
        let arguments =
            self.with_overrides(parameters, |c| c.resolve_dependencies(callable.parameters()))?;
        callable.invoke(&arguments, self)
    }

    fn invoke_method_binding(
        &self,
        binding: MethodBinding,
        instance: AnyArc,
        parameters: Parameters,
    ) -> DiResult<AnyArc> {
        match binding {
            MethodBinding::Plain(callback) => callback(instance, self),
            MethodBinding::Injected {
                parameters: declared,
                callback,
            } => {
                let arguments =
                    self.with_overrides(parameters, |c| c.resolve_dependencies(&declared))?;
                callback(instance, &arguments, self)
            }
        }
    }
}

fn runtime_key(instance: &AnyArc) -> Key {
    Key::Type((**instance).type_id(), "<instance>", None)
}

fn receiver_name(receiver: &Receiver) -> String {
    match receiver {
        Receiver::Abstract(key) => key.to_string(),
        Receiver::Instance(_) => "<instance>".to_string(),
    }
}
