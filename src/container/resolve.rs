//! Resolution and build engine.

use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::trace;

use super::Container;
use crate::decoration;
use crate::error::{DiError, DiResult};
use crate::injectable::{Arguments, Blueprint, Injectable, Parameter};
use crate::internal::circular::enter_build;
use crate::internal::{DepthGuard, Set, StackGuard};
use crate::key::Key;
use crate::parameters::Parameters;
use crate::registration::{downcast, downcast_dyn, AnyArc, Concrete};

impl Container {
    /// Resolves `key` to an instance.
    pub fn make(&self, key: impl Into<Key>) -> DiResult<AnyArc> {
        self.resolve(&key.into(), Parameters::new())
    }

    /// Resolves `key` with parameter overrides; the result is never cached.
    pub fn make_with(&self, key: impl Into<Key>, parameters: Parameters) -> DiResult<AnyArc> {
        self.resolve(&key.into(), parameters)
    }

    /// Typed [`make`](Self::make).
    pub fn make_as<T: Any + Send + Sync>(&self, key: impl Into<Key>) -> DiResult<Arc<T>> {
        downcast::<T>(self.make(key)?)
    }

    pub fn make_with_as<T: Any + Send + Sync>(
        &self,
        key: impl Into<Key>,
        parameters: Parameters,
    ) -> DiResult<Arc<T>> {
        downcast::<T>(self.make_with(key, parameters)?)
    }

    /// Resolves an injectable type, self-constructing it when unbound.
    pub fn make_type<T: Injectable>(&self) -> DiResult<Arc<T>> {
        self.make_type_with::<T>(Parameters::new())
    }

    pub fn make_type_with<T: Injectable>(&self, parameters: Parameters) -> DiResult<Arc<T>> {
        self.learn(Blueprint::of::<T>());
        self.make_with_as::<T>(Key::of::<T>(), parameters)
    }

    /// Resolves a trait object bound under `Key::of::<T>()`.
    pub fn make_dyn<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_dyn::<T>(self.make(Key::of::<T>())?)
    }

    /// Like [`make`](Self::make), but fails with `EntryNotFound` instead of
    /// self-constructing an unknown identifier.
    pub fn get(&self, key: impl Into<Key>) -> DiResult<AnyArc> {
        let key = key.into();
        if !self.has(&key) {
            return Err(DiError::entry_not_found(&key));
        }
        self.make(key)
    }

    /// Deferred [`make`](Self::make).
    pub fn factory(&self, key: impl Into<Key>) -> impl Fn() -> DiResult<AnyArc> + '_ {
        let key = key.into();
        move || self.make(key.clone())
    }

    fn resolve(&self, key: &Key, parameters: Parameters) -> DiResult<AnyArc> {
        let _depth = DepthGuard::enter(&self.depth, self.config.max_depth)?;
        self.learn_key(key);
        let key = self.get_alias(key)?;

        let contextual = self.find_contextual_concrete(&key);
        let needs_contextual_build = !parameters.is_empty() || contextual.is_some();

        if !needs_contextual_build {
            let cached = self.registry.borrow().instances.get(&key).cloned();
            if let Some(instance) = cached {
                #[cfg(feature = "tracing")]
                trace!(key = %key, "instance cache hit");
                return Ok(instance);
            }
        }

        let _overrides = StackGuard::push(&self.overrides, parameters);

        let concrete = match contextual {
            Some(concrete) => concrete,
            None => self.concrete_for(&key),
        };

        let object = match &concrete {
            Concrete::Abstract(target) if *target != key => self.make(target.clone())?,
            buildable => self.build(buildable)?,
        };

        let extenders = self.extenders.borrow().get(&key);

        #[cfg(feature = "tracing")]
        trace!(key = %key, extenders = extenders.len(), "applying extenders");

        let object = decoration::apply(&extenders, object, self)?;

        if !needs_contextual_build {
            let mut registry = self.registry.borrow_mut();
            if registry.is_shared(&key) {
                registry.instances.insert(key.clone(), object.clone());
            }
        }

        self.fire_resolving_callbacks(&key, &object);
        self.registry.borrow_mut().resolved.insert(key);

        Ok(object)
    }

    /// Runs a factory, or constructs an abstract from its learned constructor.
    ///
    /// Constructor dependencies are resolved with the abstract on top of the
    /// build stack; factories do not touch the build stack.
    pub fn build(&self, concrete: &Concrete) -> DiResult<AnyArc> {
        match concrete {
            Concrete::Factory(factory) => {
                let parameters = self.current_overrides();
                factory(self, &parameters)
            }
            Concrete::Abstract(key) => {
                let blueprint = self
                    .blueprint_for(key)
                    .ok_or_else(|| DiError::not_instantiable(key))?;

                let arguments = {
                    let _building = enter_build(&self.build_stack, key, self.config.detect_cycles)?;

                    #[cfg(feature = "tracing")]
                    trace!(key = %key, depth = self.build_stack.borrow().len(), "building");

                    self.resolve_dependencies(&blueprint.dependencies())?
                };

                blueprint.construct(&arguments)
            }
        }
    }

    /// Resolves a parameter list against the innermost overrides.
    pub(crate) fn resolve_dependencies(&self, parameters: &[Parameter]) -> DiResult<Arguments> {
        let overrides = self.current_overrides();
        let mut positional = overrides.positional_values().iter();
        let mut consumed: Set<&str> = Set::default();
        let mut arguments = Arguments::with_capacity(parameters.len());

        for parameter in parameters {
            let name = parameter.name();

            if let Some(value) = overrides.get(name) {
                if consumed.insert(name) {
                    arguments.push(parameter.owned_name(), value.clone());
                    continue;
                }
            }

            if let Some(value) = positional.next() {
                arguments.push(parameter.owned_name(), value.clone());
                continue;
            }

            let value = match parameter.declared() {
                None => self.resolve_primitive(parameter)?,
                Some(declared) => self.resolve_class(parameter, declared)?,
            };
            arguments.push(parameter.owned_name(), value);
        }

        Ok(arguments)
    }

    fn resolve_primitive(&self, parameter: &Parameter) -> DiResult<AnyArc> {
        let by_name = Key::named(parameter.name().to_string());
        if let Some(concrete) = self.find_contextual_concrete(&by_name) {
            return match concrete {
                Concrete::Factory(factory) => factory(self, &Parameters::new()),
                Concrete::Abstract(key) => self.make(key),
            };
        }

        if let Some(default) = parameter.default() {
            return Ok(default.clone());
        }

        let building = self.build_stack.borrow().last().cloned();
        Err(DiError::unresolvable_primitive(parameter.name(), building.as_ref()))
    }

    fn resolve_class(&self, parameter: &Parameter, declared: &Key) -> DiResult<AnyArc> {
        if let Some(blueprint) = parameter.blueprint() {
            self.learn(*blueprint);
        }

        match self.make(declared.clone()) {
            Ok(value) => Ok(value),
            Err(err) if err.is_binding_resolution() => match parameter.default() {
                Some(default) => Ok(default.clone()),
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Contextual implementation of `needs` for the concrete on top of the
    /// build stack, checking the abstract first and then its aliases.
    fn find_contextual_concrete(&self, needs: &Key) -> Option<Concrete> {
        let building = self.build_stack.borrow().last().cloned()?;
        let contextual = self.contextual.borrow();

        if let Some(found) = contextual.find(&building, needs) {
            return Some(found);
        }

        let aliases = self.aliases.borrow();
        aliases
            .aliases_of(needs)
            .iter()
            .find_map(|alias| contextual.find(&building, alias))
    }

    fn concrete_for(&self, key: &Key) -> Concrete {
        match self.registry.borrow().bindings.get(key) {
            Some(binding) => Concrete::Factory(binding.factory.clone()),
            None => Concrete::Abstract(key.clone()),
        }
    }

    pub(crate) fn current_overrides(&self) -> Parameters {
        self.overrides.borrow().last().cloned().unwrap_or_default()
    }

    /// Runs `f` with `parameters` as the innermost overrides.
    pub(crate) fn with_overrides<R>(
        &self,
        parameters: Parameters,
        f: impl FnOnce(&Container) -> DiResult<R>,
    ) -> DiResult<R> {
        let _overrides = StackGuard::push(&self.overrides, parameters);
        f(self)
    }

    fn fire_resolving_callbacks(&self, key: &Key, object: &AnyArc) {
        let resolving = self.callbacks.borrow().resolving.matching(key, object);
        for callback in &resolving {
            callback(object, self);
        }

        let after = self.callbacks.borrow().after_resolving.matching(key, object);

        #[cfg(feature = "tracing")]
        trace!(
            key = %key,
            resolving = resolving.len(),
            after_resolving = after.len(),
            "resolution callbacks fired"
        );

        for callback in &after {
            callback(object, self);
        }
    }
}
