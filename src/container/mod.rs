//! The container: registration API and registry state.
//!
//! Resolution lives in `resolve`, call dispatch and method bindings in
//! `call`. All state sits behind `RefCell`s so factories, extenders and
//! callbacks can re-enter the container through `&Container`; no borrow is
//! held while user code runs.

mod call;
mod resolve;

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::alias::AliasRegistry;
use crate::callbacks::{self, Callbacks, ReboundCallback, ResolvingCallback};
use crate::config::ContainerConfig;
use crate::contextual::{ContextualBindingBuilder, ContextualBindings};
use crate::decoration::{self, ExtenderChain, ExtenderFn, ServiceDecorator};
use crate::descriptors::BindingDescriptor;
use crate::error::DiResult;
use crate::injectable::{Blueprint, Injectable};
use crate::internal::Map;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::method::MethodBindings;
use crate::parameters::Parameters;
use crate::registration::{AnyArc, Binding, Concrete, FactoryFn, Registry};

/// Reflective dependency-resolution container.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{injectable, Container, Key};
/// use std::sync::Arc;
///
/// struct Connection;
/// injectable!(Connection {});
///
/// struct UserRepository {
///     connection: Arc<Connection>,
/// }
/// injectable!(UserRepository { connection: Connection });
///
/// let container = Container::new();
/// container.singleton_type::<Connection>().unwrap();
/// container.alias(Key::injectable::<UserRepository>(), "users");
///
/// let first = container.make_as::<UserRepository>("users").unwrap();
/// let second = container.make_type::<UserRepository>().unwrap();
/// assert!(Arc::ptr_eq(&first.connection, &second.connection));
/// assert!(!Arc::ptr_eq(&first, &second));
/// ```
pub struct Container {
    config: ContainerConfig,
    registry: RefCell<Registry>,
    aliases: RefCell<AliasRegistry>,
    contextual: RefCell<ContextualBindings>,
    extenders: RefCell<ExtenderChain>,
    callbacks: RefCell<Callbacks>,
    methods: RefCell<MethodBindings>,
    tags: RefCell<Map<String, Vec<Key>>>,
    blueprints: RefCell<Map<TypeId, Blueprint>>,
    build_stack: RefCell<Vec<Key>>,
    overrides: RefCell<Vec<Parameters>>,
    depth: Cell<usize>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            registry: RefCell::default(),
            aliases: RefCell::default(),
            contextual: RefCell::default(),
            extenders: RefCell::default(),
            callbacks: RefCell::default(),
            methods: RefCell::default(),
            tags: RefCell::default(),
            blueprints: RefCell::default(),
            build_stack: RefCell::default(),
            overrides: RefCell::default(),
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    // ----- Binding registry -----

    /// Registers a binding.
    ///
    /// With no concrete the abstract is bound to itself and resolves through
    /// its constructor. An `Abstract` concrete delegates to that identifier.
    /// Rebinding an abstract that was already resolved re-resolves it and
    /// fires its rebound callbacks. `lifetime` also accepts the shared flag.
    pub fn register(
        &self,
        key: impl Into<Key>,
        concrete: Option<Concrete>,
        lifetime: impl Into<Lifetime>,
    ) -> DiResult<()> {
        let key = key.into();
        let lifetime = lifetime.into();
        self.learn_key(&key);
        if let Some(target) = concrete.as_ref().and_then(Concrete::as_abstract) {
            self.learn_key(target);
        }
        self.drop_stale_instances(&key);

        let (factory, target) = match concrete {
            None => (delegate(key.clone(), key.clone()), Some(key.clone())),
            Some(Concrete::Abstract(target)) => {
                (delegate(key.clone(), target.clone()), Some(target))
            }
            Some(Concrete::Factory(factory)) => (factory, None),
        };

        #[cfg(feature = "tracing")]
        debug!(key = %key, ?lifetime, "binding registered");

        let was_resolved = {
            let mut registry = self.registry.borrow_mut();
            registry.bindings.insert(
                key.clone(),
                Binding {
                    factory,
                    lifetime,
                    target,
                },
            );
            registry.resolved.contains(&key)
        };

        if was_resolved {
            self.rebound(&key)?;
        }
        Ok(())
    }

    /// Transient binding.
    pub fn bind(&self, key: impl Into<Key>, concrete: impl Into<Concrete>) -> DiResult<()> {
        self.register(key, Some(concrete.into()), Lifetime::Transient)
    }

    /// Shared binding.
    pub fn singleton(&self, key: impl Into<Key>, concrete: impl Into<Concrete>) -> DiResult<()> {
        self.register(key, Some(concrete.into()), Lifetime::Singleton)
    }

    /// Binds the abstract to its own constructor.
    pub fn bind_self(&self, key: impl Into<Key>) -> DiResult<()> {
        self.register(key, None, Lifetime::Transient)
    }

    pub fn singleton_self(&self, key: impl Into<Key>) -> DiResult<()> {
        self.register(key, None, Lifetime::Singleton)
    }

    /// Binds only when the abstract is not bound yet.
    pub fn bind_if(&self, key: impl Into<Key>, concrete: impl Into<Concrete>) -> DiResult<()> {
        let key = key.into();
        if self.bound(&key) {
            return Ok(());
        }
        self.bind(key, concrete)
    }

    pub fn singleton_if(&self, key: impl Into<Key>, concrete: impl Into<Concrete>) -> DiResult<()> {
        let key = key.into();
        if self.bound(&key) {
            return Ok(());
        }
        self.singleton(key, concrete)
    }

    /// Binds an injectable type to its own constructor.
    pub fn bind_type<T: Injectable>(&self) -> DiResult<()> {
        self.learn(Blueprint::of::<T>());
        self.bind_self(Key::of::<T>())
    }

    pub fn singleton_type<T: Injectable>(&self) -> DiResult<()> {
        self.learn(Blueprint::of::<T>());
        self.singleton_self(Key::of::<T>())
    }

    pub fn bind_factory<T, F>(&self, key: impl Into<Key>, factory: F) -> DiResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(key, Concrete::factory(factory))
    }

    pub fn singleton_factory<T, F>(&self, key: impl Into<Key>, factory: F) -> DiResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> DiResult<T> + Send + Sync + 'static,
    {
        self.singleton(key, Concrete::factory(factory))
    }

    /// Binds a trait object under `Key::of::<T>()`.
    pub fn bind_dyn<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind(Key::of::<T>(), Concrete::factory_dyn(factory))
    }

    pub fn singleton_dyn<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.singleton(Key::of::<T>(), Concrete::factory_dyn(factory))
    }

    /// Stores an existing value as the shared instance of `key`.
    pub fn instance<T: Any + Send + Sync>(&self, key: impl Into<Key>, value: T) -> DiResult<Arc<T>> {
        let value = Arc::new(value);
        self.instance_any(key, value.clone())?;
        Ok(value)
    }

    /// Stores an existing trait object as the shared instance of `Key::of::<T>()`.
    pub fn instance_dyn<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) -> DiResult<()> {
        self.instance_any(Key::of::<T>(), Arc::new(value))
    }

    pub fn instance_any(&self, key: impl Into<Key>, instance: AnyArc) -> DiResult<()> {
        let key = key.into();
        self.aliases.borrow_mut().remove_abstract_alias(&key);
        let is_bound = self.bound(&key);
        self.aliases.borrow_mut().remove(&key);

        #[cfg(feature = "tracing")]
        debug!(key = %key, "instance registered");

        self.registry
            .borrow_mut()
            .instances
            .insert(key.clone(), instance);

        if is_bound {
            self.rebound(&key)?;
        }
        Ok(())
    }

    // ----- Aliases -----

    /// Records `alias` as another name for `abstract_key`.
    pub fn alias(&self, abstract_key: impl Into<Key>, alias: impl Into<Key>) {
        let abstract_key = abstract_key.into();
        let alias = alias.into();
        self.learn_key(&abstract_key);

        #[cfg(feature = "tracing")]
        debug!(alias = %alias, target = %abstract_key, "alias registered");

        self.aliases.borrow_mut().alias(abstract_key, alias);
    }

    /// The canonical identifier behind `key`.
    pub fn get_alias(&self, key: &Key) -> DiResult<Key> {
        self.aliases.borrow().resolve(key)
    }

    pub fn is_alias(&self, key: impl Into<Key>) -> bool {
        self.aliases.borrow().is_alias(&key.into())
    }

    // ----- Contextual bindings -----

    /// Starts a contextual binding for the construction of `concrete`.
    ///
    /// `concrete` is resolved through the alias map here, so an alias cycle
    /// fails before `needs` is given.
    pub fn when(&self, concrete: impl Into<Key>) -> DiResult<ContextualBindingBuilder<'_>> {
        let concrete = concrete.into();
        self.learn_key(&concrete);
        let concrete = self.get_alias(&concrete)?;
        Ok(ContextualBindingBuilder::new(self, concrete))
    }

    /// While `concrete` is being built, resolve `needs` through `implementation`.
    pub fn add_contextual_binding(
        &self,
        concrete: impl Into<Key>,
        needs: impl Into<Key>,
        implementation: Concrete,
    ) -> DiResult<()> {
        let concrete = self.get_alias(&concrete.into())?;
        let needs = self.get_alias(&needs.into())?;
        if let Some(target) = implementation.as_abstract() {
            self.learn_key(target);
        }

        #[cfg(feature = "tracing")]
        debug!(when = %concrete, needs = %needs, "contextual binding registered");

        self.contextual
            .borrow_mut()
            .add(concrete, needs, implementation);
        Ok(())
    }

    // ----- Extenders -----

    /// Decorates every resolution of `key`.
    pub fn extend<F>(&self, key: impl Into<Key>, extender: F) -> DiResult<()>
    where
        F: Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.add_extender(key.into(), Arc::new(extender))
    }

    /// Typed [`extend`](Self::extend); a mismatched instance fails with `TypeMismatch`.
    pub fn extend_as<T, F>(&self, key: impl Into<Key>, extender: F) -> DiResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(Arc<T>, &Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_extender(key.into(), decoration::erase::<T, _>(extender))
    }

    pub fn decorate_with<T, D>(&self, key: impl Into<Key>, decorator: D) -> DiResult<()>
    where
        T: Any + Send + Sync,
        D: ServiceDecorator<T> + 'static,
    {
        self.add_extender(key.into(), decoration::erase::<T, _>(decorator))
    }

    fn add_extender(&self, key: Key, extender: ExtenderFn) -> DiResult<()> {
        let key = self.get_alias(&key)?;

        #[cfg(feature = "tracing")]
        debug!(key = %key, "extender registered");

        let existing = self.registry.borrow().instances.get(&key).cloned();
        match existing {
            Some(instance) => {
                let extended = extender(instance, self)?;
                self.registry
                    .borrow_mut()
                    .instances
                    .insert(key.clone(), extended);
                self.rebound(&key)
            }
            None => {
                self.extenders.borrow_mut().push(key.clone(), extender);
                if self.resolved(key.clone())? {
                    self.rebound(&key)?;
                }
                Ok(())
            }
        }
    }

    /// Drops every pending extender for `key`.
    pub fn forget_extenders(&self, key: impl Into<Key>) -> DiResult<()> {
        let key = self.get_alias(&key.into())?;
        self.extenders.borrow_mut().forget(&key);
        Ok(())
    }

    // ----- Tags -----

    /// Adds each key to each tag, keeping registration order.
    pub fn tag<I, K>(&self, keys: I, tags: &[&str])
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        for key in &keys {
            self.learn_key(key);
        }
        let mut registry = self.tags.borrow_mut();
        for tag in tags {
            registry
                .entry((*tag).to_string())
                .or_default()
                .extend(keys.iter().cloned());
        }
    }

    /// Resolves every abstract under `tag`, in tagging order.
    pub fn tagged(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        let keys = self.tags.borrow().get(tag).cloned().unwrap_or_default();
        keys.into_iter().map(|key| self.make(key)).collect()
    }

    // ----- Lifecycle callbacks -----

    /// Fires after extenders on every resolution; `None` scopes it globally.
    pub fn resolving<F>(&self, scope: Option<Key>, callback: F) -> DiResult<()>
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let scope = self.callback_scope(scope)?;
        self.callbacks
            .borrow_mut()
            .resolving
            .add(scope, Arc::new(callback));
        Ok(())
    }

    /// Fires after all resolving callbacks of the same resolution.
    pub fn after_resolving<F>(&self, scope: Option<Key>, callback: F) -> DiResult<()>
    where
        F: Fn(&AnyArc, &Container) + Send + Sync + 'static,
    {
        let scope = self.callback_scope(scope)?;
        self.callbacks
            .borrow_mut()
            .after_resolving
            .add(scope, Arc::new(callback));
        Ok(())
    }

    /// Resolving callback for instances of `T`.
    pub fn resolving_type<T, F>(&self, callback: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Container) + Send + Sync + 'static,
    {
        let callback: ResolvingCallback = callbacks::typed(callback);
        self.callbacks
            .borrow_mut()
            .resolving
            .add(Some(Key::of::<T>()), callback);
    }

    pub fn after_resolving_type<T, F>(&self, callback: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Container) + Send + Sync + 'static,
    {
        let callback: ResolvingCallback = callbacks::typed(callback);
        self.callbacks
            .borrow_mut()
            .after_resolving
            .add(Some(Key::of::<T>()), callback);
    }

    fn callback_scope(&self, scope: Option<Key>) -> DiResult<Option<Key>> {
        scope.map(|key| self.get_alias(&key)).transpose()
    }

    /// Registers a rebound callback; returns the current instance when `key` is bound.
    pub fn rebinding<F>(&self, key: impl Into<Key>, callback: F) -> DiResult<Option<AnyArc>>
    where
        F: Fn(&Container, &AnyArc) + Send + Sync + 'static,
    {
        let key = self.get_alias(&key.into())?;
        let callback: ReboundCallback = Arc::new(callback);
        self.callbacks.borrow_mut().add_rebound(key.clone(), callback);

        if self.bound(&key) {
            self.make(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Rebound callback that hands each new instance of `key` to `method`
    /// on `target`.
    pub fn refresh<T, F>(
        &self,
        key: impl Into<Key>,
        target: Arc<T>,
        method: F,
    ) -> DiResult<Option<AnyArc>>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&T, &AnyArc) + Send + Sync + 'static,
    {
        self.rebinding(key, move |_, instance| method(&target, instance))
    }

    pub(crate) fn rebound(&self, key: &Key) -> DiResult<()> {
        let instance = self.make(key.clone())?;
        let callbacks = self.callbacks.borrow().rebound_for(key);

        #[cfg(feature = "tracing")]
        trace!(key = %key, callbacks = callbacks.len(), "rebound");

        for callback in callbacks {
            callback(self, &instance);
        }
        Ok(())
    }

    // ----- Queries -----

    /// Bound, aliased, or holding an instance.
    pub fn bound(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let in_registry = {
            let registry = self.registry.borrow();
            registry.bindings.contains_key(&key) || registry.instances.contains_key(&key)
        };
        in_registry || self.aliases.borrow().is_alias(&key)
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.bound(key)
    }

    /// Whether the abstract has been resolved or holds an instance.
    pub fn resolved(&self, key: impl Into<Key>) -> DiResult<bool> {
        let key = key.into();
        let key = if self.aliases.borrow().is_alias(&key) {
            self.get_alias(&key)?
        } else {
            key
        };
        let registry = self.registry.borrow();
        Ok(registry.resolved.contains(&key) || registry.instances.contains_key(&key))
    }

    pub fn is_shared(&self, key: impl Into<Key>) -> bool {
        self.registry.borrow().is_shared(&key.into())
    }

    /// Snapshot of the registered bindings, ordered by identifier.
    pub fn bindings(&self) -> Vec<BindingDescriptor> {
        let registry = self.registry.borrow();
        let extenders = self.extenders.borrow();
        let mut out: Vec<BindingDescriptor> = registry
            .bindings
            .iter()
            .map(|(key, binding)| BindingDescriptor {
                key: key.clone(),
                lifetime: binding.lifetime,
                target: binding.target.clone(),
                has_instance: registry.instances.contains_key(key),
                extenders: extenders.count(key),
            })
            .collect();
        out.sort_by(|a, b| a.key.display_name().cmp(b.key.display_name()));
        out
    }

    // ----- Reset -----

    /// Clears bindings, instances, aliases and resolved markers.
    ///
    /// Extenders, callbacks, contextual bindings, tags, method bindings and
    /// learned constructors survive.
    pub fn flush(&self) {
        #[cfg(feature = "tracing")]
        debug!("container flushed");

        self.registry.borrow_mut().clear();
        self.aliases.borrow_mut().clear();
    }

    pub fn forget_instance(&self, key: impl Into<Key>) {
        self.registry.borrow_mut().instances.remove(&key.into());
    }

    pub fn forget_instances(&self) {
        self.registry.borrow_mut().instances.clear();
    }

    fn drop_stale_instances(&self, key: &Key) {
        self.registry.borrow_mut().instances.remove(key);
        self.aliases.borrow_mut().remove(key);
    }

    // ----- Indexer sugar -----

    /// Binds `key` to a constant value.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<Key>, value: T) -> DiResult<()> {
        self.bind(key, Concrete::constant(value))
    }

    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.bound(key)
    }

    /// Drops the binding, instance and resolved marker of `key`.
    pub fn unset(&self, key: impl Into<Key>) {
        self.registry.borrow_mut().forget(&key.into());
    }

    // ----- Constructors -----

    /// Makes `T`'s constructor available for self-construction.
    pub fn learn(&self, blueprint: Blueprint) {
        self.blueprints
            .borrow_mut()
            .entry(blueprint.type_id())
            .or_insert(blueprint);
    }

    pub(crate) fn learn_key(&self, key: &Key) {
        if let Some(blueprint) = key.blueprint() {
            self.learn(blueprint);
        }
    }

    pub(crate) fn blueprint_for(&self, key: &Key) -> Option<Blueprint> {
        if let Some(blueprint) = key.blueprint() {
            return Some(blueprint);
        }
        let type_id = key.type_id()?;
        self.blueprints.borrow().get(&type_id).copied()
    }

    /// Dump of the registry state.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::from("Container:\n");
        for descriptor in self.bindings() {
            let _ = writeln!(out, "  {}", descriptor);
        }
        let aliases = self.aliases.borrow();
        let mut entries: Vec<_> = aliases.entries().collect();
        entries.sort_by(|a, b| a.0.display_name().cmp(b.0.display_name()));
        for (alias, target) in entries {
            let _ = writeln!(out, "  alias {} -> {}", alias, target);
        }
        let registry = self.registry.borrow();
        let mut instances: Vec<&str> = registry.instances.keys().map(Key::display_name).collect();
        instances.sort_unstable();
        for key in instances {
            let _ = writeln!(out, "  instance {}", key);
        }
        let _ = writeln!(out, "  contextual bindings: {}", self.contextual.borrow().len());
        out
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let callbacks = self.callbacks.borrow();
        f.debug_struct("Container")
            .field("bindings", &registry.bindings.len())
            .field("instances", &registry.instances.len())
            .field("resolved", &registry.resolved.len())
            .field("aliases", &self.aliases.borrow().entries().count())
            .field("contextual", &self.contextual.borrow().len())
            .field("resolving_callbacks", &callbacks.resolving.len())
            .field("after_resolving_callbacks", &callbacks.after_resolving.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Factory for a binding given as an identifier: build when it names the
/// abstract itself, otherwise make the other identifier with the same overrides.
fn delegate(abstract_key: Key, concrete: Key) -> FactoryFn {
    if abstract_key == concrete {
        Arc::new(move |container, _| container.build(&Concrete::Abstract(concrete.clone())))
    } else {
        Arc::new(move |container, parameters| {
            container.make_with(concrete.clone(), parameters.clone())
        })
    }
}
