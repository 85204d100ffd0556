//! Resolving, after-resolving and rebound callbacks.
//!
//! Callbacks are snapshotted (cloned `Arc`s) before they are invoked, so a
//! callback may freely call back into the container, including registering
//! more callbacks.

use std::any::Any;
use std::sync::Arc;

use crate::container::Container;
use crate::internal::Map;
use crate::key::Key;
use crate::registration::AnyArc;

/// Fired with every freshly resolved instance of a matching abstract.
pub type ResolvingCallback = Arc<dyn Fn(&AnyArc, &Container) + Send + Sync>;

/// Fired with the new instance after an already resolved abstract is rebound.
pub type ReboundCallback = Arc<dyn Fn(&Container, &AnyArc) + Send + Sync>;

/// Global callbacks plus callbacks scoped to one abstract.
#[derive(Default)]
pub(crate) struct CallbackSet {
    global: Vec<ResolvingCallback>,
    // Scopes in first-registration order
    scoped: Vec<(Key, Vec<ResolvingCallback>)>,
}

impl CallbackSet {
    pub(crate) fn add(&mut self, scope: Option<Key>, callback: ResolvingCallback) {
        match scope {
            None => self.global.push(callback),
            Some(key) => match self.scoped.iter_mut().find(|(k, _)| *k == key) {
                Some((_, callbacks)) => callbacks.push(callback),
                None => self.scoped.push((key, vec![callback])),
            },
        }
    }

    /// Global callbacks, then every scope matching `key` or the instance's runtime type.
    pub(crate) fn matching(&self, key: &Key, instance: &AnyArc) -> Vec<ResolvingCallback> {
        let runtime = (**instance).type_id();
        let mut out = self.global.clone();
        for (scope, callbacks) in &self.scoped {
            if scope == key || scope.type_id() == Some(runtime) {
                out.extend(callbacks.iter().cloned());
            }
        }
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.global.len() + self.scoped.iter().map(|(_, c)| c.len()).sum::<usize>()
    }
}

/// All lifecycle hooks of a container
#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) resolving: CallbackSet,
    pub(crate) after_resolving: CallbackSet,
    rebound: Map<Key, Vec<ReboundCallback>>,
}

impl Callbacks {
    pub(crate) fn add_rebound(&mut self, key: Key, callback: ReboundCallback) {
        self.rebound.entry(key).or_default().push(callback);
    }

    pub(crate) fn rebound_for(&self, key: &Key) -> Vec<ReboundCallback> {
        self.rebound.get(key).cloned().unwrap_or_default()
    }
}

/// Wraps a callback that only cares about instances of `T`.
pub(crate) fn typed<T, F>(callback: F) -> ResolvingCallback
where
    T: Any + Send + Sync,
    F: Fn(&T, &Container) + Send + Sync + 'static,
{
    Arc::new(move |instance, container| {
        if let Some(value) = instance.downcast_ref::<T>() {
            callback(value, container);
        }
    })
}
