//! Extender chain: post-construction decorators per abstract.
//!
//! Extenders run in registration order on every fresh resolution of their
//! abstract, each receiving the previous one's output. When the abstract
//! already has a cached instance at registration time, the new extender
//! is applied to it once, in place.

use std::any::Any;
use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::internal::Map;
use crate::key::Key;
use crate::registration::{downcast, AnyArc};

/// Erased extender `(instance, container) -> instance`.
pub type ExtenderFn = Arc<dyn Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync>;

/// A typed decorator for instances of `T`.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, DiResult, ServiceDecorator};
/// use std::sync::Arc;
///
/// struct Endpoint {
///     url: String,
/// }
///
/// struct Versioned;
/// impl ServiceDecorator<Endpoint> for Versioned {
///     fn decorate(&self, original: Arc<Endpoint>, _: &Container) -> DiResult<Arc<Endpoint>> {
///         Ok(Arc::new(Endpoint { url: format!("{}/v2", original.url) }))
///     }
/// }
///
/// let container = Container::new();
/// container.set("endpoint", Endpoint { url: "https://api".into() }).unwrap();
/// container.decorate_with("endpoint", Versioned).unwrap();
///
/// assert_eq!(container.make_as::<Endpoint>("endpoint").unwrap().url, "https://api/v2");
/// ```
pub trait ServiceDecorator<T: Send + Sync + 'static>: Send + Sync {
    fn decorate(&self, original: Arc<T>, container: &Container) -> DiResult<Arc<T>>;
}

impl<T, F> ServiceDecorator<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, &Container) -> DiResult<Arc<T>> + Send + Sync,
{
    fn decorate(&self, original: Arc<T>, container: &Container) -> DiResult<Arc<T>> {
        self(original, container)
    }
}

/// Erases a typed decorator; a mismatched instance fails with `TypeMismatch`.
pub(crate) fn erase<T, D>(decorator: D) -> ExtenderFn
where
    T: Any + Send + Sync,
    D: ServiceDecorator<T> + 'static,
{
    Arc::new(move |instance, container| {
        let typed = downcast::<T>(instance)?;
        decorator
            .decorate(typed, container)
            .map(|value| value as AnyArc)
    })
}

/// Ordered extenders by abstract
#[derive(Default)]
pub(crate) struct ExtenderChain {
    extenders: Map<Key, Vec<ExtenderFn>>,
}

impl ExtenderChain {
    pub(crate) fn push(&mut self, key: Key, extender: ExtenderFn) {
        self.extenders.entry(key).or_default().push(extender);
    }

    /// Snapshot of the chain for `key`, so user code runs without a borrow held.
    pub(crate) fn get(&self, key: &Key) -> Vec<ExtenderFn> {
        self.extenders.get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn forget(&mut self, key: &Key) {
        self.extenders.remove(key);
    }

    pub(crate) fn count(&self, key: &Key) -> usize {
        self.extenders.get(key).map(Vec::len).unwrap_or(0)
    }
}

/// Feeds `instance` through `chain` in order.
pub(crate) fn apply(
    chain: &[ExtenderFn],
    mut instance: AnyArc,
    container: &Container,
) -> DiResult<AnyArc> {
    for extender in chain {
        instance = extender(instance, container)?;
    }
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;

    fn suffix(tag: &'static str) -> ExtenderFn {
        erase::<String, _>(move |s: Arc<String>, _: &Container| -> DiResult<Arc<String>> {
            Ok(Arc::new(format!("{}{}", s, tag)))
        })
    }

    #[test]
    fn applies_in_registration_order() {
        let container = Container::new();
        let mut chain = ExtenderChain::default();
        let key = Key::named("x");
        chain.push(key.clone(), suffix("-f"));
        chain.push(key.clone(), suffix("-g"));
        assert_eq!(chain.count(&key), 2);

        let out = apply(&chain.get(&key), Arc::new(String::from("raw")), &container).unwrap();
        assert_eq!(*downcast::<String>(out).unwrap(), "raw-f-g");

        chain.forget(&key);
        assert!(chain.get(&key).is_empty());
    }

    #[test]
    fn typed_extender_rejects_other_types() {
        let container = Container::new();
        let err = apply(&[suffix("-f")], Arc::new(1u8), &container).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch(_)));
    }
}
