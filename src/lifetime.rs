//! Binding lifetime definitions.

/// Binding lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Lifetime};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let container = Container::new();
/// let counter = Arc::new(AtomicUsize::new(0));
/// let c = counter.clone();
/// container
///     .register("ticket", Some(ferrous_container::Concrete::factory(move |_| {
///         Ok(c.fetch_add(1, Ordering::SeqCst))
///     })), Lifetime::Transient)
///     .unwrap();
/// container.register("session", None, true).unwrap();
///
/// container.make("ticket").unwrap();
/// container.make("ticket").unwrap();
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// assert!(!container.is_shared("ticket"));
/// assert!(container.is_shared("session"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// Resolved once, then served from the instance cache
    ///
    /// Resolutions with parameter overrides or a contextual binding still
    /// build a fresh instance and leave the cache alone.
    Singleton,
    /// New instance per resolution, never cached
    #[default]
    Transient,
}

impl Lifetime {
    /// Whether resolved instances are cached.
    #[inline]
    pub fn is_shared(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

/// `true` is a shared binding.
impl From<bool> for Lifetime {
    fn from(shared: bool) -> Self {
        if shared {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}
