//! Binding descriptors for introspection and diagnostics.

use std::fmt;

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Snapshot of one registered binding.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Key, Lifetime};
///
/// let container = Container::new();
/// container.singleton("cache", Key::from("cache.redis")).unwrap();
/// container.set("port", 6379u16).unwrap();
///
/// let descriptors = container.bindings();
/// let cache = descriptors.iter().find(|d| d.key == Key::from("cache")).unwrap();
/// assert_eq!(cache.lifetime, Lifetime::Singleton);
/// assert_eq!(cache.target, Some(Key::from("cache.redis")));
///
/// let port = descriptors.iter().find(|d| d.key == Key::from("port")).unwrap();
/// assert!(port.is_factory());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    pub key: Key,
    pub lifetime: Lifetime,
    /// Identifier the binding delegates to; `None` for closures
    pub target: Option<Key>,
    /// Whether a shared instance is currently cached
    pub has_instance: bool,
    /// Pending extenders for the key
    pub extenders: usize,
}

impl BindingDescriptor {
    pub fn is_shared(&self) -> bool {
        self.lifetime.is_shared()
    }

    pub fn is_factory(&self) -> bool {
        self.target.is_none()
    }

    /// Bound to its own constructor.
    pub fn is_self_binding(&self) -> bool {
        self.target.as_ref() == Some(&self.key)
    }
}

impl fmt::Display for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.key, self.lifetime)?;
        match &self.target {
            Some(target) if *target == self.key => write!(f, " -> <constructor>")?,
            Some(target) => write!(f, " -> {}", target)?,
            None => write!(f, " -> <factory>")?,
        }
        if self.has_instance {
            write!(f, " [cached]")?;
        }
        if self.extenders > 0 {
            write!(f, " [{} extenders]", self.extenders)?;
        }
        Ok(())
    }
}
