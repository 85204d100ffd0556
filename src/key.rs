//! Abstract identifiers for the container.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;

use crate::injectable::{Blueprint, Injectable};

/// Key for binding storage and lookup.
///
/// Every registry in the container (bindings, instances, aliases, contextual
/// bindings, extenders, callbacks, tags) is keyed by a `Key`. A key is either
/// a free-form name or a type reference.
///
/// # Key Types
///
/// - **Name**: string identifiers such as `"db"` or `"cache.store"`
/// - **Type**: concrete types and trait objects (`Key::of::<dyn Logger>()`)
///
/// A name and a type are never equal, even when the name happens to spell
/// the type's path.
///
/// A key made with [`Key::injectable`] also carries the type's constructor,
/// so the container can build the type when the key reaches it through an
/// alias, a binding, a contextual binding or a tag.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::Key;
///
/// struct Database;
/// trait Logger: Send + Sync {}
///
/// let by_name = Key::from("db");
/// let by_type = Key::of::<Database>();
/// let by_trait = Key::of::<dyn Logger>();
///
/// assert_eq!(by_name, Key::named("db"));
/// assert_ne!(by_type, by_trait);
/// assert!(by_type.display_name().ends_with("Database"));
/// ```
///
/// ```rust
/// use ferrous_container::{injectable, Container, Key};
///
/// struct Mailer;
/// injectable!(Mailer {});
///
/// let container = Container::new();
/// container.alias(Key::injectable::<Mailer>(), "mailer");
/// assert!(container.make_as::<Mailer>("mailer").is_ok());
/// assert_eq!(Key::injectable::<Mailer>(), Key::of::<Mailer>());
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Named abstract, compared by string
    Name(Cow<'static, str>),
    /// Type reference with TypeId, name for diagnostics and, for injectable
    /// types, the constructor
    ///
    /// Only the TypeId takes part in equality and hashing.
    Type(TypeId, &'static str, Option<Blueprint>),
}

impl Key {
    /// Key for a type or trait object.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key::Type(TypeId::of::<T>(), std::any::type_name::<T>(), None)
    }

    /// Key for an injectable type, carrying its constructor.
    pub fn injectable<T: Injectable>() -> Self {
        Blueprint::of::<T>().key()
    }

    /// Key for a string name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Key::Name(name.into())
    }

    /// Human-readable form used in error messages and logs.
    pub fn display_name(&self) -> &str {
        match self {
            Key::Name(name) => name,
            Key::Type(_, name, _) => name,
        }
    }

    /// The TypeId behind a type key.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Key::Type(id, _, _) => Some(*id),
            Key::Name(_) => None,
        }
    }

    /// Constructor carried by a key made with [`Key::injectable`].
    pub fn blueprint(&self) -> Option<Blueprint> {
        match self {
            Key::Type(_, _, blueprint) => *blueprint,
            Key::Name(_) => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Key::Type(..))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Key::Name(_))
    }
}

// TypeId-only comparison for type keys
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, ..), Key::Type(b, ..)) => a == b,
            (Key::Name(a), Key::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, ..) => {
                0u8.hash(state); // Discriminant
                id.hash(state);
            }
            Key::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<&'static str> for Key {
    fn from(name: &'static str) -> Self {
        Key::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Cow::Owned(name))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// Helper function for creating type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
