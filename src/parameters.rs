//! Per-call parameter overrides.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::internal::Map;
use crate::registration::AnyArc;

/// Values that take precedence over injection for one `make_with` or `call`.
///
/// Overrides are keyed by constructor parameter name. Positional values are
/// accepted too: when dependencies are resolved they fill, in declared
/// order, the parameters that no named override matched.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::Parameters;
///
/// let params = Parameters::new()
///     .with("port", 8080u16)
///     .with("host", String::from("localhost"));
///
/// assert_eq!(*params.get_as::<u16>("port").unwrap(), 8080);
/// assert!(params.get_as::<u32>("port").is_none());
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Parameters {
    named: Map<String, AnyArc>,
    positional: Vec<AnyArc>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named override.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a named override from an already erased instance.
    pub fn with_any(mut self, name: impl Into<String>, value: AnyArc) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Appends a positional override.
    pub fn push<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.positional.push(Arc::new(value));
        self
    }

    /// Builds a set of positional overrides.
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator<Item = AnyArc>,
    {
        Self {
            named: Map::default(),
            positional: values.into_iter().collect(),
        }
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.named.insert(name.into(), Arc::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&AnyArc> {
        self.named.get(name)
    }

    /// Typed view of a named override.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.named.get(name).cloned().and_then(|v| v.downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn positional_values(&self) -> &[AnyArc] {
        &self.positional
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Parameters")
            .field("named", &names)
            .field("positional", &self.positional.len())
            .finish()
    }
}

impl<S: Into<String>> FromIterator<(S, AnyArc)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (S, AnyArc)>>(iter: I) -> Self {
        Self {
            named: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            positional: Vec::new(),
        }
    }
}
