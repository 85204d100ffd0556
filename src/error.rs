//! Error types for the container.
//!
//! Binding-resolution failures are the only recoverable kind: a typed
//! constructor parameter with a default value swallows them and uses the
//! default. Every other variant propagates to the caller.
//!
//! With the `tracing` feature, the helper constructors log the error at
//! `debug` level when it is created.

use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::key::Key;

/// Container errors
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, DiError};
///
/// let container = Container::new();
/// match container.get("missing") {
///     Err(DiError::EntryNotFound(id)) => assert_eq!(id, "missing"),
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["A".into(), "B".into(), "A".into()]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No override, contextual binding, registered binding or default could
    /// produce a dependency
    #[error("{0}")]
    BindingResolution(String),
    /// An identifier aliases to itself, directly or transitively
    #[error("{0} is aliased to itself")]
    AliasCycle(String),
    /// `get` on an identifier that is neither bound, aliased nor an instance
    #[error("No entry was found for [{0}]")]
    EntryNotFound(String),
    /// A method call target without a method segment or default method
    #[error("Method not provided for call target [{0}]")]
    MethodNotSpecified(String),
    /// Downcast of a resolved instance failed
    #[error("Type mismatch: expected {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("Resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// Configuration value could not be read
    #[error("Invalid container configuration: {0}")]
    InvalidConfig(String),
}

impl DiError {
    /// Whether a defaulted parameter may recover from this error.
    pub fn is_binding_resolution(&self) -> bool {
        matches!(self, DiError::BindingResolution(_))
    }

    pub(crate) fn logged(self) -> Self {
        #[cfg(feature = "tracing")]
        debug!(error = %self, "container error");
        self
    }

    /// A key with no binding and no constructor blueprint.
    pub(crate) fn not_instantiable(key: &Key) -> Self {
        DiError::BindingResolution(format!("Target [{}] is not instantiable", key)).logged()
    }

    /// An untyped parameter with nothing to fill it.
    pub(crate) fn unresolvable_primitive(parameter: &str, building: Option<&Key>) -> Self {
        let message = match building {
            Some(owner) => format!(
                "Unresolvable dependency resolving [{}] in [{}]",
                parameter, owner
            ),
            None => format!("Unresolvable dependency resolving [{}]", parameter),
        };
        DiError::BindingResolution(message).logged()
    }

    pub(crate) fn unbound_method(method: &str) -> Self {
        DiError::BindingResolution(format!("Method [{}] has no binding", method)).logged()
    }

    pub(crate) fn missing_argument(parameter: &str) -> Self {
        DiError::BindingResolution(format!("Argument [{}] was not resolved", parameter)).logged()
    }

    pub(crate) fn alias_cycle(key: &Key) -> Self {
        DiError::AliasCycle(key.to_string()).logged()
    }

    pub(crate) fn entry_not_found(key: &Key) -> Self {
        DiError::EntryNotFound(key.to_string()).logged()
    }

    pub(crate) fn method_not_specified(target: &str) -> Self {
        DiError::MethodNotSpecified(target.to_string()).logged()
    }

    pub(crate) fn type_mismatch(expected: &'static str) -> Self {
        DiError::TypeMismatch(expected).logged()
    }

    pub(crate) fn circular(path: Vec<String>) -> Self {
        DiError::Circular(path).logged()
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
