//! Error types for containers, capability tables, injection and object creation.

use thiserror::Error;

use crate::key::Key;

/// Container resolution errors.
///
/// Raised by a [`ResolverCore`](crate::ResolverCore) when it cannot produce
/// the service stored under a key. During wiring these surface as the
/// [`source`](DependencyResolutionError::source) of a
/// [`DependencyResolutionError`].
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(key)) => {
///         assert_eq!(key.display_name(), "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Nothing is registered under the key
    #[error("Service not found: {0}")]
    NotFound(Key),
    /// The stored service could not be downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// A fallible service factory reported an error
    #[error("Factory for {type_name} failed: {message}")]
    Factory {
        type_name: &'static str,
        message: String,
    },
}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;

/// Wiring failure for one capability of one instance.
///
/// Identifies the instance type, the capability marker it satisfied and the
/// service key that could not be resolved or attached. Injection stops at
/// the first such failure; the partially wired instance must be discarded.
#[derive(Debug, Clone, Error)]
#[error("Failed to inject {marker} into {instance}: service {service_key} unavailable: {source}")]
pub struct DependencyResolutionError {
    /// Type name of the instance being wired
    pub instance: &'static str,
    /// Capability marker the instance satisfied
    pub marker: &'static str,
    /// Key the capability's service is registered under
    pub service_key: Key,
    /// Underlying container error
    #[source]
    pub source: DiError,
}

/// Instantiation errors raised before any wiring happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// No constructor registered under this type name
    #[error("Unknown type: {0}")]
    UnknownType(String),
    /// Wrong number of constructor arguments
    #[error("{type_name} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Constructor argument of the wrong type
    #[error("{type_name} argument {index} must be {expected}")]
    ArgumentType {
        type_name: &'static str,
        index: usize,
        expected: &'static str,
    },
    /// Constructor rejected otherwise well-typed arguments
    #[error("Invalid arguments for {type_name}: {message}")]
    Invalid {
        type_name: &'static str,
        message: String,
    },
    /// A dynamically created object is not of the requested type
    #[error("Created object is not a {expected}")]
    Downcast { expected: &'static str },
}

impl ConstructionError {
    /// Shorthand for [`ConstructionError::Invalid`].
    pub fn invalid(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            type_name,
            message: message.into(),
        }
    }
}

/// Errors from [`AbstractFactory`](crate::AbstractFactory) calls.
///
/// Only forwards the two underlying kinds unchanged.
#[derive(Debug, Clone, Error)]
pub enum CreateError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Dependency(#[from] DependencyResolutionError),
}

/// Capability table configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Two entries declare the same capability marker
    #[error("Capability {marker} declared more than once")]
    DuplicateMarker { marker: &'static str },
    /// The process-wide table was already installed or already read
    #[error("Process-wide capability table is already initialized")]
    AlreadyInstalled,
}
