//! Service key types for container lookups and capability tables.

use std::any::TypeId;
use std::fmt;

/// Key for service storage and lookup.
///
/// Keys identify services in the container. Every capability in a
/// [`CapabilityTable`](crate::CapabilityTable) names the key its service is
/// resolved under, so a missing registration shows up as the key that
/// could not be found.
///
/// # Key Types
///
/// - **Type**: Concrete types (structs, enums, primitives)
/// - **Trait**: Trait objects such as `dyn Logger`
/// - **Named variants**: Both of the above with an additional string name
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Key, key_of_type, key_of_trait};
///
/// trait Logger: Send + Sync {}
///
/// let by_type = key_of_type::<u32>();
/// let by_trait = key_of_trait::<dyn Logger>();
/// let named = Key::TraitNamed(std::any::type_name::<dyn Logger>(), "logger");
///
/// assert_eq!(by_type.display_name(), "u32");
/// assert_eq!(by_trait.service_name(), None);
/// assert_eq!(named.service_name(), Some("logger"));
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key. Only stores the trait name since `dyn Trait`
    /// storage is keyed by name.
    Trait(&'static str),
    /// Named concrete type key with TypeId, type name, and service name
    TypeNamed(TypeId, &'static str, &'static str),
    /// Named trait key with trait name and service name
    TraitNamed(&'static str, &'static str),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// Returns the `std::any::type_name` of the stored service.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
            Key::TypeNamed(_, name, _) => name,
            Key::TraitNamed(name, _) => name,
        }
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(_, _) | Key::Trait(_) => None,
            Key::TypeNamed(_, _, name) => Some(name),
            Key::TraitNamed(_, name) => Some(name),
        }
    }

    /// Returns true for trait-object keys.
    ///
    /// Trait services are stored as `Arc<Arc<dyn Trait>>` inside the
    /// container, concrete services as `Arc<T>`.
    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(_) | Key::TraitNamed(_, _))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_name() {
            Some(name) => write!(f, "{}@{}", self.display_name(), name),
            None => f.write_str(self.display_name()),
        }
    }
}

// TypeId-only comparison for concrete types; names are diagnostics
impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => a == b && name_a == name_b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::TraitNamed(a, name_a), Key::TraitNamed(b, name_b)) => a == b && name_a == name_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            Key::TraitNamed(name, named) => {
                3u8.hash(state);
                name.hash(state);
                named.hash(state);
            }
        }
    }
}

/// Key of a concrete service type.
#[inline]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key of a named concrete service type.
#[inline]
pub fn key_of_named_type<T: 'static>(name: &'static str) -> Key {
    Key::TypeNamed(TypeId::of::<T>(), std::any::type_name::<T>(), name)
}

/// Key of a trait-object service, e.g. `key_of_trait::<dyn Logger>()`.
#[inline]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}

/// Key of a named trait-object service.
#[inline]
pub fn key_of_named_trait<T: ?Sized + 'static>(name: &'static str) -> Key {
    Key::TraitNamed(std::any::type_name::<T>(), name)
}
