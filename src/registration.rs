//! Service registration types.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

/// Type-erased Arc for storage
pub type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    /// Implementation type, for diagnostics
    #[cfg_attr(not(feature = "diagnostics"), allow(dead_code))]
    pub(crate) impl_id: Option<TypeId>,
    /// Singleton cache, lock-free after initialization
    pub(crate) single_runtime: Option<OnceCell<AnyArc>>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, ctor: Ctor, impl_id: Option<TypeId>) -> Self {
        let single_runtime = match lifetime {
            Lifetime::Singleton => Some(OnceCell::new()),
            Lifetime::Transient => None,
        };

        Self {
            lifetime,
            ctor,
            impl_id,
            single_runtime,
        }
    }
}

/// Service registry holding all registrations.
///
/// Re-registering a key replaces the earlier registration.
#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<Key, Registration>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: Key, registration: Registration) {
        self.entries.insert(key, registration);
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key)
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg_attr(not(feature = "diagnostics"), allow(dead_code))]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.entries.iter()
    }
}

/// Recovers a concrete service stored as `Arc<T>`.
#[inline]
pub fn downcast_type<T: Send + Sync + 'static>(any: AnyArc) -> Option<Arc<T>> {
    any.downcast::<T>().ok()
}

/// Recovers a trait-object service stored as `Arc<Arc<T>>`.
#[inline]
pub fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> Option<Arc<T>> {
    any.downcast::<Arc<T>>().ok().map(|boxed| (*boxed).clone())
}
