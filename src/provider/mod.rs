//! Service provider module.
//!
//! This module contains the ServiceProvider type, the container the
//! injector resolves capability services from.

use std::sync::Arc;

use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub use context::ResolverContext;

/// Service provider for resolving registered services.
///
/// Resolves services according to their registered lifetimes: singletons
/// are built on first request and cached, transients are built on every
/// request.
///
/// The provider also answers for its own key: resolving
/// `key_of_type::<ServiceProvider>()` yields a clone of the provider unless
/// something else was registered under that key. This is what the built-in
/// [`WantsContainer`](crate::WantsContainer) capability resolves to.
///
/// # Thread Safety
///
/// ServiceProvider is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). Singleton initialization goes through a `OnceCell`, so
/// concurrent first requests agree on one instance.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub registry: Registry,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(ProviderInner { registry }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Returns true if a service is registered under `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.inner().registry.contains_key(key)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.inner().registry.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both handles point to the same provider.
    pub fn ptr_eq(&self, other: &ServiceProvider) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for (k, r) in self.inner().registry.iter() {
            s.push_str(&format!("  {}: {:?} (impl {:?})\n", k, r.lifetime, r.impl_id));
        }
        s
    }

    fn resolve_singleton(&self, reg: &Registration) -> DiResult<AnyArc> {
        if let Some(cell) = &reg.single_runtime {
            if let Some(value) = cell.get() {
                return Ok(value.clone());
            }

            // Build outside the cell so a failing factory leaves it empty.
            let ctx = ResolverContext::new(self);
            let v = (reg.ctor)(&ctx)?;
            return Ok(cell.get_or_init(|| v).clone());
        }

        let ctx = ResolverContext::new(self);
        (reg.ctor)(&ctx)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.len())
            .finish()
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self.inner().registry.get(key) {
            Some(reg) => {
                trace!(service = %key, lifetime = ?reg.lifetime, "resolving service");
                match reg.lifetime {
                    Lifetime::Singleton => self.resolve_singleton(reg),
                    Lifetime::Transient => {
                        let ctx = ResolverContext::new(self);
                        (reg.ctor)(&ctx)
                    }
                }
            }
            None if *key == key_of_type::<ServiceProvider>() => {
                Ok(Arc::new(self.clone()) as AnyArc)
            }
            None => Err(DiError::NotFound(key.clone())),
        }
    }
}
