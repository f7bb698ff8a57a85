//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior in the
/// [`ServiceProvider`](crate::ServiceProvider).
///
/// Injection itself never caches anything: whatever the container hands
/// back for a capability's key is what gets attached.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<RequestModel, _>(|_| RequestModel { id: 7 });
///
/// let provider = services.build();
/// let db1 = provider.get_required::<Database>();
/// let db2 = provider.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let m1 = provider.get_required::<RequestModel>();
/// let m2 = provider.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&m1, &m2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance per provider, created on first request and cached.
    Singleton,
    /// New instance per resolution, never cached.
    Transient,
}
