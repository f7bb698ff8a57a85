//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_named_trait, key_of_named_type, key_of_trait, key_of_type, Key};
use crate::registration::{downcast_trait, downcast_type, AnyArc};

/// Core resolver trait for object-safe service resolution.
///
/// This is the container contract the
/// [`DependencyInjector`](crate::DependencyInjector) consumes: a single
/// `get(key) -> service` operation that fails with
/// [`DiError::NotFound`] for unregistered keys. Implementations must be
/// safe to call from several threads at once.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed generic methods built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves the type-erased service stored under `key`.
    ///
    /// Concrete services come back as `Arc<T>`, trait services as
    /// `Arc<Arc<dyn Trait>>`, both erased to `Arc<dyn Any>`.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Implemented for every [`ResolverCore`], so `ServiceProvider` and the
/// `ResolverContext` handed to factories share the same API.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = collection.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// provider.get_required_trait::<dyn Logger>().log("resolved");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_type::<T>())?;
        downcast_type::<T>(any).ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a trait implementation.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_trait::<T>())?;
        downcast_trait::<T>(any).ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a named concrete service type.
    fn get_named<T: 'static + Send + Sync>(&self, name: &'static str) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_named_type::<T>(name))?;
        downcast_type::<T>(any).ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a named trait implementation.
    fn get_named_trait<T: ?Sized + 'static + Send + Sync>(&self, name: &'static str) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_named_trait::<T>(name))?;
        downcast_trait::<T>(any).ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a concrete service type, panicking on failure.
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a named concrete service type, panicking on failure.
    fn get_named_required<T: 'static + Send + Sync>(&self, name: &'static str) -> Arc<T> {
        self.get_named::<T>(name)
            .unwrap_or_else(|e| panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<T>(), name, e))
    }

    /// Resolves a named trait implementation, panicking on failure.
    fn get_named_trait_required<T: ?Sized + 'static + Send + Sync>(&self, name: &'static str) -> Arc<T> {
        self.get_named_trait::<T>(name)
            .unwrap_or_else(|e| panic!("Failed to resolve named trait {} ({}): {}", std::any::type_name::<T>(), name, e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
