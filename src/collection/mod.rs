//! Service collection module.
//!
//! This module contains the ServiceCollection type used to register the
//! services that capabilities resolve to, and to build a service provider.

use std::any::TypeId;
use std::fmt::Display;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_named_trait, key_of_named_type, key_of_trait, key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, Registration, Registry};
use crate::ServiceProvider;

pub mod module_system;
pub use module_system::*;

/// Registration surface for services.
///
/// Registering the same key twice replaces the earlier registration.
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    // ----- Concrete Type Registrations -----

    /// Registers a singleton instance that will be shared across the entire application.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_wire::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.add_instance(key_of_type::<T>(), Arc::new(value), Some(TypeId::of::<T>()))
    }

    /// Registers a singleton factory that creates the instance on first request.
    ///
    /// The factory is called once and the result is cached. It receives a
    /// `ResolverContext` to resolve its own dependencies.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a transient factory that creates a new instance on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_type::<T>(), Lifetime::Transient, factory)
    }

    /// Registers a factory that may fail.
    ///
    /// A failure is reported to the resolving caller as [`DiError::Factory`]
    /// and, for singletons, nothing is cached so the next request retries.
    ///
    /// ```rust
    /// # use ferrous_wire::{ServiceCollection, Lifetime, Resolver, DiError};
    /// struct Port(u16);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_fallible_factory::<Port, _, _>(Lifetime::Singleton, |_| {
    ///     "80x".parse::<u16>().map(Port)
    /// });
    ///
    /// let provider = services.build();
    /// assert!(matches!(provider.get::<Port>(), Err(DiError::Factory { .. })));
    /// ```
    pub fn add_fallible_factory<T, E, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        E: Display,
        F: Fn(&ResolverContext) -> Result<T, E> + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            factory(r)
                .map(|value| Arc::new(value) as AnyArc)
                .map_err(|e| DiError::Factory {
                    type_name: std::any::type_name::<T>(),
                    message: e.to_string(),
                })
        };
        self.registry.insert(
            key_of_type::<T>(),
            Registration::new(lifetime, Arc::new(ctor), Some(TypeId::of::<T>())),
        );
        self
    }

    fn add_factory<T, F>(&mut self, key: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(r))) };
        self.registry.insert(
            key,
            Registration::new(lifetime, Arc::new(ctor), Some(TypeId::of::<T>())),
        );
        self
    }

    fn add_instance(&mut self, key: Key, value: AnyArc, impl_id: Option<TypeId>) -> &mut Self {
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(value.clone()) };
        self.registry
            .insert(key, Registration::new(Lifetime::Singleton, Arc::new(ctor), impl_id));
        self
    }

    // ----- Trait Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_wire::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, _message: &str) {}
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// let logger = Arc::new(FileLogger { path: "/var/log/app.log".to_string() });
    /// services.add_singleton_trait::<dyn Logger>(logger);
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        // Stored as Arc<Arc<dyn Trait>> so it can live behind `dyn Any`
        self.add_instance(key_of_trait::<T>(), Arc::new(value), None)
    }

    /// Registers a singleton trait factory, called on first request.
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_factory(key_of_trait::<Trait>(), Lifetime::Singleton, factory)
    }

    /// Registers a transient trait factory, called on every request.
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_factory(key_of_trait::<Trait>(), Lifetime::Transient, factory)
    }

    // ----- Named Registrations -----

    /// Registers a named singleton.
    ///
    /// ```
    /// use ferrous_wire::{ServiceCollection, Resolver};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_named_singleton("primary", 42usize);
    /// services.add_named_singleton("secondary", 100usize);
    ///
    /// let provider = services.build();
    /// assert_eq!(*provider.get_named_required::<usize>("secondary"), 100);
    /// ```
    pub fn add_named_singleton<T: 'static + Send + Sync>(&mut self, name: &'static str, value: T) -> &mut Self {
        self.add_instance(key_of_named_type::<T>(name), Arc::new(value), Some(TypeId::of::<T>()))
    }

    /// Registers a named singleton factory.
    pub fn add_named_singleton_factory<T, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_named_type::<T>(name), Lifetime::Singleton, factory)
    }

    /// Registers a named transient factory.
    pub fn add_named_transient_factory<T, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(key_of_named_type::<T>(name), Lifetime::Transient, factory)
    }

    /// Registers a named singleton trait implementation.
    pub fn add_named_singleton_trait<T>(&mut self, name: &'static str, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        self.add_instance(key_of_named_trait::<T>(name), Arc::new(value), None)
    }

    /// Registers a named trait factory with the given lifetime.
    pub fn add_named_trait_factory<Trait, F>(&mut self, name: &'static str, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_factory(key_of_named_trait::<Trait>(name), lifetime, factory)
    }

    // ----- Introspection -----

    /// Returns true if a service is registered under `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.registry.contains_key(key)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Builds the service provider.
    ///
    /// ```
    /// use ferrous_wire::{ServiceCollection, Resolver};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(42usize);
    /// services.add_singleton("Hello".to_string());
    ///
    /// let provider = services.build();
    /// assert_eq!(*provider.get_required::<usize>(), 42);
    /// assert_eq!(&*provider.get_required::<String>(), "Hello");
    /// ```
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::new(self.registry)
    }
}
