//! Service module system for modular registration.
//!
//! This module provides traits for organizing service registrations into
//! reusable modules. The wiring services themselves are registered this way
//! (see [`InjectionModule`](crate::InjectionModule)).

use crate::{DiResult, ServiceCollection};

/// A module that can register services with a ServiceCollection.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{ServiceCollection, ServiceModule, ServiceCollectionExt, DiResult, Resolver};
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton(UserConfig::default());
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = ServiceCollection::new().add_module(UserModule)?.build();
/// assert!(provider.get::<UserConfig>().is_ok());
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the ServiceCollection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Extension trait providing by-value module chaining.
pub trait ServiceCollectionExt {
    /// Add a module to the service collection and return the collection.
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        module.register_services(&mut self)?;
        Ok(self)
    }
}

/// Extension trait providing in-place module registration.
pub trait ServiceCollectionModuleExt {
    /// Add a module to the service collection in-place.
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionModuleExt for ServiceCollection {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
