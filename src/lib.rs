//! # ferrous-wire
//!
//! Capability-based dependency injection for Rust.
//!
//! Objects declare optional dependencies ("capabilities") as typed
//! [`Slot`] fields. A [`CapabilityTable`] lists the known capabilities and
//! the container key each one's service lives under. The
//! [`DependencyInjector`] walks the table and fills the slots an object
//! declares from a [`ServiceProvider`], and the [`AbstractFactory`] combines
//! construction with injection so callers get fully wired objects.
//!
//! ## Features
//!
//! - **Explicit capability table**: adding a capability is one marker type
//!   and one `.with::<Marker>()` call
//! - **Typed accessors**: `Slot<C>` holds `Arc<C::Service>`, no downcasts at
//!   use sites
//! - **Self capabilities**: objects may ask for the container, the injector
//!   or a factory like any other service
//! - **Fail-fast wiring** with a separate [`DependencyInjector::diagnose`]
//!   dry run reporting every missing service
//! - **Thread-safe**: tables, injectors, factories and providers are
//!   `Send + Sync`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ferrous_wire::{
//!     capability, injectable, AbstractFactory, CapabilityExt, CapabilityTable, Construct,
//!     ConstructionError, Resolver, ServiceCollection, Slot,
//! };
//!
//! pub trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! capability! {
//!     /// Wants the application logger.
//!     pub WithLogger: dyn Logger => "logger"
//! }
//!
//! #[derive(Default)]
//! struct Foo {
//!     logger: Slot<WithLogger>,
//! }
//! injectable!(Foo { logger: WithLogger });
//!
//! impl Construct for Foo {
//!     type Args = ();
//!     fn construct(_: ()) -> Result<Self, ConstructionError> {
//!         Ok(Foo::default())
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_named_singleton_trait::<dyn Logger>("logger", Arc::new(ConsoleLogger));
//! services.add_injection(CapabilityTable::builder().with::<WithLogger>().build()?);
//! let provider = services.build();
//!
//! let factory = provider.get_required::<AbstractFactory>();
//! let foo = factory.create_object::<Foo>(())?;
//! foo.capability::<WithLogger>().unwrap().log("wired");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//!
//! Wiring is instrumented with `tracing`: one `resolve_dependencies` span
//! per instance, `trace` events per attached capability and `warn` events
//! for failures and slow resolutions. The library never installs a
//! subscriber.

pub mod capability;
pub mod collection;
pub mod config;
pub mod error;
pub mod factory;
pub mod injector;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod traits;

mod registration;

pub use capability::{
    Capability, CapabilityEntry, CapabilityExt, CapabilityTable, CapabilityTableBuilder, Has, Injectable, Slot,
    WantsContainer, WantsFactory, WantsInjector,
};
pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule};
pub use config::InjectorConfig;
pub use error::{ConstructionError, CreateError, DependencyResolutionError, DiError, DiResult, TableError};
pub use factory::{AbstractFactory, Args, Construct, ConstructorRegistry, FromArgs, InjectionModule};
pub use injector::DependencyInjector;
pub use key::{key_of_named_trait, key_of_named_type, key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{InjectionObserver, LoggingObserver, MetricsObserver};
pub use provider::{ResolverContext, ServiceProvider};
pub use registration::{downcast_trait, downcast_type, AnyArc};
pub use traits::{Resolver, ResolverCore};
