//! Capability declarations and the per-instance accessor scaffolding.
//!
//! A *capability* is an optional dependency an object may declare, such as
//! "needs a logger". Each capability is a zero-sized marker type
//! implementing [`Capability`], which names the service type and the
//! container key it is resolved under. Objects declare capabilities by
//! embedding a [`Slot`] per capability and implementing [`Injectable`],
//! which the [`injectable!`](crate::injectable) macro does for them.
//!
//! # Examples
//!
//! ```
//! use ferrous_wire::{capability, injectable, CapabilityExt, Slot};
//!
//! pub trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
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
//!
//! injectable!(Foo { logger: WithLogger });
//!
//! let foo = Foo::default();
//! assert!(foo.capability::<WithLogger>().is_none());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::key::Key;
use crate::registration::AnyArc;

pub mod table;

pub use table::{CapabilityEntry, CapabilityTable, CapabilityTableBuilder};

/// A capability marker.
///
/// Implemented by zero-sized marker types, usually through the
/// [`capability!`](crate::capability) macro. The marker's `TypeId` is its
/// identity in a [`CapabilityTable`].
pub trait Capability: 'static {
    /// Service handed to instances declaring this capability.
    type Service: ?Sized + Send + Sync + 'static;

    /// Container key the service is resolved under.
    fn service_key() -> Key;

    /// Recovers the typed service from the container's type-erased storage.
    fn downcast(service: AnyArc) -> Option<Arc<Self::Service>>;

    /// Diagnostic name of the marker.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Holder for one capability's service.
///
/// Embedded as a field in objects that declare the capability. Setting an
/// already filled slot overwrites it.
pub struct Slot<C: Capability> {
    service: Option<Arc<C::Service>>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Capability> Slot<C> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            service: None,
            _marker: PhantomData,
        }
    }

    /// Creates a slot already holding `service`.
    pub fn with(service: Arc<C::Service>) -> Self {
        Self {
            service: Some(service),
            _marker: PhantomData,
        }
    }

    /// The injected service, if any.
    #[inline]
    pub fn get(&self) -> Option<&Arc<C::Service>> {
        self.service.as_ref()
    }

    /// Clones out the injected service.
    #[inline]
    pub fn cloned(&self) -> Option<Arc<C::Service>> {
        self.service.clone()
    }

    /// Stores `service`, replacing any previous one.
    #[inline]
    pub fn set(&mut self, service: Arc<C::Service>) {
        self.service = Some(service);
    }

    /// Removes and returns the injected service.
    pub fn take(&mut self) -> Option<Arc<C::Service>> {
        self.service.take()
    }

    /// Returns true once a service has been injected.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.service.is_some()
    }
}

impl<C: Capability> Default for Slot<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Capability> Clone for Slot<C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C: Capability> fmt::Debug for Slot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("capability", &C::name())
            .field("set", &self.is_set())
            .finish()
    }
}

/// Typed accessor pair for one capability.
pub trait Has<C: Capability> {
    fn slot(&self) -> &Slot<C>;
    fn slot_mut(&mut self) -> &mut Slot<C>;
}

/// Turbofish-friendly getters and setters over [`Has`].
///
/// `foo.capability::<WithLogger>()` instead of
/// `Has::<WithLogger>::slot(&foo).cloned()`.
pub trait CapabilityExt {
    /// The injected service for `C`, if set.
    fn capability<C: Capability>(&self) -> Option<Arc<C::Service>>
    where
        Self: Has<C>,
    {
        self.slot().cloned()
    }

    /// Sets the service for `C` by hand.
    fn set_capability<C: Capability>(&mut self, service: Arc<C::Service>)
    where
        Self: Has<C>,
    {
        self.slot_mut().set(service);
    }
}

impl<T: ?Sized> CapabilityExt for T {}

/// An object the injector can wire.
///
/// The membership test is `capability_slot`: given a marker's `TypeId` it
/// returns the matching [`Slot`] as `&mut dyn Any`, or `None` when the type
/// does not declare that capability. Implementations are normally generated
/// with [`injectable!`](crate::injectable); a manual implementation must
/// answer `declares` consistently with `capability_slot`.
///
/// ```
/// use std::any::{Any, TypeId};
/// use ferrous_wire::{capability, Injectable, Slot};
///
/// capability!(pub WithPort: u16 => "port");
///
/// #[derive(Default)]
/// struct Listener {
///     port: Slot<WithPort>,
/// }
///
/// impl Injectable for Listener {
///     fn capability_slot(&mut self, marker: TypeId) -> Option<&mut dyn Any> {
///         if marker == TypeId::of::<WithPort>() {
///             return Some(&mut self.port);
///         }
///         None
///     }
///
///     fn declares(&self, marker: TypeId) -> bool {
///         marker == TypeId::of::<WithPort>()
///     }
///
///     fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
///         self
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Returns the slot for `marker` when this type declares it.
    fn capability_slot(&mut self, marker: TypeId) -> Option<&mut dyn Any>;

    /// Returns true when this type declares `marker`.
    fn declares(&self, marker: TypeId) -> bool;

    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Converts a boxed instance back into `dyn Any` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

/// Declares a capability marker type.
///
/// Four forms, by service shape and key:
///
/// ```
/// use ferrous_wire::capability;
///
/// pub trait Logger: Send + Sync {}
/// pub struct Clock;
///
/// capability!(pub WithLogger: dyn Logger => "logger"); // named trait service
/// capability!(pub WithAnyLogger: dyn Logger);          // trait service
/// capability!(pub WithClock: Clock => "clock");        // named concrete service
/// capability!(pub WithDefaultClock: Clock);            // concrete service
/// ```
#[macro_export]
macro_rules! capability {
    (@marker $(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : dyn $svc:path => $key:literal $(;)?) => {
        $crate::capability!(@marker $(#[$meta])* $vis $name);
        impl $crate::Capability for $name {
            type Service = dyn $svc;
            fn service_key() -> $crate::Key {
                $crate::key_of_named_trait::<dyn $svc>($key)
            }
            fn downcast(service: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self::Service>> {
                $crate::downcast_trait::<dyn $svc>(service)
            }
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : dyn $svc:path $(;)?) => {
        $crate::capability!(@marker $(#[$meta])* $vis $name);
        impl $crate::Capability for $name {
            type Service = dyn $svc;
            fn service_key() -> $crate::Key {
                $crate::key_of_trait::<dyn $svc>()
            }
            fn downcast(service: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self::Service>> {
                $crate::downcast_trait::<dyn $svc>(service)
            }
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : $svc:ty => $key:literal $(;)?) => {
        $crate::capability!(@marker $(#[$meta])* $vis $name);
        impl $crate::Capability for $name {
            type Service = $svc;
            fn service_key() -> $crate::Key {
                $crate::key_of_named_type::<$svc>($key)
            }
            fn downcast(service: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self::Service>> {
                $crate::downcast_type::<$svc>(service)
            }
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : $svc:ty $(;)?) => {
        $crate::capability!(@marker $(#[$meta])* $vis $name);
        impl $crate::Capability for $name {
            type Service = $svc;
            fn service_key() -> $crate::Key {
                $crate::key_of_type::<$svc>()
            }
            fn downcast(service: $crate::AnyArc) -> ::std::option::Option<::std::sync::Arc<Self::Service>> {
                $crate::downcast_type::<$svc>(service)
            }
        }
    };
}

/// Implements [`Injectable`] and [`Has`] for a struct with [`Slot`] fields.
///
/// ```
/// use ferrous_wire::{capability, injectable, Slot};
///
/// pub struct Clock;
/// capability!(pub WithClock: Clock);
///
/// #[derive(Default)]
/// struct Job {
///     clock: Slot<WithClock>,
///     name: String,
/// }
///
/// injectable!(Job { clock: WithClock });
///
/// // A type without capabilities can still be created by the factory.
/// struct Plain;
/// injectable!(Plain);
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty { $($field:ident : $cap:ty),* $(,)? }) => {
        $(
            impl $crate::Has<$cap> for $ty {
                fn slot(&self) -> &$crate::Slot<$cap> {
                    &self.$field
                }
                fn slot_mut(&mut self) -> &mut $crate::Slot<$cap> {
                    &mut self.$field
                }
            }
        )*

        impl $crate::Injectable for $ty {
            #[allow(unused_variables)]
            fn capability_slot(
                &mut self,
                marker: ::std::any::TypeId,
            ) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                $(
                    if marker == ::std::any::TypeId::of::<$cap>() {
                        return ::std::option::Option::Some(&mut self.$field);
                    }
                )*
                ::std::option::Option::None
            }

            #[allow(unused_variables)]
            fn declares(&self, marker: ::std::any::TypeId) -> bool {
                $(marker == ::std::any::TypeId::of::<$cap>() ||)* false
            }

            fn into_any(
                self: ::std::boxed::Box<Self>,
            ) -> ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync> {
                self
            }
        }
    };
    ($ty:ty $(;)?) => {
        $crate::injectable!($ty {});
    };
}

capability! {
    /// Wants the container the instance is being wired from.
    pub WantsContainer: crate::ServiceProvider
}

capability! {
    /// Wants the dependency injector.
    pub WantsInjector: crate::DependencyInjector
}

capability! {
    /// Wants an abstract factory bound to the current container.
    pub WantsFactory: crate::AbstractFactory
}
