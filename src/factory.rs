//! Object creation: construct, then wire.
//!
//! [`AbstractFactory`] is the front door for building injectable objects.
//! It constructs through [`Construct`] (statically) or a
//! [`ConstructorRegistry`] (by name), then runs the injector over the new
//! instance before handing it back. [`InjectionModule`] registers the
//! injector, a factory and a constructor registry into a
//! [`ServiceCollection`].

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityTable, Injectable, Slot, WantsContainer, WantsInjector};
use crate::collection::{ServiceCollection, ServiceModule};
use crate::config::InjectorConfig;
use crate::error::{ConstructionError, CreateError, DependencyResolutionError, DiError, DiResult};
use crate::injector::DependencyInjector;
use crate::lifetime::Lifetime;
use crate::observer::InjectionObserver;
use crate::provider::ServiceProvider;
use crate::traits::{Resolver, ResolverCore};

/// Type-erased constructor arguments.
pub type Args = Vec<Box<dyn Any + Send>>;

/// Builds an [`Args`] list.
///
/// ```
/// let args = ferrous_wire::args![1u32, "two".to_string()];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($arg) as ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send>),*]
    };
}

/// A type the factory can instantiate.
///
/// `construct` only builds the object; capabilities are wired afterwards by
/// the factory and must not be touched here.
pub trait Construct: Injectable + Sized {
    /// Constructor arguments, usually a tuple.
    type Args;

    fn construct(args: Self::Args) -> Result<Self, ConstructionError>;
}

/// Conversion from type-erased [`Args`] into typed constructor arguments.
///
/// Implemented for tuples of up to four elements.
pub trait FromArgs: Sized {
    /// Expected argument count.
    const ARITY: usize;

    fn from_args(type_name: &'static str, args: Args) -> Result<Self, ConstructionError>;
}

fn take_arg<A: Any>(
    type_name: &'static str,
    index: usize,
    arg: Option<Box<dyn Any + Send>>,
) -> Result<A, ConstructionError> {
    let arg = arg.ok_or(ConstructionError::ArgumentCount {
        type_name,
        expected: index + 1,
        actual: index,
    })?;
    arg.downcast::<A>()
        .map(|boxed| *boxed)
        .map_err(|_| ConstructionError::ArgumentType {
            type_name,
            index,
            expected: std::any::type_name::<A>(),
        })
}

macro_rules! impl_from_args {
    ($arity:expr; $($idx:tt $ty:ident),*) => {
        impl<$($ty: Any + Send),*> FromArgs for ($($ty,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_mut, unused_variables)]
            fn from_args(type_name: &'static str, args: Args) -> Result<Self, ConstructionError> {
                if args.len() != Self::ARITY {
                    return Err(ConstructionError::ArgumentCount {
                        type_name,
                        expected: Self::ARITY,
                        actual: args.len(),
                    });
                }
                let mut args = args.into_iter();
                Ok(($(take_arg::<$ty>(type_name, $idx, args.next())?,)*))
            }
        }
    };
}

impl_from_args!(0;);
impl_from_args!(1; 0 A);
impl_from_args!(2; 0 A, 1 B);
impl_from_args!(3; 0 A, 1 B, 2 C);
impl_from_args!(4; 0 A, 1 B, 2 C, 3 D);

type DynConstructor = Arc<dyn Fn(Args) -> Result<Box<dyn Injectable>, ConstructionError> + Send + Sync>;

/// Constructors addressable by type name.
///
/// Backs [`AbstractFactory::create_named`]. Registering a name twice
/// replaces the earlier constructor.
///
/// ```
/// use ferrous_wire::{injectable, Construct, ConstructionError, ConstructorRegistry};
///
/// struct Greeting(String);
/// injectable!(Greeting);
///
/// impl Construct for Greeting {
///     type Args = (String,);
///     fn construct((text,): (String,)) -> Result<Self, ConstructionError> {
///         Ok(Greeting(text))
///     }
/// }
///
/// let mut registry = ConstructorRegistry::new();
/// registry.register::<Greeting>("greeting");
/// assert!(registry.contains("greeting"));
/// ```
#[derive(Clone, Default)]
pub struct ConstructorRegistry {
    constructors: HashMap<String, DynConstructor>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `name`.
    pub fn register<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: Construct,
        T::Args: FromArgs,
    {
        let ctor = |args: Args| -> Result<Box<dyn Injectable>, ConstructionError> {
            let args = T::Args::from_args(type_name::<T>(), args)?;
            Ok(Box::new(T::construct(args)?))
        };
        self.constructors.insert(name.into(), Arc::new(ctor));
        self
    }

    /// Registers `T` under its full type name.
    pub fn register_type<T>(&mut self) -> &mut Self
    where
        T: Construct,
        T::Args: FromArgs,
    {
        self.register::<T>(type_name::<T>())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates `name` without wiring it.
    pub fn construct(&self, name: &str, args: Args) -> Result<Box<dyn Injectable>, ConstructionError> {
        let ctor = self
            .constructors
            .get(name)
            .ok_or_else(|| ConstructionError::UnknownType(name.to_string()))?;
        ctor(args)
    }
}

impl fmt::Debug for ConstructorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Creates objects and wires their capabilities.
///
/// The factory is itself a capability consumer: it wires its own
/// [`WantsInjector`] slot from the container it is bound to. The container
/// is captured as an opaque [`ResolverCore`], so any implementation works
/// through [`over`](Self::over). Resolving [`WantsFactory`](crate::WantsFactory)
/// from a provider set up with [`ServiceCollection::add_injection`] yields a
/// fresh factory bound to that provider.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ferrous_wire::{
///     capability, injectable, AbstractFactory, CapabilityExt, CapabilityTable, Construct,
///     ConstructionError, Resolver, ServiceCollection, Slot,
/// };
///
/// pub struct Clock;
/// capability!(pub WithClock: Clock);
///
/// #[derive(Default)]
/// struct Job {
///     name: String,
///     clock: Slot<WithClock>,
/// }
/// injectable!(Job { clock: WithClock });
///
/// impl Construct for Job {
///     type Args = String;
///     fn construct(name: String) -> Result<Self, ConstructionError> {
///         Ok(Job { name, ..Job::default() })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Clock);
/// services.add_injection(CapabilityTable::builder().with::<WithClock>().build()?);
/// let provider = services.build();
///
/// let factory = provider.get_required::<AbstractFactory>();
/// let job = factory.create_object::<Job>("nightly".into())?;
/// assert_eq!(job.name, "nightly");
/// assert!(job.capability::<WithClock>().is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct AbstractFactory {
    injector: Arc<DependencyInjector>,
    container: Arc<dyn ResolverCore>,
}

#[derive(Default)]
struct FactoryWiring {
    injector: Slot<WantsInjector>,
}

impl Injectable for FactoryWiring {
    fn capability_slot(&mut self, marker: TypeId) -> Option<&mut dyn Any> {
        if marker == TypeId::of::<WantsInjector>() {
            Some(&mut self.injector)
        } else {
            None
        }
    }

    fn declares(&self, marker: TypeId) -> bool {
        marker == TypeId::of::<WantsInjector>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<AbstractFactory>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl AbstractFactory {
    /// Binds a factory to the provider answering `resolver`.
    ///
    /// `resolver` is usually a [`ServiceProvider`] or the context handed to
    /// a registration factory; the owned container handle is resolved
    /// through [`WantsContainer`]. Use [`over`](Self::over) for containers
    /// that cannot hand out such a handle.
    pub fn new(resolver: &dyn ResolverCore) -> Result<Self, DependencyResolutionError> {
        let provider: Arc<ServiceProvider> = resolve_builtin::<WantsContainer>(resolver)?;
        Self::over(provider)
    }

    /// Binds a factory to `container`.
    ///
    /// Fails when the container has no [`DependencyInjector`].
    pub fn over(container: Arc<dyn ResolverCore>) -> Result<Self, DependencyResolutionError> {
        let bootstrap = resolve_builtin::<WantsInjector>(container.as_ref())?;

        let mut wiring = FactoryWiring::default();
        bootstrap.resolve_dependencies(&mut wiring, container.as_ref())?;

        // A table without the built-ins leaves the slot empty.
        let injector = wiring.injector.take().unwrap_or(bootstrap);
        Ok(Self { injector, container })
    }

    /// Constructs `T` from `args` and wires its capabilities.
    pub fn create_object<T: Construct>(&self, args: T::Args) -> Result<T, CreateError> {
        let mut instance = T::construct(args)?;
        self.injector
            .resolve_dependencies(&mut instance, self.container.as_ref())?;
        Ok(instance)
    }

    /// Constructs the type registered as `name` in the container's
    /// [`ConstructorRegistry`] and wires it.
    ///
    /// A container without a registry knows no names. Any other failure
    /// to resolve the registry is reported as invalid construction.
    pub fn create_named(&self, name: &str, args: Args) -> Result<Box<dyn Injectable>, CreateError> {
        let registry = self
            .container
            .get::<ConstructorRegistry>()
            .map_err(|err| match err {
                DiError::NotFound(_) => ConstructionError::UnknownType(name.to_string()),
                other => ConstructionError::invalid(type_name::<ConstructorRegistry>(), other.to_string()),
            })?;
        let mut instance = registry.construct(name, args)?;
        self.injector
            .resolve_dependencies(instance.as_mut(), self.container.as_ref())?;
        Ok(instance)
    }

    /// [`create_named`](Self::create_named), downcast to `T`.
    pub fn create_named_as<T: Injectable>(&self, name: &str, args: Args) -> Result<T, CreateError> {
        let instance = self.create_named(name, args)?;
        instance
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ConstructionError::Downcast { expected: type_name::<T>() }.into())
    }

    /// Wires an instance constructed elsewhere.
    pub fn wire(&self, instance: &mut dyn Injectable) -> Result<(), DependencyResolutionError> {
        self.injector.resolve_dependencies(instance, self.container.as_ref())
    }

    pub fn injector(&self) -> &Arc<DependencyInjector> {
        &self.injector
    }

    /// The container objects are wired from.
    pub fn container(&self) -> &dyn ResolverCore {
        self.container.as_ref()
    }
}

impl fmt::Debug for AbstractFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbstractFactory")
            .field("injector", &self.injector)
            .finish_non_exhaustive()
    }
}

fn resolve_builtin<C: Capability>(
    container: &dyn ResolverCore,
) -> Result<Arc<C::Service>, DependencyResolutionError> {
    container
        .resolve_any(&C::service_key())
        .and_then(|service| C::downcast(service).ok_or(DiError::TypeMismatch(type_name::<C::Service>())))
        .map_err(|source| DependencyResolutionError {
            instance: type_name::<AbstractFactory>(),
            marker: C::name(),
            service_key: C::service_key(),
            source,
        })
}

/// Registers the wiring services.
///
/// Adds a [`DependencyInjector`] singleton over the given table (built-ins
/// appended), an [`AbstractFactory`] transient and a [`ConstructorRegistry`]
/// singleton.
///
/// ```
/// use std::sync::Arc;
/// use ferrous_wire::{
///     CapabilityTable, InjectionModule, InjectorConfig, MetricsObserver, Resolver,
///     ServiceCollection, ServiceCollectionExt, DependencyInjector,
/// };
///
/// let provider = ServiceCollection::new()
///     .add_module(
///         InjectionModule::new(CapabilityTable::builtins())
///             .with_config(InjectorConfig::default().trace_attachments(true))
///             .with_observer(Arc::new(MetricsObserver::new())),
///     )?
///     .build();
///
/// assert!(provider.get_required::<DependencyInjector>().config().trace_attachments);
/// # Ok::<(), ferrous_wire::DiError>(())
/// ```
pub struct InjectionModule {
    table: CapabilityTable,
    config: InjectorConfig,
    constructors: ConstructorRegistry,
    observers: Vec<Arc<dyn InjectionObserver>>,
}

impl InjectionModule {
    pub fn new(table: CapabilityTable) -> Self {
        Self {
            table,
            config: InjectorConfig::default(),
            constructors: ConstructorRegistry::default(),
            observers: Vec::new(),
        }
    }

    /// Module over the process-wide table.
    pub fn global() -> Self {
        Self::new(CapabilityTable::global().as_ref().clone())
    }

    pub fn with_config(mut self, config: InjectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_constructors(mut self, constructors: ConstructorRegistry) -> Self {
        self.constructors = constructors;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn InjectionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn install(self, services: &mut ServiceCollection) {
        let mut injector = DependencyInjector::with_config(self.table.with_builtins(), self.config);
        for observer in self.observers {
            injector.add_observer(observer);
        }

        services.add_singleton(injector);
        services.add_singleton(self.constructors);
        services.add_fallible_factory::<AbstractFactory, _, _>(Lifetime::Transient, |r| {
            AbstractFactory::new(r)
        });
    }
}

impl ServiceModule for InjectionModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        self.install(services);
        Ok(())
    }
}

impl ServiceCollection {
    /// Registers the wiring services over `table`.
    pub fn add_injection(&mut self, table: CapabilityTable) -> &mut Self {
        InjectionModule::new(table).install(self);
        self
    }

    /// Registers the wiring services over the process-wide table.
    pub fn add_default_injection(&mut self) -> &mut Self {
        InjectionModule::global().install(self);
        self
    }
}
