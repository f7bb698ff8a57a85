//! Integration tests for the dependency injector.
//!
//! These cover which slots get filled, what happens when a service is
//! missing, and the built-in self capabilities.

use ferrous_wire::{
    capability, injectable, AbstractFactory, AnyArc, CapabilityExt, CapabilityTable, DependencyInjector,
    DiError, DiResult, Injectable, Key, MetricsObserver, Resolver, ResolverCore, ServiceCollection,
    ServiceProvider, Slot, WantsContainer, WantsFactory, WantsInjector,
};
use std::sync::Arc;

// ===== Test Services =====

pub trait Logger: Send + Sync {
    fn name(&self) -> &str;
}

struct MemoryLogger(&'static str);

impl Logger for MemoryLogger {
    fn name(&self) -> &str {
        self.0
    }
}

pub struct Clock {
    pub tick: u64,
}

pub struct Mailer;

capability!(pub WithLogger: dyn Logger => "logger");
capability!(pub WithClock: Clock);
capability!(pub WithMailer: Mailer => "mailer");
capability!(pub WithUnlisted: u32);

#[derive(Default)]
struct Service {
    logger: Slot<WithLogger>,
    clock: Slot<WithClock>,
    mailer: Slot<WithMailer>,
}
injectable!(Service { logger: WithLogger, clock: WithClock, mailer: WithMailer });

#[derive(Default)]
struct OnlyUnlisted {
    value: u32,
    unlisted: Slot<WithUnlisted>,
}
injectable!(OnlyUnlisted { unlisted: WithUnlisted });

struct Plain {
    payload: Vec<u8>,
}
injectable!(Plain);

#[derive(Default)]
struct SelfAware {
    container: Slot<WantsContainer>,
    injector: Slot<WantsInjector>,
    factory: Slot<WantsFactory>,
}
injectable!(SelfAware {
    container: WantsContainer,
    injector: WantsInjector,
    factory: WantsFactory,
});

fn ordered_table() -> CapabilityTable {
    CapabilityTable::builder()
        .with::<WithLogger>()
        .with::<WithMailer>()
        .with::<WithClock>()
        .build()
        .unwrap()
}

fn full_provider() -> ServiceProvider {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton_trait::<dyn Logger>("logger", Arc::new(MemoryLogger("app")));
    sc.add_singleton(Clock { tick: 1 });
    sc.add_named_singleton("mailer", Mailer);
    sc.build()
}

// ===== Wiring =====

#[test]
fn test_declared_capabilities_match_container_services() {
    let sp = full_provider();
    let injector = DependencyInjector::new(ordered_table());

    let mut service = Service::default();
    injector.resolve_dependencies(&mut service, &sp).unwrap();

    let logger = service.capability::<WithLogger>().unwrap();
    assert!(Arc::ptr_eq(&logger, &sp.get_named_trait_required::<dyn Logger>("logger")));
    assert!(Arc::ptr_eq(
        &service.capability::<WithClock>().unwrap(),
        &sp.get_required::<Clock>()
    ));
    assert!(service.mailer.is_set());
    assert_eq!(logger.name(), "app");
}

#[test]
fn test_instance_without_capabilities_is_untouched() {
    let sp = ServiceCollection::new().build();
    let injector = DependencyInjector::new(ordered_table().with_builtins());

    let mut plain = Plain { payload: vec![1, 2, 3] };
    injector.resolve_dependencies(&mut plain, &sp).unwrap();
    assert_eq!(plain.payload, vec![1, 2, 3]);

    let mut unlisted = OnlyUnlisted { value: 5, ..Default::default() };
    injector.resolve_dependencies(&mut unlisted, &sp).unwrap();
    assert_eq!(unlisted.value, 5);
    assert!(!unlisted.unlisted.is_set());
}

#[test]
fn test_reinjection_yields_same_state() {
    let sp = full_provider();
    let injector = DependencyInjector::new(ordered_table());

    let mut service = Service::default();
    injector.resolve_dependencies(&mut service, &sp).unwrap();
    let first_logger = service.capability::<WithLogger>().unwrap();
    let first_clock = service.capability::<WithClock>().unwrap();

    injector.resolve_dependencies(&mut service, &sp).unwrap();
    assert!(Arc::ptr_eq(&first_logger, &service.capability::<WithLogger>().unwrap()));
    assert!(Arc::ptr_eq(&first_clock, &service.capability::<WithClock>().unwrap()));
}

#[test]
fn test_transient_service_is_overwritten_on_reinjection() {
    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Clock, _>(|_| Clock { tick: 0 });
    let sp = sc.build();
    let injector = DependencyInjector::new(CapabilityTable::builder().with::<WithClock>().build().unwrap());

    let mut service = Service::default();
    injector.resolve_dependencies(&mut service, &sp).unwrap();
    let first = service.capability::<WithClock>().unwrap();
    injector.resolve_dependencies(&mut service, &sp).unwrap();
    assert!(!Arc::ptr_eq(&first, &service.capability::<WithClock>().unwrap()));
}

#[test]
fn test_failure_stops_at_first_missing_service() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton_trait::<dyn Logger>("logger", Arc::new(MemoryLogger("app")));
    sc.add_singleton(Clock { tick: 1 });
    let sp = sc.build();

    let metrics = Arc::new(MetricsObserver::new());
    let mut injector = DependencyInjector::new(ordered_table());
    injector.add_observer(metrics.clone());

    let mut service = Service::default();
    let err = injector.resolve_dependencies(&mut service, &sp).unwrap_err();

    assert!(err.marker.ends_with("WithMailer"));
    assert_eq!(err.service_key.service_name(), Some("mailer"));
    assert!(err.instance.ends_with("Service"));
    assert!(matches!(err.source, DiError::NotFound(ref key) if *key == err.service_key));

    // The logger precedes the failure, the clock follows it
    assert!(service.logger.is_set());
    assert!(!service.mailer.is_set());
    assert!(!service.clock.is_set());
    assert_eq!(metrics.attached_count(), 1);
    assert_eq!(metrics.failure_count(), 1);
}

#[test]
fn test_error_source_chains_to_container_error() {
    use std::error::Error;

    let sp = ServiceCollection::new().build();
    let injector = DependencyInjector::new(ordered_table());
    let err = injector.resolve_dependencies(&mut Service::default(), &sp).unwrap_err();

    let source = err.source().expect("container error as source");
    assert!(source.to_string().starts_with("Service not found"));
}

// ===== Diagnostics =====

#[test]
fn test_diagnose_reports_every_missing_service() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Clock { tick: 1 });
    let sp = sc.build();
    let injector = DependencyInjector::new(ordered_table());

    let service = Service::default();
    let problems = injector.diagnose(&service, &sp);

    let markers: Vec<_> = problems.iter().map(|e| e.marker).collect();
    assert_eq!(markers.len(), 2);
    assert!(markers[0].ends_with("WithLogger"));
    assert!(markers[1].ends_with("WithMailer"));
    assert!(!service.clock.is_set());
}

/// Container that answers every key with the wrong type.
struct Mismatched;

impl ResolverCore for Mismatched {
    fn resolve_any(&self, _key: &Key) -> DiResult<AnyArc> {
        Ok(Arc::new("not the service"))
    }
}

#[test]
fn test_wrongly_typed_service_is_a_type_mismatch() {
    let injector = DependencyInjector::new(ordered_table());

    let problems = injector.diagnose(&Service::default(), &Mismatched);
    assert_eq!(problems.len(), 3);
    assert!(problems.iter().all(|e| matches!(e.source, DiError::TypeMismatch(_))));

    let mut service = Service::default();
    let err = injector.resolve_dependencies(&mut service, &Mismatched).unwrap_err();
    assert!(err.marker.ends_with("WithLogger"));
    assert!(!service.logger.is_set());

    // Both paths name the expected service type
    let expected = std::any::type_name::<dyn Logger>();
    assert!(matches!(err.source, DiError::TypeMismatch(name) if name == expected));
    assert!(matches!(problems[0].source, DiError::TypeMismatch(name) if name == expected));
}

#[test]
fn test_satisfied_markers() {
    let injector = DependencyInjector::new(ordered_table().with_builtins());

    let markers = injector.satisfied_markers(&Service::default());
    assert_eq!(markers.len(), 3);
    assert!(injector.satisfied_markers(&Plain { payload: vec![] }).is_empty());
    assert_eq!(injector.satisfied_markers(&SelfAware::default()).len(), 3);
}

// ===== Built-in self capabilities =====

#[test]
fn test_self_capabilities_resolve_to_current_container() {
    let mut sc = ServiceCollection::new();
    sc.add_injection(CapabilityTable::builtins());
    let sp = sc.build();

    let factory = sp.get_required::<AbstractFactory>();
    let mut aware = SelfAware::default();
    factory.wire(&mut aware).unwrap();

    assert!(aware.capability::<WantsContainer>().unwrap().ptr_eq(&sp));
    assert!(Arc::ptr_eq(
        &aware.capability::<WantsInjector>().unwrap(),
        &sp.get_required::<DependencyInjector>()
    ));
    let nested = aware.capability::<WantsFactory>().unwrap();
    assert!(nested
        .container()
        .get_required::<ServiceProvider>()
        .ptr_eq(&sp));
}

#[test]
fn test_self_capabilities_fail_without_injection_services() {
    let sp = ServiceCollection::new().build();
    let injector = DependencyInjector::new(CapabilityTable::builtins());

    let mut aware = SelfAware::default();
    let err = injector.resolve_dependencies(&mut aware, &sp).unwrap_err();

    // The container answers for itself; the injector is not registered
    assert!(aware.container.is_set());
    assert!(err.marker.ends_with("WantsInjector"));
}

#[test]
fn test_boxed_instances_are_wired_through_trait_object() {
    let sp = full_provider();
    let injector = DependencyInjector::new(ordered_table());

    let mut boxed: Box<dyn Injectable> = Box::new(Service::default());
    injector.resolve_dependencies(boxed.as_mut(), &sp).unwrap();

    let service = boxed.into_any().downcast::<Service>().unwrap();
    assert!(service.logger.is_set() && service.clock.is_set() && service.mailer.is_set());
}
