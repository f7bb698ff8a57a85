//! The process-wide capability table.
//!
//! Kept in its own test binary since installation is one-shot per process.

use ferrous_wire::{
    capability, CapabilityTable, DependencyInjector, InjectionModule, Resolver, ServiceCollection,
    ServiceCollectionExt, TableError,
};

pub struct Tracer;
capability!(pub WithTracer: Tracer => "tracer");

#[test]
fn test_install_once_then_read() {
    let table = CapabilityTable::builder()
        .with::<WithTracer>()
        .with_builtins()
        .build()
        .unwrap();
    CapabilityTable::install(table).unwrap();

    assert!(CapabilityTable::global().contains::<WithTracer>());
    assert_eq!(
        CapabilityTable::install(CapabilityTable::builtins()),
        Err(TableError::AlreadyInstalled)
    );

    assert!(DependencyInjector::global().table().contains::<WithTracer>());
    assert!(DependencyInjector::default().table().contains::<WithTracer>());

    let mut sc = ServiceCollection::new();
    sc.add_default_injection();
    let sp = sc.build();
    assert_eq!(sp.get_required::<DependencyInjector>().table().len(), 4);

    let sp = ServiceCollection::new()
        .add_module(InjectionModule::global())
        .unwrap()
        .build();
    assert!(sp.get_required::<DependencyInjector>().table().contains::<WithTracer>());
}
