#![no_main]

use ferrous_wire::{
    capability, injectable, CapabilityExt, CapabilityTable, DependencyInjector, Resolver, ServiceCollection, Slot,
};
use libfuzzer_sys::fuzz_target;

pub struct A(u8);
pub struct B(u8);
pub struct C(u8);
pub struct D(u8);

capability!(pub WithA: A);
capability!(pub WithB: B => "b");
capability!(pub WithC: C);
capability!(pub WithD: D => "d");

#[derive(Default)]
struct Target {
    a: Slot<WithA>,
    b: Slot<WithB>,
    c: Slot<WithC>,
    d: Slot<WithD>,
}
injectable!(Target { a: WithA, b: WithB, c: WithC, d: WithD });

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let registered = data[0];
    let order = &data[1..];

    // Build a table from the byte order; duplicates must be rejected
    let mut builder = CapabilityTable::builder();
    let mut seen = [false; 4];
    let mut duplicate = false;
    for byte in order.iter().take(8) {
        let index = (*byte % 4) as usize;
        duplicate |= seen[index];
        seen[index] = true;
        builder = match index {
            0 => builder.with::<WithA>(),
            1 => builder.with::<WithB>(),
            2 => builder.with::<WithC>(),
            _ => builder.with::<WithD>(),
        };
    }
    let table = match builder.build() {
        Ok(table) => {
            assert!(!duplicate);
            table
        }
        Err(_) => {
            assert!(duplicate);
            return;
        }
    };

    let mut sc = ServiceCollection::new();
    if registered & 1 != 0 {
        sc.add_singleton(A(registered));
    }
    if registered & 2 != 0 {
        sc.add_named_singleton("b", B(registered));
    }
    if registered & 4 != 0 {
        sc.add_singleton(C(registered));
    }
    if registered & 8 != 0 {
        sc.add_named_singleton("d", D(registered));
    }
    let sp = sc.build();

    let injector = DependencyInjector::new(table);
    let mut target = Target::default();
    let missing = injector.diagnose(&target, &sp).len();
    match injector.resolve_dependencies(&mut target, &sp) {
        Ok(()) => {
            assert_eq!(missing, 0);
            if seen[0] {
                assert_eq!(target.capability::<WithA>().unwrap().0, sp.get_required::<A>().0);
            }
        }
        Err(_) => assert!(missing > 0),
    }
});
