//! The process-wide default registry.
//!
//! Every test here registers its own types: the default registry is shared
//! by all tests of this binary.

use std::sync::Arc;

use refwire::prelude::*;

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

trait Scheduler: Send + Sync {
    fn next_tick(&self) -> u64;
}

#[derive(Default, Injectable)]
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        42
    }
}

impl Component for FixedClock {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Clock>(|c| c);
    }
}

#[derive(Default, Injectable)]
struct TickScheduler {
    #[inject(labels = "fixed")]
    clock: Inject<dyn Clock>,
}

impl Scheduler for TickScheduler {
    fn next_tick(&self) -> u64 {
        self.clock.now() + 1
    }
}

impl Component for TickScheduler {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Scheduler>(|c| c);
    }
}

#[derive(Default, Injectable)]
struct Worker {
    #[inject]
    scheduler: Inject<dyn Scheduler>,
}

#[test]
fn register_then_resolve() {
    refwire::register::<FixedClock>(&["fixed"]).unwrap();
    refwire::register::<TickScheduler>(&[]).unwrap();
    refwire::validate().unwrap();

    let worker = Worker::default();
    refwire::inject(&worker).unwrap();
    assert_eq!(worker.scheduler.next_tick(), 43);

    let mut slot: Option<Arc<dyn Clock>> = None;
    let clock = refwire::materialize_into(&mut slot, &["fixed"]).unwrap();
    assert!(Arc::ptr_eq(&clock, slot.as_ref().unwrap()));

    let scheduler: Arc<dyn Scheduler> = refwire::materialize(&[]).unwrap();
    assert_eq!(scheduler.next_tick(), 43);

    assert!(refwire::with_default_registry(|reg| reg.contains::<TickScheduler>()));
}

trait Unregistered: Send + Sync {}

#[test]
fn unregistered_interface_is_not_found() {
    let err = refwire::materialize::<dyn Unregistered>(&[]).err().unwrap();
    assert!(matches!(err, RefwireError::NotFound(_)));
}

trait Marker: Send + Sync {}

#[derive(Default, Injectable)]
struct Twice;

impl Marker for Twice {}

impl Component for Twice {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provides::<dyn Marker>(|c| c);
    }
}

#[test]
fn duplicate_in_default_registry() {
    refwire::register::<Twice>(&[]).unwrap();
    assert!(matches!(
        refwire::register::<Twice>(&[]),
        Err(RefwireError::DuplicateRegistration(_))
    ));
}
