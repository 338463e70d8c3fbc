//! # The Injector: one resolution call
//!
//! An [`Injector`] owns the [`ResolutionCache`] for a single top-level
//! `inject` or `materialize` call and walks injection points recursively.
//!
//! ```text
//! inject(target) ──for each field──> materialize(interface, labels)
//!        ▲                                  │
//!        │                       find ─> cache hit? ──yes──> reuse
//!        │                                  │ no
//!        │                     construct: Default ─> cache ─┐
//!        └──────────────── inject(new instance) <───────────┘
//!                                   │
//!                              initialize()
//! ```
//!
//! A new instance is cached before its own fields are injected, so a
//! dependency that leads back to it gets the same (still unfinished)
//! instance instead of recursing forever. Within one call every
//! (component, labels) identity is built and initialized at most once.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::{CacheKey, ResolutionCache};
use crate::component::{Component, Injectable, InjectionPoint, InjectionPoints, Instance, Refusal};
use crate::error::{RefwireError, Result};
use crate::key::TypeKey;
use crate::label::LabelSet;
use crate::registry::{ComponentDescriptor, Registry};

/// Resolution context for one call tree.
///
/// Not meant to be reused across top-level calls: each call gets its own
/// instance identities.
pub struct Injector<'r> {
    registry: &'r Registry,
    cache: ResolutionCache,
    /// `Owner.field` entries for the fields currently being resolved.
    path: Vec<String>,
}

impl<'r> Injector<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            cache: ResolutionCache::new(),
            path: Vec::new(),
        }
    }

    /// Fills every injection point of `target`, in declaration order.
    ///
    /// Stops at the first error; fields already set stay set.
    pub fn inject<T: Injectable>(&mut self, target: &T) -> Result<()> {
        for point in InjectionPoints::<T>::scan().into_points() {
            match point {
                InjectionPoint::Embedded { name, embedding } => {
                    trace!(owner = %TypeKey::of::<T>(), field = name, "Descending into embedded field");
                    embedding.inject(target, self)?;
                }
                InjectionPoint::Field { requirement, binding } => {
                    if !requirement.interface.is_interface() {
                        return Err(RefwireError::FieldNotInterface {
                            owner: requirement.owner,
                            field: requirement.field,
                            ty: requirement.interface,
                        });
                    }
                    if binding.is_bound(target) {
                        return Err(RefwireError::CantSet {
                            owner: requirement.owner,
                            field: requirement.field,
                        });
                    }

                    self.path.push(requirement.to_string());
                    let resolved = self.materialize(&requirement.interface, &requirement.labels);
                    self.path.pop();
                    let (descriptor, instance) = resolved?;

                    let handle = descriptor.cast(&requirement.interface, instance)?;
                    binding.bind(target, handle).map_err(|refusal| match refusal {
                        Refusal::Occupied => RefwireError::CantSet {
                            owner: requirement.owner,
                            field: requirement.field,
                        },
                        Refusal::Mismatch => RefwireError::CantMaterialize {
                            component: descriptor.key(),
                            interface: requirement.interface,
                        },
                    })?;
                    trace!(field = %requirement, component = %descriptor.key(), "Injected");
                }
            }
        }
        Ok(())
    }

    /// Returns the ready (or, inside a cycle, in-progress) instance of the
    /// single component providing `interface` under `labels`.
    pub fn materialize(
        &mut self,
        interface: &TypeKey,
        labels: &LabelSet,
    ) -> Result<(&'r ComponentDescriptor, Instance)> {
        debug_assert!(interface.is_interface(), "materialize called with concrete type {interface:?}");

        let registry = self.registry;
        let descriptor = registry
            .find(interface, labels)
            .map_err(|err| err.along(&self.path))?;

        let key = CacheKey::new(descriptor.key(), descriptor.labels().clone());
        if let Some(instance) = self.cache.get(&key) {
            return Ok((descriptor, Arc::clone(instance)));
        }

        let instance = descriptor.construct(self)?;
        Ok((descriptor, instance))
    }

    /// Typed [`materialize`](Self::materialize): resolves `I` and exposes
    /// the instance through it.
    pub fn resolve<I>(&mut self, labels: &LabelSet) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let interface = TypeKey::of::<I>();
        let (descriptor, instance) = self.materialize(&interface, labels)?;
        let handle = descriptor.cast(&interface, instance)?;
        handle
            .downcast::<Arc<I>>()
            .map(|boxed| *boxed)
            .map_err(|_| RefwireError::CantMaterialize {
                component: descriptor.key(),
                interface,
            })
    }

    /// The instances built so far in this call.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }
}

/// Builds a new `C`: zero value, cached, injected, initialized.
pub(crate) fn construct<C: Component>(
    injector: &mut Injector<'_>,
    descriptor: &ComponentDescriptor,
) -> Result<Instance> {
    let component = Arc::new(C::default());
    let instance: Instance = component.clone();
    let key = descriptor.key();

    debug!(component = %key, labels = %descriptor.labels(), "Constructing component");
    injector.cache.insert(
        CacheKey::new(key, descriptor.labels().clone()),
        Arc::clone(&instance),
    );

    injector.inject(&*component)?;

    component
        .initialize()
        .map_err(|source| RefwireError::InitializationFailed { component: key, source })?;
    trace!(component = %key, "Component ready");

    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Capabilities, Inject};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    trait Fooer: Send + Sync {
        fn id(&self) -> usize;
    }
    trait Barer: Send + Sync {
        fn foo(&self) -> &Arc<dyn Fooer>;
    }

    #[derive(Default)]
    struct FooService;

    impl Fooer for FooService {
        fn id(&self) -> usize {
            self as *const Self as usize
        }
    }
    impl Injectable for FooService {}
    impl Component for FooService {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Fooer>(|c| c);
        }
    }

    #[derive(Default)]
    struct BarService {
        foo: Inject<dyn Fooer>,
    }

    impl Barer for BarService {
        fn foo(&self) -> &Arc<dyn Fooer> {
            self.foo.get().expect("injected")
        }
    }
    impl Injectable for BarService {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("foo", "", |this| &this.foo);
        }
    }
    impl Component for BarService {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Barer>(|c| c);
        }
    }

    /// Needs both directly and through `Barer`: a diamond.
    #[derive(Default)]
    struct QuxService {
        foo: Inject<dyn Fooer>,
        bar: Inject<dyn Barer>,
    }

    impl Injectable for QuxService {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points
                .field("foo", "", |this| &this.foo)
                .field("bar", "", |this| &this.bar);
        }
    }

    trait Quuxer1: Send + Sync {
        fn other(&self) -> &Arc<dyn Quuxer2>;
    }
    trait Quuxer2: Send + Sync {
        fn other(&self) -> &Arc<dyn Quuxer1>;
    }

    #[derive(Default)]
    struct QuuxService1 {
        quux2: Inject<dyn Quuxer2>,
        init_count: AtomicUsize,
    }
    #[derive(Default)]
    struct QuuxService2 {
        quux1: Inject<dyn Quuxer1>,
        init_count: AtomicUsize,
    }

    impl Quuxer1 for QuuxService1 {
        fn other(&self) -> &Arc<dyn Quuxer2> {
            self.quux2.get().expect("injected")
        }
    }
    impl Quuxer2 for QuuxService2 {
        fn other(&self) -> &Arc<dyn Quuxer1> {
            self.quux1.get().expect("injected")
        }
    }
    impl Injectable for QuuxService1 {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("quux2", "", |this| &this.quux2);
        }
    }
    impl Injectable for QuuxService2 {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("quux1", "", |this| &this.quux1);
        }
    }
    impl Component for QuuxService1 {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Quuxer1>(|c| c);
        }
        fn initialize(&self) -> std::result::Result<(), crate::component::BoxError> {
            self.init_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
    impl Component for QuuxService2 {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Quuxer2>(|c| c);
        }
        fn initialize(&self) -> std::result::Result<(), crate::component::BoxError> {
            self.init_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();
        reg.register::<BarService>(&[]).unwrap();
        reg
    }

    #[test]
    fn inject_hierarchy() {
        let reg = registry();
        let bar = BarService::default();
        let mut injector = Injector::new(&reg);
        injector.inject(&bar).unwrap();

        assert!(bar.foo.is_bound());
        assert_eq!(injector.cache().len(), 1);
    }

    #[test]
    fn diamond_shares_one_instance() {
        init_tracing();
        let reg = registry();
        let qux = QuxService::default();
        Injector::new(&reg).inject(&qux).unwrap();

        assert!(Arc::ptr_eq(&*qux.foo.get().unwrap(), qux.bar.foo()));
        assert_eq!(qux.foo.id(), qux.bar.foo().id());
    }

    #[test]
    fn separate_calls_get_separate_instances() {
        let reg = registry();
        let first = QuxService::default();
        let second = QuxService::default();
        reg.inject(&first).unwrap();
        reg.inject(&second).unwrap();

        assert!(!Arc::ptr_eq(first.foo.get().unwrap(), second.foo.get().unwrap()));
    }

    #[test]
    fn cycle_closes_on_itself() {
        init_tracing();
        let mut reg = Registry::new();
        reg.register::<QuuxService1>(&[]).unwrap();
        reg.register::<QuuxService2>(&[]).unwrap();

        let mut injector = Injector::new(&reg);
        let q1: Arc<dyn Quuxer1> = injector.resolve(&LabelSet::empty()).unwrap();
        assert_eq!(injector.cache().len(), 2);

        let back = q1.other().other();
        assert!(Arc::ptr_eq(&q1, back));
    }

    #[test]
    fn cycle_initializes_each_component_once() {
        let mut reg = Registry::new();
        reg.register::<QuuxService1>(&[]).unwrap();
        reg.register::<QuuxService2>(&[]).unwrap();

        let mut injector = Injector::new(&reg);
        let key1 = CacheKey::new(TypeKey::of::<QuuxService1>(), LabelSet::empty());
        let key2 = CacheKey::new(TypeKey::of::<QuuxService2>(), LabelSet::empty());
        injector
            .materialize(&TypeKey::of::<dyn Quuxer1>(), &LabelSet::empty())
            .unwrap();

        let q1 = injector.cache().get(&key1).unwrap().clone().downcast::<QuuxService1>().unwrap();
        let q2 = injector.cache().get(&key2).unwrap().clone().downcast::<QuuxService2>().unwrap();
        assert_eq!(q1.init_count.load(Ordering::SeqCst), 1);
        assert_eq!(q2.init_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn not_found_reports_path() {
        let mut reg = Registry::new();
        reg.register::<BarService>(&[]).unwrap();

        let qux = QuxService::default();
        match Injector::new(&reg).inject(&qux).unwrap_err() {
            RefwireError::NotFound(e) => {
                assert_eq!(e.interface, TypeKey::of::<dyn Fooer>());
                assert_eq!(e.path, vec!["QuxService.foo".to_string()]);
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn nested_not_found_reports_full_path() {
        let mut reg = Registry::new();
        reg.register::<BarService>(&[]).unwrap();

        let mut injector = Injector::new(&reg);
        let err = injector.resolve::<dyn Barer>(&LabelSet::empty()).err().unwrap();
        match err {
            RefwireError::NotFound(e) => {
                assert_eq!(e.path, vec!["BarService.foo".to_string()]);
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn bound_field_cannot_be_set_again() {
        let reg = registry();
        let bar = BarService::default();
        reg.inject(&bar).unwrap();

        match reg.inject(&bar).unwrap_err() {
            RefwireError::CantSet { owner, field } => {
                assert_eq!(owner, TypeKey::of::<BarService>());
                assert_eq!(field, "foo");
            }
            other => panic!("Expected CantSet, got: {other:?}"),
        }
    }

    #[test]
    fn target_without_points_is_noop() {
        let reg = Registry::new();
        reg.inject(&FooService).unwrap();
    }
}
