//! Component registry: stores every registered component type.
//!
//! The registry is filled once, then shared read-only for resolution.
//! Lookups scan all registrations and accept exactly one match: no
//! registration order, label specificity or other tie-break is applied.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use refwire_support::rendering::{shorten_type_name, suggest_similar};
use tracing::{debug, instrument, trace, warn};

use crate::component::{Capabilities, Caster, Component, Handle, Injectable, Instance, Requirement, collect_requirements};
use crate::error::{
    AmbiguousError, Candidate, DuplicateRegistrationError, NotFoundError, RefwireError, Result,
};
use crate::graph::GraphValidator;
use crate::injector::{self, Injector};
use crate::key::TypeKey;
use crate::label::LabelSet;

type ConstructFn = fn(&mut Injector<'_>, &ComponentDescriptor) -> Result<Instance>;

/// Everything the registry knows about one concrete component type.
pub struct ComponentDescriptor {
    key: TypeKey,
    labels: LabelSet,
    casts: Vec<(TypeKey, Caster)>,
    construct: ConstructFn,
    requirements: fn(&mut Vec<Requirement>),
}

impl ComponentDescriptor {
    fn of<C: Component>(labels: LabelSet) -> Self {
        Self {
            key: TypeKey::of::<C>(),
            labels,
            casts: Capabilities::<C>::scan().into_casts(),
            construct: injector::construct::<C>,
            requirements: collect_requirements::<C>,
        }
    }

    /// The concrete type of this component.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Returns `true` if the component can be exposed as `interface`.
    pub fn provides(&self, interface: &TypeKey) -> bool {
        self.casts.iter().any(|(key, _)| key == interface)
    }

    /// The interfaces this component declared, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.casts.iter().map(|(key, _)| *key)
    }

    /// The component's injection requirements, embedded ones included.
    pub fn requirements(&self) -> Vec<Requirement> {
        let mut out = Vec::new();
        (self.requirements)(&mut out);
        out
    }

    pub(crate) fn construct(&self, injector: &mut Injector<'_>) -> Result<Instance> {
        (self.construct)(injector, self)
    }

    /// Exposes `instance` through `interface` as a boxed `Arc<dyn Interface>`.
    pub(crate) fn cast(&self, interface: &TypeKey, instance: Instance) -> Result<Handle> {
        self.casts
            .iter()
            .find(|(key, _)| key == interface)
            .and_then(|(_, cast)| cast(instance))
            .ok_or(RefwireError::CantMaterialize {
                component: self.key,
                interface: *interface,
            })
    }

    fn candidate(&self) -> Candidate {
        Candidate {
            component: self.key,
            labels: self.labels.clone(),
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("labels", &self.labels)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .finish()
    }
}

/// Stores all component registrations.
///
/// `Registry` is `Send + Sync`; resolution only needs `&self`, so once
/// registration is done it can be shared freely.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use refwire_core::prelude::*;
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
///
/// #[derive(Default)]
/// struct Primary;
/// #[derive(Default)]
/// struct Replica;
///
/// impl Store for Primary { fn name(&self) -> &'static str { "primary" } }
/// impl Store for Replica { fn name(&self) -> &'static str { "replica" } }
///
/// impl Injectable for Primary {}
/// impl Injectable for Replica {}
///
/// impl Component for Primary {
///     fn capabilities(caps: &mut Capabilities<Self>) { caps.provides::<dyn Store>(|c| c); }
/// }
/// impl Component for Replica {
///     fn capabilities(caps: &mut Capabilities<Self>) { caps.provides::<dyn Store>(|c| c); }
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Primary>(&["db", "rw"]).unwrap();
/// registry.register::<Replica>(&["db", "ro"]).unwrap();
///
/// let store: Arc<dyn Store> = registry.materialize(&["ro"]).unwrap();
/// assert_eq!(store.name(), "replica");
///
/// // both qualify for "db"
/// assert!(registry.materialize::<dyn Store>(&["db"]).is_err());
/// ```
#[derive(Default)]
pub struct Registry {
    index: HashMap<TypeKey, usize>,
    entries: Vec<ComponentDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `C` with the given labels.
    ///
    /// # Errors
    /// Returns [`RefwireError::DuplicateRegistration`] if `C` is already
    /// registered, whatever its labels.
    pub fn register<C: Component>(&mut self, labels: &[&str]) -> Result<()> {
        let key = TypeKey::of::<C>();
        let labels = LabelSet::new(labels);

        if let Some(&existing) = self.index.get(&key) {
            return Err(RefwireError::DuplicateRegistration(DuplicateRegistrationError {
                component: key,
                existing: self.entries[existing].labels.clone(),
                rejected: labels,
            }));
        }

        let descriptor = ComponentDescriptor::of::<C>(labels);
        debug!(
            component = %key,
            labels = %descriptor.labels,
            interfaces = descriptor.casts.len(),
            "Registered component"
        );
        self.index.insert(key, self.entries.len());
        self.entries.push(descriptor);
        Ok(())
    }

    /// Finds the single component that provides `interface` and whose
    /// labels include every label of `labels`.
    ///
    /// # Errors
    /// - [`RefwireError::NotFound`] if no component qualifies
    /// - [`RefwireError::Ambiguous`] if more than one component qualifies
    pub fn find(&self, interface: &TypeKey, labels: &LabelSet) -> Result<&ComponentDescriptor> {
        let mut found: Vec<&ComponentDescriptor> = Vec::with_capacity(4);
        for entry in &self.entries {
            if !labels.is_subset(&entry.labels) {
                trace!(component = %entry.key, labels = %entry.labels, query = %labels, "Filtered out by labels");
                continue;
            }
            if entry.provides(interface) {
                found.push(entry);
            }
        }

        match found.as_slice() {
            [single] => Ok(*single),
            [] => Err(RefwireError::NotFound(NotFoundError {
                interface: *interface,
                labels: labels.clone(),
                path: Vec::new(),
                near_misses: self
                    .entries
                    .iter()
                    .filter(|e| e.provides(interface))
                    .map(ComponentDescriptor::candidate)
                    .collect(),
                suggestions: self.suggest_interfaces(interface),
            })),
            many => {
                warn!(interface = %interface, labels = %labels, matches = many.len(), "Ambiguous lookup");
                Err(RefwireError::Ambiguous(AmbiguousError {
                    interface: *interface,
                    labels: labels.clone(),
                    path: Vec::new(),
                    candidates: many.iter().map(|e| e.candidate()).collect(),
                }))
            }
        }
    }

    /// Looks up the registration of a concrete type.
    pub fn get(&self, component: &TypeKey) -> Option<&ComponentDescriptor> {
        self.index.get(component).map(|&i| &self.entries[i])
    }

    /// Returns `true` if `C` is registered.
    pub fn contains<C: Component>(&self) -> bool {
        self.index.contains_key(&TypeKey::of::<C>())
    }

    /// All registrations, in registration order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.entries.iter()
    }

    /// Every interface provided by at least one component.
    pub fn interfaces(&self) -> Vec<TypeKey> {
        let mut seen = Vec::new();
        for key in self.entries.iter().flat_map(|e| e.interfaces()) {
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    /// Returns the number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no components are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Resolution ──

    /// Fills the injectable fields of an existing object.
    ///
    /// Fails fast: fields set before an error keep their values.
    #[instrument(level = "debug", skip_all, fields(target = %TypeKey::of::<T>()))]
    pub fn inject<T: Injectable>(&self, target: &T) -> Result<()> {
        Injector::new(self).inject(target)
    }

    /// Builds (or reuses, within this call) the component that provides
    /// interface `I` under `labels`, with all of its fields injected.
    ///
    /// # Errors
    /// [`RefwireError::NotInterface`] if `I` is not a trait object, plus
    /// any error raised while resolving the graph.
    #[instrument(level = "debug", skip_all, fields(interface = %TypeKey::of::<I>()))]
    pub fn materialize<I>(&self, labels: &[&str]) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let interface = TypeKey::of::<I>();
        if !interface.is_interface() {
            return Err(RefwireError::NotInterface { requested: interface });
        }
        Injector::new(self).resolve::<I>(&LabelSet::new(labels))
    }

    /// Like [`materialize`](Self::materialize), and also stores the result
    /// in `slot`. The returned `Arc` and the slot's content are the same
    /// instance. On error the slot is left untouched.
    pub fn materialize_into<I>(&self, slot: &mut Option<Arc<I>>, labels: &[&str]) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let value = self.materialize::<I>(labels)?;
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Checks that every injectable field of every registration resolves,
    /// without constructing anything. Cycles are accepted.
    pub fn validate(&self) -> Result<()> {
        GraphValidator::new(self).validate()
    }

    fn suggest_interfaces(&self, interface: &TypeKey) -> Vec<String> {
        let known: Vec<&str> = self.interfaces().iter().map(TypeKey::type_name).collect();
        suggest_similar(interface.type_name(), &known, 3)
            .into_iter()
            .map(|name| shorten_type_name(&name))
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("registered", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Fooer: Send + Sync {}
    trait Barer: Send + Sync {}
    trait Unused: Send + Sync {}

    #[derive(Default)]
    struct FooService;
    #[derive(Default)]
    struct OtherFoo;
    #[derive(Default)]
    struct FooBar;

    impl Fooer for FooService {}
    impl Fooer for OtherFoo {}
    impl Fooer for FooBar {}
    impl Barer for FooBar {}

    impl Injectable for FooService {}
    impl Injectable for OtherFoo {}
    impl Injectable for FooBar {}

    impl Component for FooService {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Fooer>(|c| c);
        }
    }

    impl Component for OtherFoo {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Fooer>(|c| c);
        }
    }

    impl Component for FooBar {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provides::<dyn Fooer>(|c| c).provides::<dyn Barer>(|c| c);
        }
    }

    fn fooer() -> TypeKey {
        TypeKey::of::<dyn Fooer>()
    }

    #[test]
    fn register_and_find() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();

        let found = reg.find(&fooer(), &LabelSet::empty()).unwrap();
        assert_eq!(found.key(), TypeKey::of::<FooService>());
        assert!(reg.contains::<FooService>());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_fails_regardless_of_labels() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&["a"]).unwrap();

        match reg.register::<FooService>(&["b"]).unwrap_err() {
            RefwireError::DuplicateRegistration(e) => {
                assert_eq!(e.component, TypeKey::of::<FooService>());
                assert_eq!(e.existing, LabelSet::parse("a"));
                assert_eq!(e.rejected, LabelSet::parse("b"));
            }
            other => panic!("Expected DuplicateRegistration, got: {other:?}"),
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn not_found_lists_label_near_misses() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&["x"]).unwrap();

        match reg.find(&fooer(), &LabelSet::parse("y")).unwrap_err() {
            RefwireError::NotFound(e) => {
                assert_eq!(e.interface, fooer());
                assert_eq!(e.labels, LabelSet::parse("y"));
                assert_eq!(e.near_misses.len(), 1);
                assert_eq!(e.near_misses[0].component, TypeKey::of::<FooService>());
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn not_found_for_unknown_interface() {
        let reg = Registry::new();
        let err = reg.find(&TypeKey::of::<dyn Unused>(), &LabelSet::empty()).unwrap_err();
        assert!(matches!(err, RefwireError::NotFound(ref e) if e.near_misses.is_empty()));
    }

    #[test]
    fn ambiguity_is_an_error() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();
        reg.register::<OtherFoo>(&[]).unwrap();

        match reg.find(&fooer(), &LabelSet::empty()).unwrap_err() {
            RefwireError::Ambiguous(e) => {
                let names: Vec<TypeKey> = e.candidates.iter().map(|c| c.component).collect();
                assert_eq!(names, vec![TypeKey::of::<FooService>(), TypeKey::of::<OtherFoo>()]);
            }
            other => panic!("Expected Ambiguous, got: {other:?}"),
        }
    }

    #[test]
    fn labels_narrow_the_match() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&["x"]).unwrap();
        reg.register::<OtherFoo>(&[]).unwrap();

        let found = reg.find(&fooer(), &LabelSet::parse("x")).unwrap();
        assert_eq!(found.key(), TypeKey::of::<FooService>());

        assert!(matches!(
            reg.find(&fooer(), &LabelSet::empty()),
            Err(RefwireError::Ambiguous(_))
        ));
    }

    #[test]
    fn interface_filter_resolves_ambiguity() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();
        reg.register::<FooBar>(&[]).unwrap();

        let found = reg.find(&TypeKey::of::<dyn Barer>(), &LabelSet::empty()).unwrap();
        assert_eq!(found.key(), TypeKey::of::<FooBar>());
    }

    #[test]
    fn descriptor_introspection() {
        let mut reg = Registry::new();
        reg.register::<FooBar>(&["b", "a"]).unwrap();

        let desc = reg.get(&TypeKey::of::<FooBar>()).unwrap();
        assert_eq!(desc.labels().as_slice(), ["a", "b"]);
        assert_eq!(
            desc.interfaces().collect::<Vec<_>>(),
            vec![fooer(), TypeKey::of::<dyn Barer>()]
        );
        assert!(desc.requirements().is_empty());
        assert_eq!(reg.interfaces().len(), 2);
    }

    #[test]
    fn materialize_rejects_concrete_request() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();

        assert!(matches!(
            reg.materialize::<FooService>(&[]),
            Err(RefwireError::NotInterface { .. })
        ));
        assert!(matches!(
            reg.materialize::<[u8]>(&[]),
            Err(RefwireError::NotInterface { .. })
        ));
        assert!(matches!(
            reg.materialize::<str>(&[]),
            Err(RefwireError::NotInterface { .. })
        ));
    }

    #[test]
    fn materialize_into_fills_slot() {
        let mut reg = Registry::new();
        reg.register::<FooService>(&[]).unwrap();

        let mut slot: Option<Arc<dyn Fooer>> = None;
        let value = reg.materialize_into(&mut slot, &[]).unwrap();
        assert!(Arc::ptr_eq(&value, slot.as_ref().unwrap()));
    }

    #[test]
    fn materialize_into_keeps_slot_on_error() {
        let reg = Registry::new();
        let mut slot: Option<Arc<dyn Fooer>> = None;
        assert!(reg.materialize_into(&mut slot, &[]).is_err());
        assert!(slot.is_none());
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
