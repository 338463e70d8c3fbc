//! The component contract.
//!
//! - [`Injectable`]: a type whose fields can be filled by the injector.
//! - [`Component`]: an injectable type that can be registered, created as a
//!   zero value and exposed through one or more interfaces.
//! - [`Inject`]: the write-once slot an injectable field is declared with.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use refwire_core::prelude::*;
//!
//! trait Fooer: Send + Sync {
//!     fn foo(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct FooService;
//!
//! impl Fooer for FooService {
//!     fn foo(&self) -> &'static str { "foo" }
//! }
//!
//! impl Injectable for FooService {}
//!
//! impl Component for FooService {
//!     fn capabilities(caps: &mut Capabilities<Self>) {
//!         caps.provides::<dyn Fooer>(|c| c);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct BarService {
//!     foo: Inject<dyn Fooer>,
//! }
//!
//! impl Injectable for BarService {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("foo", "", |this| &this.foo);
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register::<FooService>(&[]).unwrap();
//!
//! let bar = BarService::default();
//! registry.inject(&bar).unwrap();
//! assert_eq!(bar.foo.foo(), "foo");
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::injector::Injector;
use crate::key::TypeKey;
use crate::label::LabelSet;

/// Error type returned by lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A live component, type-erased.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A component exposed through an interface: a boxed `Arc<dyn Trait>`.
pub(crate) type Handle = Box<dyn Any + Send + Sync>;

pub(crate) type Caster = Box<dyn Fn(Instance) -> Option<Handle> + Send + Sync>;

/// A type whose fields can be injected.
///
/// The default implementation declares no injection points, which makes
/// injecting into the type a no-op. Usually implemented through
/// `#[derive(Injectable)]`.
pub trait Injectable: Sized + 'static {
    /// Declares the injectable fields and embedded sub-objects, in order.
    fn injection_points(points: &mut InjectionPoints<Self>) {
        let _ = points;
    }
}

/// A registrable component.
///
/// Components are created with [`Default`], cached, then injected, so a
/// component can take part in cyclic graphs.
pub trait Component: Injectable + Default + Send + Sync {
    /// Declares which interfaces this component can be exposed through.
    fn capabilities(caps: &mut Capabilities<Self>);

    /// Lifecycle hook, called once after the component's own fields are
    /// injected and before it is handed to anyone outside the resolution.
    ///
    /// In a cyclic graph a partner reached through a field may not have been
    /// injected yet; dereferencing that partner's own `Inject` slots from
    /// here can panic.
    fn initialize(&self) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Inject slot
// ═══════════════════════════════════════════

/// A write-once slot for an injected interface.
///
/// Dereferences to the interface once bound.
pub struct Inject<I: ?Sized> {
    slot: OnceCell<Arc<I>>,
}

impl<I: ?Sized> Inject<I> {
    pub const fn new() -> Self {
        Self { slot: OnceCell::new() }
    }

    /// Returns the injected value, if any.
    pub fn get(&self) -> Option<&Arc<I>> {
        self.slot.get()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    fn bind(&self, value: Arc<I>) -> std::result::Result<(), Arc<I>> {
        self.slot.set(value)
    }
}

impl<I: ?Sized> Default for Inject<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> Deref for Inject<I> {
    type Target = I;

    /// # Panics
    /// Panics if the slot has not been injected yet.
    fn deref(&self) -> &I {
        match self.slot.get() {
            Some(value) => value,
            None => panic!(
                "Inject<{}> used before injection",
                std::any::type_name::<I>()
            ),
        }
    }
}

// Never prints the target: injected graphs may be cyclic.
impl<I: ?Sized + 'static> fmt::Debug for Inject<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_bound() { "bound" } else { "unbound" };
        write!(f, "Inject<{}>({state})", TypeKey::of::<I>())
    }
}

// ═══════════════════════════════════════════
// Injection points
// ═══════════════════════════════════════════

/// One injectable field: which interface it needs under which labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The type declaring the field.
    pub owner: TypeKey,
    pub field: &'static str,
    /// The declared type of the field's slot.
    pub interface: TypeKey,
    pub labels: LabelSet,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.field)
    }
}

/// Why a slot refused a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refusal {
    Occupied,
    Mismatch,
}

pub(crate) trait Binding<T> {
    fn is_bound(&self, target: &T) -> bool;
    fn bind(&self, target: &T, handle: Handle) -> std::result::Result<(), Refusal>;
}

struct FieldBinding<T, I: ?Sized> {
    accessor: fn(&T) -> &Inject<I>,
}

impl<T, I> Binding<T> for FieldBinding<T, I>
where
    I: ?Sized + Send + Sync + 'static,
{
    fn is_bound(&self, target: &T) -> bool {
        (self.accessor)(target).is_bound()
    }

    fn bind(&self, target: &T, handle: Handle) -> std::result::Result<(), Refusal> {
        let value = handle.downcast::<Arc<I>>().map_err(|_| Refusal::Mismatch)?;
        (self.accessor)(target)
            .bind(*value)
            .map_err(|_| Refusal::Occupied)
    }
}

pub(crate) trait Embedding<T> {
    fn inject(&self, target: &T, injector: &mut Injector<'_>) -> Result<()>;
    fn collect(&self, out: &mut Vec<Requirement>);
}

struct EmbeddedBinding<T, E> {
    accessor: fn(&T) -> &E,
}

impl<T, E: Injectable> Embedding<T> for EmbeddedBinding<T, E> {
    fn inject(&self, target: &T, injector: &mut Injector<'_>) -> Result<()> {
        injector.inject((self.accessor)(target))
    }

    fn collect(&self, out: &mut Vec<Requirement>) {
        collect_requirements::<E>(out);
    }
}

pub(crate) enum InjectionPoint<T> {
    Field {
        requirement: Requirement,
        binding: Box<dyn Binding<T>>,
    },
    Embedded {
        name: &'static str,
        embedding: Box<dyn Embedding<T>>,
    },
}

/// Builder an [`Injectable`] declares its fields into.
pub struct InjectionPoints<T> {
    owner: TypeKey,
    points: Vec<InjectionPoint<T>>,
}

impl<T: Injectable> InjectionPoints<T> {
    pub(crate) fn scan() -> Self {
        let mut points = Self {
            owner: TypeKey::of::<T>(),
            points: Vec::new(),
        };
        T::injection_points(&mut points);
        points
    }

    /// Declares an injected field.
    ///
    /// `labels` is the space-separated label constraint; `""` means any
    /// implementation qualifies.
    pub fn field<I>(&mut self, name: &'static str, labels: &str, accessor: fn(&T) -> &Inject<I>) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.points.push(InjectionPoint::Field {
            requirement: Requirement {
                owner: self.owner,
                field: name,
                interface: TypeKey::of::<I>(),
                labels: LabelSet::parse(labels),
            },
            binding: Box::new(FieldBinding { accessor }),
        });
        self
    }

    /// Declares an embedded sub-object whose own injection points are
    /// filled as part of this type.
    pub fn embed<E: Injectable>(&mut self, name: &'static str, accessor: fn(&T) -> &E) -> &mut Self {
        self.points.push(InjectionPoint::Embedded {
            name,
            embedding: Box::new(EmbeddedBinding { accessor }),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn into_points(self) -> Vec<InjectionPoint<T>> {
        self.points
    }
}

/// Appends the requirements of `T`, including embedded sub-objects.
pub(crate) fn collect_requirements<T: Injectable>(out: &mut Vec<Requirement>) {
    for point in InjectionPoints::<T>::scan().into_points() {
        match point {
            InjectionPoint::Field { requirement, .. } => out.push(requirement),
            InjectionPoint::Embedded { embedding, .. } => embedding.collect(out),
        }
    }
}

// ═══════════════════════════════════════════
// Capabilities
// ═══════════════════════════════════════════

/// Builder a [`Component`] declares its interfaces into.
pub struct Capabilities<C> {
    casts: Vec<(TypeKey, Caster)>,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> Capabilities<C> {
    pub(crate) fn scan() -> Self {
        let mut caps = Self {
            casts: Vec::new(),
            _component: PhantomData,
        };
        C::capabilities(&mut caps);
        caps
    }

    /// Declares that `C` can be exposed as `I`.
    ///
    /// `cast` is almost always `|c| c`, relying on unsized coercion
    /// from `Arc<C>` to `Arc<dyn Trait>`. Declaring the same interface
    /// twice keeps the last cast.
    pub fn provides<I>(&mut self, cast: fn(Arc<C>) -> Arc<I>) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        let caster: Caster = Box::new(move |instance: Instance| {
            instance
                .downcast::<C>()
                .ok()
                .map(|component| Box::new(cast(component)) as Handle)
        });
        self.casts.retain(|(existing, _)| *existing != key);
        self.casts.push((key, caster));
        self
    }

    pub(crate) fn into_casts(self) -> Vec<(TypeKey, Caster)> {
        self.casts
    }
}
