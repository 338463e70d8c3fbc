//! Type identification keys.
//!
//! [`TypeKey`] identifies a component type or an interface within the
//! registry. It wraps a [`TypeId`] together with the type's name and
//! whether the type is an interface (a trait object).

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

use refwire_support::rendering::shorten_type_name;

/// Uniquely identifies a type in the registry.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept
/// for error messages.
///
/// # Examples
/// ```
/// use refwire_core::key::TypeKey;
///
/// trait Fooer: Send + Sync {}
/// struct FooService;
///
/// let concrete = TypeKey::of::<FooService>();
/// assert!(!concrete.is_interface());
///
/// let interface = TypeKey::of::<dyn Fooer>();
/// assert!(interface.is_interface());
/// assert_ne!(concrete, interface);
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
    interface: bool,
}

impl TypeKey {
    /// Creates a key for type `T`.
    ///
    /// `T` counts as an interface when it is a trait object: unsized, and
    /// named `dyn ...`. Slices, `str` and slice-tailed structs are unsized
    /// too but are not interfaces.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_name = type_name::<T>();
        let wide = size_of::<*const T>() > size_of::<*const ()>();
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            interface: wide && type_name.starts_with("dyn "),
        }
    }

    /// Returns the [`TypeId`] of this type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }

    /// Returns `true` if the key denotes an interface (a `dyn Trait`).
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.interface
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}
