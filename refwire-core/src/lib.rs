//! Core engine for refwire: label-qualified, reflection-free field injection.
//!
//! Components are registered by type with a set of labels. Injection fills
//! the [`Inject`] fields of an object by finding, for each field, the single
//! registered component that provides the field's interface and carries all
//! of the field's labels. Instances are shared within one call, which makes
//! diamond and cyclic graphs resolve to one instance per component.

pub mod cache;
pub mod component;
pub mod error;
mod graph;
pub mod injector;
pub mod key;
pub mod label;
pub mod registry;

pub use component::{BoxError, Capabilities, Component, Inject, Injectable, InjectionPoints, Instance, Requirement};
pub use error::{RefwireError, Result};
pub use injector::Injector;
pub use key::TypeKey;
pub use label::LabelSet;
pub use registry::{ComponentDescriptor, Registry};

pub mod prelude {
    pub use crate::component::{BoxError, Capabilities, Component, Inject, Injectable, InjectionPoints};
    pub use crate::error::{RefwireError, Result};
    pub use crate::injector::Injector;
    pub use crate::key::TypeKey;
    pub use crate::label::LabelSet;
    pub use crate::registry::Registry;
}
