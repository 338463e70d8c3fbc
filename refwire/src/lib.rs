//! # refwire: label-qualified field injection for Rust
//!
//! Register concrete components with labels, declare the interfaces a
//! struct needs with `#[inject]`, and let refwire wire the graph. Within
//! one call every component is built once, so diamond and cyclic graphs
//! share instances.
//!
//! ```
//! use std::sync::Arc;
//! use refwire::prelude::*;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default, Injectable)]
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String { "hello".into() }
//! }
//!
//! impl Component for English {
//!     fn capabilities(caps: &mut Capabilities<Self>) {
//!         caps.provides::<dyn Greeter>(|c| c);
//!     }
//! }
//!
//! #[derive(Default, Injectable)]
//! struct Frontdesk {
//!     #[inject(labels = "en")]
//!     greeter: Inject<dyn Greeter>,
//! }
//!
//! let mut registry = Registry::new();
//! registry.register::<English>(&["en"]).unwrap();
//!
//! let desk = Frontdesk::default();
//! registry.inject(&desk).unwrap();
//! assert_eq!(desk.greeter.greet(), "hello");
//! ```

pub mod global;

pub use refwire_core::*;
#[cfg(feature = "derive")]
pub use refwire_macros::Injectable;
pub use refwire_support as support;

pub use global::{inject, materialize, materialize_into, register, validate, with_default_registry};

pub mod prelude {
    pub use refwire_core::prelude::*;
    #[cfg(feature = "derive")]
    pub use refwire_macros::Injectable;
}
