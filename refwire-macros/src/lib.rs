//! Procedural macros for refwire.
//!
//! - `#[derive(Injectable)]` - declares a struct's injection points from
//!   `#[inject]` field attributes

use proc_macro::TokenStream;

/// Injectable derive implementation.
mod injectable;

/// Derives `refwire::Injectable` for a struct.
///
/// Field attributes:
/// - `#[inject]` - inject any implementation of the field's interface
/// - `#[inject(labels = "db primary")]` - only implementations carrying
///   every listed label qualify
/// - `#[inject(embed)]` - the field is itself `Injectable`; its own
///   injection points are filled as part of this struct
///
/// Injected fields must be declared as `Inject<dyn Trait>`. Fields without
/// an attribute are left alone.
///
/// ```ignore
/// #[derive(Default, Injectable)]
/// struct Handler {
///     #[inject(labels = "primary")]
///     store: Inject<dyn Store>,
///     #[inject(embed)]
///     common: Common,
///     hits: AtomicUsize,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
