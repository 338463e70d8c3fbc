//! Process-wide default registry.
//!
//! A convenience for programs that wire everything in one place. The
//! registry sits behind a `parking_lot::RwLock`: registration takes the
//! write lock, resolution and validation the read lock.
//!
//! Lifecycle hooks run while the read lock is held and must not call back
//! into this module.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use refwire_core::{Component, Injectable, Registry, Result};

static DEFAULT: Lazy<RwLock<Registry>> = Lazy::new(|| {
    debug!("Creating default registry");
    RwLock::new(Registry::new())
});

/// Registers `C` in the default registry. See [`Registry::register`].
pub fn register<C: Component>(labels: &[&str]) -> Result<()> {
    DEFAULT.write().register::<C>(labels)
}

/// Injects `target` from the default registry. See [`Registry::inject`].
pub fn inject<T: Injectable>(target: &T) -> Result<()> {
    DEFAULT.read().inject(target)
}

/// See [`Registry::materialize`].
pub fn materialize<I>(labels: &[&str]) -> Result<Arc<I>>
where
    I: ?Sized + Send + Sync + 'static,
{
    DEFAULT.read().materialize::<I>(labels)
}

/// See [`Registry::materialize_into`].
pub fn materialize_into<I>(slot: &mut Option<Arc<I>>, labels: &[&str]) -> Result<Arc<I>>
where
    I: ?Sized + Send + Sync + 'static,
{
    DEFAULT.read().materialize_into(slot, labels)
}

/// See [`Registry::validate`].
pub fn validate() -> Result<()> {
    DEFAULT.read().validate()
}

/// Runs `f` against the default registry under the read lock.
pub fn with_default_registry<R>(f: impl FnOnce(&Registry) -> R) -> R {
    f(&*DEFAULT.read())
}
