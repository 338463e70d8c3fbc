//! Per-resolution instance cache.
//!
//! One [`ResolutionCache`] lives for exactly one top-level `inject` or
//! `materialize` call. It maps a component identity to the instance built
//! for it. Entries are inserted before the instance's own fields are
//! injected, which is what lets cyclic graphs close on themselves.

use std::collections::HashMap;

use tracing::trace;

use crate::component::Instance;
use crate::key::TypeKey;
use crate::label::LabelSet;

/// Identity of a resolved component: its concrete type and the labels it
/// was registered with (not the labels it was asked for).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub component: TypeKey,
    pub labels: LabelSet,
}

impl CacheKey {
    pub fn new(component: TypeKey, labels: LabelSet) -> Self {
        Self { component, labels }
    }
}

/// Scratch map from [`CacheKey`] to live instance.
#[derive(Default)]
pub struct ResolutionCache {
    entries: HashMap<CacheKey, Instance>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Instance> {
        let hit = self.entries.get(key);
        if hit.is_some() {
            trace!(component = %key.component, labels = %key.labels, "Reusing cached instance");
        }
        hit
    }

    /// Caches `instance`; an existing entry for `key` is kept.
    pub fn insert(&mut self, key: CacheKey, instance: Instance) {
        self.entries.entry(key).or_insert(instance);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
