//! Dependency graph validation.
//!
//! Checks a filled registry without constructing anything:
//! - every injectable field is declared with an interface type
//! - every field resolves to exactly one registered component
//!
//! Cycles are legal: the injector closes them through its resolution
//! cache, so the walk simply stops at a component it is already visiting.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use crate::error::{RefwireError, Result};
use crate::key::TypeKey;
use crate::registry::{ComponentDescriptor, Registry};

/// Depth-first walk over the requirements of every registration.
pub(crate) struct GraphValidator<'r> {
    registry: &'r Registry,
    /// Components on the current DFS path.
    visiting: HashSet<TypeKey>,
    /// Components whose whole subgraph checked out.
    validated: HashSet<TypeKey>,
    /// `Owner.field` chain of the current DFS path, for error reporting.
    path: Vec<String>,
}

impl<'r> GraphValidator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates every registration, in registration order.
    ///
    /// # Errors
    /// The first [`RefwireError::FieldNotInterface`],
    /// [`RefwireError::NotFound`] or [`RefwireError::Ambiguous`] met.
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<()> {
        debug!(component_count = self.registry.len(), "Starting dependency graph validation");

        let registry = self.registry;
        for descriptor in registry.components() {
            self.validate_component(descriptor)?;
        }

        debug!("Dependency graph validation passed");
        Ok(())
    }

    fn validate_component(&mut self, descriptor: &'r ComponentDescriptor) -> Result<()> {
        let key = descriptor.key();
        if self.validated.contains(&key) {
            return Ok(());
        }
        if self.visiting.contains(&key) {
            trace!(component = %key, path = ?self.path, "Cycle closes here");
            return Ok(());
        }

        self.visiting.insert(key);
        let registry = self.registry;

        for requirement in descriptor.requirements() {
            if !requirement.interface.is_interface() {
                return Err(RefwireError::FieldNotInterface {
                    owner: requirement.owner,
                    field: requirement.field,
                    ty: requirement.interface,
                });
            }

            self.path.push(requirement.to_string());
            let dependency = registry
                .find(&requirement.interface, &requirement.labels)
                .map_err(|err| err.along(&self.path))?;
            self.validate_component(dependency)?;
            self.path.pop();
        }

        self.visiting.remove(&key);
        self.validated.insert(key);
        Ok(())
    }
}
