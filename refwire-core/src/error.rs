//! Error types for refwire operations.
//!
//! Every error names the types and labels involved and, when raised
//! during a resolution, the chain of fields that led to it.

use std::fmt;

use refwire_support::rendering::{render_chain, render_list};

use crate::component::BoxError;
use crate::key::TypeKey;
use crate::label::LabelSet;

/// Main error type for all refwire operations.
#[derive(Debug, thiserror::Error)]
pub enum RefwireError {
    /// The same concrete type was registered twice.
    #[error("{}", .0)]
    DuplicateRegistration(DuplicateRegistrationError),

    /// No registered component provides the interface under the labels.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// More than one registered component qualifies.
    #[error("{}", .0)]
    Ambiguous(AmbiguousError),

    /// A field marked for injection is not declared with an interface type.
    #[error("Non-interface field won't be injected: {owner}.{field} has type {ty}")]
    FieldNotInterface {
        owner: TypeKey,
        field: &'static str,
        ty: TypeKey,
    },

    /// A field marked for injection can't be written.
    #[error("Field won't be set: {owner}.{field} already holds a value")]
    CantSet { owner: TypeKey, field: &'static str },

    /// A resolved component can't be exposed through the requested interface.
    #[error("Won't be materialized: {component} can't be exposed as {interface}")]
    CantMaterialize {
        component: TypeKey,
        interface: TypeKey,
    },

    /// A component's lifecycle hook failed.
    #[error("Failed to initialize {component}: {source}")]
    InitializationFailed {
        component: TypeKey,
        #[source]
        source: BoxError,
    },

    /// A concrete type was requested where an interface is expected.
    #[error("Not an interface: {requested}\n  Hint: request a trait object, e.g. `dyn Trait + Send + Sync`")]
    NotInterface { requested: TypeKey },
}

impl RefwireError {
    /// Attaches the resolution path to lookup errors that don't carry one yet.
    pub(crate) fn along(mut self, path: &[String]) -> Self {
        if let RefwireError::NotFound(NotFoundError { path: slot, .. })
        | RefwireError::Ambiguous(AmbiguousError { path: slot, .. }) = &mut self
        {
            if slot.is_empty() {
                *slot = path.to_vec();
            }
        }
        self
    }
}

/// A registered component as listed in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub component: TypeKey,
    pub labels: LabelSet,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.component, self.labels)
    }
}

/// Error when a concrete type is registered a second time.
#[derive(Debug)]
pub struct DuplicateRegistrationError {
    pub component: TypeKey,
    /// Labels of the registration that is already in place.
    pub existing: LabelSet,
    pub rejected: LabelSet,
}

impl fmt::Display for DuplicateRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registered already: {} labels={} (rejected labels={})",
            self.component, self.existing, self.rejected,
        )?;
        write!(f, "\n  Hint: a concrete type can be registered only once per registry")
    }
}

/// Error when nothing provides the requested interface.
#[derive(Debug)]
pub struct NotFoundError {
    pub interface: TypeKey,
    pub labels: LabelSet,
    /// Fields that led to this lookup, outermost first.
    pub path: Vec<String>,
    /// Components that provide the interface but were filtered out by labels.
    pub near_misses: Vec<Candidate>,
    /// Registered interfaces with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Not found in registry: interface={} labels={}",
            self.interface, self.labels
        )?;

        if !self.path.is_empty() {
            write!(f, "\n  Required via: {}", render_chain(&self.path))?;
        }

        if !self.near_misses.is_empty() {
            let rendered: Vec<String> = self.near_misses.iter().map(|c| c.to_string()).collect();
            write!(f, "\n  Implemented by, but labels don't match:{}", render_list(&rendered, 4))?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:{}", render_list(&self.suggestions, 4))?;
        }

        Ok(())
    }
}

/// Error when several components qualify and no rule picks one.
#[derive(Debug)]
pub struct AmbiguousError {
    pub interface: TypeKey,
    pub labels: LabelSet,
    pub path: Vec<String>,
    /// Every qualifying component, in registration order.
    pub candidates: Vec<Candidate>,
}

impl fmt::Display for AmbiguousError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found multiple components for interface={} labels={}",
            self.interface, self.labels
        )?;
        let rendered: Vec<String> = self.candidates.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", render_list(&rendered, 4))?;

        if !self.path.is_empty() {
            write!(f, "\n  Required via: {}", render_chain(&self.path))?;
        }

        write!(f, "\n  Hint: add labels to the registrations and to the injection point to narrow the match")
    }
}

/// Convenient Result type for refwire operations.
pub type Result<T> = std::result::Result<T, RefwireError>;
