//! External resources a project relies on.

use chrono::{DateTime, Utc};
use std::path::Path;

use super::fingerprint::fingerprint;
use super::store::DependencyState;
use crate::config::DependencyDefinition;

/// A library folder or data file the steps depend on.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Path relative to the project directory.
    pub path: String,

    /// Command run while sourcing, if any.
    pub command: Option<String>,

    /// When the dependency was last sourced.
    pub sourced_at: Option<DateTime<Utc>>,

    /// Fingerprint recorded at the last sourcing.
    pub fingerprint: Option<String>,
}

impl Dependency {
    /// Build a dependency from its definition and any persisted state.
    pub fn new(definition: &DependencyDefinition, state: Option<&DependencyState>) -> Self {
        Self {
            path: definition.path().to_string(),
            command: definition.command().map(String::from),
            sourced_at: state.and_then(|s| s.sourced_at),
            fingerprint: state.and_then(|s| s.fingerprint.clone()),
        }
    }

    /// Identifier used in listings and the state file.
    pub fn identifier(&self) -> &str {
        &self.path
    }

    /// Whether the dependency changed since it was last sourced.
    pub fn is_dirty(&self, root: &Path) -> bool {
        fingerprint(root, &self.path) != self.fingerprint
    }

    /// Record a successful sourcing against the current contents.
    pub fn mark_sourced(&mut self, root: &Path) {
        self.fingerprint = fingerprint(root, &self.path);
        self.sourced_at = Some(Utc::now());
    }

    /// Snapshot for the state store.
    pub fn to_state(&self) -> DependencyState {
        DependencyState {
            sourced_at: self.sourced_at,
            fingerprint: self.fingerprint.clone(),
        }
    }
}
