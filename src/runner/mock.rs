//! Recording engine for testing the orchestrator.
//!
//! `RecordingEngine` implements [`StepEngine`] without running anything. It
//! records every call for later assertion.
//!
//! # Example
//!
//! ```
//! use kettle::runner::{EngineCall, RecordingEngine, StepEngine};
//! # use kettle::config::{ProjectDefinition, StepDefinition};
//! # use kettle::project::Project;
//! # use kettle::ui::MockUI;
//! # let temp = tempfile::TempDir::new().unwrap();
//! # let definition = ProjectDefinition {
//! #     name: "weather".to_string(),
//! #     steps: vec![StepDefinition::named("S1"), StepDefinition::named("S2")],
//! #     ..Default::default()
//! # };
//! # let mut project = Project::from_definition(temp.path(), definition).unwrap();
//! let mut engine = RecordingEngine::new();
//! let ran = engine
//!     .run_section(&mut project, Some("S1"), 2, false, &mut MockUI::new())
//!     .unwrap();
//!
//! assert_eq!(ran, vec!["S1", "S2"]);
//! assert_eq!(
//!     engine.calls(),
//!     &[EngineCall::Section { start: Some("S1".to_string()), limit: 2, force: false }]
//! );
//! ```

use crate::error::{KettleError, Result};
use crate::project::Project;
use crate::ui::UserInterface;

use super::engine::StepEngine;

/// A call made to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Section {
        start: Option<String>,
        limit: i64,
        force: bool,
    },
    Complete {
        start: Option<String>,
        force: bool,
        limit: i64,
    },
    Dependencies,
}

/// Engine that records calls instead of executing steps.
///
/// `run_section` reports the `limit` consecutive steps from `start` (or from
/// the first step) as executed, which is enough to exercise duplicate
/// suppression in the orchestrator.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Vec<EngineCall>,
    sourcing_fails: bool,
    error_on: Option<String>,
}

impl RecordingEngine {
    /// Create a new recording engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `run_dependencies` report failure.
    pub fn failing_sourcing(mut self) -> Self {
        self.sourcing_fails = true;
        self
    }

    /// Make `run_section` return an error when it starts at `step`.
    pub fn erroring_on(mut self, step: &str) -> Self {
        self.error_on = Some(step.to_string());
        self
    }

    /// All calls in order.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Start step of every section call, in order.
    pub fn section_starts(&self) -> Vec<Option<String>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Section { start, .. } => Some(start.clone()),
                _ => None,
            })
            .collect()
    }
}

impl StepEngine for RecordingEngine {
    fn run_section(
        &mut self,
        project: &mut Project,
        start: Option<&str>,
        limit: i64,
        force: bool,
        _ui: &mut dyn UserInterface,
    ) -> Result<Vec<String>> {
        self.calls.push(EngineCall::Section {
            start: start.map(String::from),
            limit,
            force,
        });

        if let (Some(start), Some(error_on)) = (start, &self.error_on) {
            if start == error_on {
                return Err(KettleError::CommandFailed {
                    command: start.to_string(),
                    code: None,
                });
            }
        }

        let first = start.and_then(|s| project.index_of(s)).unwrap_or(0);
        Ok(project
            .steps
            .iter()
            .skip(first)
            .take(limit.max(1) as usize)
            .map(|s| s.name.clone())
            .collect())
    }

    fn run_complete(
        &mut self,
        _project: &mut Project,
        start: Option<&str>,
        force: bool,
        limit: i64,
        _ui: &mut dyn UserInterface,
    ) -> Result<()> {
        self.calls.push(EngineCall::Complete {
            start: start.map(String::from),
            force,
            limit,
        });
        Ok(())
    }

    fn run_dependencies(
        &mut self,
        _project: &mut Project,
        _ui: &mut dyn UserInterface,
    ) -> Result<bool> {
        self.calls.push(EngineCall::Dependencies);
        Ok(!self.sourcing_fails)
    }
}
