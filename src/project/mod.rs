//! The project model: ordered steps, dependencies and persisted state.
//!
//! A [`Project`] is loaded once per session. Engines mutate its steps while
//! running, and [`Project::write`] persists the outcome to
//! `.kettle/state.yml`.

pub mod dependency;
pub mod fingerprint;
pub mod step;
pub mod store;

pub use dependency::Dependency;
pub use fingerprint::fingerprint;
pub use step::{Step, StepResult};
pub use store::{DependencyState, StateStore, StepState, StepStatus, STATE_DIR};

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{load_definition, validate, ProjectDefinition};
use crate::error::Result;

/// An open project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Merged definition.
    pub definition: ProjectDefinition,

    /// Directory containing `kettle.yml`.
    pub source_directory: PathBuf,

    /// Directory on the remote editor's machine this project mirrors.
    pub remote_source_directory: Option<String>,

    /// Steps in declaration order.
    pub steps: Vec<Step>,

    /// Dependencies (order irrelevant).
    pub dependencies: Vec<Dependency>,

    state: StateStore,
}

impl Project {
    /// Open the project rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let definition = load_definition(root)?;
        Self::from_definition(root, definition)
    }

    /// Build a project from an already loaded definition.
    ///
    /// Persisted state under `root` is picked up if present.
    pub fn from_definition(root: &Path, definition: ProjectDefinition) -> Result<Self> {
        validate(&definition)?;
        let state = StateStore::load(root, &definition.name)?;

        let steps = definition
            .steps
            .iter()
            .enumerate()
            .map(|(i, def)| Step::new(i, def.clone(), state.get_step(&def.name)))
            .collect();

        let dependencies = definition
            .dependencies
            .iter()
            .map(|def| Dependency::new(def, state.get_dependency(def.path())))
            .collect();

        debug!(
            project = %definition.name,
            root = %root.display(),
            "opened project"
        );

        Ok(Self {
            definition,
            source_directory: root.to_path_buf(),
            remote_source_directory: None,
            steps,
            dependencies,
            state,
        })
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Interpreter used for steps without an explicit command.
    pub fn interpreter(&self) -> &str {
        &self.definition.settings.interpreter
    }

    /// Step names in project order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Look up a step by name for mutation.
    pub fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.name == name)
    }

    /// Position of a step in project order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    /// Whether the step at `index` needs to run.
    pub fn is_step_dirty(&self, index: usize) -> bool {
        self.steps
            .get(index)
            .is_some_and(|s| s.is_dirty(&self.source_directory))
    }

    /// Index of the first dirty step, the default place to resume.
    pub fn first_dirty_index(&self) -> Option<usize> {
        (0..self.steps.len()).find(|&i| self.is_step_dirty(i))
    }

    /// Forget the results of earlier runs in this session.
    pub fn clear_results(&mut self) {
        for step in &mut self.steps {
            step.result = None;
        }
    }

    /// Names of steps whose execution in this session failed.
    pub fn failed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.result.as_ref().is_some_and(|r| !r.success))
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Whether any dependency changed since it was last sourced.
    pub fn needs_sourcing(&self) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.is_dirty(&self.source_directory))
    }

    /// Persist step and dependency state.
    pub fn write(&mut self) -> Result<()> {
        self.state.project = self.definition.name.clone();
        self.state.last_run = Some(Utc::now());

        for step in &self.steps {
            self.state.update_step(&step.name, step.to_state());
        }
        for dependency in &self.dependencies {
            self.state
                .update_dependency(&dependency.path, dependency.to_state());
        }

        let step_names: Vec<&str> = self.steps.iter().map(|s| s.name.as_str()).collect();
        let dependency_paths: Vec<&str> =
            self.dependencies.iter().map(|d| d.path.as_str()).collect();
        self.state.retain_known(&step_names, &dependency_paths);

        self.state.save(&self.source_directory)?;
        debug!(project = %self.definition.name, "wrote project state");
        Ok(())
    }

    /// Path of the state file.
    pub fn state_file(&self) -> PathBuf {
        StateStore::state_file(&self.source_directory)
    }
}
