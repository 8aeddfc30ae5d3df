//! Persistent run state.
//!
//! Stored as `.kettle/state.yml` inside the project directory, next to the
//! definition it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KettleError, Result};

/// Directory holding kettle's bookkeeping inside a project.
pub const STATE_DIR: &str = ".kettle";

/// Persistent state for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStore {
    /// Schema version for migration.
    pub version: u32,

    /// Project name at the time of the last write.
    pub project: String,

    /// Last time the state was written after a run.
    pub last_run: Option<DateTime<Utc>>,

    /// State for each step, keyed by step name.
    #[serde(default)]
    pub steps: HashMap<String, StepState>,

    /// State for each dependency, keyed by dependency path.
    #[serde(default)]
    pub dependencies: HashMap<String, DependencyState>,
}

/// State for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    /// When this step last ran.
    pub last_run: Option<DateTime<Utc>>,

    /// Status of the last run.
    pub status: StepStatus,

    /// Duration of the last run in milliseconds.
    pub duration_ms: Option<u64>,

    /// Fingerprint of the step source at the last successful run.
    pub fingerprint: Option<String>,
}

/// State for a single dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyState {
    /// When the dependency was last sourced.
    pub sourced_at: Option<DateTime<Utc>>,

    /// Fingerprint recorded when it was last sourced.
    pub fingerprint: Option<String>,
}

/// Status of a step execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    #[default]
    NeverRun,
}

impl StepStatus {
    /// Short lowercase label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::NeverRun => "never run",
        }
    }
}

impl StateStore {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty state store.
    pub fn new(project: &str) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            project: project.to_string(),
            last_run: None,
            steps: HashMap::new(),
            dependencies: HashMap::new(),
        }
    }

    /// Get the state file path for a project directory.
    pub fn state_file(project_root: &Path) -> PathBuf {
        project_root.join(STATE_DIR).join("state.yml")
    }

    /// Load state from disk, or start fresh when none exists.
    pub fn load(project_root: &Path, project: &str) -> Result<Self> {
        let path = Self::state_file(project_root);

        if !path.exists() {
            return Ok(Self::new(project));
        }

        let content = fs::read_to_string(&path)?;
        let state: Self = serde_yaml::from_str(&content).map_err(|e| KettleError::StateError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(state)
    }

    /// Save state to disk using atomic write.
    ///
    /// Writes to a temp file and renames it over the state file so a crash
    /// never leaves a partially written state behind.
    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = Self::state_file(project_root);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_yaml::to_string(self).map_err(|e| KettleError::StateError {
            path: path.clone(),
            message: format!("Failed to serialize state: {}", e),
        })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Get state for a step.
    pub fn get_step(&self, name: &str) -> Option<&StepState> {
        self.steps.get(name)
    }

    /// Update state for a step.
    pub fn update_step(&mut self, name: &str, state: StepState) {
        self.steps.insert(name.to_string(), state);
    }

    /// Get state for a dependency.
    pub fn get_dependency(&self, path: &str) -> Option<&DependencyState> {
        self.dependencies.get(path)
    }

    /// Update state for a dependency.
    pub fn update_dependency(&mut self, path: &str, state: DependencyState) {
        self.dependencies.insert(path.to_string(), state);
    }

    /// Drop entries for steps and dependencies the definition no longer has.
    pub fn retain_known(&mut self, steps: &[&str], dependencies: &[&str]) {
        self.steps.retain(|name, _| steps.contains(&name.as_str()));
        self.dependencies
            .retain(|path, _| dependencies.contains(&path.as_str()));
    }
}
