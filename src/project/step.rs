//! Steps and their execution results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::fingerprint::fingerprint;
use super::store::{StepState, StepStatus};
use crate::config::StepDefinition;
use crate::shell::quote;

/// A named, ordered unit of project work.
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique name within the project.
    pub name: String,

    /// Index in the project's step sequence.
    pub position: usize,

    /// Definition as loaded from `kettle.yml`.
    pub definition: StepDefinition,

    /// Status of the last run.
    pub status: StepStatus,

    /// When the step last ran.
    pub last_run: Option<DateTime<Utc>>,

    /// Duration of the last run in milliseconds.
    pub duration_ms: Option<u64>,

    /// Source fingerprint recorded at the last successful run.
    pub fingerprint: Option<String>,

    /// Result of the most recent execution in this session.
    pub result: Option<StepResult>,
}

impl Step {
    /// Build a step from its definition and any persisted state.
    pub fn new(position: usize, definition: StepDefinition, state: Option<&StepState>) -> Self {
        let mut step = Self {
            name: definition.name.clone(),
            position,
            definition,
            status: StepStatus::NeverRun,
            last_run: None,
            duration_ms: None,
            fingerprint: None,
            result: None,
        };

        if let Some(state) = state {
            step.status = state.status;
            step.last_run = state.last_run;
            step.duration_ms = state.duration_ms;
            step.fingerprint = state.fingerprint.clone();
        }

        step
    }

    /// Source file relative to the project directory.
    pub fn source_file(&self) -> &str {
        self.definition.source_file()
    }

    /// Shell command that executes this step.
    pub fn command(&self, interpreter: &str) -> String {
        match &self.definition.command {
            Some(command) => command.clone(),
            None => format!("{} {}", interpreter, quote(self.source_file())),
        }
    }

    /// Fingerprint of the step source as it is on disk now.
    pub fn current_fingerprint(&self, root: &Path) -> Option<String> {
        fingerprint(root, self.source_file())
    }

    /// A step is dirty until it has succeeded against its current source.
    pub fn is_dirty(&self, root: &Path) -> bool {
        self.status != StepStatus::Success || self.current_fingerprint(root) != self.fingerprint
    }

    /// Record the outcome of an execution.
    ///
    /// `fingerprint` is the source fingerprint taken before the step ran; it
    /// is only kept when the step succeeded.
    pub fn record(&mut self, result: StepResult, fingerprint: Option<String>) {
        self.last_run = Some(Utc::now());
        self.duration_ms = Some(result.duration.as_millis() as u64);
        if result.success {
            self.status = StepStatus::Success;
            self.fingerprint = fingerprint;
        } else {
            self.status = StepStatus::Failed;
        }
        self.result = Some(result);
    }

    /// Snapshot for the state store.
    pub fn to_state(&self) -> StepState {
        StepState {
            last_run: self.last_run,
            status: self.status,
            duration_ms: self.duration_ms,
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Result of executing a step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Step name.
    pub name: String,

    /// Whether the step succeeded.
    pub success: bool,

    /// Execution duration.
    pub duration: Duration,

    /// Exit code (if the process exited normally).
    pub exit_code: Option<i32>,

    /// Error message (if failed).
    pub error: Option<String>,

    /// Captured output (if available).
    pub output: Option<String>,
}

impl StepResult {
    /// Create a success result.
    pub fn success(name: &str, duration: Duration, output: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            duration,
            exit_code: Some(0),
            error: None,
            output,
        }
    }

    /// Create a failure result.
    pub fn failure(name: &str, duration: Duration, exit_code: Option<i32>, error: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration,
            exit_code,
            error: Some(error.to_string()),
            output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn step(name: &str) -> Step {
        Step::new(0, StepDefinition::named(name), None)
    }

    #[test]
    fn never_run_step_is_dirty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("S01.sh"), "true").unwrap();
        assert!(step("S01.sh").is_dirty(temp.path()));
    }

    #[test]
    fn successful_step_is_clean_until_source_changes() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("S01.sh");
        fs::write(&file, "true").unwrap();

        let mut s = step("S01.sh");
        let fp = s.current_fingerprint(temp.path());
        s.record(StepResult::success("S01.sh", Duration::from_millis(5), None), fp);
        assert!(!s.is_dirty(temp.path()));

        fs::write(&file, "false").unwrap();
        assert!(s.is_dirty(temp.path()));
    }

    #[test]
    fn failed_step_stays_dirty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("S01.sh"), "exit 1").unwrap();

        let mut s = step("S01.sh");
        let fp = s.current_fingerprint(temp.path());
        s.record(
            StepResult::failure("S01.sh", Duration::ZERO, Some(1), "exit 1"),
            fp,
        );

        assert_eq!(s.status, StepStatus::Failed);
        assert!(s.fingerprint.is_none());
        assert!(s.is_dirty(temp.path()));
    }

    #[test]
    fn command_defaults_to_interpreter_and_file() {
        let mut s = step("S01.py");
        assert_eq!(s.command("python3"), "python3 S01.py");

        s.definition.file = Some("steps/load.py".to_string());
        assert_eq!(s.command("python3"), "python3 steps/load.py");

        s.definition.command = Some("make load".to_string());
        assert_eq!(s.command("python3"), "make load");
    }

    #[cfg(unix)]
    #[test]
    fn command_quotes_unusual_file_names() {
        let s = step("load data; cleanup.sh");
        assert_eq!(s.command("sh"), "sh 'load data; cleanup.sh'");
    }

    #[test]
    fn persisted_state_is_restored() {
        let state = StepState {
            last_run: Some(Utc::now()),
            status: StepStatus::Success,
            duration_ms: Some(3),
            fingerprint: Some("abc".to_string()),
        };
        let s = Step::new(2, StepDefinition::named("S03"), Some(&state));

        assert_eq!(s.position, 2);
        assert_eq!(s.to_state(), state);
    }
}
