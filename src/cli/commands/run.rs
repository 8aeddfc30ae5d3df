//! Run command implementation.
//!
//! The `kettle run` command runs the selected steps of the project found at
//! or above the working directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::args::RunArgs;
use crate::error::{KettleError, Result};
use crate::project::Project;
use crate::runner::{self, ShellEngine};
use crate::ui::{OutputMode, UserInterface};

use super::dispatcher::{locate_project, Command, CommandResult, EXIT_NO_PROJECT};

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project_root: &Path, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Get the project search start path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(root) = locate_project(&self.project_root, ui) else {
            return Ok(CommandResult::failure(EXIT_NO_PROJECT));
        };

        let mut project = Project::open(&root)?;
        if ui.output_mode() == OutputMode::Normal {
            ui.set_output_mode(project.definition.settings.output.into());
        }
        debug!(project = %project.name(), root = %root.display(), "running project");

        let mut engine = ShellEngine::new();
        let request = self.args.to_request();

        match runner::run(&mut project, &mut engine, &request, ui) {
            Ok(outcome) => {
                debug!(mode = outcome.mode.as_str(), steps = ?outcome.steps_run, "run finished");
            }
            Err(KettleError::MissingSteps { .. }) => {
                return Ok(CommandResult::failure(1));
            }
            Err(e @ KettleError::SourcingFailed) => {
                let failure = e.to_failure();
                ui.error(&format!("[{}]: {}", failure.kind, failure.message));
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        }

        let failed = project.failed_steps();
        if !failed.is_empty() {
            ui.error(&format!("Failed: {}", failed.join(", ")));
            return Ok(CommandResult::failure(1));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup(steps: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            format!("name: weather\nsteps:\n{}", steps),
        )
        .unwrap();
        temp
    }

    #[test]
    fn run_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = RunCommand::new(temp.path(), RunArgs::default());
        assert_eq!(cmd.project_root(), temp.path());
        assert_eq!(cmd.args().limit, -1);
    }

    #[test]
    fn run_without_project_exits_two() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("No kettle.yml found"));
    }

    #[cfg(unix)]
    #[test]
    fn run_executes_all_dirty_steps() {
        let temp = setup(
            "  - name: a\n    command: echo a > a.out\n  - name: b\n    command: echo b > b.out\n",
        );
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(temp.path().join("a.out").exists());
        assert!(temp.path().join("b.out").exists());
        assert!(temp.path().join(".kettle").join("state.yml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn run_unknown_step_aborts_with_one() {
        let temp = setup("  - name: a\n    command: echo a > a.out\n");
        let mut ui = MockUI::new();
        let args = RunArgs {
            steps: vec!["nope".to_string()],
            ..Default::default()
        };

        let result = RunCommand::new(temp.path(), args).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("\"nope\""));
        assert!(!temp.path().join("a.out").exists());
    }

    #[cfg(unix)]
    #[test]
    fn run_failed_step_exits_one() {
        let temp = setup("  - name: a\n    command: exit 3\n");
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Failed: a"));
    }

    #[cfg(unix)]
    #[test]
    fn run_failed_sourcing_reports_aborted() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: weather\ndependencies:\n  - path: libs\n    command: exit 1\nsteps:\n  - name: a\n    command: echo a > a.out\n",
        )
        .unwrap();
        fs::create_dir_all(temp.path().join("libs")).unwrap();
        fs::write(temp.path().join("libs").join("util.sh"), "x=1").unwrap();
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("[ABORTED]"));
        assert!(!temp.path().join("a.out").exists());
    }

    #[test]
    fn project_output_setting_applies_in_normal_mode() {
        let temp = setup("  - name: a\n    command: \"true\"\n");
        fs::write(
            temp.path().join("kettle.local.yml"),
            "settings:\n  output: quiet\n",
        )
        .unwrap();
        let mut ui = MockUI::new();

        RunCommand::new(temp.path(), RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }
}
