//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::find_project_root;
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Exit code when no project could be found.
pub const EXIT_NO_PROJECT: i32 = 2;

/// Locate the project containing `start`, reporting on the UI if none does.
pub fn locate_project(start: &Path, ui: &mut dyn UserInterface) -> Option<PathBuf> {
    let root = find_project_root(start);
    if root.is_none() {
        ui.error(&format!(
            "No kettle.yml found in {} or any parent directory",
            start.display()
        ));
    }
    root
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher starting the project search at `project_root`.
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Get the project search start path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(&self.project_root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Status(args)) => {
                let cmd = super::status::StatusCommand::new(&self.project_root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Serve(args)) => {
                let cmd = super::serve::ServeCommand::new(&self.project_root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                let cmd = super::run::RunCommand::new(&self.project_root, RunArgs::default());
                cmd.execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn locate_project_reports_missing() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        assert!(locate_project(temp.path(), &mut ui).is_none());
        assert!(ui.has_error("No kettle.yml found"));
    }

    #[cfg(unix)]
    #[test]
    fn dispatch_without_command_runs_project() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: p\nsteps:\n  - name: a\n    command: \"true\"\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["kettle"]).unwrap();
        let mut ui = MockUI::new();

        let result = CommandDispatcher::new(temp.path().to_path_buf())
            .dispatch(&cli, &mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.headers().contains(&"RUNNING".to_string()));
    }
}
