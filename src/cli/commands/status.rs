//! Status command implementation.
//!
//! The `kettle status` command shows which steps and dependencies would run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::error::Result;
use crate::project::{Project, StepStatus};
use crate::ui::UserInterface;

use super::dispatcher::{locate_project, Command, CommandResult, EXIT_NO_PROJECT};
use super::display;

/// The status command implementation.
pub struct StatusCommand {
    project_root: PathBuf,
    args: StatusArgs,
}

/// JSON form of a step's status.
#[derive(Debug, Serialize)]
struct StepReport<'a> {
    name: &'a str,
    status: StepStatus,
    dirty: bool,
    last_run: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
}

/// JSON form of a dependency's status.
#[derive(Debug, Serialize)]
struct DependencyReport<'a> {
    path: &'a str,
    dirty: bool,
    sourced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    project: &'a str,
    source_directory: &'a Path,
    steps: Vec<StepReport<'a>>,
    dependencies: Vec<DependencyReport<'a>>,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(project_root: &Path, args: StatusArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    fn report<'a>(project: &'a Project) -> StatusReport<'a> {
        let root = &project.source_directory;
        StatusReport {
            project: project.name(),
            source_directory: root,
            steps: project
                .steps
                .iter()
                .map(|s| StepReport {
                    name: &s.name,
                    status: s.status,
                    dirty: s.is_dirty(root),
                    last_run: s.last_run,
                    duration_ms: s.duration_ms,
                })
                .collect(),
            dependencies: project
                .dependencies
                .iter()
                .map(|d| DependencyReport {
                    path: &d.path,
                    dirty: d.is_dirty(root),
                    sourced_at: d.sourced_at,
                })
                .collect(),
        }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(root) = locate_project(&self.project_root, ui) else {
            return Ok(CommandResult::failure(EXIT_NO_PROJECT));
        };
        let project = Project::open(&root)?;
        let report = Self::report(&project);

        if self.args.json {
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            println!("{json}");
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("{} - Status", project.definition.display_title()));
        ui.message(&format!("Project: {}", root.display()));
        ui.blank_line();

        if !project.dependencies.is_empty() {
            ui.message("Dependencies:");
            for dependency in &report.dependencies {
                display::show_dependency_status(ui, dependency.path, dependency.dirty);
            }
            ui.blank_line();
        }

        ui.message("Steps:");
        for (step, line) in project.steps.iter().zip(&report.steps) {
            display::show_step_status(ui, step, line.dirty);
        }
        ui.blank_line();

        match project.first_dirty_index() {
            Some(index) => ui.message(&format!(
                "Next: kettle run {}",
                project.steps[index].name
            )),
            None => ui.success("Everything is up to date"),
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

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: weather\ndependencies:\n  - libs\nsteps:\n  - name: S01.sh\n  - name: S02.sh\n",
        )
        .unwrap();
        fs::write(temp.path().join("S01.sh"), "true").unwrap();
        fs::write(temp.path().join("S02.sh"), "true").unwrap();
        temp
    }

    #[test]
    fn status_without_project_exits_two() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = StatusCommand::new(temp.path(), StatusArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn status_lists_steps_in_order() {
        let temp = setup();
        let mut ui = MockUI::new();

        let result = StatusCommand::new(temp.path(), StatusArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        let steps: Vec<_> = ui
            .messages()
            .iter()
            .filter(|m| m.contains("never run"))
            .cloned()
            .collect();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].contains("S01.sh"));
        assert!(steps[1].contains("S02.sh"));
        assert!(ui.has_message("Next: kettle run S01.sh"));
    }

    #[test]
    fn report_marks_missing_dependency_clean() {
        let temp = setup();
        let project = Project::open(temp.path()).unwrap();

        let report = StatusCommand::report(&project);

        assert_eq!(report.dependencies.len(), 1);
        assert!(!report.dependencies[0].dirty);
        assert!(report.steps.iter().all(|s| s.dirty));
    }
}
