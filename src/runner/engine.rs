//! Step execution engines.
//!
//! The orchestrator never runs a step itself. It drives a [`StepEngine`]
//! through three entry points: a bounded section, a run through to the end of
//! the project, and a dependency sourcing pass.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{KettleError, Result};
use crate::project::{Project, StepResult};
use crate::shell::{execute, execute_streaming, CommandOptions, CommandResult, OutputLine};
use crate::ui::{format_duration, SpinnerHandle, UserInterface};

/// Executes steps and sources dependencies on behalf of the orchestrator.
pub trait StepEngine {
    /// Run up to `limit` steps starting at `start`, or at the default next
    /// step when `start` is `None`. Returns the names of steps executed.
    fn run_section(
        &mut self,
        project: &mut Project,
        start: Option<&str>,
        limit: i64,
        force: bool,
        ui: &mut dyn UserInterface,
    ) -> Result<Vec<String>>;

    /// Run from `start` (or the beginning) through the end of the project,
    /// stopping after `limit` executed steps when `limit > 0`. Persists the
    /// project when done.
    fn run_complete(
        &mut self,
        project: &mut Project,
        start: Option<&str>,
        force: bool,
        limit: i64,
        ui: &mut dyn UserInterface,
    ) -> Result<()>;

    /// Re-source every dependency. Returns `false` if sourcing failed.
    fn run_dependencies(&mut self, project: &mut Project, ui: &mut dyn UserInterface)
        -> Result<bool>;
}

/// Engine that runs each step as a shell command in the project directory.
///
/// Once a step fails, the engine refuses to run anything else, so later
/// sections of the same invocation do not build on a broken result.
#[derive(Debug, Default)]
pub struct ShellEngine {
    failed: bool,
}

impl ShellEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a step failed during this engine's lifetime.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn options(&self, project: &Project, step: &str) -> CommandOptions {
        let mut env = HashMap::new();
        env.insert("KETTLE_STEP".to_string(), step.to_string());
        env.insert(
            "KETTLE_PROJECT_DIR".to_string(),
            project.source_directory.to_string_lossy().to_string(),
        );

        CommandOptions {
            cwd: Some(project.source_directory.clone()),
            env,
            capture_stdout: true,
            capture_stderr: true,
        }
    }

    fn run_step(
        &mut self,
        project: &mut Project,
        index: usize,
        ui: &mut dyn UserInterface,
    ) -> StepResult {
        let step = &project.steps[index];
        let name = step.name.clone();
        let command = step.command(project.interpreter());
        let fingerprint = step.current_fingerprint(&project.source_directory);
        let options = self.options(project, &name);

        info!(step = %name, command = %command, "running step");

        let outcome = if ui.output_mode().shows_command_output() {
            ui.message(&format!("◆ {}", name));
            execute_streaming(&command, &options, &mut |line| {
                let text = match line {
                    OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
                };
                ui.command_output(&text);
            })
            .map(|r| (r, None))
        } else {
            let spinner = ui.start_spinner(&name);
            execute(&command, &options).map(|r| (r, Some(spinner)))
        };

        let result = match outcome {
            Ok((output, spinner)) => self.finish_step(&name, output, spinner, ui),
            Err(e) => {
                ui.error(&format!("{}: {}", name, e));
                StepResult::failure(&name, Duration::ZERO, None, &e.to_string())
            }
        };

        if !result.success {
            self.failed = true;
        }

        if let Some(step) = project.steps.get_mut(index) {
            step.record(result.clone(), fingerprint);
        }
        result
    }

    fn finish_step(
        &self,
        name: &str,
        output: CommandResult,
        spinner: Option<Box<dyn SpinnerHandle>>,
        ui: &mut dyn UserInterface,
    ) -> StepResult {
        let label = format!("{} ({})", name, format_duration(output.duration));

        if output.success {
            match spinner {
                Some(mut s) => s.finish_success(&label),
                None => ui.success(&label),
            }
            debug!(step = %name, duration_ms = output.duration.as_millis() as u64, "step succeeded");
            return StepResult::success(name, output.duration, Some(output.stdout));
        }

        let detail = output
            .last_error_line()
            .map(String::from)
            .unwrap_or_else(|| match output.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            });

        match spinner {
            Some(mut s) => s.finish_error(&label),
            None => ui.error(&label),
        }
        ui.error(&format!("  {}", detail));
        warn!(step = %name, exit_code = ?output.exit_code, "step failed");

        StepResult::failure(name, output.duration, output.exit_code, &detail)
    }

    fn skip(&self, project: &Project, index: usize, ui: &mut dyn UserInterface) {
        let name = &project.steps[index].name;
        debug!(step = %name, "step is clean, skipping");
        ui.message(&format!("○ {} is up to date", name));
    }

    fn start_index(&self, project: &Project, start: Option<&str>) -> Result<Option<usize>> {
        match start {
            Some(name) => project
                .index_of(name)
                .map(Some)
                .ok_or_else(|| KettleError::StepNotFound {
                    name: name.to_string(),
                }),
            None => Ok(project.first_dirty_index()),
        }
    }
}

impl StepEngine for ShellEngine {
    fn run_section(
        &mut self,
        project: &mut Project,
        start: Option<&str>,
        limit: i64,
        force: bool,
        ui: &mut dyn UserInterface,
    ) -> Result<Vec<String>> {
        if self.failed {
            return Ok(Vec::new());
        }

        let Some(first) = self.start_index(project, start)? else {
            ui.message("Nothing to run: every step is up to date");
            return Ok(Vec::new());
        };

        let window = limit.max(1) as usize;
        let end = first.saturating_add(window).min(project.steps.len());
        let mut ran = Vec::new();

        for index in first..end {
            if !force && !project.is_step_dirty(index) {
                self.skip(project, index, ui);
                continue;
            }

            let result = self.run_step(project, index, ui);
            ran.push(result.name);
            if !result.success {
                break;
            }
        }

        Ok(ran)
    }

    fn run_complete(
        &mut self,
        project: &mut Project,
        start: Option<&str>,
        force: bool,
        limit: i64,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        let first = match start {
            Some(name) => project
                .index_of(name)
                .ok_or_else(|| KettleError::StepNotFound {
                    name: name.to_string(),
                })?,
            None => 0,
        };

        let mut executed: i64 = 0;
        for index in first..project.steps.len() {
            if self.failed || (limit > 0 && executed >= limit) {
                break;
            }
            if !force && !project.is_step_dirty(index) {
                self.skip(project, index, ui);
                continue;
            }

            self.run_step(project, index, ui);
            executed += 1;
        }

        project.write()
    }

    fn run_dependencies(
        &mut self,
        project: &mut Project,
        ui: &mut dyn UserInterface,
    ) -> Result<bool> {
        for dependency in &project.dependencies {
            let Some(command) = &dependency.command else {
                ui.message(&format!("○ {}", dependency.identifier()));
                continue;
            };

            info!(dependency = %dependency.identifier(), command = %command, "sourcing dependency");
            let options = self.options(project, dependency.identifier());
            let spinner_label = dependency.identifier().to_string();
            let mut spinner = ui.start_spinner(&spinner_label);
            let output = execute(command, &options)?;

            if !output.success {
                spinner.finish_error(&spinner_label);
                if let Some(line) = output.last_error_line() {
                    ui.error(&format!("  {}", line));
                }
                warn!(dependency = %spinner_label, "sourcing failed");
                return Ok(false);
            }
            spinner.finish_success(&spinner_label);
        }

        let root = project.source_directory.clone();
        for dependency in &mut project.dependencies {
            dependency.mark_sourced(&root);
        }
        Ok(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::project::StepStatus;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup(steps: &[(&str, &str)]) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let mut yaml = String::from("name: weather\nsteps:\n");
        for (name, body) in steps {
            yaml.push_str(&format!("  - name: {}\n", name));
            fs::write(temp.path().join(name), body).unwrap();
        }
        fs::write(temp.path().join("kettle.yml"), yaml).unwrap();
        let project = Project::open(temp.path()).unwrap();
        (temp, project)
    }

    #[test]
    fn section_runs_window_from_start() {
        let (_t, mut p) = setup(&[("a.sh", "true"), ("b.sh", "true"), ("c.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();

        let ran = engine
            .run_section(&mut p, Some("a.sh"), 2, false, &mut ui)
            .unwrap();

        assert_eq!(ran, vec!["a.sh", "b.sh"]);
        assert_eq!(p.steps[2].status, StepStatus::NeverRun);
    }

    #[test]
    fn step_file_with_spaces_runs() {
        let (t, mut p) = setup(&[("load data.sh", "echo ok > out.txt")]);
        let mut ui = MockUI::new();

        let ran = ShellEngine::new()
            .run_section(&mut p, Some("load data.sh"), 1, false, &mut ui)
            .unwrap();

        assert_eq!(ran, vec!["load data.sh"]);
        assert_eq!(p.steps[0].status, StepStatus::Success);
        assert!(t.path().join("out.txt").exists());
    }

    #[test]
    fn section_without_start_begins_at_first_dirty() {
        let (_t, mut p) = setup(&[("a.sh", "true"), ("b.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();
        engine.run_section(&mut p, Some("a.sh"), 1, false, &mut ui).unwrap();

        let ran = engine.run_section(&mut p, None, 1, false, &mut ui).unwrap();

        assert_eq!(ran, vec!["b.sh"]);
    }

    #[test]
    fn section_skips_clean_steps_unless_forced() {
        let (_t, mut p) = setup(&[("a.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();
        engine.run_section(&mut p, Some("a.sh"), 1, false, &mut ui).unwrap();

        let skipped = engine.run_section(&mut p, Some("a.sh"), 1, false, &mut ui).unwrap();
        assert!(skipped.is_empty());
        assert!(ui.has_message("a.sh is up to date"));

        let forced = engine.run_section(&mut p, Some("a.sh"), 1, true, &mut ui).unwrap();
        assert_eq!(forced, vec!["a.sh"]);
    }

    #[test]
    fn failure_stops_the_engine() {
        let (_t, mut p) = setup(&[("a.sh", "exit 4"), ("b.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();

        let ran = engine.run_section(&mut p, Some("a.sh"), 2, false, &mut ui).unwrap();
        assert_eq!(ran, vec!["a.sh"]);
        assert_eq!(p.steps[0].status, StepStatus::Failed);
        assert_eq!(p.steps[0].result.as_ref().unwrap().exit_code, Some(4));
        assert!(engine.has_failed());

        let later = engine.run_section(&mut p, Some("b.sh"), 1, true, &mut ui).unwrap();
        assert!(later.is_empty());
    }

    #[test]
    fn steps_see_kettle_environment() {
        let (t, mut p) = setup(&[("a.sh", "echo \"$KETTLE_STEP\" > out.txt")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();

        engine.run_section(&mut p, Some("a.sh"), 1, false, &mut ui).unwrap();

        let out = fs::read_to_string(t.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "a.sh");
    }

    #[test]
    fn complete_runs_to_end_and_writes() {
        let (_t, mut p) = setup(&[("a.sh", "true"), ("b.sh", "true"), ("c.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();

        engine.run_complete(&mut p, Some("b.sh"), false, -1, &mut ui).unwrap();

        assert_eq!(p.steps[0].status, StepStatus::NeverRun);
        assert_eq!(p.steps[1].status, StepStatus::Success);
        assert_eq!(p.steps[2].status, StepStatus::Success);
        assert!(p.state_file().exists());
    }

    #[test]
    fn complete_honors_limit_on_executed_steps() {
        let (_t, mut p) = setup(&[("a.sh", "true"), ("b.sh", "true"), ("c.sh", "true")]);
        let mut ui = MockUI::new();
        let mut engine = ShellEngine::new();
        engine.run_section(&mut p, Some("a.sh"), 1, false, &mut ui).unwrap();

        engine.run_complete(&mut p, None, false, 1, &mut ui).unwrap();

        assert_eq!(p.steps[1].status, StepStatus::Success);
        assert_eq!(p.steps[2].status, StepStatus::NeverRun);
    }

    #[test]
    fn unknown_start_is_an_error() {
        let (_t, mut p) = setup(&[("a.sh", "true")]);
        let mut ui = MockUI::new();
        let err = ShellEngine::new()
            .run_section(&mut p, Some("zz"), 1, false, &mut ui)
            .unwrap_err();
        assert!(matches!(err, KettleError::StepNotFound { .. }));
    }

    #[test]
    fn dependency_failure_reports_false() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: p\ndependencies:\n  - path: libs\n    command: exit 1\n",
        )
        .unwrap();
        let mut p = Project::open(temp.path()).unwrap();
        let mut ui = MockUI::new();

        let ok = ShellEngine::new().run_dependencies(&mut p, &mut ui).unwrap();

        assert!(!ok);
        assert!(p.dependencies[0].sourced_at.is_none());
    }

    #[test]
    fn dependency_success_marks_sourced() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("libs")).unwrap();
        fs::write(temp.path().join("libs").join("u.sh"), "x=1").unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: p\ndependencies:\n  - libs\n",
        )
        .unwrap();
        let mut p = Project::open(temp.path()).unwrap();
        assert!(p.needs_sourcing());

        let ok = ShellEngine::new()
            .run_dependencies(&mut p, &mut MockUI::new())
            .unwrap();

        assert!(ok);
        assert!(!p.needs_sourcing());
    }
}
