//! Run orchestration.
//!
//! A run request goes through three stages:
//!
//! 1. [`resolve`](super::selection::resolve) turns tokens into a selection.
//!    Any unknown name aborts the run before anything happens.
//! 2. If any dependency is dirty, every dependency is re-sourced. A failed
//!    sourcing pass aborts the run.
//! 3. One of three modes drives the engine:
//!    - single step: one section of length 1
//!    - continue: the engine runs through to the end and persists itself
//!    - section: one section per selected step, each step at most once
//!
//! Single-step and section runs persist the project exactly once at the end,
//! including when the engine errors.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{KettleError, Result};
use crate::project::Project;
use crate::ui::UserInterface;

use super::engine::StepEngine;
use super::selection::{resolve, Selection};

/// A request to run steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Raw selection tokens (names, optionally a trailing limit shorthand).
    pub steps: Vec<String>,

    /// Run selected steps even if they are clean.
    pub force: bool,

    /// Keep going through the rest of the project after the first step.
    pub continue_after: bool,

    /// Run only one step.
    pub single_step: bool,

    /// Maximum number of steps, `-1` for no limit.
    pub limit: i64,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            force: false,
            continue_after: false,
            single_step: false,
            limit: -1,
        }
    }
}

impl RunRequest {
    /// Request for the given step tokens with default flags.
    pub fn steps<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Mode a run was dispatched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    SingleStep,
    Continue,
    Section,
}

impl RunMode {
    /// Lowercase label used in logs and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleStep => "single_step",
            Self::Continue => "continue",
            Self::Section => "section",
        }
    }
}

/// What a dispatched run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Mode the run was dispatched in.
    pub mode: RunMode,

    /// Steps the engine reported as executed. Always empty in continue mode,
    /// where the engine owns the bookkeeping.
    pub steps_run: Vec<String>,
}

/// Resolve, gate and dispatch a run request.
///
/// # Errors
///
/// Returns `MissingSteps` when a requested name matches no step and
/// `SourcingFailed` when dependencies could not be re-sourced. In both cases
/// nothing runs and nothing is written.
pub fn run(
    project: &mut Project,
    engine: &mut dyn StepEngine,
    request: &RunRequest,
    ui: &mut dyn UserInterface,
) -> Result<RunOutcome> {
    let selection = resolve(project, &request.steps, request.limit);
    debug!(
        steps = ?selection.steps,
        unmatched = ?selection.unmatched,
        limit = selection.limit,
        "resolved selection"
    );

    if !selection.is_complete() {
        report_missing(&selection.unmatched, ui);
        return Err(KettleError::MissingSteps {
            steps: selection.unmatched,
        });
    }

    project.clear_results();
    source_dependencies(project, engine, ui)?;
    orchestrate(project, engine, &selection, request, ui)
}

/// Re-source every dependency if any of them is dirty.
///
/// Returns whether a sourcing pass happened.
pub fn source_dependencies(
    project: &mut Project,
    engine: &mut dyn StepEngine,
    ui: &mut dyn UserInterface,
) -> Result<bool> {
    if !project.needs_sourcing() {
        return Ok(false);
    }

    info!(project = %project.name(), "dependencies changed, sourcing");
    ui.show_header("SOURCING");
    if !engine.run_dependencies(project, ui)? {
        return Err(KettleError::SourcingFailed);
    }
    Ok(true)
}

/// Dispatch a resolved selection to the engine.
///
/// The request's `steps` and `limit` are ignored in favor of the
/// selection's; only its flags are read.
pub fn orchestrate(
    project: &mut Project,
    engine: &mut dyn StepEngine,
    selection: &Selection,
    request: &RunRequest,
    ui: &mut dyn UserInterface,
) -> Result<RunOutcome> {
    ui.show_header("RUNNING");

    let first = selection.steps.first().map(String::as_str);

    if request.single_step {
        let force = request.force || first.is_some();
        info!(mode = "single_step", start = ?first, force, "dispatching run");

        let result = engine.run_section(project, first, 1, force, ui);
        return finish(project, RunMode::SingleStep, result, ui);
    }

    if request.continue_after || selection.is_empty() {
        info!(mode = "continue", start = ?first, limit = selection.limit, "dispatching run");

        engine.run_complete(project, first, request.force, selection.limit, ui)?;
        ui.blank_line();
        return Ok(RunOutcome {
            mode: RunMode::Continue,
            steps_run: Vec::new(),
        });
    }

    let limit = selection.limit.max(1);
    let force = request.force || (selection.limit < 1 && selection.steps.len() < 2);
    info!(mode = "section", steps = ?selection.steps, limit, force, "dispatching run");

    let mut steps_run = Vec::new();
    let result = run_sections(project, engine, &selection.steps, limit, force, &mut steps_run, ui)
        .map(|()| steps_run);
    finish(project, RunMode::Section, result, ui)
}

fn run_sections(
    project: &mut Project,
    engine: &mut dyn StepEngine,
    steps: &[String],
    limit: i64,
    force: bool,
    steps_run: &mut Vec<String>,
    ui: &mut dyn UserInterface,
) -> Result<()> {
    let mut has_run: HashSet<String> = HashSet::new();

    for name in steps {
        if has_run.contains(name) {
            debug!(step = %name, "already ran in this invocation");
            continue;
        }

        for ran in engine.run_section(project, Some(name), limit, force, ui)? {
            if has_run.insert(ran.clone()) {
                steps_run.push(ran);
            }
        }
    }

    Ok(())
}

/// Persist the project, then surface the engine's result.
fn finish(
    project: &mut Project,
    mode: RunMode,
    result: Result<Vec<String>>,
    ui: &mut dyn UserInterface,
) -> Result<RunOutcome> {
    let written = project.write();
    let steps_run = result?;
    written?;

    ui.blank_line();
    Ok(RunOutcome { mode, steps_run })
}

fn report_missing(names: &[String], ui: &mut dyn UserInterface) {
    ui.error("[ABORTED]: Unable to locate the following step(s):");
    for name in names {
        ui.error(&format!("  * \"{}\"", name));
    }
    ui.blank_line();
}
