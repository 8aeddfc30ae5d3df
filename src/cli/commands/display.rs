//! Shared display helpers for step status formatting.
//!
//! Used by `status` and `run` to render steps consistently.

use crate::project::{Step, StepStatus};
use crate::ui::UserInterface;

/// Return the icon string for a step.
///
/// A successful step whose inputs changed since is shown as stale.
pub fn status_icon(status: &StepStatus, dirty: bool) -> &'static str {
    match (status, dirty) {
        (StepStatus::Success, false) => "✓",
        (StepStatus::Success, true) => "◐",
        (StepStatus::Failed, _) => "✗",
        (StepStatus::NeverRun, _) => "◌",
    }
}

/// Short label for a step's state.
pub fn status_label(status: &StepStatus, dirty: bool) -> &'static str {
    match (status, dirty) {
        (StepStatus::Success, false) => "up to date",
        (StepStatus::Success, true) => "modified",
        (StepStatus::Failed, _) => "failed",
        (StepStatus::NeverRun, _) => "never run",
    }
}

/// Print a single step's status line, styled by severity.
pub fn show_step_status(ui: &mut dyn UserInterface, step: &Step, dirty: bool) {
    let line = format!(
        "  {} {} ({})",
        status_icon(&step.status, dirty),
        step.name,
        status_label(&step.status, dirty)
    );
    match (&step.status, dirty) {
        (StepStatus::Success, false) => ui.success(&line),
        (StepStatus::Success, true) => ui.warning(&line),
        (StepStatus::Failed, _) => ui.error(&line),
        (StepStatus::NeverRun, _) => ui.message(&line),
    }
}

/// Print a dependency line.
pub fn show_dependency_status(ui: &mut dyn UserInterface, path: &str, dirty: bool) {
    if dirty {
        ui.warning(&format!("  ◐ {} (changed)", path));
    } else {
        ui.success(&format!("  ✓ {}", path));
    }
}
