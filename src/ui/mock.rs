//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use kettle::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("RUNNING");
//! ui.success("S01-load.sh");
//! ui.blank_line();
//!
//! assert_eq!(ui.headers(), &["RUNNING".to_string()]);
//! assert!(ui.has_success("S01-load.sh"));
//! assert_eq!(ui.blank_lines(), 1);
//! ```

use std::sync::{Arc, Mutex};

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    spinners: Vec<String>,
    spinner_results: Arc<Mutex<Vec<(String, SpinnerStatus)>>>,
    blank_lines: usize,
    transcript: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all spinner start messages.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Finish message and status of every spinner, in finish order.
    pub fn spinner_results(&self) -> Vec<(String, SpinnerStatus)> {
        self.spinner_results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of blank lines emitted.
    pub fn blank_lines(&self) -> usize {
        self.blank_lines
    }

    /// Every call in order, as `kind:text` entries.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success message was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    fn log(&mut self, kind: &str, text: &str) {
        self.transcript.push(format!("{}:{}", kind, text));
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.log("message", msg);
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.log("success", msg);
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.log("warning", msg);
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.log("error", msg);
        self.errors.push(msg.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.log("spinner", message);
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Some(Arc::clone(&self.spinner_results)),
            ..Default::default()
        })
    }

    fn show_header(&mut self, title: &str) {
        self.log("header", title);
        self.headers.push(title.to_string());
    }

    fn blank_line(&mut self) {
        self.log("blank", "");
        self.blank_lines += 1;
    }

    fn is_interactive(&self) -> bool {
        false
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    /// Finished successfully.
    Success,
    /// Finished with error.
    Error,
    /// Finished as skipped.
    Skipped,
}

/// Mock spinner that records how it finished.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finish_message: Option<String>,
    status: Option<SpinnerStatus>,
    results: Option<Arc<Mutex<Vec<(String, SpinnerStatus)>>>>,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages set during spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get the final finish message.
    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    /// Get the final status.
    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }

    fn finish(&mut self, msg: &str, status: SpinnerStatus) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(status);
        if let Some(results) = &self.results {
            if let Ok(mut results) = results.lock() {
                results.push((msg.to_string(), status));
            }
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Error);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish(msg, SpinnerStatus::Skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ui_captures_messages() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.success("done");
        ui.warning("careful");
        ui.error("broken");

        assert_eq!(ui.messages(), &["hello".to_string()]);
        assert!(ui.has_success("done"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("broken"));
    }

    #[test]
    fn mock_ui_transcript_keeps_order() {
        let mut ui = MockUI::new();
        ui.show_header("SOURCING");
        ui.show_header("RUNNING");
        ui.blank_line();

        assert_eq!(
            ui.transcript(),
            &[
                "header:SOURCING".to_string(),
                "header:RUNNING".to_string(),
                "blank:".to_string()
            ]
        );
    }

    #[test]
    fn mock_ui_records_spinner_results() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("S01.sh");
        spinner.finish_error("S01.sh failed");

        assert_eq!(ui.spinners(), &["S01.sh".to_string()]);
        assert_eq!(
            ui.spinner_results(),
            vec![("S01.sh failed".to_string(), SpinnerStatus::Error)]
        );
    }

    #[test]
    fn mock_spinner_captures_finish() {
        let mut spinner = MockSpinner::new();
        spinner.set_message("working");
        spinner.finish_skipped("clean");

        assert_eq!(spinner.messages(), &["working".to_string()]);
        assert_eq!(spinner.finish_message(), Some("clean"));
        assert_eq!(spinner.status(), Some(SpinnerStatus::Skipped));
    }

    #[test]
    fn mock_ui_output_mode() {
        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
        ui.set_output_mode(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn command_output_only_in_verbose() {
        let mut ui = MockUI::new();
        ui.command_output("hidden");
        assert!(ui.messages().is_empty());

        ui.set_output_mode(OutputMode::Verbose);
        ui.command_output("shown");
        assert!(ui.has_message("shown"));
    }
}
