//! Shell command execution.

use super::platform::shell;
use crate::error::{KettleError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    fn from_status(
        status: std::process::ExitStatus,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
            success: status.success(),
        }
    }

    /// Last non-empty line of stderr, for error summaries.
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr.lines().rev().find(|l| !l.trim().is_empty())
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

fn build(command: &str, options: &CommandOptions) -> Command {
    let (shell, flag) = shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd
}

fn spawn_failed(command: &str) -> KettleError {
    KettleError::CommandFailed {
        command: command.to_string(),
        code: None,
    }
}

/// Execute a shell command.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let mut cmd = build(command, options);

    cmd.stdout(if options.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    let output = cmd.output().map_err(|_| spawn_failed(command))?;

    Ok(CommandResult::from_status(
        output.status,
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        start.elapsed(),
    ))
}

/// Execute a command, handing each output line to `on_line` as it arrives.
///
/// Both streams are always captured into the returned result as well.
pub fn execute_streaming(
    command: &str,
    options: &CommandOptions,
    on_line: &mut dyn FnMut(OutputLine),
) -> Result<CommandResult> {
    let start = Instant::now();
    let mut cmd = build(command, options);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|_| spawn_failed(command))?;
    let stdout = child.stdout.take().ok_or_else(|| spawn_failed(command))?;
    let stderr = child.stderr.take().ok_or_else(|| spawn_failed(command))?;

    let (tx, rx) = mpsc::channel();
    let tx_stdout = tx.clone();
    let tx_stderr = tx;

    let stdout_handle = thread::spawn(move || {
        let mut output = String::new();
        for line in BufReader::new(stdout).lines().map_while(std::result::Result::ok) {
            output.push_str(&line);
            output.push('\n');
            let _ = tx_stdout.send(OutputLine::Stdout(line));
        }
        output
    });

    let stderr_handle = thread::spawn(move || {
        let mut output = String::new();
        for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
            output.push_str(&line);
            output.push('\n');
            let _ = tx_stderr.send(OutputLine::Stderr(line));
        }
        output
    });

    for line in rx {
        on_line(line);
    }

    let stdout_output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();
    let status = child.wait().map_err(|_| spawn_failed(command))?;

    Ok(CommandResult::from_status(
        status,
        stdout_output,
        stderr_output,
        start.elapsed(),
    ))
}
