//! Shell command execution.

pub mod command;
pub mod platform;

pub use command::{execute, execute_streaming, CommandOptions, CommandResult, OutputLine};
pub use platform::{is_ci, quote};
