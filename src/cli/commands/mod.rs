//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. `kettle` with no subcommand runs
//! the project.

pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod run;
pub mod serve;
pub mod status;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
