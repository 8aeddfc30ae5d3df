//! Kettle - selective, dirty-aware step runner for data-analysis projects.
//!
//! A project is an ordered list of steps (scripts) plus the library folders
//! and data files they depend on. Kettle remembers what ran, fingerprints
//! every source, and on each invocation runs only what changed, or exactly
//! what was asked for.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Project definition loading, merging and validation
//! - [`error`] - Error types and result aliases
//! - [`project`] - Steps, dependencies, fingerprints and persisted state
//! - [`runner`] - Step selection and run orchestration
//! - [`server`] - Local sync server for remote editors
//! - [`shell`] - Shell command execution
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use kettle::config::{ProjectDefinition, StepDefinition};
//! use kettle::project::Project;
//! use kettle::runner::resolve;
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let definition = ProjectDefinition {
//!     name: "weather".to_string(),
//!     steps: vec![
//!         StepDefinition::named("S01-load.sh"),
//!         StepDefinition::named("S02-clean.sh"),
//!         StepDefinition::named("S03-plot.sh"),
//!     ],
//!     ..Default::default()
//! };
//! let project = Project::from_definition(temp.path(), definition).unwrap();
//!
//! // Ask for two steps starting at S02-clean.sh.
//! let tokens = vec!["S02-clean.sh".to_string(), "2".to_string()];
//! let selection = resolve(&project, &tokens, -1);
//! assert_eq!(selection.steps, vec!["S02-clean.sh"]);
//! assert_eq!(selection.limit, 2);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod project;
pub mod runner;
pub mod server;
pub mod shell;
pub mod ui;

pub use error::{KettleError, Result};
