//! Step selection and run orchestration.

pub mod engine;
pub mod mock;
pub mod orchestrator;
pub mod selection;

pub use engine::{ShellEngine, StepEngine};
pub use mock::{EngineCall, RecordingEngine};
pub use orchestrator::{orchestrate, run, source_dependencies, RunMode, RunOutcome, RunRequest};
pub use selection::{resolve, Selection};
