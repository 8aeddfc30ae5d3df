//! Project definition loading, merging, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Layer merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use kettle::config::load_definition;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(
//!     temp.path().join("kettle.yml"),
//!     "name: weather\nsteps:\n  - name: S01-load.sh\n",
//! )
//! .unwrap();
//!
//! let definition = load_definition(temp.path()).unwrap();
//! assert_eq!(definition.steps[0].name, "S01-load.sh");
//! ```

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use loader::{
    find_project_root, load_definition, load_definition_value, parse_definition,
    write_definition, DefinitionPaths, DEFINITION_FILE, LOCAL_DEFINITION_FILE,
};
pub use merger::{deep_merge, merge_layers};
pub use schema::{
    DependencyDefinition, OutputMode, ProjectDefinition, ServerSettings, Settings,
    StepDefinition,
};
pub use validator::{validate, validate_definition, ValidationError};
