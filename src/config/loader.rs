//! Definition file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::merger::merge_layers;
use crate::config::schema::ProjectDefinition;
use crate::config::validator::validate;
use crate::error::{KettleError, Result};

/// File name of the project definition.
pub const DEFINITION_FILE: &str = "kettle.yml";

/// File name of the machine-local override layer.
pub const LOCAL_DEFINITION_FILE: &str = "kettle.local.yml";

/// Paths to definition layers in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`~/.kettle/config.yml`)
/// 2. Project definition (`kettle.yml`)
/// 3. Local overrides (`kettle.local.yml`)
#[derive(Debug, Clone)]
pub struct DefinitionPaths {
    /// User's global config: ~/.kettle/config.yml
    pub user_global: Option<PathBuf>,

    /// Project definition: kettle.yml
    pub project: Option<PathBuf>,

    /// Local overrides: kettle.local.yml
    pub project_local: Option<PathBuf>,
}

impl DefinitionPaths {
    /// Discover definition layers for the given project directory.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: existing(dirs::home_dir().map(|h| h.join(".kettle").join("config.yml"))),
            project: existing(Some(project_root.join(DEFINITION_FILE))),
            project_local: existing(Some(project_root.join(LOCAL_DEFINITION_FILE))),
        }
    }

    /// Returns all existing layer paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Check if the project definition exists.
    pub fn has_project_definition(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p.exists())
}

/// Find the project directory by walking up from `start`.
///
/// The first directory containing `kettle.yml` wins.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(DEFINITION_FILE).is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Parse YAML content into a definition.
pub fn parse_definition(content: &str, source_path: &Path) -> Result<ProjectDefinition> {
    serde_yaml::from_str(content).map_err(|e| KettleError::DefinitionParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load one layer as a raw YAML value (for merging).
pub fn load_definition_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;

    serde_yaml::from_str(&content).map_err(|e| KettleError::DefinitionParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load, merge and validate all layers for a project.
///
/// # Errors
///
/// Returns `ProjectNotFound` if `kettle.yml` is missing, `DefinitionParseError`
/// if any layer is invalid YAML, and `ValidationError` if the merged result
/// breaks a rule.
pub fn load_definition(project_root: &Path) -> Result<ProjectDefinition> {
    let paths = DefinitionPaths::discover(project_root);

    if !paths.has_project_definition() {
        return Err(KettleError::ProjectNotFound {
            path: project_root.to_path_buf(),
        });
    }

    let mut layers = Vec::new();
    for path in paths.all_existing() {
        debug!(path = %path.display(), "loading definition layer");
        layers.push(load_definition_value(path)?);
    }

    let merged = merge_layers(&layers);
    let definition: ProjectDefinition =
        serde_yaml::from_value(merged).map_err(|e| KettleError::DefinitionParseError {
            path: project_root.join(DEFINITION_FILE),
            message: format!("Failed to parse merged definition: {}", e),
        })?;

    validate(&definition)?;
    Ok(definition)
}

/// Write a definition to `<dir>/kettle.yml`.
pub fn write_definition(dir: &Path, definition: &ProjectDefinition) -> Result<PathBuf> {
    let path = dir.join(DEFINITION_FILE);
    let content = serde_yaml::to_string(definition).map_err(|e| KettleError::ValidationError {
        message: format!("Failed to serialize definition: {}", e),
    })?;
    fs::write(&path, content)?;
    Ok(path)
}
