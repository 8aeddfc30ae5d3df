//! Project definition schema.
//!
//! These structs map to the `kettle.yml` file at the root of a project.
//! Declaration order of `steps` is meaningful: it is the default run order.

use serde::{Deserialize, Serialize};

/// Root structure of `kettle.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefinition {
    /// Project name (identifier and display fallback).
    pub name: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Ordered step definitions.
    pub steps: Vec<StepDefinition>,

    /// Library folders and data files the steps rely on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDefinition>,

    /// Runtime settings.
    pub settings: Settings,
}

impl ProjectDefinition {
    /// Display title, falling back to the project name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// A single step in the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDefinition {
    /// Unique step name.
    pub name: String,

    /// Source file relative to the project directory. Defaults to `name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Explicit command. Defaults to `<interpreter> <file>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Short description for listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StepDefinition {
    /// Create a definition with only a name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Source file path relative to the project directory.
    pub fn source_file(&self) -> &str {
        self.file.as_deref().unwrap_or(&self.name)
    }
}

/// A dependency is either a bare path or a path with a sourcing command.
///
/// ```yaml
/// dependencies:
///   - libs
///   - path: vendor/geo
///     command: make -C vendor/geo
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDefinition {
    Path(String),
    Detailed {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
}

impl DependencyDefinition {
    /// Path relative to the project directory.
    pub fn path(&self) -> &str {
        match self {
            Self::Path(p) => p,
            Self::Detailed { path, .. } => path,
        }
    }

    /// Command to run while sourcing, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { command, .. } => command.as_deref(),
        }
    }
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Program used to run a step file when no command is given.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Default output mode.
    pub output: OutputMode,

    /// Sync server settings.
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            output: OutputMode::default(),
            server: ServerSettings::default(),
        }
    }
}

fn default_interpreter() -> String {
    "sh".to_string()
}

/// Sync server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,

    /// Browser origins allowed to call the server besides loopback ones,
    /// e.g. `https://editor.example.com`.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5010,
            allowed_origins: Vec::new(),
        }
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Verbose,
    #[default]
    Normal,
    Quiet,
    Silent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_definition() {
        let yaml = r#"
name: weather
steps:
  - name: S01-load.sh
  - name: S02-clean.sh
"#;
        let def: ProjectDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.name, "weather");
        assert_eq!(def.steps.len(), 2);
        assert_eq!(def.steps[0].name, "S01-load.sh");
        assert_eq!(def.settings.interpreter, "sh");
        assert_eq!(def.settings.server.port, 5010);
    }

    #[test]
    fn steps_keep_declaration_order() {
        let yaml = r#"
name: p
steps:
  - name: zeta
  - name: alpha
  - name: mid
"#;
        let def: ProjectDefinition = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = def.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn source_file_defaults_to_name() {
        let mut step = StepDefinition::named("S01.py");
        assert_eq!(step.source_file(), "S01.py");
        step.file = Some("steps/load.py".to_string());
        assert_eq!(step.source_file(), "steps/load.py");
    }

    #[test]
    fn dependencies_accept_both_forms() {
        let yaml = r#"
name: p
dependencies:
  - libs
  - path: vendor/geo
    command: make -C vendor/geo
"#;
        let def: ProjectDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.dependencies[0].path(), "libs");
        assert_eq!(def.dependencies[0].command(), None);
        assert_eq!(def.dependencies[1].path(), "vendor/geo");
        assert_eq!(def.dependencies[1].command(), Some("make -C vendor/geo"));
    }

    #[test]
    fn output_mode_parses_lowercase() {
        let yaml = "name: p\nsettings:\n  output: quiet\n";
        let def: ProjectDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.settings.output, OutputMode::Quiet);
    }

    #[test]
    fn display_title_falls_back_to_name() {
        let mut def = ProjectDefinition {
            name: "weather".to_string(),
            ..Default::default()
        };
        assert_eq!(def.display_title(), "weather");
        def.title = Some("Weather Study".to_string());
        assert_eq!(def.display_title(), "Weather Study");
    }
}
