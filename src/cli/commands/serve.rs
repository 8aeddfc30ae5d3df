//! Serve command implementation.
//!
//! The `kettle serve` command starts the local sync server. A project found
//! at or above the working directory is opened up front; otherwise the
//! server waits for a remote editor to open one.

use std::path::{Path, PathBuf};

use crate::cli::args::ServeArgs;
use crate::config::{find_project_root, ServerSettings};
use crate::error::Result;
use crate::project::Project;
use crate::server::{self, SyncContext};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The serve command implementation.
pub struct ServeCommand {
    project_root: PathBuf,
    args: ServeArgs,
}

impl ServeCommand {
    /// Create a new serve command.
    pub fn new(project_root: &Path, args: ServeArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Server settings from the project, with bind flags taking precedence.
    fn settings(&self, project: Option<&Project>) -> ServerSettings {
        let mut settings = project
            .map(|p| p.definition.settings.server.clone())
            .unwrap_or_default();
        if let Some(host) = &self.args.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.args.port {
            settings.port = port;
        }
        settings
    }
}

impl Command for ServeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let project = match find_project_root(&self.project_root) {
            Some(root) => Some(Project::open(&root)?),
            None => None,
        };
        let ServerSettings {
            host,
            port,
            allowed_origins,
        } = self.settings(project.as_ref());

        ui.show_header("SYNC SERVER");
        match &project {
            Some(p) => ui.message(&format!(
                "Project: {} ({})",
                p.name(),
                p.source_directory.display()
            )),
            None => ui.message("No project open, waiting for a remote editor"),
        }
        ui.success(&format!("Listening on http://{}:{}", host, port));

        let context = project.map(SyncContext::with_project).unwrap_or_default();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(server::serve(&host, port, allowed_origins, context))?;

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn settings_default_to_loopback() {
        let temp = TempDir::new().unwrap();
        let cmd = ServeCommand::new(temp.path(), ServeArgs::default());

        let settings = cmd.settings(None);
        assert_eq!((settings.host.as_str(), settings.port), ("127.0.0.1", 5010));
        assert!(settings.allowed_origins.is_empty());
    }

    #[test]
    fn settings_prefer_flags_over_project() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kettle.yml"),
            "name: weather\nsteps: []\nsettings:\n  server:\n    host: 0.0.0.0\n    port: 6000\n    allowed_origins:\n      - https://editor.example.com\n",
        )
        .unwrap();
        let project = Project::open(temp.path()).unwrap();

        let from_settings =
            ServeCommand::new(temp.path(), ServeArgs::default()).settings(Some(&project));
        assert_eq!((from_settings.host.as_str(), from_settings.port), ("0.0.0.0", 6000));
        assert_eq!(from_settings.allowed_origins, vec!["https://editor.example.com"]);

        let from_flags = ServeCommand::new(
            temp.path(),
            ServeArgs {
                host: None,
                port: Some(7000),
            },
        )
        .settings(Some(&project));
        assert_eq!((from_flags.host.as_str(), from_flags.port), ("0.0.0.0", 7000));
    }
}
