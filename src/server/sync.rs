//! Filesystem side of remote synchronisation.
//!
//! A remote editor opens a project by sending its definition, then streams
//! each source file as base64 chunks. Remote projects live in a temporary
//! container laid out as:
//!
//! ```text
//! kettle-remote-project-XXXX/
//!   shared_libs/   library folders shared by every remote project
//!   downloads/     files clients may fetch through /download
//!   project/       kettle.yml and the synced sources
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use base64::Engine;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::{write_definition, DependencyDefinition, ProjectDefinition};
use crate::error::{KettleError, Result};
use crate::project::Project;

/// Library folder every remote project gets, relative to `project/`.
pub const SHARED_LIBS: &str = "../shared_libs";

/// Sync status of one project file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStatus {
    /// Path relative to the project directory.
    pub path: String,

    /// `step` or `dependency`.
    pub kind: &'static str,

    /// Whether the file exists.
    pub exists: bool,

    /// Last modification time, unix seconds.
    pub modified: Option<f64>,
}

/// Normalise a client-supplied relative path.
///
/// Backslashes become slashes and outer slashes are trimmed. Paths that
/// would escape the project directory are rejected.
pub fn normalize_relative_path(raw: &str) -> Option<PathBuf> {
    let cleaned = raw.replace('\\', "/");
    let trimmed = cleaned.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut path = PathBuf::new();
    for part in trimmed.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            part => path.push(part),
        }
    }

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Decode a base64 chunk.
pub fn decode_chunk(chunk: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(chunk.trim())
        .map_err(|e| KettleError::Sync {
            message: format!("Invalid chunk encoding: {}", e),
        })
}

/// Write a decoded chunk to `path`, appending or truncating.
pub fn write_chunk(path: &Path, data: &[u8], append: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(data)?;

    debug!(path = %path.display(), bytes = data.len(), append, "wrote chunk");
    Ok(())
}

/// Status of every step file and dependency in the project.
pub fn project_status(project: &Project) -> Vec<FileStatus> {
    let root = &project.source_directory;
    let steps = project
        .steps
        .iter()
        .map(|s| file_status(root, s.source_file(), "step"));
    let dependencies = project
        .dependencies
        .iter()
        .map(|d| file_status(root, &d.path, "dependency"));
    steps.chain(dependencies).collect()
}

fn file_status(root: &Path, relative: &str, kind: &'static str) -> FileStatus {
    let metadata = fs::metadata(root.join(relative)).ok();
    let modified = metadata
        .as_ref()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64());

    FileStatus {
        path: relative.to_string(),
        kind,
        exists: metadata.is_some(),
        modified,
    }
}

/// Drop shared and empty library paths, then add the container's shared
/// library folder.
pub fn rebase_dependencies(definition: &mut ProjectDefinition) {
    definition
        .dependencies
        .retain(|d| !d.path().is_empty() && !d.path().starts_with(".."));
    definition
        .dependencies
        .push(DependencyDefinition::Path(SHARED_LIBS.to_string()));
}

/// Create a container for a remote project and open it there.
pub fn open_remote_project(
    mut definition: ProjectDefinition,
    remote_source_directory: &str,
) -> Result<(Project, TempDir)> {
    rebase_dependencies(&mut definition);

    let container = tempfile::Builder::new()
        .prefix("kettle-remote-project-")
        .tempdir()?;
    fs::create_dir_all(container.path().join("shared_libs"))?;
    fs::create_dir_all(container.path().join("downloads"))?;
    let project_dir = container.path().join("project");
    fs::create_dir_all(&project_dir)?;

    write_definition(&project_dir, &definition)?;
    let mut project = Project::open(&project_dir)?;
    project.remote_source_directory = Some(remote_source_directory.to_string());

    info!(
        project = %project.name(),
        container = %container.path().display(),
        remote = remote_source_directory,
        "opened remote project"
    );
    Ok((project, container))
}

/// Location of a downloadable file, if it exists.
pub fn download_path(source_directory: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename).file_name()?;
    let path = source_directory.join("..").join("downloads").join(name);
    path.is_file().then_some(path)
}

/// Guess a content type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt" | "log" | "md") => "text/plain",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("yml" | "yaml") => "application/yaml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StepDefinition;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type(Path::new("plot.PNG")), "image/png");
        assert_eq!(content_type(Path::new("data.csv")), "text/csv");
        assert_eq!(content_type(Path::new("archive")), "application/octet-stream");
    }

    #[test]
    fn normalize_converts_backslashes_and_trims() {
        assert_eq!(
            normalize_relative_path("\\src\\S01.sh\\"),
            Some(PathBuf::from("src").join("S01.sh"))
        );
        assert_eq!(
            normalize_relative_path("/libs/util.sh"),
            Some(PathBuf::from("libs").join("util.sh"))
        );
    }

    #[test]
    fn normalize_rejects_parent_segments_and_empty() {
        assert_eq!(normalize_relative_path("../etc/passwd"), None);
        assert_eq!(normalize_relative_path("a/../../b"), None);
        assert_eq!(normalize_relative_path("//"), None);
        assert_eq!(normalize_relative_path(""), None);
    }

    #[test]
    fn decode_chunk_rejects_garbage() {
        assert_eq!(decode_chunk("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_chunk("not base64!").is_err());
    }

    #[test]
    fn write_chunk_truncates_then_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("file.txt");

        write_chunk(&path, b"old content", false).unwrap();
        write_chunk(&path, b"hello ", false).unwrap();
        write_chunk(&path, b"world", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn rebase_dependencies_drops_shared_paths() {
        let mut definition = ProjectDefinition {
            name: "weather".to_string(),
            dependencies: vec![
                DependencyDefinition::Path("libs".to_string()),
                DependencyDefinition::Path("../common".to_string()),
                DependencyDefinition::Path(String::new()),
            ],
            ..Default::default()
        };

        rebase_dependencies(&mut definition);

        let paths: Vec<&str> = definition.dependencies.iter().map(|d| d.path()).collect();
        assert_eq!(paths, vec!["libs", SHARED_LIBS]);
    }

    #[test]
    fn open_remote_project_builds_container() {
        let definition = ProjectDefinition {
            name: "weather".to_string(),
            steps: vec![StepDefinition::named("S01.sh")],
            ..Default::default()
        };

        let (project, container) = open_remote_project(definition, "/home/me/weather").unwrap();

        assert!(container.path().join("shared_libs").is_dir());
        assert!(container.path().join("downloads").is_dir());
        assert!(container.path().join("project").join("kettle.yml").is_file());
        assert_eq!(project.source_directory, container.path().join("project"));
        assert_eq!(
            project.remote_source_directory.as_deref(),
            Some("/home/me/weather")
        );
        assert_eq!(project.dependencies.last().unwrap().path, SHARED_LIBS);
    }

    #[test]
    fn project_status_reports_existence() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("S01.sh"), "true").unwrap();
        let definition = ProjectDefinition {
            name: "weather".to_string(),
            steps: vec![StepDefinition::named("S01.sh"), StepDefinition::named("S02.sh")],
            dependencies: vec![DependencyDefinition::Path("libs".to_string())],
            ..Default::default()
        };
        let project = Project::from_definition(temp.path(), definition).unwrap();

        let status = project_status(&project);

        assert_eq!(status.len(), 3);
        assert!(status[0].exists && status[0].modified.is_some());
        assert!(!status[1].exists && status[1].modified.is_none());
        assert_eq!(status[2].kind, "dependency");
    }

    #[test]
    fn download_path_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("project");
        fs::create_dir_all(&project_dir).unwrap();
        fs::create_dir_all(temp.path().join("downloads")).unwrap();
        fs::write(temp.path().join("downloads").join("plot.png"), "png").unwrap();

        assert!(download_path(&project_dir, "plot.png").is_some());
        assert!(download_path(&project_dir, "missing.png").is_none());
        assert!(download_path(&project_dir, "../downloads/plot.png").is_some());
    }
}
