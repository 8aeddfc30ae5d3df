//! Shared state for the sync server.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use crate::project::Project;

use super::origin::OriginPolicy;

/// Sync time reported before any file has been synced.
pub const NEVER_SYNCED: f64 = -1.0;

/// Identity of the running server.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub version: &'static str,
    pub pid: u32,
    pub host: String,
    pub port: u16,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl ServerInfo {
    /// Describe a server bound to `host:port`, started now.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            pid: std::process::id(),
            host: host.to_string(),
            port,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Payload returned by `/ping`.
    pub fn to_json(&self) -> Value {
        json!({
            "version": self.version,
            "pid": self.pid,
            "uptime": self.uptime(),
            "host": self.host,
            "port": self.port,
            "id": self.started_at.to_rfc3339(),
        })
    }
}

/// The project being synced and when it was last written to.
#[derive(Debug)]
pub struct SyncContext {
    /// Client-provided timestamp of the last synced chunk.
    pub sync_time: f64,

    /// Open project, if any.
    pub project: Option<Project>,

    /// Temporary container holding a remotely opened project. Dropping it
    /// removes the container from disk.
    pub container: Option<TempDir>,
}

impl Default for SyncContext {
    fn default() -> Self {
        Self {
            sync_time: NEVER_SYNCED,
            project: None,
            container: None,
        }
    }
}

impl SyncContext {
    /// Context with a locally opened project.
    pub fn with_project(project: Project) -> Self {
        Self {
            project: Some(project),
            ..Default::default()
        }
    }

    /// Replace the open project with one living in `container`.
    pub fn open_remote(&mut self, project: Project, container: TempDir) {
        self.sync_time = NEVER_SYNCED;
        self.project = Some(project);
        self.container = Some(container);
    }
}

/// State accessible from all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub sync: Arc<Mutex<SyncContext>>,
    pub info: Arc<ServerInfo>,
    pub origins: Arc<OriginPolicy>,
}

impl AppState {
    /// State accepting browser requests from loopback origins only.
    pub fn new(context: SyncContext, info: ServerInfo) -> Self {
        Self {
            sync: Arc::new(Mutex::new(context)),
            info: Arc::new(info),
            origins: Arc::new(OriginPolicy::default()),
        }
    }

    /// Also accept browser requests from `origins`.
    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.origins = Arc::new(OriginPolicy::new(origins));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_has_never_synced() {
        let context = SyncContext::default();
        assert_eq!(context.sync_time, NEVER_SYNCED);
        assert!(context.project.is_none());
    }

    #[test]
    fn server_info_json_has_identity_fields() {
        let info = ServerInfo::new("127.0.0.1", 5010);
        let value = info.to_json();

        assert_eq!(value["port"], 5010);
        assert_eq!(value["host"], "127.0.0.1");
        assert_eq!(value["pid"], std::process::id());
        assert!(value["uptime"].as_f64().unwrap() >= 0.0);
        assert!(value["id"].is_string());
    }
}
