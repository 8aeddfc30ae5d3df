//! HTTP route handlers for the sync API.
//!
//! Handlers read their arguments leniently from a JSON body: a missing or
//! malformed body counts as no arguments, and each handler reports what it
//! needed with an `INVALID_ARGS` failure. A body sent with any other
//! content type is refused.

use axum::body::Bytes;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::ProjectDefinition;
use crate::runner::{self, RunRequest, ShellEngine};
use crate::ui::{NonInteractiveUI, OutputMode};

use super::response::SyncResponse;
use super::state::AppState;
use super::sync;

/// Library folder assumed when an opened definition lists none.
const DEFAULT_LIBRARY: &str = "libs";

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping).post(ping))
        .route("/sync-status", get(sync_status).post(sync_status))
        .route("/sync-open", post(sync_open))
        .route("/sync-file", post(sync_file))
        .route("/download/{filename}", get(download).post(download))
        .route("/run", post(run))
}

/// Handler arguments read from a JSON body.
///
/// An empty or malformed body yields the defaults. A non-empty body that is
/// not `application/json` is rejected with 415.
#[derive(Debug, Default)]
pub struct JsonArgs<T>(pub T);

impl<S, T> FromRequest<S> for JsonArgs<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(request.headers());
        let body = Bytes::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if body.is_empty() {
            return Ok(Self(T::default()));
        }
        if !json {
            return Err((
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                SyncResponse::new().fail_with(
                    "UNSUPPORTED_MEDIA_TYPE",
                    "Request body must be application/json",
                ),
            )
                .into_response());
        }
        Ok(Self(serde_json::from_slice(&body).unwrap_or_default()))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Give a definition without a library list the default `libs` folder.
fn with_default_library(mut definition: Value) -> Value {
    if let Some(fields) = definition.as_object_mut() {
        fields
            .entry("dependencies")
            .or_insert_with(|| json!([DEFAULT_LIBRARY]));
    }
    definition
}

/// Arguments of `/sync-open`.
#[derive(Debug, Default, Deserialize)]
pub struct OpenArgs {
    definition: Option<Value>,
    source_directory: Option<String>,
}

/// Arguments of `/sync-file`.
#[derive(Debug, Default, Deserialize)]
pub struct FileArgs {
    relative_path: Option<String>,
    chunk: Option<String>,
    #[serde(rename = "type")]
    file_type: Option<String>,
    index: Option<i64>,
    sync_time: Option<f64>,
}

/// Arguments of `/run`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunArgs {
    steps: Vec<String>,
    force: bool,
    #[serde(rename = "continue")]
    continue_after: bool,
    single_step: bool,
    limit: i64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            force: false,
            continue_after: false,
            single_step: false,
            limit: -1,
        }
    }
}

impl From<RunArgs> for RunRequest {
    fn from(args: RunArgs) -> Self {
        RunRequest {
            steps: args.steps,
            force: args.force,
            continue_after: args.continue_after,
            single_step: args.single_step,
            limit: args.limit,
        }
    }
}

/// GET /ping - server identity and uptime.
pub async fn ping(State(state): State<AppState>) -> SyncResponse {
    SyncResponse::new().update("server", state.info.to_json())
}

/// GET|POST /sync-status - sync time and per-file status of the open project.
pub async fn sync_status(State(state): State<AppState>) -> SyncResponse {
    let context = state.sync.lock().await;
    let Some(project) = &context.project else {
        return SyncResponse::new().fail_with(
            "NO_PROJECT",
            "No open project on which to retrieve status",
        );
    };

    let status = sync::project_status(project);
    SyncResponse::new()
        .update("sync_time", context.sync_time)
        .update(
            "source_directory",
            project.source_directory.to_string_lossy().to_string(),
        )
        .update(
            "remote_source_directory",
            project.remote_source_directory.clone(),
        )
        .update(
            "status",
            serde_json::to_value(status).unwrap_or(Value::Null),
        )
}

/// POST /sync-open - open a remote project in a fresh container.
pub async fn sync_open(
    State(state): State<AppState>,
    JsonArgs(args): JsonArgs<OpenArgs>,
) -> SyncResponse {
    let (Some(definition), Some(source_directory)) = (args.definition, args.source_directory)
    else {
        return SyncResponse::new()
            .fail_with("INVALID_ARGS", "Invalid arguments. Unable to open project");
    };

    let definition = with_default_library(definition);
    let definition: ProjectDefinition = match serde_json::from_value(definition) {
        Ok(d) => d,
        Err(e) => {
            return SyncResponse::new().fail_with(
                "INVALID_DEFINITION",
                &format!("Invalid project definition: {}", e),
            )
        }
    };

    let mut context = state.sync.lock().await;
    match sync::open_remote_project(definition, &source_directory) {
        Ok((project, container)) => {
            let directory = project.source_directory.to_string_lossy().to_string();
            context.open_remote(project, container);
            SyncResponse::new()
                .update("source_directory", directory)
                .notify("SUCCESS", "PROJECT_OPENED", "Project opened")
        }
        Err(e) => {
            warn!(error = %e, "failed to open remote project");
            SyncResponse::new().fail_from(&e)
        }
    }
}

/// POST /sync-file - write one base64 chunk of a project file.
pub async fn sync_file(
    State(state): State<AppState>,
    JsonArgs(args): JsonArgs<FileArgs>,
) -> SyncResponse {
    let (Some(relative_path), Some(chunk)) = (args.relative_path, args.chunk) else {
        return SyncResponse::new().fail_with("INVALID_ARGS", "Missing or invalid arguments");
    };

    let mut context = state.sync.lock().await;
    let Some(project) = &context.project else {
        return SyncResponse::new()
            .fail_with("NO_OPEN_PROJECT", "No project is open. Unable to sync");
    };

    let Some(relative) = sync::normalize_relative_path(&relative_path) else {
        return SyncResponse::new()
            .fail_with("INVALID_ARGS", "Relative path must stay inside the project");
    };
    let path = project.source_directory.join(relative);

    let written = sync::decode_chunk(&chunk)
        .and_then(|data| sync::write_chunk(&path, &data, args.index.unwrap_or(0) > 0));
    if let Err(e) = written {
        return SyncResponse::new().fail_from(&e);
    }

    context.sync_time = args.sync_time.unwrap_or(0.0);
    info!(
        path = %relative_path,
        index = args.index.unwrap_or(0),
        file_type = args.file_type.as_deref().unwrap_or("unknown"),
        "synced chunk"
    );

    SyncResponse::new().notify("SUCCESS", "SAVED_CHUNK", "Saved file chunk")
}

/// GET|POST /download/{filename} - serve a file from the container's
/// `downloads/` folder. Replies 204 when there is nothing to serve.
pub async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let path = {
        let context = state.sync.lock().await;
        context
            .project
            .as_ref()
            .and_then(|p| sync::download_path(&p.source_directory, &filename))
    };
    let Some(path) = path else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, sync::content_type(&path))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "download failed");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// POST /run - run steps of the open project.
pub async fn run(
    State(state): State<AppState>,
    JsonArgs(args): JsonArgs<RunArgs>,
) -> SyncResponse {
    let request = RunRequest::from(args);
    let sync = state.sync.clone();

    let joined = tokio::task::spawn_blocking(move || {
        let mut context = sync.blocking_lock();
        let Some(project) = context.project.as_mut() else {
            return SyncResponse::new()
                .fail_with("NO_OPEN_PROJECT", "No project is open. Unable to run");
        };

        let mut engine = ShellEngine::new();
        let mut ui = NonInteractiveUI::new(OutputMode::Normal);
        match runner::run(project, &mut engine, &request, &mut ui) {
            Ok(outcome) => {
                let failed: Vec<String> =
                    project.failed_steps().into_iter().map(String::from).collect();
                let response = SyncResponse::new()
                    .update("mode", outcome.mode.as_str())
                    .update("steps_run", outcome.steps_run)
                    .update("failed_steps", failed.clone());
                if failed.is_empty() {
                    response.notify("SUCCESS", "RUN_COMPLETE", "Run complete")
                } else {
                    response.fail_with(
                        "STEP_FAILED",
                        &format!("Step(s) failed: {}", failed.join(", ")),
                    )
                }
            }
            Err(e) => SyncResponse::new().fail_from(&e),
        }
    })
    .await;

    joined.unwrap_or_else(|e| {
        warn!(error = %e, "run task panicked");
        SyncResponse::new().fail_with("INTERNAL_ERROR", "Run did not complete")
    })
}
