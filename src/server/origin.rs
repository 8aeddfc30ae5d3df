//! Browser origin policy.
//!
//! The sync API runs project commands, so only pages served from loopback
//! or from an explicitly configured origin may call it. Requests without an
//! `Origin` header (editors, curl) are not browser requests and pass.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use super::response::SyncResponse;
use super::state::AppState;

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// Origins allowed to call the server from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Loopback origins plus `allowed`.
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|o| o.trim_end_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether a browser page at `origin` may call the server.
    pub fn allows(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/').to_ascii_lowercase();
        is_loopback(&origin) || self.allowed.iter().any(|o| *o == origin)
    }

    fn allows_header(&self, origin: &HeaderValue) -> bool {
        origin.to_str().is_ok_and(|o| self.allows(o))
    }
}

fn is_loopback(origin: &str) -> bool {
    let Some((scheme, authority)) = origin.split_once("://") else {
        return false;
    };
    if scheme != "http" && scheme != "https" {
        return false;
    }

    let host = if authority.starts_with('[') {
        match authority.find(']') {
            Some(end) => &authority[..=end],
            None => return false,
        }
    } else {
        authority.split(':').next().unwrap_or_default()
    };

    LOOPBACK_HOSTS.contains(&host)
}

/// CORS layer answering preflights for allowed origins only.
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            policy.allows_header(origin)
        }))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Refuse requests coming from a page on a disallowed origin.
pub async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !state.origins.allows_header(origin) {
            warn!(origin = ?origin, path = %request.uri().path(), "refused cross-origin request");
            return (
                StatusCode::FORBIDDEN,
                SyncResponse::new().fail_with("FORBIDDEN_ORIGIN", "Origin is not allowed"),
            )
                .into_response();
        }
    }
    next.run(request).await
}
