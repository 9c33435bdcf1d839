//! Health check endpoints
//!
//! - /health, /healthz - Liveness probe
//! - /version          - Build version

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::helpers::{json_response, FullBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    /// `mongodb` or `memory`
    pub store: &'static str,
    pub active_sessions: usize,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub service: &'static str,
}

pub fn health_check(state: &AppState) -> Response<FullBody> {
    let stats = state.sessions.stats();
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            store: state.store_kind,
            active_sessions: stats.active_sessions,
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

pub fn version_info() -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            service: "bookworm",
        },
    )
}
