//! REST API handlers for the hub server
//!
//! Every derived view here is a full-log rescan; there is no historical
//! query surface beyond that.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::aggregate::leader::LeaderBoard;
use crate::aggregate::AggregateTable;
use crate::devices::CatDevice;
use crate::metrics;
use crate::models::ScanReport;
use crate::publish::PublisherStatus;

use super::server::AppState;
use super::ws;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Aggregate table with its scan diagnostics
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub table: AggregateTable,
    pub report: ScanReport,
}

/// One known device
#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub id: String,
    pub port: u16,
}

/// Hub status: log size plus publisher state
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub log_bytes: u64,
    pub report: ScanReport,
    pub publisher: PublisherStatus,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router, including the WebSocket feeds
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // REST endpoints
        .route("/api/health", get(health_check))
        .route("/api/leader", get(get_leader))
        .route("/api/aggregate", get(get_aggregate))
        .route("/api/devices", get(list_devices))
        .route("/api/stats", get(get_stats))
        .route("/api/metrics", get(get_metrics))
        // Push feeds
        .route("/ws/buzz", get(ws::buzz_handler))
        .route("/ws/data", get(ws::data_handler))
        .route("/ws/chart", get(ws::chart_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    }))
}

/// Current leader with per-device scores
async fn get_leader(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.snapshot().await {
        Ok(text) => {
            let (table, _) = state.aggregator.scan(&text);
            (
                StatusCode::OK,
                Json(ApiResponse::success(LeaderBoard::from_table(&table))),
            )
        }
        Err(err) => {
            tracing::warn!(error = %err, "leader endpoint failed to read log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<LeaderBoard>::error("Failed to load data.")),
            )
        }
    }
}

/// Full per-device per-state duration breakdown
async fn get_aggregate(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.snapshot().await {
        Ok(text) => {
            let (table, report) = state.aggregator.scan(&text);
            (
                StatusCode::OK,
                Json(ApiResponse::success(AggregateResponse { table, report })),
            )
        }
        Err(err) => {
            tracing::warn!(error = %err, "aggregate endpoint failed to read log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<AggregateResponse>::error("Failed to load data.")),
            )
        }
    }
}

/// The fixed device registry
async fn list_devices() -> impl IntoResponse {
    let devices: Vec<DeviceResponse> = CatDevice::all()
        .into_iter()
        .map(|d| DeviceResponse {
            id: d.id().to_string(),
            port: d.port(),
        })
        .collect();

    Json(ApiResponse::success(devices))
}

/// Log size, scan diagnostics, and publisher status
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let log_bytes = state.log.len_bytes().await;
    let publisher = state.publisher.status().await;

    // Missing file counts as an empty log here, not an error
    let report = match state.log.snapshot().await {
        Ok(text) => state.aggregator.scan(&text).1,
        Err(_) => ScanReport::default(),
    };

    Json(ApiResponse::success(StatsResponse {
        log_bytes,
        report,
        publisher,
    }))
}

/// Prometheus metrics in text exposition format
async fn get_metrics() -> impl IntoResponse {
    match metrics::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        ),
        Err(err) => {
            tracing::warn!(error = %err, "metrics encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                String::new(),
            )
        }
    }
}
