//! HTTP API handlers for Seawatch.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /safety/snapshot` - The current safety snapshot
//! - `POST /safety/refresh` - Request a refresh
//! - `PUT /safety/auto-refresh` - Enable or disable periodic refresh
//! - `GET /safety/history` - Recent snapshot log entries
//! - `GET /safety/map` - The current snapshot rendered for a map
//! - `GET /maritime/vessels-nearby` - On-demand vessel evaluation
//! - `GET /maritime/danger-analysis` - On-demand sea-condition assessment
//! - `GET /maritime/complete-safety-report` - On-demand full report
//!
//! The `/maritime/*` endpoints answer in the wire format that
//! [`MaritimeApiClient`](crate::data_sources::MaritimeApiClient) consumes.
//! They never fail on bad coordinates: an unusable position is replaced by
//! the default position and a non-positive radius by the configured one.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::data_sources::maritime_api::{
    DangerAnalysisData, Envelope, NearbyVesselsData, SafetyReportData,
};
use crate::model::{Position, SafetySnapshot};
use crate::monitor::{RefreshState, SafetyMonitor};
use crate::render::{GeoJsonRenderer, MapRenderer, MarkerRenderer, Viewport};
use crate::storage::SnapshotRecord;

/// Upper bound on `GET /safety/history?limit=`.
const MAX_HISTORY_LIMIT: u32 = 500;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: SafetyMonitor,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/safety/snapshot", get(get_snapshot))
        .route("/safety/refresh", post(post_refresh))
        .route("/safety/auto-refresh", put(put_auto_refresh))
        .route("/safety/history", get(get_history))
        .route("/safety/map", get(get_map))
        .route("/maritime/vessels-nearby", get(get_vessels_nearby))
        .route("/maritime/danger-analysis", get(get_danger_analysis))
        .route(
            "/maritime/complete-safety-report",
            get(get_complete_safety_report),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

// ============================================================================
// Snapshot and commands
// ============================================================================

/// Monitor status returned by the command endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub auto_refresh: bool,
    pub state: RefreshState,
}

impl MonitorStatus {
    fn of(monitor: &SafetyMonitor) -> Self {
        Self {
            auto_refresh: monitor.auto_refresh_enabled(),
            state: monitor.state(),
        }
    }
}

/// GET /safety/snapshot - The most recently completed snapshot.
///
/// Returns `503 Service Unavailable` until the first refresh completes.
#[instrument(skip(state))]
pub async fn get_snapshot(
    State(state): State<AppState>,
) -> Result<Json<SafetySnapshot>, StatusCode> {
    let snapshot = state.monitor.current().ok_or_else(|| {
        warn!("Snapshot requested before first refresh completed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(snapshot.as_ref().clone()))
}

/// POST /safety/refresh - Request a manual refresh.
///
/// Returns `202 Accepted`; the new snapshot is published when the cycle
/// completes. A refresh already in flight is not cancelled.
#[instrument(skip(state))]
pub async fn post_refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.monitor.request_manual_refresh();
    info!("Manual refresh requested");
    (StatusCode::ACCEPTED, Json(MonitorStatus::of(&state.monitor)))
}

/// Body of PUT /safety/auto-refresh.
#[derive(Debug, Deserialize)]
pub struct AutoRefreshRequest {
    pub enabled: bool,
}

/// PUT /safety/auto-refresh - Enable or disable periodic refresh.
///
/// # Request Body
///
/// ```json
/// { "enabled": false }
/// ```
#[instrument(skip(state))]
pub async fn put_auto_refresh(
    State(state): State<AppState>,
    Json(request): Json<AutoRefreshRequest>,
) -> Json<MonitorStatus> {
    state.monitor.set_auto_refresh(request.enabled);
    Json(MonitorStatus::of(&state.monitor))
}

/// Query parameters for GET /safety/history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Number of records (default: 20).
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    20
}

/// GET /safety/history - Recent snapshot log entries, newest first.
///
/// Returns `503 Service Unavailable` when no snapshot log is configured.
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SnapshotRecord>>, StatusCode> {
    let storage = state.monitor.storage().ok_or_else(|| {
        warn!("Snapshot log not configured");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);
    match storage.recent_snapshots(limit).await {
        Ok(records) => {
            info!(count = records.len(), "Snapshot history queried");
            Ok(Json(records))
        }
        Err(e) => {
            warn!(error = %e, "Failed to read snapshot history");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Output of GET /safety/map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapFormat {
    #[default]
    GeoJson,
    Markers,
}

/// Query parameters for GET /safety/map.
#[derive(Debug, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub format: MapFormat,

    /// Zoom level (default: 12).
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Viewport width in pixels (default: 800).
    #[serde(default = "default_width")]
    pub width: u32,

    /// Viewport height in pixels (default: 600).
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_zoom() -> u8 {
    12
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

/// GET /safety/map - The current snapshot rendered for a map.
///
/// # Query Parameters
///
/// - `format` (optional): `geojson` (default) or `markers`
/// - `zoom`, `width`, `height` (optional): viewport centred on the user
#[instrument(skip(state))]
pub async fn get_map(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Response, StatusCode> {
    let snapshot = state
        .monitor
        .current()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let viewport = Viewport::new(
        snapshot.position,
        query.zoom.min(22),
        query.width,
        query.height,
    );

    let response = match query.format {
        MapFormat::GeoJson => Json(GeoJsonRenderer.render(&snapshot, &viewport)).into_response(),
        MapFormat::Markers => Json(MarkerRenderer.render(&snapshot, &viewport)).into_response(),
    };

    Ok(response)
}

// ============================================================================
// Maritime query endpoints
// ============================================================================

/// Query parameters for the `/maritime/*` endpoints.
#[derive(Debug, Deserialize)]
pub struct MaritimeQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Search radius in kilometres.
    pub radius: Option<f64>,
}

impl MaritimeQuery {
    /// Requested position, or `fallback` when missing or invalid.
    fn position_or(&self, fallback: Position) -> Position {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Position::validated(lat, lon).unwrap_or_else(|e| {
                warn!(error = %e, "Invalid query position, using default");
                fallback
            }),
            _ => fallback,
        }
    }

    /// Requested radius, or `fallback` when missing or not positive.
    fn radius_or(&self, fallback: f64) -> f64 {
        self.radius
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(fallback)
    }
}

async fn evaluate(state: &AppState, query: &MaritimeQuery) -> SafetySnapshot {
    let monitor = &state.monitor;
    let position = query.position_or(monitor.locator().default_position());
    let radius_km = query.radius_or(monitor.settings().radius_km);
    monitor.pipeline().evaluate(0, position, radius_km).await
}

/// GET /maritime/vessels-nearby - Vessels around a position.
///
/// # Query Parameters
///
/// - `lat`, `lon` (optional): position; defaults to the configured default
/// - `radius` (optional): kilometres; defaults to the configured radius
#[instrument(skip(state))]
pub async fn get_vessels_nearby(
    State(state): State<AppState>,
    Query(query): Query<MaritimeQuery>,
) -> Json<Envelope<NearbyVesselsData>> {
    let snapshot = evaluate(&state, &query).await;
    info!(
        vessels = snapshot.vessels_found,
        data_source = snapshot.data_source.as_str(),
        "Nearby vessels queried"
    );
    Json(Envelope::new(NearbyVesselsData::from_snapshot(&snapshot)))
}

/// GET /maritime/danger-analysis - Sea conditions at a position.
#[instrument(skip(state))]
pub async fn get_danger_analysis(
    State(state): State<AppState>,
    Query(query): Query<MaritimeQuery>,
) -> Json<Envelope<DangerAnalysisData>> {
    let position = query.position_or(state.monitor.locator().default_position());
    let assessment = state.monitor.pipeline().assess_environment(position).await;
    info!(risk = assessment.risk_tier.label(), "Danger analysis queried");
    Json(Envelope::new(DangerAnalysisData::from_assessment(
        &assessment,
        Utc::now(),
    )))
}

/// GET /maritime/complete-safety-report - Vessels and sea conditions.
#[instrument(skip(state))]
pub async fn get_complete_safety_report(
    State(state): State<AppState>,
    Query(query): Query<MaritimeQuery>,
) -> Json<Envelope<SafetyReportData>> {
    let snapshot = evaluate(&state, &query).await;
    info!(
        status = snapshot.overall_status.label(),
        vessels = snapshot.vessels_found,
        "Safety report queried"
    );
    Json(Envelope::new(SafetyReportData::from_snapshot(&snapshot)))
}
