//! Integration tests for Seawatch API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API,
//! with the monitor running offline (synthesized vessels, seeded).

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use seawatch::api::{self, AppState};
use seawatch::config::MonitorConfig;
use seawatch::monitor::SafetyMonitor;
use seawatch::storage::Storage;
use seawatch::synthesis::VesselDensity;

fn offline_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.static_fix = Some((18.95, 72.83));
    config.auto_refresh = false;
    config.synthesis.density = VesselDensity::Low;
    config.synthesis.seed = Some(2024);
    config
}

async fn create_test_server(with_storage: bool) -> (TestServer, SafetyMonitor) {
    let storage = if with_storage {
        Some(Storage::new("sqlite::memory:").await.unwrap())
    } else {
        None
    };

    let monitor = SafetyMonitor::from_config(&offline_config(), storage).await;
    let app = api::router(AppState {
        monitor: monitor.clone(),
    });

    (TestServer::new(app).unwrap(), monitor)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _) = create_test_server(false).await;

    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_snapshot_unavailable_before_first_refresh() {
    let (server, _) = create_test_server(false).await;

    let response = server.get("/safety/snapshot").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_snapshot_after_refresh() {
    let (server, monitor) = create_test_server(false).await;
    monitor.refresh_now().await;

    let response = server.get("/safety/snapshot").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["cycle"], 1);
    assert_eq!(body["data_source"], "simulated");
    assert_eq!(body["position"]["latitude"], 18.95);
    assert_eq!(
        body["vessels_found"].as_u64().unwrap() as usize,
        body["vessels"].as_array().unwrap().len()
    );
    assert!(["SAFE", "WARNING", "CRITICAL"].contains(&body["overall_status"].as_str().unwrap()));
}

#[tokio::test]
async fn test_manual_refresh_is_accepted() {
    let (server, monitor) = create_test_server(false).await;
    let mut rx = monitor.subscribe();

    let response = server.post("/safety/refresh").await;
    response.assert_status(StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("refresh completed")
        .unwrap();

    server.get("/safety/snapshot").await.assert_status_ok();
}

#[tokio::test]
async fn test_toggle_auto_refresh() {
    let (server, monitor) = create_test_server(false).await;

    let response = server
        .put("/safety/auto-refresh")
        .json(&json!({ "enabled": true }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["auto_refresh"], true);
    assert!(monitor.timer_active());

    let response = server
        .put("/safety/auto-refresh")
        .json(&json!({ "enabled": false }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["auto_refresh"], false);
    assert!(!monitor.timer_active());
}

#[tokio::test]
async fn test_history_requires_storage() {
    let (server, _) = create_test_server(false).await;

    server
        .get("/safety/history")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_history_lists_snapshots() {
    let (server, monitor) = create_test_server(true).await;
    for _ in 0..3 {
        monitor.refresh_now().await;
    }

    let response = server.get("/safety/history?limit=2").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["cycle"], 3);
    assert_eq!(records[0]["data_source"], "simulated");
}

#[tokio::test]
async fn test_map_formats() {
    let (server, monitor) = create_test_server(false).await;
    let snapshot = monitor.refresh_now().await;

    let response = server.get("/safety/map").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(
        body["features"].as_array().unwrap().len(),
        snapshot.vessels.len() + 1
    );

    let response = server
        .get("/safety/map?format=markers&zoom=8&width=640&height=480")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_x"], 320.0);
    assert_eq!(body["user_y"], 240.0);
    let shown = body["markers"].as_array().unwrap().len();
    let culled = body["culled"].as_u64().unwrap() as usize;
    assert_eq!(shown + culled, snapshot.vessels.len());
}

#[tokio::test]
async fn test_vessels_nearby_wire_format() {
    let (server, _) = create_test_server(false).await;

    let response = server
        .get("/maritime/vessels-nearby?lat=19.0760&lon=72.8777&radius=10")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let data = &body["data"];
    assert_eq!(data["user_location"]["latitude"], 19.076);
    let vessels = data["vessels"].as_array().unwrap();
    assert_eq!(data["vessels_found"].as_u64().unwrap() as usize, vessels.len());

    let summary = &data["alert_summary"];
    let counted = summary["DANGER"].as_u64().unwrap()
        + summary["WARNING"].as_u64().unwrap()
        + summary["SAFE"].as_u64().unwrap();
    assert_eq!(counted as usize, vessels.len());

    for vessel in vessels {
        assert!(vessel["mmsi"].is_number());
        assert!(vessel["alert_level"]["level"].is_string());
        assert!(vessel["distance_km"].is_number());
    }
}

#[tokio::test]
async fn test_invalid_query_parameters_still_answer() {
    let (server, _) = create_test_server(false).await;

    let response = server
        .get("/maritime/vessels-nearby?lat=999&lon=999&radius=-5")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["user_location"]["latitude"], 19.076);
    assert_eq!(body["data"]["user_location"]["longitude"], 72.8777);

    server
        .get("/maritime/complete-safety-report?lat=999&lon=999")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_danger_analysis_defaults_to_benign() {
    let (server, _) = create_test_server(false).await;

    let response = server
        .get("/maritime/danger-analysis?lat=19.0760&lon=72.8777")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let data = &body["data"];
    assert_eq!(data["environmental_data"]["sea_surface_temp_c"], 27.5);
    assert_eq!(data["risk_analysis"]["overall_risk_level"], "SAFE");
    assert_eq!(data["risk_analysis"]["danger_factors"]["high_winds"], false);
    assert!(!data["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_complete_safety_report_wire_format() {
    let (server, _) = create_test_server(false).await;

    let response = server
        .get("/maritime/complete-safety-report?lat=19.0760&lon=72.8777&radius=10")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let data = &body["data"];
    assert!(data["overall_safety"]["status"].is_string());
    assert!(data["vessel_tracking"]["vessels"].is_array());
    assert!(data["environmental_conditions"]["risk_analysis"]["rogue_wave_probability"].is_number());
    assert_eq!(data["data_source"], "simulated");
}
