//! Remote maritime backend client.
//!
//! The backend answers three queries, each wrapped in a `{ "data": … }`
//! envelope:
//!
//! - `GET /maritime/vessels-nearby?lat=&lon=&radius=` - AIS traffic near a point
//! - `GET /maritime/complete-safety-report?lat=&lon=&radius=` - vessels and
//!   sea conditions in one call
//! - `GET /maritime/danger-analysis?lat=&lon=` - sea conditions only
//!
//! The same wire types are used by this crate's own HTTP API, so one
//! Seawatch instance can serve as the maritime backend of another.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{MaritimeFeed, RemoteSafetyReport};
use crate::environment::{self, EnvironmentalAssessor};
use crate::error::SafetyError;
use crate::model::{
    AlertSummary, CollisionAlert, DangerFactors, EnvironmentalAssessment, EnvironmentalReading,
    OverallStatus, Position, SafetySnapshot, VesselClass, VesselContact, VesselReport,
};

/// Client for a remote maritime backend.
#[derive(Clone)]
pub struct MaritimeApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl MaritimeApiClient {
    /// Create a client for the backend at `base_url` (no trailing slash).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch vessels within `radius_km` of a point.
    pub async fn get_nearby_vessels(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<NearbyVesselsData, SafetyError> {
        let url = format!(
            "{}/maritime/vessels-nearby?lat={}&lon={}&radius={}",
            self.base_url, latitude, longitude, radius_km
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let envelope = response.json::<Envelope<NearbyVesselsData>>().await?;
        Ok(envelope.data)
    }

    /// Fetch the consolidated safety report for a point.
    pub async fn get_complete_safety_report(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<SafetyReportData, SafetyError> {
        let url = format!(
            "{}/maritime/complete-safety-report?lat={}&lon={}&radius={}",
            self.base_url, latitude, longitude, radius_km
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let envelope = response.json::<Envelope<SafetyReportData>>().await?;
        Ok(envelope.data)
    }

    /// Fetch sea conditions for a point.
    pub async fn get_danger_analysis(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<DangerAnalysisData, SafetyError> {
        let url = format!(
            "{}/maritime/danger-analysis?lat={}&lon={}",
            self.base_url, latitude, longitude
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let envelope = response.json::<Envelope<DangerAnalysisData>>().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl MaritimeFeed for MaritimeApiClient {
    async fn nearby_vessels(
        &self,
        center: Position,
        radius_km: f64,
    ) -> Result<Vec<VesselReport>, SafetyError> {
        let data = self
            .get_nearby_vessels(center.latitude, center.longitude, radius_km)
            .await?;
        Ok(convert_vessels(&data.vessels))
    }

    async fn safety_report(
        &self,
        center: Position,
        radius_km: f64,
    ) -> Result<RemoteSafetyReport, SafetyError> {
        let data = self
            .get_complete_safety_report(center.latitude, center.longitude, radius_km)
            .await?;

        Ok(RemoteSafetyReport {
            vessels: convert_vessels(&data.vessel_tracking.vessels),
            environmental: data.environmental_conditions.as_ref().map(|e| e.reading()),
            overall_status: parse_overall_status(&data.overall_safety.status),
        })
    }

    async fn environmental(&self, center: Position) -> Result<EnvironmentalReading, SafetyError> {
        let data = self
            .get_danger_analysis(center.latitude, center.longitude)
            .await?;
        Ok(data.reading())
    }
}

fn convert_vessels(vessels: &[WireVessel]) -> Vec<VesselReport> {
    vessels
        .iter()
        .filter_map(|vessel| match vessel.to_report() {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Dropping remote vessel record");
                None
            }
        })
        .collect()
}

fn parse_overall_status(status: &str) -> Option<OverallStatus> {
    match status {
        "SAFE" => Some(OverallStatus::Safe),
        "WARNING" => Some(OverallStatus::Warning),
        "CRITICAL" => Some(OverallStatus::Critical),
        _ => None,
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// `{ "data": … }` response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Vessel identity as sent by AIS providers: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireMmsi {
    Number(u64),
    Text(String),
}

impl Default for WireMmsi {
    fn default() -> Self {
        WireMmsi::Text(String::new())
    }
}

impl WireMmsi {
    /// Numeric identity, taking the trailing digits of text ids like "MOCK1004".
    pub fn numeric(&self) -> Option<u64> {
        match self {
            WireMmsi::Number(n) => Some(*n),
            WireMmsi::Text(text) => {
                let text = text.trim();
                let digits_start = text
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| c.is_ascii_digit())
                    .last()
                    .map(|(i, _)| i)?;
                text[digits_start..].parse().ok()
            }
        }
    }
}

/// Position echoed back by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Alert level attached to a vessel by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAlertLevel {
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub action: String,
}

/// A vessel record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVessel {
    #[serde(default)]
    pub mmsi: WireMmsi,

    #[serde(default, alias = "name")]
    pub ship_name: String,

    #[serde(default, alias = "type")]
    pub ship_type: String,

    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,

    #[serde(default, alias = "lon")]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub distance_km: Option<f64>,

    /// Speed over ground in knots.
    #[serde(default)]
    pub speed: Option<f64>,

    /// Course over ground in degrees.
    #[serde(default, alias = "heading")]
    pub course: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_level: Option<WireAlertLevel>,
}

impl WireVessel {
    /// Convert into a report. The backend's own alert level is ignored.
    pub fn to_report(&self) -> Result<VesselReport, SafetyError> {
        let mmsi = self.mmsi.numeric().ok_or_else(|| {
            SafetyError::MalformedVesselData(format!("unusable vessel id {:?}", self.mmsi))
        })?;

        let (latitude, longitude) = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(SafetyError::MalformedVesselData(format!(
                    "vessel {} has no position",
                    mmsi
                )));
            }
        };

        let position = Position::validated(latitude, longitude).map_err(|_| {
            SafetyError::MalformedVesselData(format!(
                "vessel {} at ({}, {}) is out of range",
                mmsi, latitude, longitude
            ))
        })?;

        let speed_knots = self.speed.unwrap_or(0.0);
        if !speed_knots.is_finite() || speed_knots < 0.0 {
            return Err(SafetyError::MalformedVesselData(format!(
                "vessel {} has speed {}",
                mmsi, speed_knots
            )));
        }

        let heading_deg = self
            .course
            .filter(|c| c.is_finite())
            .map(|c| c.rem_euclid(360.0))
            .unwrap_or(0.0);

        let name = if self.ship_name.trim().is_empty() {
            "Unknown Vessel".to_string()
        } else {
            self.ship_name.clone()
        };

        Ok(VesselReport {
            mmsi,
            name,
            class: VesselClass::from_type_name(&self.ship_type),
            position,
            heading_deg,
            speed_knots,
        })
    }

    /// Encode a classified contact.
    pub fn from_contact(contact: &VesselContact) -> Self {
        let (message, action) = CollisionAlert::describe(contact.risk_tier);
        Self {
            mmsi: WireMmsi::Number(contact.mmsi),
            ship_name: contact.name.clone(),
            ship_type: contact.class.label().to_string(),
            latitude: Some(contact.position.latitude),
            longitude: Some(contact.position.longitude),
            distance_km: Some(round_to(contact.distance_km, 2)),
            speed: Some(round_to(contact.speed_knots, 1)),
            course: Some(round_to(contact.heading_deg, 0)),
            alert_level: Some(WireAlertLevel {
                level: contact.risk_tier.label().to_string(),
                message: message.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Per-tier vessel counts, keyed the way the backend keys them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WireAlertSummary {
    #[serde(default, rename = "DANGER")]
    pub danger: usize,
    #[serde(default, rename = "WARNING")]
    pub warning: usize,
    #[serde(default, rename = "SAFE")]
    pub safe: usize,
}

impl From<AlertSummary> for WireAlertSummary {
    fn from(summary: AlertSummary) -> Self {
        Self {
            danger: summary.danger,
            warning: summary.warning,
            safe: summary.safe,
        }
    }
}

/// Response body of `vessels-nearby`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyVesselsData {
    #[serde(default)]
    pub user_location: Option<WireLocation>,

    #[serde(default, alias = "totalCount")]
    pub vessels_found: usize,

    #[serde(default, alias = "closestDistanceKm")]
    pub closest_vessel_km: Option<f64>,

    #[serde(default)]
    pub vessels: Vec<WireVessel>,

    #[serde(default)]
    pub alert_summary: WireAlertSummary,

    /// Provenance tag of the serving instance, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl NearbyVesselsData {
    pub fn from_snapshot(snapshot: &SafetySnapshot) -> Self {
        Self {
            user_location: Some(WireLocation {
                latitude: snapshot.position.latitude,
                longitude: snapshot.position.longitude,
            }),
            vessels_found: snapshot.vessels_found,
            closest_vessel_km: (!snapshot.vessels.is_empty())
                .then(|| round_to(snapshot.closest_vessel_distance_km, 2)),
            vessels: snapshot.vessels.iter().map(WireVessel::from_contact).collect(),
            alert_summary: snapshot.alert_summary.into(),
            data_source: Some(snapshot.data_source.as_str().to_string()),
        }
    }
}

/// Raw sea-condition values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireEnvironmentalData {
    pub wind_speed_knots: f64,
    pub ocean_current_knots: f64,
    pub sea_surface_temp_c: f64,
    #[serde(default, alias = "chlorophyll_concentration")]
    pub chlorophyll_mg_m3: f64,
}

/// Risk verdict on sea conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRiskAnalysis {
    pub overall_risk_level: String,

    #[serde(default)]
    pub risk_message: String,

    #[serde(default)]
    pub rogue_wave_probability: Option<f64>,

    #[serde(default)]
    pub danger_factors: Option<DangerFactors>,
}

/// Response body of `danger-analysis`; also nested in the safety report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DangerAnalysisData {
    pub environmental_data: WireEnvironmentalData,
    pub risk_analysis: WireRiskAnalysis,

    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DangerAnalysisData {
    /// Reading described by this analysis.
    ///
    /// A missing rogue-wave probability is derived from the reported danger
    /// factors, or from factors computed with default thresholds.
    pub fn reading(&self) -> EnvironmentalReading {
        let env = &self.environmental_data;
        let mut reading = EnvironmentalReading {
            sea_surface_temp_c: env.sea_surface_temp_c,
            wind_speed_knots: env.wind_speed_knots,
            ocean_current_knots: env.ocean_current_knots,
            chlorophyll_mg_m3: env.chlorophyll_mg_m3,
            rogue_wave_probability: 0.0,
        };

        reading.rogue_wave_probability = match self.risk_analysis.rogue_wave_probability {
            Some(probability) => probability,
            None => {
                let factors = self
                    .risk_analysis
                    .danger_factors
                    .unwrap_or_else(|| EnvironmentalAssessor::default().danger_factors(&reading));
                environment::rogue_wave_probability(&factors)
            }
        };

        reading.sanitized()
    }

    /// Encode an assessment.
    pub fn from_assessment(assessment: &EnvironmentalAssessment, timestamp: DateTime<Utc>) -> Self {
        let reading = &assessment.reading;
        Self {
            environmental_data: WireEnvironmentalData {
                wind_speed_knots: round_to(reading.wind_speed_knots, 2),
                ocean_current_knots: round_to(reading.ocean_current_knots, 2),
                sea_surface_temp_c: round_to(reading.sea_surface_temp_c, 2),
                chlorophyll_mg_m3: round_to(reading.chlorophyll_mg_m3, 3),
            },
            risk_analysis: WireRiskAnalysis {
                overall_risk_level: assessment.risk_tier.label().to_string(),
                risk_message: assessment.message.clone(),
                rogue_wave_probability: Some(round_to(reading.rogue_wave_probability, 2)),
                danger_factors: Some(assessment.danger_factors),
            },
            recommendations: assessment.recommendations.clone(),
            timestamp: Some(timestamp),
        }
    }
}

/// Overall verdict block of the safety report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOverallSafety {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Vessel block of the safety report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireVesselTracking {
    #[serde(default)]
    pub vessels_found: usize,

    #[serde(default)]
    pub collision_alerts: usize,

    #[serde(default)]
    pub closest_vessel_km: Option<f64>,

    #[serde(default)]
    pub vessels: Vec<WireVessel>,
}

/// Response body of `complete-safety-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReportData {
    pub overall_safety: WireOverallSafety,
    pub vessel_tracking: WireVesselTracking,

    #[serde(default)]
    pub environmental_conditions: Option<DangerAnalysisData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl SafetyReportData {
    pub fn from_snapshot(snapshot: &SafetySnapshot) -> Self {
        Self {
            overall_safety: WireOverallSafety {
                status: snapshot.overall_status.label().to_string(),
                message: snapshot.status_message.clone(),
            },
            vessel_tracking: WireVesselTracking {
                vessels_found: snapshot.vessels_found,
                collision_alerts: snapshot.collision_alert_count,
                closest_vessel_km: (!snapshot.vessels.is_empty())
                    .then(|| round_to(snapshot.closest_vessel_distance_km, 2)),
                vessels: snapshot.vessels.iter().map(WireVessel::from_contact).collect(),
            },
            environmental_conditions: Some(DangerAnalysisData::from_assessment(
                &snapshot.environmental,
                snapshot.generated_at,
            )),
            data_source: Some(snapshot.data_source.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mmsi_forms() {
        assert_eq!(WireMmsi::Number(419000123).numeric(), Some(419000123));
        assert_eq!(WireMmsi::Text("419000123".into()).numeric(), Some(419000123));
        assert_eq!(WireMmsi::Text("MOCK1004".into()).numeric(), Some(1004));
        assert_eq!(WireMmsi::Text("Unknown".into()).numeric(), None);
        assert_eq!(WireMmsi::default().numeric(), None);
    }

    #[test]
    fn test_decode_backend_vessel() {
        let vessel: WireVessel = serde_json::from_value(json!({
            "mmsi": "MOCK1001",
            "ship_name": "Vessel 2",
            "ship_type": "Tanker",
            "latitude": 19.08,
            "longitude": 72.9,
            "distance_km": 2.4,
            "speed": 11.5,
            "course": 370.0,
            "alert_level": { "level": "WARNING" }
        }))
        .unwrap();

        let report = vessel.to_report().unwrap();
        assert_eq!(report.mmsi, 1001);
        assert_eq!(report.class, VesselClass::Tanker);
        assert_eq!(report.heading_deg, 10.0);
        assert_eq!(report.speed_knots, 11.5);
    }

    #[test]
    fn test_malformed_vessels_rejected() {
        let cases = [
            json!({ "mmsi": 1, "latitude": 95.0, "longitude": 72.0 }),
            json!({ "mmsi": 2, "latitude": 19.0 }),
            json!({ "mmsi": 3, "latitude": 19.0, "longitude": 72.0, "speed": -4.0 }),
            json!({ "mmsi": "none", "latitude": 19.0, "longitude": 72.0 }),
        ];

        for case in cases {
            let vessel: WireVessel = serde_json::from_value(case).unwrap();
            assert!(matches!(
                vessel.to_report(),
                Err(SafetyError::MalformedVesselData(_))
            ));
        }
    }

    #[test]
    fn test_convert_vessels_skips_bad_records() {
        let vessels: Vec<WireVessel> = serde_json::from_value(json!([
            { "mmsi": 10, "lat": 19.1, "lon": 72.9, "speed": 4.0 },
            { "mmsi": 11, "lat": -200.0, "lon": 72.9 },
        ]))
        .unwrap();

        let reports = convert_vessels(&vessels);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].mmsi, 10);
    }

    #[test]
    fn test_reading_derives_missing_rogue_wave_probability() {
        let data: DangerAnalysisData = serde_json::from_value(json!({
            "environmental_data": {
                "wind_speed_knots": 30.0,
                "ocean_current_knots": 3.5,
                "sea_surface_temp_c": 27.0,
                "chlorophyll_mg_m3": 0.8
            },
            "risk_analysis": { "overall_risk_level": "DANGER" }
        }))
        .unwrap();

        assert_eq!(data.reading().rogue_wave_probability, 0.6);
    }

    #[test]
    fn test_reading_uses_reported_factors() {
        let data: DangerAnalysisData = serde_json::from_value(json!({
            "environmental_data": {
                "wind_speed_knots": 10.0,
                "ocean_current_knots": 1.0,
                "sea_surface_temp_c": 27.0
            },
            "risk_analysis": {
                "overall_risk_level": "CAUTION",
                "danger_factors": {
                    "dangerous_currents": true,
                    "high_winds": false,
                    "temperature_anomaly": false
                }
            }
        }))
        .unwrap();

        assert_eq!(data.reading().rogue_wave_probability, 0.35);
        assert_eq!(data.reading().chlorophyll_mg_m3, 0.0);
    }

    #[test]
    fn test_parse_overall_status() {
        assert_eq!(parse_overall_status("CRITICAL"), Some(OverallStatus::Critical));
        assert_eq!(parse_overall_status("UNKNOWN"), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(359.6, 0), 360.0);
    }
}
