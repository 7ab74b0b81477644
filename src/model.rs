//! Data model for Seawatch.
//!
//! # Snapshot semantics
//!
//! Every type in this module is a plain value. A refresh cycle builds a new
//! [`SafetySnapshot`] from scratch and publishes it whole; nothing here is
//! ever mutated after publication. Vessel contacts carry no identity across
//! refreshes, they belong to the snapshot that contains them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

/// Speed (knots) at or below which a vessel is considered stationary.
pub const STATIONARY_SPEED_KNOTS: f64 = 0.1;

/// A geographic position in decimal degrees.
///
/// Positions handed to the rest of the pipeline are always valid: the
/// geolocation layer replaces anything out of range before it gets this far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, within [-90, 90].
    pub latitude: f64,

    /// Longitude in degrees, within [-180, 180].
    pub longitude: f64,
}

impl Position {
    /// Mumbai harbour, the documented fallback position.
    pub const MUMBAI_HARBOUR: Position = Position {
        latitude: 19.0760,
        longitude: 72.8777,
    };

    /// Create a position without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a position, rejecting non-finite or out-of-range coordinates.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, SafetyError> {
        let position = Self::new(latitude, longitude);
        if position.is_valid() {
            Ok(position)
        } else {
            Err(SafetyError::LocationInvalid {
                latitude,
                longitude,
            })
        }
    }

    /// Whether both coordinates are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Vessel classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselClass {
    Cargo,
    Tanker,
    Fishing,
    Passenger,
    Container,
    BulkCarrier,
    Tug,
    Pilot,
    Other,
}

impl VesselClass {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            VesselClass::Cargo => "Cargo",
            VesselClass::Tanker => "Tanker",
            VesselClass::Fishing => "Fishing",
            VesselClass::Passenger => "Passenger",
            VesselClass::Container => "Container",
            VesselClass::BulkCarrier => "Bulk Carrier",
            VesselClass::Tug => "Tug",
            VesselClass::Pilot => "Pilot",
            VesselClass::Other => "Other",
        }
    }

    /// Map a free-text ship type from a remote feed onto a class.
    ///
    /// AIS type names vary between providers ("Cargo - Hazard A",
    /// "Bulk Carrier", "Towing"), so matching is by keyword.
    pub fn from_type_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("container") {
            VesselClass::Container
        } else if name.contains("bulk") {
            VesselClass::BulkCarrier
        } else if name.contains("tanker") {
            VesselClass::Tanker
        } else if name.contains("cargo") {
            VesselClass::Cargo
        } else if name.contains("fishing") || name.contains("trawler") {
            VesselClass::Fishing
        } else if name.contains("passenger") || name.contains("ferry") {
            VesselClass::Passenger
        } else if name.contains("tug") || name.contains("towing") {
            VesselClass::Tug
        } else if name.contains("pilot") {
            VesselClass::Pilot
        } else {
            VesselClass::Other
        }
    }
}

/// Whether a vessel is under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionState {
    Moving,
    Stationary,
}

impl MotionState {
    /// Derive the motion state from speed over ground.
    pub fn from_speed(speed_knots: f64) -> Self {
        if speed_knots > STATIONARY_SPEED_KNOTS {
            MotionState::Moving
        } else {
            MotionState::Stationary
        }
    }
}

/// Collision risk tier for a single vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselRiskTier {
    Safe,
    Warning,
    Danger,
}

impl VesselRiskTier {
    /// Get the wire label.
    pub fn label(&self) -> &'static str {
        match self {
            VesselRiskTier::Safe => "SAFE",
            VesselRiskTier::Warning => "WARNING",
            VesselRiskTier::Danger => "DANGER",
        }
    }
}

/// Risk tier for sea conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentalRiskTier {
    Safe,
    Caution,
    Danger,
    ExtremeDanger,
}

impl EnvironmentalRiskTier {
    /// Get the wire label.
    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentalRiskTier::Safe => "SAFE",
            EnvironmentalRiskTier::Caution => "CAUTION",
            EnvironmentalRiskTier::Danger => "DANGER",
            EnvironmentalRiskTier::ExtremeDanger => "EXTREME_DANGER",
        }
    }

    /// Tier for a number of raised danger factors.
    pub fn from_flag_count(count: usize) -> Self {
        match count {
            0 => EnvironmentalRiskTier::Safe,
            1 => EnvironmentalRiskTier::Caution,
            2 => EnvironmentalRiskTier::Danger,
            _ => EnvironmentalRiskTier::ExtremeDanger,
        }
    }
}

/// Overall verdict of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Safe,
    Warning,
    Critical,
}

impl OverallStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::Safe => "SAFE",
            OverallStatus::Warning => "WARNING",
            OverallStatus::Critical => "CRITICAL",
        }
    }
}

impl From<VesselRiskTier> for OverallStatus {
    fn from(tier: VesselRiskTier) -> Self {
        match tier {
            VesselRiskTier::Safe => OverallStatus::Safe,
            VesselRiskTier::Warning => OverallStatus::Warning,
            VesselRiskTier::Danger => OverallStatus::Critical,
        }
    }
}

impl From<EnvironmentalRiskTier> for OverallStatus {
    fn from(tier: EnvironmentalRiskTier) -> Self {
        match tier {
            EnvironmentalRiskTier::Safe => OverallStatus::Safe,
            EnvironmentalRiskTier::Caution => OverallStatus::Warning,
            EnvironmentalRiskTier::Danger | EnvironmentalRiskTier::ExtremeDanger => {
                OverallStatus::Critical
            }
        }
    }
}

/// Provenance of the vessel data in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    /// Live remote vessel query.
    Live,
    /// Consolidated remote safety report.
    CachedReport,
    /// Local synthesis; implies degraded confidence.
    Simulated,
}

impl DataSource {
    /// Wire tag, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::CachedReport => "cached-report",
            DataSource::Simulated => "simulated",
        }
    }

    /// Parse a wire tag.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "live" => Some(DataSource::Live),
            "cached-report" => Some(DataSource::CachedReport),
            "simulated" => Some(DataSource::Simulated),
            _ => None,
        }
    }
}

/// A vessel as reported by a source, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    /// Numeric identity (MMSI for AIS sources).
    pub mmsi: u64,

    /// Ship name.
    pub name: String,

    /// Classification.
    pub class: VesselClass,

    /// Reported position.
    pub position: Position,

    /// Heading in degrees [0, 360); meaningless when stationary.
    pub heading_deg: f64,

    /// Speed over ground in knots, never negative.
    pub speed_knots: f64,
}

/// A classified vessel inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselContact {
    pub mmsi: u64,
    pub name: String,
    pub class: VesselClass,
    pub position: Position,
    pub heading_deg: f64,
    pub speed_knots: f64,

    /// Derived from speed.
    pub motion_state: MotionState,

    /// Distance from the user in kilometres.
    pub distance_km: f64,

    /// Collision risk tier.
    pub risk_tier: VesselRiskTier,
}

/// Raw sea-condition readings at a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    pub sea_surface_temp_c: f64,
    pub wind_speed_knots: f64,
    pub ocean_current_knots: f64,
    pub chlorophyll_mg_m3: f64,

    /// Probability of rogue waves, within [0, 1].
    pub rogue_wave_probability: f64,
}

impl EnvironmentalReading {
    /// The benign reading substituted when no upstream data is available.
    pub const fn benign() -> Self {
        Self {
            sea_surface_temp_c: 27.5,
            wind_speed_knots: 12.0,
            ocean_current_knots: 2.3,
            chlorophyll_mg_m3: 1.2,
            rogue_wave_probability: 0.15,
        }
    }

    /// Replace non-finite fields with the benign value and clamp the
    /// probability into [0, 1].
    pub fn sanitized(self) -> Self {
        let benign = Self::benign();
        let pick = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };

        Self {
            sea_surface_temp_c: pick(self.sea_surface_temp_c, benign.sea_surface_temp_c),
            wind_speed_knots: pick(self.wind_speed_knots, benign.wind_speed_knots).max(0.0),
            ocean_current_knots: pick(self.ocean_current_knots, benign.ocean_current_knots)
                .max(0.0),
            chlorophyll_mg_m3: pick(self.chlorophyll_mg_m3, benign.chlorophyll_mg_m3).max(0.0),
            rogue_wave_probability: pick(
                self.rogue_wave_probability,
                benign.rogue_wave_probability,
            )
            .clamp(0.0, 1.0),
        }
    }
}

/// Boolean danger flags derived from a reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerFactors {
    pub dangerous_currents: bool,
    pub high_winds: bool,
    pub temperature_anomaly: bool,
}

impl DangerFactors {
    /// Number of raised flags.
    pub fn count(&self) -> usize {
        [
            self.dangerous_currents,
            self.high_winds,
            self.temperature_anomaly,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }
}

/// Where the environmental reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentalSource {
    /// Remote environmental query.
    Remote,
    /// Environmental block of the consolidated report.
    Report,
    /// Benign default.
    Default,
}

/// Assessed sea conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalAssessment {
    pub reading: EnvironmentalReading,
    pub danger_factors: DangerFactors,
    pub risk_tier: EnvironmentalRiskTier,
    pub message: String,
    pub recommendations: Vec<String>,
    pub source: EnvironmentalSource,
}

/// A collision alert for a vessel that is not SAFE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionAlert {
    pub mmsi: u64,
    pub name: String,
    pub distance_km: f64,
    pub tier: VesselRiskTier,
    pub message: String,
    pub action: String,
}

impl CollisionAlert {
    /// Alert message and recommended action for a tier.
    pub fn describe(tier: VesselRiskTier) -> (&'static str, &'static str) {
        match tier {
            VesselRiskTier::Danger => (
                "COLLISION RISK - Vessel very close!",
                "Take immediate evasive action",
            ),
            VesselRiskTier::Warning => (
                "Ship nearby - Monitor closely",
                "Maintain safe distance and heading",
            ),
            VesselRiskTier::Safe => ("Safe distance", "Continue normal operation"),
        }
    }

    /// Alert for a classified contact; `None` for SAFE contacts.
    pub fn for_contact(contact: &VesselContact) -> Option<Self> {
        if contact.risk_tier == VesselRiskTier::Safe {
            return None;
        }

        let (message, action) = Self::describe(contact.risk_tier);
        Some(Self {
            mmsi: contact.mmsi,
            name: contact.name.clone(),
            distance_km: contact.distance_km,
            tier: contact.risk_tier,
            message: message.to_string(),
            action: action.to_string(),
        })
    }
}

/// Vessel counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub danger: usize,
    pub warning: usize,
    pub safe: usize,
}

/// Output of the aggregator: everything in a snapshot except position,
/// provenance and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Ascending by `distance_km`.
    pub vessels: Vec<VesselContact>,
    pub environmental: EnvironmentalAssessment,
    pub overall_status: OverallStatus,
    pub status_message: String,
    pub vessels_found: usize,
    pub collision_alert_count: usize,

    /// Distance to the closest vessel, 0 when there are none.
    pub closest_vessel_distance_km: f64,
    pub alerts: Vec<CollisionAlert>,
    pub alert_summary: AlertSummary,
}

/// One immutable, fully aggregated safety evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySnapshot {
    /// Monotonic number of the refresh cycle that produced this snapshot.
    pub cycle: u64,
    pub position: Position,
    pub vessels: Vec<VesselContact>,
    pub environmental: EnvironmentalAssessment,
    pub overall_status: OverallStatus,
    pub status_message: String,
    pub vessels_found: usize,
    pub collision_alert_count: usize,
    pub closest_vessel_distance_km: f64,
    pub alerts: Vec<CollisionAlert>,
    pub alert_summary: AlertSummary,
    pub data_source: DataSource,
    pub generated_at: DateTime<Utc>,
}

impl SafetySnapshot {
    /// Assemble a snapshot from an aggregator result.
    pub fn new(
        cycle: u64,
        position: Position,
        data_source: DataSource,
        assessment: SafetyAssessment,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            cycle,
            position,
            vessels: assessment.vessels,
            environmental: assessment.environmental,
            overall_status: assessment.overall_status,
            status_message: assessment.status_message,
            vessels_found: assessment.vessels_found,
            collision_alert_count: assessment.collision_alert_count,
            closest_vessel_distance_km: assessment.closest_vessel_distance_km,
            alerts: assessment.alerts,
            alert_summary: assessment.alert_summary,
            data_source,
            generated_at,
        }
    }

    /// Whether the vessel data came from the local synthesizer.
    pub fn is_degraded(&self) -> bool {
        self.data_source == DataSource::Simulated
    }
}
