//! Monitor configuration.
//!
//! All settings live in [`MonitorConfig`], which is built once at start-up
//! and handed to the components that need it. The only runtime-mutable
//! setting, auto-refresh, is changed through [`SafetyMonitor::set_auto_refresh`].
//!
//! # Environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `SEAWATCH_PORT` | 3000 |
//! | `SEAWATCH_DATABASE_URL` | `sqlite:seawatch.db?mode=rwc` |
//! | `SEAWATCH_MARITIME_API_URL` | unset (synthesis only) |
//! | `SEAWATCH_LATITUDE` / `SEAWATCH_LONGITUDE` | unset (location unavailable) |
//! | `SEAWATCH_RADIUS_KM` | 10 |
//! | `SEAWATCH_REFRESH_SECS` | 30 |
//! | `SEAWATCH_AUTO_REFRESH` | true |
//! | `SEAWATCH_DENSITY` | medium |
//! | `SEAWATCH_SEED` | unset |
//! | `SEAWATCH_REMOTE_TIMEOUT_MS` | 2000 |
//! | `SEAWATCH_LOCATION_MODE` | single-shot |
//!
//! [`SafetyMonitor::set_auto_refresh`]: crate::monitor::SafetyMonitor::set_auto_refresh

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classifier::PolicyTable;
use crate::environment::EnvironmentalThresholds;
use crate::geolocation::LocationOptions;
use crate::model::Position;
use crate::provider::DEFAULT_REMOTE_TIMEOUT;
use crate::synthesis::{SynthesisConfig, VesselDensity};

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
pub const DEFAULT_DB_PATH: &str = "sqlite:seawatch.db?mode=rwc";

/// Default search radius around the user.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Default auto-refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// How the monitor acquires the user's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationMode {
    /// One position request per refresh.
    #[default]
    SingleShot,

    /// A background subscription; each refresh reads its latest update.
    Continuous,
}

impl FromStr for LocationMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single-shot" => Ok(LocationMode::SingleShot),
            "continuous" => Ok(LocationMode::Continuous),
            other => Err(format!("unknown location mode '{}'", other)),
        }
    }
}

/// Configuration for the safety monitor and its HTTP surface.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub port: u16,
    pub database_url: String,

    /// Base URL of the remote maritime backend; `None` means synthesis only.
    pub maritime_api_url: Option<String>,

    /// Fixed position reported by the static geolocation source.
    pub static_fix: Option<(f64, f64)>,

    /// Substituted when no position is known.
    pub default_position: Position,

    /// Search radius for vessel queries.
    pub radius_km: f64,

    pub refresh_interval: Duration,

    /// Initial auto-refresh flag.
    pub auto_refresh: bool,

    pub synthesis: SynthesisConfig,

    /// Bound on each remote attempt.
    pub remote_timeout: Duration,

    pub location_mode: LocationMode,
    pub location: LocationOptions,
    pub policies: PolicyTable,
    pub thresholds: EnvironmentalThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DB_PATH.to_string(),
            maritime_api_url: None,
            static_fix: None,
            default_position: Position::MUMBAI_HARBOUR,
            radius_km: DEFAULT_RADIUS_KM,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            auto_refresh: true,
            synthesis: SynthesisConfig::default(),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            location_mode: LocationMode::SingleShot,
            location: LocationOptions::default(),
            policies: PolicyTable::default(),
            thresholds: EnvironmentalThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `SEAWATCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let static_fix = match (
            parsed::<f64>(&lookup, "SEAWATCH_LATITUDE"),
            parsed::<f64>(&lookup, "SEAWATCH_LONGITUDE"),
        ) {
            (Some(latitude), Some(longitude)) => Some((latitude, longitude)),
            _ => None,
        };

        let density = match lookup("SEAWATCH_DENSITY") {
            Some(value) => VesselDensity::parse(&value).unwrap_or_else(|| {
                warn!(key = "SEAWATCH_DENSITY", value = %value, "Ignoring invalid setting");
                defaults.synthesis.density
            }),
            None => defaults.synthesis.density,
        };

        let radius_km = parsed::<f64>(&lookup, "SEAWATCH_RADIUS_KM")
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(defaults.radius_km);

        Self {
            port: parsed(&lookup, "SEAWATCH_PORT").unwrap_or(defaults.port),
            database_url: lookup("SEAWATCH_DATABASE_URL").unwrap_or(defaults.database_url),
            maritime_api_url: lookup("SEAWATCH_MARITIME_API_URL").filter(|url| !url.is_empty()),
            static_fix,
            radius_km,
            refresh_interval: parsed::<u64>(&lookup, "SEAWATCH_REFRESH_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            auto_refresh: parsed(&lookup, "SEAWATCH_AUTO_REFRESH").unwrap_or(defaults.auto_refresh),
            synthesis: SynthesisConfig {
                density,
                seed: parsed(&lookup, "SEAWATCH_SEED"),
                ..defaults.synthesis
            },
            remote_timeout: parsed::<u64>(&lookup, "SEAWATCH_REMOTE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            location_mode: parsed(&lookup, "SEAWATCH_LOCATION_MODE")
                .unwrap_or(defaults.location_mode),
            ..defaults
        }
    }
}

/// Parse a setting, warning about (and ignoring) unparseable values.
fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "Ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> MonitorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.radius_km, 10.0);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert!(config.auto_refresh);
        assert!(config.maritime_api_url.is_none());
        assert!(config.static_fix.is_none());
        assert_eq!(config.synthesis.density, VesselDensity::Medium);
        assert_eq!(config.remote_timeout, Duration::from_secs(2));
        assert_eq!(config.location_mode, LocationMode::SingleShot);
        assert_eq!(config.default_position, Position::MUMBAI_HARBOUR);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SEAWATCH_PORT", "8080"),
            ("SEAWATCH_MARITIME_API_URL", "http://backend:8001"),
            ("SEAWATCH_LATITUDE", "15.4"),
            ("SEAWATCH_LONGITUDE", "73.8"),
            ("SEAWATCH_RADIUS_KM", "25"),
            ("SEAWATCH_REFRESH_SECS", "5"),
            ("SEAWATCH_AUTO_REFRESH", "false"),
            ("SEAWATCH_DENSITY", "high"),
            ("SEAWATCH_SEED", "42"),
            ("SEAWATCH_REMOTE_TIMEOUT_MS", "500"),
            ("SEAWATCH_LOCATION_MODE", "continuous"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.maritime_api_url.as_deref(), Some("http://backend:8001"));
        assert_eq!(config.static_fix, Some((15.4, 73.8)));
        assert_eq!(config.radius_km, 25.0);
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert!(!config.auto_refresh);
        assert_eq!(config.synthesis.density, VesselDensity::High);
        assert_eq!(config.synthesis.seed, Some(42));
        assert_eq!(config.remote_timeout, Duration::from_millis(500));
        assert_eq!(config.location_mode, LocationMode::Continuous);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("SEAWATCH_PORT", "harbour"),
            ("SEAWATCH_RADIUS_KM", "-3"),
            ("SEAWATCH_REFRESH_SECS", "0"),
            ("SEAWATCH_DENSITY", "crowded"),
            ("SEAWATCH_LATITUDE", "18.0"),
            ("SEAWATCH_LOCATION_MODE", "sometimes"),
        ]);

        assert_eq!(config.port, 3000);
        assert_eq!(config.radius_km, 10.0);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.synthesis.density, VesselDensity::Medium);
        assert!(config.static_fix.is_none());
        assert_eq!(config.location_mode, LocationMode::SingleShot);
    }
}
