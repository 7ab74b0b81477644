//! Remote maritime data sources.
//!
//! A [`MaritimeFeed`] answers the three questions the pipeline asks of the
//! outside world: which vessels are near a point, what the consolidated
//! safety report for it says, and what the sea conditions are. Every call
//! may fail; callers decide what to fall back to.
//!
//! # Data Sources
//!
//! - [`maritime_api`]: HTTP client for a maritime backend exposing the
//!   `/maritime/*` endpoints (including another Seawatch instance)

pub mod maritime_api;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SafetyError;
use crate::model::{EnvironmentalReading, OverallStatus, Position, VesselReport};

pub use maritime_api::MaritimeApiClient;

/// Consolidated report returned by a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSafetyReport {
    pub vessels: Vec<VesselReport>,

    /// Sea conditions, if the report carried them.
    pub environmental: Option<EnvironmentalReading>,

    /// The remote's own verdict. Informational only; the local aggregator
    /// always recomputes the status.
    pub overall_status: Option<OverallStatus>,
}

/// A remote source of maritime data.
#[async_trait]
pub trait MaritimeFeed: Send + Sync {
    /// Vessels within `radius_km` of `center`.
    async fn nearby_vessels(
        &self,
        center: Position,
        radius_km: f64,
    ) -> Result<Vec<VesselReport>, SafetyError>;

    /// Consolidated safety report for `center`.
    async fn safety_report(
        &self,
        center: Position,
        radius_km: f64,
    ) -> Result<RemoteSafetyReport, SafetyError>;

    /// Sea conditions at `center`.
    async fn environmental(&self, center: Position) -> Result<EnvironmentalReading, SafetyError>;
}

/// Shared handle to a feed.
pub type DynMaritimeFeed = Arc<dyn MaritimeFeed>;
