//! Proximity and collision-risk classification.
//!
//! Two policies exist because vessel data arrives by two routes that were
//! historically judged differently:
//!
//! - [`ClassificationPolicy::DistanceThreshold`]: pure distance bands, the
//!   default and the policy applied to synthesized and report data.
//! - [`ClassificationPolicy::SpeedAware`]: distance combined with speed over
//!   ground, applied to live AIS traffic where speeds are trustworthy.
//!
//! [`PolicyTable`] pins one policy per [`DataSource`]; the two are never
//! blended.

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::model::{DataSource, MotionState, Position, VesselContact, VesselReport, VesselRiskTier};

/// Inside this distance a vessel is DANGER under the distance policy.
pub const DANGER_DISTANCE_KM: f64 = 1.0;

/// Inside this distance a vessel is WARNING under the distance policy.
pub const WARNING_DISTANCE_KM: f64 = 3.0;

/// Speed-aware policy: DANGER band.
pub const SPEED_AWARE_DANGER_KM: f64 = 2.0;
pub const SPEED_AWARE_DANGER_KNOTS: f64 = 10.0;

/// Speed-aware policy: WARNING band.
pub const SPEED_AWARE_WARNING_KM: f64 = 5.0;
pub const SPEED_AWARE_WARNING_KNOTS: f64 = 5.0;

/// How a vessel's distance (and speed) map onto a risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// `< 1 km` DANGER, `< 3 km` WARNING, otherwise SAFE.
    #[default]
    DistanceThreshold,

    /// `< 2 km` and `> 10 kn` DANGER, `< 5 km` and `> 5 kn` WARNING,
    /// otherwise SAFE.
    SpeedAware,
}

impl ClassificationPolicy {
    /// Tier for a vessel at `distance_km` moving at `speed_knots`.
    pub fn tier(&self, distance_km: f64, speed_knots: f64) -> VesselRiskTier {
        match self {
            ClassificationPolicy::DistanceThreshold => {
                if distance_km < DANGER_DISTANCE_KM {
                    VesselRiskTier::Danger
                } else if distance_km < WARNING_DISTANCE_KM {
                    VesselRiskTier::Warning
                } else {
                    VesselRiskTier::Safe
                }
            }
            ClassificationPolicy::SpeedAware => {
                if distance_km < SPEED_AWARE_DANGER_KM && speed_knots > SPEED_AWARE_DANGER_KNOTS {
                    VesselRiskTier::Danger
                } else if distance_km < SPEED_AWARE_WARNING_KM
                    && speed_knots > SPEED_AWARE_WARNING_KNOTS
                {
                    VesselRiskTier::Warning
                } else {
                    VesselRiskTier::Safe
                }
            }
        }
    }
}

/// Which policy applies to each data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub live: ClassificationPolicy,
    pub cached_report: ClassificationPolicy,
    pub simulated: ClassificationPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            live: ClassificationPolicy::SpeedAware,
            cached_report: ClassificationPolicy::DistanceThreshold,
            simulated: ClassificationPolicy::DistanceThreshold,
        }
    }
}

impl PolicyTable {
    /// A table applying the same policy everywhere.
    pub fn uniform(policy: ClassificationPolicy) -> Self {
        Self {
            live: policy,
            cached_report: policy,
            simulated: policy,
        }
    }

    /// Policy for a data path.
    pub fn for_source(&self, source: DataSource) -> ClassificationPolicy {
        match source {
            DataSource::Live => self.live,
            DataSource::CachedReport => self.cached_report,
            DataSource::Simulated => self.simulated,
        }
    }
}

/// Result of classifying one vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub distance_km: f64,
    pub risk_tier: VesselRiskTier,
}

/// Classify `vessel` relative to `user` under the default distance policy.
pub fn classify(user: &Position, vessel: &VesselReport) -> Classification {
    classify_with(ClassificationPolicy::DistanceThreshold, user, vessel)
}

/// Classify `vessel` relative to `user` under `policy`.
pub fn classify_with(
    policy: ClassificationPolicy,
    user: &Position,
    vessel: &VesselReport,
) -> Classification {
    let distance_km = geo::distance_km(user, &vessel.position);
    Classification {
        distance_km,
        risk_tier: policy.tier(distance_km, vessel.speed_knots),
    }
}

/// Turn a report into a classified contact.
pub fn to_contact(
    policy: ClassificationPolicy,
    user: &Position,
    vessel: VesselReport,
) -> VesselContact {
    let Classification {
        distance_km,
        risk_tier,
    } = classify_with(policy, user, &vessel);

    VesselContact {
        motion_state: MotionState::from_speed(vessel.speed_knots),
        mmsi: vessel.mmsi,
        name: vessel.name,
        class: vessel.class,
        position: vessel.position,
        heading_deg: vessel.heading_deg,
        speed_knots: vessel.speed_knots,
        distance_km,
        risk_tier,
    }
}

/// Classify every report from `source`, using the table's policy for it.
pub fn classify_all(
    table: &PolicyTable,
    source: DataSource,
    user: &Position,
    vessels: Vec<VesselReport>,
) -> Vec<VesselContact> {
    let policy = table.for_source(source);
    vessels
        .into_iter()
        .map(|vessel| to_contact(policy, user, vessel))
        .collect()
}
