//! Safety aggregation.
//!
//! Combines classified vessel contacts and an environmental assessment into
//! the overall verdict for one refresh. Aggregation is pure and total: it
//! accepts any vessel list (including an empty one) and never fails.

use crate::model::{
    AlertSummary, CollisionAlert, EnvironmentalAssessment, EnvironmentalRiskTier, OverallStatus,
    SafetyAssessment, VesselContact, VesselRiskTier,
};

/// Aggregate vessels and sea conditions into a safety assessment.
///
/// The overall status is the worst of:
/// 1. CRITICAL if any vessel is DANGER or conditions are DANGER/EXTREME_DANGER
/// 2. WARNING if any vessel is WARNING or conditions are CAUTION
/// 3. SAFE otherwise
///
/// # Arguments
///
/// * `vessels` - Classified contacts, in any order
/// * `environmental` - Assessed sea conditions
///
/// # Returns
///
/// A `SafetyAssessment` with vessels sorted ascending by distance.
pub fn aggregate(
    mut vessels: Vec<VesselContact>,
    environmental: EnvironmentalAssessment,
) -> SafetyAssessment {
    vessels.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let alerts: Vec<CollisionAlert> = vessels.iter().filter_map(CollisionAlert::for_contact).collect();
    let alert_summary = summarize(&vessels);

    let closest_vessel_distance_km = vessels.first().map(|v| v.distance_km).unwrap_or(0.0);

    let overall_status = overall_status(&vessels, environmental.risk_tier);

    SafetyAssessment {
        vessels_found: vessels.len(),
        collision_alert_count: alerts.len(),
        closest_vessel_distance_km,
        status_message: status_message(overall_status).to_string(),
        overall_status,
        alerts,
        alert_summary,
        vessels,
        environmental,
    }
}

/// Worst status implied by the vessels and the environmental tier.
pub fn overall_status(
    vessels: &[VesselContact],
    environmental: EnvironmentalRiskTier,
) -> OverallStatus {
    let from_vessels = vessels
        .iter()
        .map(|v| OverallStatus::from(v.risk_tier))
        .max()
        .unwrap_or(OverallStatus::Safe);

    from_vessels.max(OverallStatus::from(environmental))
}

/// Fixed status message for each overall status.
pub fn status_message(status: OverallStatus) -> &'static str {
    match status {
        OverallStatus::Critical => {
            "CRITICAL: Immediate danger - take evasive action or return to port"
        }
        OverallStatus::Warning => "WARNING: Hazards nearby - monitor conditions closely",
        OverallStatus::Safe => "SAFE: No immediate hazards detected",
    }
}

fn summarize(vessels: &[VesselContact]) -> AlertSummary {
    vessels
        .iter()
        .fold(AlertSummary::default(), |mut summary, vessel| {
            match vessel.risk_tier {
                VesselRiskTier::Danger => summary.danger += 1,
                VesselRiskTier::Warning => summary.warning += 1,
                VesselRiskTier::Safe => summary.safe += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{self, ClassificationPolicy};
    use crate::environment::EnvironmentalAssessor;
    use crate::geo;
    use crate::model::{
        EnvironmentalReading, EnvironmentalSource, Position, VesselClass, VesselReport,
    };

    const USER: Position = Position::MUMBAI_HARBOUR;

    fn contact_at(mmsi: u64, distance_km: f64) -> VesselContact {
        let report = VesselReport {
            mmsi,
            name: format!("Vessel {mmsi}"),
            class: VesselClass::Fishing,
            position: geo::offset(&USER, distance_km, 0.8),
            heading_deg: 120.0,
            speed_knots: 6.0,
        };
        classifier::to_contact(ClassificationPolicy::DistanceThreshold, &USER, report)
    }

    fn benign() -> EnvironmentalAssessment {
        EnvironmentalAssessor::default().assess_default()
    }

    #[test]
    fn test_empty_benign_is_safe() {
        let result = aggregate(vec![], benign());
        assert_eq!(result.overall_status, OverallStatus::Safe);
        assert_eq!(result.collision_alert_count, 0);
        assert_eq!(result.closest_vessel_distance_km, 0.0);
        assert_eq!(result.vessels_found, 0);
        assert_eq!(result.status_message, "SAFE: No immediate hazards detected");
    }

    #[test]
    fn test_single_close_vessel_is_critical() {
        let result = aggregate(vec![contact_at(1, 0.5)], benign());
        assert_eq!(result.vessels[0].risk_tier, VesselRiskTier::Danger);
        assert_eq!(result.overall_status, OverallStatus::Critical);
        assert_eq!(result.alerts[0].message, "COLLISION RISK - Vessel very close!");
    }

    #[test]
    fn test_mixed_distances() {
        let result = aggregate(
            vec![contact_at(3, 10.0), contact_at(1, 0.5), contact_at(2, 2.0)],
            benign(),
        );

        assert_eq!(result.collision_alert_count, 2);
        assert!((result.closest_vessel_distance_km - 0.5).abs() < 1e-9);
        assert_eq!(result.overall_status, OverallStatus::Critical);
        assert_eq!(
            result.alert_summary,
            AlertSummary {
                danger: 1,
                warning: 1,
                safe: 1
            }
        );
        let order: Vec<u64> = result.vessels.iter().map(|v| v.mmsi).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_rogue_waves_without_vessels_is_critical() {
        let reading = EnvironmentalReading {
            rogue_wave_probability: 0.9,
            ..EnvironmentalReading::benign()
        };
        let environmental =
            EnvironmentalAssessor::default().assess(reading, EnvironmentalSource::Remote);

        let result = aggregate(vec![], environmental);
        assert_eq!(result.overall_status, OverallStatus::Critical);
        assert_eq!(result.vessels_found, 0);
    }

    #[test]
    fn test_warning_from_vessel_or_conditions() {
        let result = aggregate(vec![contact_at(1, 2.5)], benign());
        assert_eq!(result.overall_status, OverallStatus::Warning);
        assert_eq!(result.alerts[0].action, "Maintain safe distance and heading");

        let caution = EnvironmentalReading {
            ocean_current_knots: 3.6,
            ..EnvironmentalReading::benign()
        };
        let environmental =
            EnvironmentalAssessor::default().assess(caution, EnvironmentalSource::Remote);
        let result = aggregate(vec![contact_at(1, 12.0)], environmental);
        assert_eq!(result.overall_status, OverallStatus::Warning);
        assert_eq!(result.collision_alert_count, 0);
    }

    #[test]
    fn test_alert_count_matches_non_safe_vessels() {
        let vessels: Vec<VesselContact> = (0..40)
            .map(|i| contact_at(i, i as f64 * 0.25))
            .collect();
        let expected = vessels
            .iter()
            .filter(|v| v.risk_tier != VesselRiskTier::Safe)
            .count();
        let min = vessels
            .iter()
            .map(|v| v.distance_km)
            .fold(f64::INFINITY, f64::min);

        let result = aggregate(vessels, benign());
        assert_eq!(result.collision_alert_count, expected);
        assert_eq!(result.closest_vessel_distance_km, min);
    }
}
