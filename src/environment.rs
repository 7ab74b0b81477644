//! Sea-condition risk assessment.
//!
//! Readings are reduced to three danger flags (currents, wind, water
//! temperature anomaly). The number of raised flags sets the base tier and a
//! high rogue-wave probability escalates it regardless of the flags.

use serde::{Deserialize, Serialize};

use crate::model::{
    DangerFactors, EnvironmentalAssessment, EnvironmentalReading, EnvironmentalRiskTier,
    EnvironmentalSource,
};

/// Thresholds used to derive danger flags and rogue-wave escalation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalThresholds {
    /// Currents above this speed (knots) are dangerous.
    pub dangerous_current_knots: f64,

    /// Winds above this speed (knots) are high.
    pub high_wind_knots: f64,

    /// Seasonal baseline sea surface temperature (°C).
    pub baseline_sst_c: f64,

    /// Deviation from the baseline (°C) that counts as an anomaly.
    pub sst_anomaly_c: f64,

    /// Rogue-wave probability that forces at least DANGER.
    pub rogue_wave_danger: f64,

    /// Rogue-wave probability that forces EXTREME_DANGER.
    pub rogue_wave_extreme: f64,
}

impl Default for EnvironmentalThresholds {
    fn default() -> Self {
        Self {
            dangerous_current_knots: 3.0,
            high_wind_knots: 25.0,
            baseline_sst_c: 27.0,
            sst_anomaly_c: 2.0,
            rogue_wave_danger: 0.7,
            rogue_wave_extreme: 0.85,
        }
    }
}

/// Rogue-wave probability used when a source reports conditions but no
/// probability of its own.
pub fn rogue_wave_probability(factors: &DangerFactors) -> f64 {
    let DangerFactors {
        dangerous_currents: currents,
        high_winds: winds,
        temperature_anomaly: temperature,
    } = *factors;

    if currents && winds && temperature {
        0.85
    } else if (currents && winds) || (winds && temperature) {
        0.6
    } else if currents || winds {
        0.35
    } else {
        0.0
    }
}

/// Assesses environmental readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentalAssessor {
    thresholds: EnvironmentalThresholds,
}

impl EnvironmentalAssessor {
    pub fn new(thresholds: EnvironmentalThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &EnvironmentalThresholds {
        &self.thresholds
    }

    /// Raise the danger flags for a reading.
    pub fn danger_factors(&self, reading: &EnvironmentalReading) -> DangerFactors {
        let t = &self.thresholds;
        DangerFactors {
            dangerous_currents: reading.ocean_current_knots > t.dangerous_current_knots,
            high_winds: reading.wind_speed_knots > t.high_wind_knots,
            temperature_anomaly: (reading.sea_surface_temp_c - t.baseline_sst_c).abs()
                > t.sst_anomaly_c,
        }
    }

    /// Tier for a reading.
    pub fn risk_tier(&self, reading: &EnvironmentalReading) -> EnvironmentalRiskTier {
        let from_flags = EnvironmentalRiskTier::from_flag_count(self.danger_factors(reading).count());
        let probability = reading.rogue_wave_probability;

        let from_waves = if probability >= self.thresholds.rogue_wave_extreme {
            EnvironmentalRiskTier::ExtremeDanger
        } else if probability >= self.thresholds.rogue_wave_danger {
            EnvironmentalRiskTier::Danger
        } else {
            EnvironmentalRiskTier::Safe
        };

        from_flags.max(from_waves)
    }

    /// Full assessment of a reading.
    pub fn assess(
        &self,
        reading: EnvironmentalReading,
        source: EnvironmentalSource,
    ) -> EnvironmentalAssessment {
        let reading = reading.sanitized();
        let danger_factors = self.danger_factors(&reading);
        let risk_tier = self.risk_tier(&reading);

        EnvironmentalAssessment {
            reading,
            danger_factors,
            risk_tier,
            message: risk_message(risk_tier).to_string(),
            recommendations: recommendations(risk_tier, reading.rogue_wave_probability),
            source,
        }
    }

    /// Assessment of the benign default reading.
    pub fn assess_default(&self) -> EnvironmentalAssessment {
        self.assess(EnvironmentalReading::benign(), EnvironmentalSource::Default)
    }
}

fn risk_message(tier: EnvironmentalRiskTier) -> &'static str {
    match tier {
        EnvironmentalRiskTier::ExtremeDanger => {
            "EXTREME CONDITIONS - Return to port immediately!"
        }
        EnvironmentalRiskTier::Danger => "DANGEROUS CONDITIONS - Exercise extreme caution",
        EnvironmentalRiskTier::Caution => "MODERATE RISK - Monitor conditions closely",
        EnvironmentalRiskTier::Safe => "CONDITIONS SAFE - Good for fishing",
    }
}

/// Safety recommendations for a tier, adjusted for rogue-wave risk.
pub fn recommendations(tier: EnvironmentalRiskTier, rogue_wave_probability: f64) -> Vec<String> {
    let base: &[&str] = match tier {
        EnvironmentalRiskTier::ExtremeDanger => &[
            "RETURN TO PORT IMMEDIATELY",
            "Extremely dangerous sea conditions detected",
            "Maintain emergency radio contact",
            "Ensure all safety equipment is ready",
            "Avoid fishing activities completely",
        ],
        EnvironmentalRiskTier::Danger => &[
            "Consider returning to port",
            "Dangerous currents and waves expected",
            "Stay close to other vessels if possible",
            "Keep emergency contacts ready",
            "Suspend fishing operations",
        ],
        EnvironmentalRiskTier::Caution => &[
            "Monitor weather conditions continuously",
            "Be aware of changing sea conditions",
            "Stay within safe distance from shore",
            "Exercise caution while fishing",
            "Maintain regular radio contact",
        ],
        EnvironmentalRiskTier::Safe => &[
            "Conditions favorable for fishing",
            "Sea conditions within safe limits",
            "Good fishing conditions expected",
            "Maintain standard safety protocols",
        ],
    };

    let mut lines: Vec<String> = base.iter().map(|s| s.to_string()).collect();

    if rogue_wave_probability > 0.7 {
        lines.insert(1, "HIGH ROGUE WAVE RISK - Avoid open waters".to_string());
    } else if rogue_wave_probability > 0.4 {
        let at = lines.len() - 1;
        lines.insert(at, "Monitor for unusual wave patterns".to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sst: f64, wind: f64, current: f64, rogue: f64) -> EnvironmentalReading {
        EnvironmentalReading {
            sea_surface_temp_c: sst,
            wind_speed_knots: wind,
            ocean_current_knots: current,
            chlorophyll_mg_m3: 1.0,
            rogue_wave_probability: rogue,
        }
    }

    #[test]
    fn test_benign_reading_is_safe() {
        let assessment = EnvironmentalAssessor::default().assess_default();
        assert_eq!(assessment.risk_tier, EnvironmentalRiskTier::Safe);
        assert_eq!(assessment.danger_factors, DangerFactors::default());
        assert_eq!(assessment.source, EnvironmentalSource::Default);
        assert_eq!(assessment.recommendations.len(), 4);
    }

    #[test]
    fn test_single_flag_is_caution() {
        let assessor = EnvironmentalAssessor::default();
        let a = assessor.assess(reading(27.0, 12.0, 3.5, 0.1), EnvironmentalSource::Remote);
        assert!(a.danger_factors.dangerous_currents);
        assert_eq!(a.risk_tier, EnvironmentalRiskTier::Caution);
        assert!(a.message.contains("MODERATE"));
    }

    #[test]
    fn test_flag_count_escalates() {
        let assessor = EnvironmentalAssessor::default();
        assert_eq!(
            assessor.risk_tier(&reading(27.0, 30.0, 3.5, 0.1)),
            EnvironmentalRiskTier::Danger
        );
        assert_eq!(
            assessor.risk_tier(&reading(31.0, 30.0, 3.5, 0.1)),
            EnvironmentalRiskTier::ExtremeDanger
        );
        assert_eq!(
            assessor.risk_tier(&reading(22.0, 10.0, 1.0, 0.1)),
            EnvironmentalRiskTier::Caution
        );
    }

    #[test]
    fn test_rogue_wave_escalates_regardless_of_flags() {
        let assessor = EnvironmentalAssessor::default();
        assert_eq!(
            assessor.risk_tier(&reading(27.0, 10.0, 1.0, 0.7)),
            EnvironmentalRiskTier::Danger
        );
        assert_eq!(
            assessor.risk_tier(&reading(27.0, 10.0, 1.0, 0.9)),
            EnvironmentalRiskTier::ExtremeDanger
        );
        assert_eq!(
            assessor.risk_tier(&reading(27.0, 10.0, 1.0, 0.69)),
            EnvironmentalRiskTier::Safe
        );
    }

    #[test]
    fn test_rogue_wave_probability_from_factors() {
        let all = DangerFactors {
            dangerous_currents: true,
            high_winds: true,
            temperature_anomaly: true,
        };
        assert_eq!(rogue_wave_probability(&all), 0.85);

        let wind_and_sst = DangerFactors {
            dangerous_currents: false,
            high_winds: true,
            temperature_anomaly: true,
        };
        assert_eq!(rogue_wave_probability(&wind_and_sst), 0.6);

        let currents_and_sst = DangerFactors {
            dangerous_currents: true,
            high_winds: false,
            temperature_anomaly: true,
        };
        assert_eq!(rogue_wave_probability(&currents_and_sst), 0.35);

        let sst_only = DangerFactors {
            temperature_anomaly: true,
            ..DangerFactors::default()
        };
        assert_eq!(rogue_wave_probability(&sst_only), 0.0);
    }

    #[test]
    fn test_recommendations_rogue_wave_lines() {
        let high = recommendations(EnvironmentalRiskTier::ExtremeDanger, 0.85);
        assert_eq!(high[1], "HIGH ROGUE WAVE RISK - Avoid open waters");
        assert_eq!(high.len(), 6);

        let moderate = recommendations(EnvironmentalRiskTier::Safe, 0.5);
        assert_eq!(moderate.len(), 5);
        assert_eq!(moderate[3], "Monitor for unusual wave patterns");
        assert_eq!(moderate[4], "Maintain standard safety protocols");
    }
}
