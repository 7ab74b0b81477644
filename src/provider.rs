//! Vessel population provider.
//!
//! # Resolution order
//!
//! 1. Live vessel query against the remote feed (`live`)
//! 2. Consolidated safety report from the same feed (`cached-report`)
//! 3. Local synthesis (`simulated`), which always succeeds
//!
//! Each remote attempt is bounded by a timeout and every failure moves on to
//! the next step. Remote records are validated before they are returned;
//! anything unusable is dropped rather than failing the whole response.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::data_sources::DynMaritimeFeed;
use crate::error::SafetyError;
use crate::geo;
use crate::model::{DataSource, EnvironmentalReading, Position, VesselReport};
use crate::synthesis::VesselSynthesizer;

/// Default bound on a single remote attempt.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(2);

/// Vessels for one refresh, tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselPopulation {
    pub vessels: Vec<VesselReport>,
    pub data_source: DataSource,

    /// Sea conditions carried by the consolidated report, when that step
    /// produced the vessels.
    pub report_environmental: Option<EnvironmentalReading>,
}

/// Resolves the vessel population around a position.
#[derive(Clone)]
pub struct VesselProvider {
    feed: Option<DynMaritimeFeed>,
    synthesizer: VesselSynthesizer,
    timeout: Duration,
}

impl VesselProvider {
    pub fn new(feed: Option<DynMaritimeFeed>, synthesizer: VesselSynthesizer, timeout: Duration) -> Self {
        Self {
            feed,
            synthesizer,
            timeout,
        }
    }

    /// A provider with no remote feed; always synthesizes.
    pub fn offline(synthesizer: VesselSynthesizer) -> Self {
        Self::new(None, synthesizer, DEFAULT_REMOTE_TIMEOUT)
    }

    pub fn has_feed(&self) -> bool {
        self.feed.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve vessels within `radius_km` of `center`. Never fails.
    pub async fn fetch_vessels(&self, center: Position, radius_km: f64) -> VesselPopulation {
        if let Some(feed) = &self.feed {
            match self.bounded(feed.nearby_vessels(center, radius_km)).await {
                Ok(records) => {
                    let vessels = sanitize(records, &center, radius_km);
                    debug!(vessels = vessels.len(), "Live vessel query succeeded");
                    return VesselPopulation {
                        vessels,
                        data_source: DataSource::Live,
                        report_environmental: None,
                    };
                }
                Err(e) => warn!(error = %e, "Live vessel query failed, trying safety report"),
            }

            match self.bounded(feed.safety_report(center, radius_km)).await {
                Ok(report) => {
                    let vessels = sanitize(report.vessels, &center, radius_km);
                    debug!(
                        vessels = vessels.len(),
                        remote_status = ?report.overall_status,
                        "Safety report query succeeded"
                    );
                    return VesselPopulation {
                        vessels,
                        data_source: DataSource::CachedReport,
                        report_environmental: report.environmental,
                    };
                }
                Err(e) => warn!(error = %e, "Safety report query failed, synthesizing vessels"),
            }
        }

        let vessels = self.synthesizer.generate(&center);
        info!(vessels = vessels.len(), "Using synthesized vessel population");
        VesselPopulation {
            vessels,
            data_source: DataSource::Simulated,
            report_environmental: None,
        }
    }

    /// Remote sea conditions at `center`, if the feed answers in time.
    pub async fn fetch_environmental(&self, center: Position) -> Option<EnvironmentalReading> {
        let feed = self.feed.as_ref()?;
        match self.bounded(feed.environmental(center)).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(error = %e, "Environmental query failed");
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        request: impl std::future::Future<Output = Result<T, SafetyError>>,
    ) -> Result<T, SafetyError> {
        tokio::time::timeout(self.timeout, request).await?
    }
}

/// Validate remote records, dropping unusable ones.
pub fn sanitize(records: Vec<VesselReport>, center: &Position, radius_km: f64) -> Vec<VesselReport> {
    records
        .into_iter()
        .filter_map(|record| match validate(record, center, radius_km) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Discarding vessel record");
                None
            }
        })
        .collect()
}

fn validate(
    mut record: VesselReport,
    center: &Position,
    radius_km: f64,
) -> Result<VesselReport, SafetyError> {
    let position = record.position;
    if !position.is_valid() || (position.latitude == 0.0 && position.longitude == 0.0) {
        return Err(SafetyError::MalformedVesselData(format!(
            "vessel {} at ({}, {})",
            record.mmsi, position.latitude, position.longitude
        )));
    }

    if !record.speed_knots.is_finite() || record.speed_knots < 0.0 {
        return Err(SafetyError::MalformedVesselData(format!(
            "vessel {} has speed {}",
            record.mmsi, record.speed_knots
        )));
    }

    let distance = geo::distance_km(center, &position);
    if radius_km > 0.0 && distance > radius_km {
        return Err(SafetyError::MalformedVesselData(format!(
            "vessel {} is {:.1} km away, outside {:.1} km",
            record.mmsi, distance, radius_km
        )));
    }

    record.heading_deg = if record.heading_deg.is_finite() {
        record.heading_deg.rem_euclid(360.0)
    } else {
        0.0
    };

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sources::{MaritimeFeed, RemoteSafetyReport};
    use crate::model::VesselClass;
    use crate::synthesis::{SynthesisConfig, VesselDensity};
    use async_trait::async_trait;
    use std::sync::Arc;

    const CENTER: Position = Position::MUMBAI_HARBOUR;

    #[derive(Clone, Copy, PartialEq)]
    enum Behaviour {
        Answer,
        Fail,
        Hang,
    }

    struct FakeFeed {
        live: Behaviour,
        report: Behaviour,
        vessels: Vec<VesselReport>,
    }

    impl FakeFeed {
        async fn respond<T>(&self, behaviour: Behaviour, value: T) -> Result<T, SafetyError> {
            match behaviour {
                Behaviour::Answer => Ok(value),
                Behaviour::Fail => Err(SafetyError::RemoteUnavailable("HTTP 503".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(value)
                }
            }
        }
    }

    #[async_trait]
    impl MaritimeFeed for FakeFeed {
        async fn nearby_vessels(
            &self,
            _center: Position,
            _radius_km: f64,
        ) -> Result<Vec<VesselReport>, SafetyError> {
            self.respond(self.live, self.vessels.clone()).await
        }

        async fn safety_report(
            &self,
            _center: Position,
            _radius_km: f64,
        ) -> Result<RemoteSafetyReport, SafetyError> {
            let report = RemoteSafetyReport {
                vessels: self.vessels.clone(),
                environmental: Some(EnvironmentalReading::benign()),
                overall_status: None,
            };
            self.respond(self.report, report).await
        }

        async fn environmental(&self, _center: Position) -> Result<EnvironmentalReading, SafetyError> {
            self.respond(self.live, EnvironmentalReading::benign()).await
        }
    }

    fn vessel(mmsi: u64, position: Position, speed_knots: f64) -> VesselReport {
        VesselReport {
            mmsi,
            name: format!("Vessel {mmsi}"),
            class: VesselClass::Cargo,
            position,
            heading_deg: 45.0,
            speed_knots,
        }
    }

    fn provider(live: Behaviour, report: Behaviour) -> VesselProvider {
        let feed = FakeFeed {
            live,
            report,
            vessels: vec![vessel(1, geo::offset(&CENTER, 2.0, 1.0), 8.0)],
        };
        let synthesizer = VesselSynthesizer::new(SynthesisConfig {
            density: VesselDensity::Low,
            radius_km: 50.0,
            seed: Some(17),
        });
        VesselProvider::new(
            Some(Arc::new(feed) as DynMaritimeFeed),
            synthesizer,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_live_query_preferred() {
        let population = provider(Behaviour::Answer, Behaviour::Answer)
            .fetch_vessels(CENTER, 10.0)
            .await;
        assert_eq!(population.data_source, DataSource::Live);
        assert_eq!(population.vessels.len(), 1);
        assert!(population.report_environmental.is_none());
    }

    #[tokio::test]
    async fn test_report_used_when_live_fails() {
        let population = provider(Behaviour::Fail, Behaviour::Answer)
            .fetch_vessels(CENTER, 10.0)
            .await;
        assert_eq!(population.data_source, DataSource::CachedReport);
        assert_eq!(population.report_environmental, Some(EnvironmentalReading::benign()));
    }

    #[tokio::test]
    async fn test_timeouts_fall_through_to_synthesis() {
        let started = std::time::Instant::now();
        let population = provider(Behaviour::Hang, Behaviour::Hang)
            .fetch_vessels(CENTER, 10.0)
            .await;
        assert_eq!(population.data_source, DataSource::Simulated);
        assert!(!population.vessels.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_offline_provider_synthesizes() {
        let provider = VesselProvider::offline(VesselSynthesizer::default());
        assert!(!provider.has_feed());
        let population = provider.fetch_vessels(CENTER, 10.0).await;
        assert_eq!(population.data_source, DataSource::Simulated);
        assert!(population.vessels.len() >= VesselDensity::Medium.base_count());
        assert!(provider.fetch_environmental(CENTER).await.is_none());
    }

    #[tokio::test]
    async fn test_environmental_timeout_yields_none() {
        let provider = provider(Behaviour::Hang, Behaviour::Answer);
        assert!(provider.fetch_environmental(CENTER).await.is_none());
    }

    #[test]
    fn test_sanitize_drops_bad_records() {
        let records = vec![
            vessel(1, geo::offset(&CENTER, 1.0, 0.0), 5.0),
            vessel(2, Position::new(0.0, 0.0), 5.0),
            vessel(3, Position::new(95.0, 72.0), 5.0),
            vessel(4, geo::offset(&CENTER, 1.0, 0.0), -1.0),
            vessel(5, geo::offset(&CENTER, 25.0, 0.0), 5.0),
            vessel(6, Position::new(f64::NAN, 72.0), 5.0),
        ];

        let kept = sanitize(records, &CENTER, 10.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].mmsi, 1);
    }

    #[test]
    fn test_sanitize_normalizes_heading() {
        let mut record = vessel(1, geo::offset(&CENTER, 1.0, 0.0), 5.0);
        record.heading_deg = -90.0;
        let kept = sanitize(vec![record], &CENTER, 10.0);
        assert_eq!(kept[0].heading_deg, 270.0);
    }

    #[test]
    fn test_sanitize_keeps_vessel_across_antimeridian() {
        let center = Position::new(0.0, 179.9995);
        let record = vessel(7, Position::new(0.0, -179.9995), 9.0);

        let kept = sanitize(vec![record], &center, 10.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].mmsi, 7);
    }
}
