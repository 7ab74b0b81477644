//! Refresh controller.
//!
//! # Refresh cycle
//!
//! A cycle acquires a position, then fetches vessels and sea conditions
//! concurrently. Both branches resolve (to data or to a fallback) before the
//! aggregator runs, and only the finished snapshot is published. Consumers
//! therefore never see a partially updated snapshot.
//!
//! # Triggers
//!
//! - [`SafetyMonitor::start`]: the initial refresh
//! - [`SafetyMonitor::request_manual_refresh`]: on demand
//! - a periodic timer while auto-refresh is enabled
//!
//! Refreshes are independent tasks. A new request never cancels one in
//! flight; whichever completes last owns the published snapshot. Disabling
//! auto-refresh or shutting down aborts only the timer.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::aggregation;
use crate::classifier::{self, PolicyTable};
use crate::config::{LocationMode, MonitorConfig};
use crate::data_sources::{DynMaritimeFeed, MaritimeApiClient};
use crate::environment::EnvironmentalAssessor;
use crate::geolocation::{GeolocationWatch, Locator, StaticGeolocation};
use crate::model::{EnvironmentalAssessment, EnvironmentalSource, Position, SafetySnapshot};
use crate::provider::VesselProvider;
use crate::storage::Storage;
use crate::synthesis::VesselSynthesizer;

/// Longest wait between position updates in continuous mode.
const MAX_POSITION_POLL: Duration = Duration::from_secs(5);

/// Shortest accepted auto-refresh period.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Published snapshot handle; `None` until the first cycle completes.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<SafetySnapshot>>>;

// ============================================================================
// Pipeline
// ============================================================================

/// One evaluation: vessels and environment in, snapshot out.
#[derive(Clone)]
pub struct SafetyPipeline {
    provider: VesselProvider,
    assessor: EnvironmentalAssessor,
    policies: PolicyTable,
}

impl SafetyPipeline {
    pub fn new(provider: VesselProvider, assessor: EnvironmentalAssessor, policies: PolicyTable) -> Self {
        Self {
            provider,
            assessor,
            policies,
        }
    }

    /// Build the pipeline described by a configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let feed: Option<DynMaritimeFeed> = config.maritime_api_url.as_deref().map(|url| {
            info!(url, "Using remote maritime backend");
            Arc::new(MaritimeApiClient::new(url)) as DynMaritimeFeed
        });

        let provider = VesselProvider::new(
            feed,
            VesselSynthesizer::new(config.synthesis),
            config.remote_timeout,
        );

        Self::new(
            provider,
            EnvironmentalAssessor::new(config.thresholds),
            config.policies,
        )
    }

    pub fn provider(&self) -> &VesselProvider {
        &self.provider
    }

    pub fn assessor(&self) -> &EnvironmentalAssessor {
        &self.assessor
    }

    /// Evaluate safety at `position`.
    ///
    /// Vessel and environmental fetches run concurrently and are joined
    /// before aggregation. Never fails.
    pub async fn evaluate(&self, cycle: u64, position: Position, radius_km: f64) -> SafetySnapshot {
        let (population, remote_environmental) = tokio::join!(
            self.provider.fetch_vessels(position, radius_km),
            self.provider.fetch_environmental(position),
        );

        let environmental = match (remote_environmental, population.report_environmental) {
            (Some(reading), _) => self.assessor.assess(reading, EnvironmentalSource::Remote),
            (None, Some(reading)) => self.assessor.assess(reading, EnvironmentalSource::Report),
            (None, None) => {
                debug!("No remote sea conditions, using default reading");
                self.assessor.assess_default()
            }
        };

        let contacts = classifier::classify_all(
            &self.policies,
            population.data_source,
            &position,
            population.vessels,
        );
        let assessment = aggregation::aggregate(contacts, environmental);

        SafetySnapshot::new(cycle, position, population.data_source, assessment, Utc::now())
    }

    /// Assess sea conditions alone: the remote reading, or the default.
    pub async fn assess_environment(&self, position: Position) -> EnvironmentalAssessment {
        match self.provider.fetch_environmental(position).await {
            Some(reading) => self.assessor.assess(reading, EnvironmentalSource::Remote),
            None => self.assessor.assess_default(),
        }
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Refresh state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Refresh settings fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    pub radius_km: f64,
    pub refresh_interval: Duration,

    /// Initial auto-refresh flag.
    pub auto_refresh: bool,
    pub location_mode: LocationMode,
}

impl From<&MonitorConfig> for RefreshSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            radius_km: config.radius_km,
            refresh_interval: config.refresh_interval,
            auto_refresh: config.auto_refresh,
            location_mode: config.location_mode,
        }
    }
}

struct Shared {
    pipeline: SafetyPipeline,
    locator: Locator,
    settings: RefreshSettings,
    storage: Option<Storage>,
    snapshot_tx: watch::Sender<Option<Arc<SafetySnapshot>>>,
    cycle: AtomicU64,
    in_flight: AtomicUsize,
    auto_refresh: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    position_watch: Mutex<Option<GeolocationWatch>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

/// Marks a refresh as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the current snapshot and decides when to refresh it.
#[derive(Clone)]
pub struct SafetyMonitor {
    inner: Arc<Shared>,
}

impl SafetyMonitor {
    /// Create a monitor. Nothing runs until [`start`](Self::start).
    ///
    /// A refresh interval below [`MIN_REFRESH_INTERVAL`] is raised to it.
    pub fn new(
        pipeline: SafetyPipeline,
        locator: Locator,
        mut settings: RefreshSettings,
        storage: Option<Storage>,
    ) -> Self {
        if settings.refresh_interval < MIN_REFRESH_INTERVAL {
            warn!(
                requested_ms = settings.refresh_interval.as_millis() as u64,
                "Refresh interval too short, using minimum"
            );
            settings.refresh_interval = MIN_REFRESH_INTERVAL;
        }

        let (snapshot_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(Shared {
                pipeline,
                locator,
                settings,
                storage,
                snapshot_tx,
                cycle: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                auto_refresh: AtomicBool::new(settings.auto_refresh),
                timer: Mutex::new(None),
                position_watch: Mutex::new(None),
            }),
        }
    }

    /// Build a monitor from configuration, seeding the last known position
    /// from the snapshot log when one is available.
    pub async fn from_config(config: &MonitorConfig, storage: Option<Storage>) -> Self {
        let source = match config.static_fix {
            Some((latitude, longitude)) => StaticGeolocation::new(latitude, longitude),
            None => StaticGeolocation::unavailable(),
        };

        let last_position = match &storage {
            Some(storage) => match storage.last_known_position().await {
                Ok(position) => position,
                Err(e) => {
                    warn!(error = %e, "Could not read last known position");
                    None
                }
            },
            None => None,
        };

        let locator = Locator::new(Arc::new(source), config.location, config.default_position)
            .with_last_known_good(last_position);

        Self::new(
            SafetyPipeline::from_config(config),
            locator,
            RefreshSettings::from(config),
            storage,
        )
    }

    /// Begin operating: position subscription (continuous mode), the
    /// initial refresh, and the timer if auto-refresh is enabled.
    pub fn start(&self) {
        if self.inner.settings.location_mode == LocationMode::Continuous {
            if let Ok(mut slot) = self.inner.position_watch.lock() {
                if slot.is_none() {
                    let interval = self.inner.settings.refresh_interval.min(MAX_POSITION_POLL);
                    *slot = Some(self.inner.locator.watch(interval));
                }
            }
        }

        self.request_manual_refresh();

        if self.auto_refresh_enabled() {
            self.start_timer();
        }
    }

    /// Run a refresh cycle to completion and return its snapshot.
    pub async fn refresh_now(&self) -> Arc<SafetySnapshot> {
        self.inner.refresh().await
    }

    /// Start a refresh in the background. Does not cancel any in flight.
    pub fn request_manual_refresh(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.refresh().await;
        });
    }

    /// Enable or disable periodic refresh.
    ///
    /// Disabling aborts the pending timer; a refresh already running
    /// still completes and publishes.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let was = self.inner.auto_refresh.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            info!(enabled, "Auto-refresh toggled");
        }

        if enabled {
            self.start_timer();
        } else {
            self.stop_timer();
        }
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.inner.auto_refresh.load(Ordering::SeqCst)
    }

    /// Current refresh state.
    pub fn state(&self) -> RefreshState {
        if self.inner.in_flight.load(Ordering::SeqCst) > 0 {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// The most recently completed snapshot.
    pub fn current(&self) -> Option<Arc<SafetySnapshot>> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Observe published snapshots.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.inner.settings
    }

    pub fn pipeline(&self) -> &SafetyPipeline {
        &self.inner.pipeline
    }

    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.inner.storage.as_ref()
    }

    /// Whether the periodic timer is running.
    pub fn timer_active(&self) -> bool {
        self.inner
            .timer
            .lock()
            .map(|timer| timer.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stop the timer and release the position subscription.
    pub fn shutdown(&self) {
        self.stop_timer();
        if let Ok(mut slot) = self.inner.position_watch.lock() {
            slot.take();
        }
        info!("Safety monitor stopped");
    }

    fn start_timer(&self) {
        let Ok(mut timer) = self.inner.timer.lock() else {
            return;
        };
        if timer.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let period = self.inner.settings.refresh_interval;
        let weak: Weak<Shared> = Arc::downgrade(&self.inner);

        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                debug!("Auto-refresh tick");
                tokio::spawn(async move {
                    inner.refresh().await;
                });
            }
        }));
    }

    fn stop_timer(&self) {
        if let Ok(mut timer) = self.inner.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

impl Shared {
    async fn refresh(&self) -> Arc<SafetySnapshot> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;

        let position = self.acquire_position().await;
        let snapshot = Arc::new(
            self.pipeline
                .evaluate(cycle, position, self.settings.radius_km)
                .await,
        );

        self.snapshot_tx.send_replace(Some(snapshot.clone()));
        info!(
            cycle,
            status = snapshot.overall_status.label(),
            vessels = snapshot.vessels_found,
            alerts = snapshot.collision_alert_count,
            data_source = snapshot.data_source.as_str(),
            "Safety snapshot published"
        );

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.record_snapshot(&snapshot).await {
                warn!(error = %e, cycle, "Failed to log snapshot");
            }
        }

        snapshot
    }

    async fn acquire_position(&self) -> Position {
        let watched = self
            .position_watch
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(GeolocationWatch::reading));

        match watched {
            Some(reading) => self.locator.resolve(reading),
            None => self.locator.locate().await,
        }
    }
}
