//! Position acquisition.
//!
//! A [`GeolocationSource`] is whatever the platform offers for finding out
//! where the boat is. Sources are allowed to fail; the [`Locator`] sits in
//! front of them and guarantees that the pipeline always gets a valid
//! [`Position`], substituting the last known good fix or the configured
//! default when a reading is missing or unusable.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SafetyError;
use crate::model::Position;

/// Shortest accepted polling period for [`Locator::watch`].
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Options for a single position request.
#[derive(Debug, Clone, Copy)]
pub struct LocationOptions {
    /// How long to wait for a fix.
    pub timeout: Duration,

    /// Ask for the most precise fix the platform can provide.
    pub high_accuracy: bool,

    /// Accept a cached fix no older than this.
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

/// A platform position source.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    /// Obtain the current position.
    async fn current_position(&self, options: &LocationOptions) -> Result<Position, SafetyError>;
}

/// Shared handle to a position source.
pub type DynGeolocationSource = Arc<dyn GeolocationSource>;

/// A source that reports a fixed, configured fix.
///
/// Used on shore-side deployments where the monitored position comes from
/// configuration. With no fix configured every request fails with
/// [`SafetyError::LocationUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct StaticGeolocation {
    fix: Option<(f64, f64)>,
}

impl StaticGeolocation {
    /// Source reporting the given coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            fix: Some((latitude, longitude)),
        }
    }

    /// Source with no location capability.
    pub fn unavailable() -> Self {
        Self { fix: None }
    }
}

#[async_trait]
impl GeolocationSource for StaticGeolocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<Position, SafetyError> {
        match self.fix {
            Some((latitude, longitude)) => Position::validated(latitude, longitude),
            None => Err(SafetyError::LocationUnavailable(
                "no position fix configured".to_string(),
            )),
        }
    }
}

async fn request_position(
    source: &dyn GeolocationSource,
    options: &LocationOptions,
) -> Result<Position, SafetyError> {
    match tokio::time::timeout(options.timeout, source.current_position(options)).await {
        Ok(reading) => reading,
        Err(_) => Err(SafetyError::LocationUnavailable(
            "position request timed out".to_string(),
        )),
    }
}

/// Turns fallible position readings into a usable position.
pub struct Locator {
    source: DynGeolocationSource,
    options: LocationOptions,
    default_position: Position,
    last_known_good: Mutex<Option<Position>>,
}

impl Locator {
    /// Create a locator over `source` falling back to `default_position`.
    pub fn new(
        source: DynGeolocationSource,
        options: LocationOptions,
        default_position: Position,
    ) -> Self {
        Self {
            source,
            options,
            default_position,
            last_known_good: Mutex::new(None),
        }
    }

    /// Seed the last known good position (e.g. from the snapshot log).
    pub fn with_last_known_good(self, position: Option<Position>) -> Self {
        if let Some(position) = position.filter(Position::is_valid) {
            self.remember(position);
        }
        self
    }

    /// The position substituted when nothing better is known.
    pub fn default_position(&self) -> Position {
        self.default_position
    }

    /// The most recent valid position seen, if any.
    pub fn last_known_good(&self) -> Option<Position> {
        self.last_known_good
            .lock()
            .map(|guard| *guard)
            .unwrap_or(None)
    }

    /// Single-shot acquisition. Never fails.
    pub async fn locate(&self) -> Position {
        let reading = request_position(self.source.as_ref(), &self.options).await;
        self.resolve(reading)
    }

    /// Resolve a reading into a usable position, updating the last known good.
    pub fn resolve(&self, reading: Result<Position, SafetyError>) -> Position {
        let reading = reading.and_then(|p| Position::validated(p.latitude, p.longitude));

        match reading {
            Ok(position) => {
                self.remember(position);
                position
            }
            Err(e) => {
                let fallback = self.last_known_good().unwrap_or(self.default_position);
                warn!(
                    error = %e,
                    latitude = fallback.latitude,
                    longitude = fallback.longitude,
                    "Position unavailable, using fallback"
                );
                fallback
            }
        }
    }

    /// Start continuous acquisition, polling the source every `interval`.
    ///
    /// The returned watch owns the polling task; dropping it stops polling.
    /// Intervals below [`MIN_WATCH_INTERVAL`] are raised to it.
    pub fn watch(&self, interval: Duration) -> GeolocationWatch {
        let interval = interval.max(MIN_WATCH_INTERVAL);
        let (tx, rx) = watch::channel(None);
        let source = self.source.clone();
        let options = self.options;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reading = request_position(source.as_ref(), &options).await;
                debug!(ok = reading.is_ok(), "Position update");
                if tx.send(Some(reading)).is_err() {
                    break;
                }
            }
        });

        GeolocationWatch { rx, handle }
    }

    fn remember(&self, position: Position) {
        if let Ok(mut guard) = self.last_known_good.lock() {
            *guard = Some(position);
        }
    }
}

/// A continuous position subscription.
///
/// Holds the most recent raw reading. The polling task is aborted when the
/// watch is dropped, on every exit path.
pub struct GeolocationWatch {
    rx: watch::Receiver<Option<Result<Position, SafetyError>>>,
    handle: JoinHandle<()>,
}

impl GeolocationWatch {
    /// The latest raw reading, `None` before the first update.
    pub fn reading(&self) -> Option<Result<Position, SafetyError>> {
        self.rx.borrow().clone()
    }

    /// The latest reading, or `LocationUnavailable` before the first one.
    pub fn latest(&self) -> Result<Position, SafetyError> {
        self.reading().unwrap_or_else(|| {
            Err(SafetyError::LocationUnavailable(
                "waiting for first position update".to_string(),
            ))
        })
    }

    /// Wait until a new reading arrives.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether the polling task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for GeolocationWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
