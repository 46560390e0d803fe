//! Live positioning strategy.
//!
//! A [`PositionSource`] represents the device's positioning capability.
//! [`LiveSensorExtractor`] issues one query per photo, bounded by
//! [`PositionOptions::timeout`], and reuses its previous fix while that
//! fix is younger than [`PositionOptions::maximum_age`]. Every failure
//! (timeout, denial, missing capability) collapses to "no coordinate".

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geofilter_zone_models::GeoCoordinate;
use thiserror::Error;
use tokio::time::Instant;

use crate::{CoordinateExtractor, ExtractError};

/// Acquisition timeout for a single fix.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Oldest cached fix that is still acceptable.
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(300);

/// Query options passed to a [`PositionSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for the most accurate fix the source can produce.
    pub high_accuracy: bool,
    /// Give up on the query after this long.
    pub timeout: Duration,
    /// Accept a previously acquired fix up to this old.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
        }
    }
}

/// A single position reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// Where the device is.
    pub coordinate: GeoCoordinate,
    /// Estimated horizontal accuracy in metres, if known.
    pub accuracy_m: Option<f64>,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
}

/// Reasons a position query can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user or platform refused access to location.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The device has no positioning capability or it is switched off.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// No fix arrived within the timeout.
    #[error("Position query timed out after {0:?}")]
    Timeout(Duration),
}

/// The device's positioning capability.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Acquires one current fix.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if no fix can be produced.
    async fn current_position(&self, options: &PositionOptions)
    -> Result<PositionFix, PositionError>;
}

/// A source for builds or hosts without any positioning capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePositionSource;

#[async_trait]
impl PositionSource for UnavailablePositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<PositionFix, PositionError> {
        Err(PositionError::Unavailable(
            "no positioning capability on this host".to_string(),
        ))
    }
}

/// A source that reports a configured, stationary position.
///
/// Used for fixed installations (kiosks, desktop hosts) where the location
/// is supplied by configuration rather than a sensor.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource {
    coordinate: GeoCoordinate,
    accuracy_m: Option<f64>,
}

impl FixedPositionSource {
    /// Creates a source that always reports `coordinate`.
    #[must_use]
    pub const fn new(coordinate: GeoCoordinate, accuracy_m: Option<f64>) -> Self {
        Self {
            coordinate,
            accuracy_m,
        }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<PositionFix, PositionError> {
        Ok(PositionFix {
            coordinate: self.coordinate,
            accuracy_m: self.accuracy_m,
            timestamp: Utc::now(),
        })
    }
}

/// Extracts a coordinate by querying a live [`PositionSource`].
///
/// The image bytes are ignored: the photo is assumed to have been taken
/// where the device is now.
pub struct LiveSensorExtractor {
    source: Arc<dyn PositionSource>,
    options: PositionOptions,
    last_fix: Mutex<Option<(Instant, GeoCoordinate)>>,
}

impl LiveSensorExtractor {
    /// Creates an extractor over `source` with the default options
    /// (high accuracy, 10 s timeout, 5 min cache tolerance).
    #[must_use]
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self::with_options(source, PositionOptions::default())
    }

    /// Creates an extractor with explicit query options.
    #[must_use]
    pub fn with_options(source: Arc<dyn PositionSource>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            last_fix: Mutex::new(None),
        }
    }

    /// The options used for each query.
    #[must_use]
    pub const fn options(&self) -> &PositionOptions {
        &self.options
    }

    fn cached_fix(&self) -> Option<GeoCoordinate> {
        let last = *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        last.filter(|(acquired, _)| acquired.elapsed() <= self.options.maximum_age)
            .map(|(_, coordinate)| coordinate)
    }

    fn remember(&self, coordinate: GeoCoordinate) {
        let mut guard = self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some((Instant::now(), coordinate));
    }

    async fn query(&self) -> Result<PositionFix, PositionError> {
        tokio::time::timeout(
            self.options.timeout,
            self.source.current_position(&self.options),
        )
        .await
        .unwrap_or(Err(PositionError::Timeout(self.options.timeout)))
    }
}

#[async_trait]
impl CoordinateExtractor for LiveSensorExtractor {
    fn name(&self) -> &str {
        "live"
    }

    async fn extract(&self, _image_bytes: &[u8]) -> Result<Option<GeoCoordinate>, ExtractError> {
        if let Some(coordinate) = self.cached_fix() {
            log::debug!("Using cached device position {coordinate}");
            return Ok(Some(coordinate));
        }

        match self.query().await {
            Ok(fix) => {
                log::info!(
                    "Device location: {} (accuracy: {:?}m)",
                    fix.coordinate,
                    fix.accuracy_m
                );
                self.remember(fix.coordinate);
                Ok(Some(fix.coordinate))
            }
            Err(e) => {
                log::warn!("Error getting location: {e}");
                Ok(None)
            }
        }
    }
}
