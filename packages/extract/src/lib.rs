#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate extraction for submitted photos.
//!
//! Two interchangeable strategies implement [`CoordinateExtractor`]:
//!
//! 1. [`metadata::MetadataExtractor`] reads the GPS block embedded in the
//!    image container (EXIF) and converts degrees/minutes/seconds to
//!    decimal degrees.
//! 2. [`position::LiveSensorExtractor`] asks a [`position::PositionSource`]
//!    for a single current fix, bounded by a timeout and tolerant of a
//!    recently cached fix.
//!
//! "No coordinate" is an ordinary outcome (`Ok(None)`), never an error.
//! Each call resolves exactly once; neither strategy retries and neither
//! supports cancellation.

pub mod metadata;
pub mod position;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use async_trait::async_trait;
use geofilter_zone_models::GeoCoordinate;
use thiserror::Error;

/// Errors that can occur while reading a photo's location.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The embedded metadata block exists but could not be read.
    #[error("Metadata read error: {0}")]
    Metadata(#[from] exif::Error),
}

/// A strategy for finding where a photo was taken.
#[async_trait]
pub trait CoordinateExtractor: Send + Sync {
    /// Short identifier used in log lines (e.g. `"metadata"`).
    fn name(&self) -> &str;

    /// Resolves the coordinate for `image_bytes`.
    ///
    /// Returns `Ok(None)` when no location is available.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] only when the source data is present but
    /// unreadable. Absence and positioning failures are `Ok(None)`.
    async fn extract(&self, image_bytes: &[u8]) -> Result<Option<GeoCoordinate>, ExtractError>;
}
