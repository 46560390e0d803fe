#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone registry and zone matching.
//!
//! The [`registry`] holds the fixed catalog of named zones, loaded once at
//! process start from TOML embedded at compile time (or from a file handed
//! in by the caller). The [`matcher`] answers "which zone, if any, contains
//! this coordinate" using great-circle distance for circular zones and
//! point-in-polygon containment for polygon zones.

pub mod distance;
pub mod matcher;
pub mod registry;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use matcher::ZoneMatcher;
pub use registry::ZoneRegistry;

use geofilter_zone_models::ModelError;
use thiserror::Error;

/// Errors that can occur while building the zone registry.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// A zone definition failed validation.
    #[error("Invalid zone definition: {0}")]
    Model(#[from] ModelError),

    /// Zone TOML could not be parsed.
    #[error("Zone TOML parse error in '{source_name}': {message}")]
    Parse {
        /// Which file or embedded table failed.
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// Two zones share the same name.
    #[error("Duplicate zone name: {name}")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// Reading a zone file from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
