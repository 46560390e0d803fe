#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic zone, coordinate, and filter specification types.
//!
//! These types are shared by the zone registry, the coordinate extractors,
//! the image compositor, and the pipeline orchestrator. Zones are
//! deserialized from TOML at process start and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors produced when constructing or validating model values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Latitude outside `[-90, 90]` or longitude outside `[-180, 180]`.
    #[error("coordinate out of range: lat={lat}, lng={lng}")]
    CoordinateOutOfRange {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// A color string could not be parsed.
    #[error("invalid color '{value}': {reason}")]
    InvalidColor {
        /// The raw color string.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Filter intensity outside `[0, 1]`.
    #[error("intensity {value} is outside [0, 1]")]
    InvalidIntensity {
        /// The rejected intensity.
        value: f32,
    },

    /// Zone definition is structurally invalid.
    #[error("invalid zone '{name}': {reason}")]
    InvalidZone {
        /// Zone name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A WGS84 latitude/longitude pair in decimal degrees.
///
/// Immutable once constructed; the constructor enforces the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct GeoCoordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for GeoCoordinate {
    type Error = ModelError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl GeoCoordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CoordinateOutOfRange`] if `lat` is not in
    /// `[-90, 90]` or `lng` is not in `[-180, 180]`.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ModelError> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Ok(Self { lat, lng })
        } else {
            Err(ModelError::CoordinateOutOfRange { lat, lng })
        }
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// An RGB color with a fractional alpha channel.
///
/// Parsed from CSS-style strings: `rgba(34, 197, 94, 0.3)`, `rgb(1, 2, 3)`,
/// `#22c55e` or `#22c55e4d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbaColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f32,
}

impl RgbaColor {
    /// Creates a color, clamping `a` into `[0, 1]`.
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }
}

impl FromStr for RgbaColor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| ModelError::InvalidColor {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid("expected #rrggbb or #rrggbbaa"));
        }

        let (body, expect_alpha) = if let Some(rest) = trimmed.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = trimmed.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid("expected rgba(...), rgb(...) or #hex"));
        };

        let body = body
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing parenthesis"))?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();

        let expected = if expect_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid(&format!(
                "expected {expected} components, found {}",
                parts.len()
            )));
        }

        let channel = |p: &str| {
            p.parse::<u8>()
                .map_err(|_| invalid(&format!("channel '{p}' is not in 0-255")))
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;

        let a = if expect_alpha {
            let a: f32 = parts[3]
                .parse()
                .map_err(|_| invalid(&format!("alpha '{}' is not a number", parts[3])))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(invalid("alpha must be within [0, 1]"));
            }
            a
        } else {
            1.0
        };

        Ok(Self { r, g, b, a })
    }
}

fn parse_hex(hex: &str) -> Option<RgbaColor> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let a = if hex.len() == 8 {
        f32::from(byte(6)?) / 255.0
    } else {
        1.0
    };
    Some(RgbaColor {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        a,
    })
}

impl TryFrom<String> for RgbaColor {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RgbaColor> for String {
    fn from(color: RgbaColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for RgbaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// The visual effect a zone applies to matching photos.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterKind {
    /// Semi-transparent color rectangle over the whole frame.
    Overlay,
    /// Warm brown sepia toning.
    Sepia,
    /// Faded, color-shifted "old print" look.
    Vintage,
    /// Uniform brightness lift.
    Brightness,
}

/// Filter configuration attached to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Which effect to apply.
    pub kind: FilterKind,
    /// Overlay color. Its alpha carries the overlay strength.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RgbaColor>,
    /// Effect strength in `[0, 1]` for the per-pixel transforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

impl FilterSpec {
    /// An overlay filter with the given color.
    #[must_use]
    pub const fn overlay(color: RgbaColor) -> Self {
        Self {
            kind: FilterKind::Overlay,
            color: Some(color),
            intensity: Some(color.a),
        }
    }

    /// Returns the configured intensity or `default` when unset.
    #[must_use]
    pub fn intensity_or(&self, default: f32) -> f32 {
        self.intensity.unwrap_or(default)
    }

    /// Checks that the intensity, when present, lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIntensity`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self.intensity {
            Some(value) if !(0.0..=1.0).contains(&value) => {
                Err(ModelError::InvalidIntensity { value })
            }
            _ => Ok(()),
        }
    }
}

/// The geographic extent of a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneBoundary {
    /// Everything within `radius_km` great-circle kilometres of `center`.
    Circle {
        /// Circle center.
        center: GeoCoordinate,
        /// Radius in kilometres, strictly positive.
        radius_km: f64,
    },
    /// A closed ring of at least three vertices (implicitly closed).
    Polygon {
        /// Ring vertices in order.
        vertices: Vec<GeoCoordinate>,
    },
}

/// A named geographic zone with the filter applied to photos taken inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique, human-readable identifier (e.g. "Times Square, NYC").
    pub name: String,
    /// Geographic extent.
    pub boundary: ZoneBoundary,
    /// Filter applied on match.
    pub filter: FilterSpec,
}

impl Zone {
    /// Creates a circular zone.
    #[must_use]
    pub fn circle(
        name: impl Into<String>,
        center: GeoCoordinate,
        radius_km: f64,
        filter: FilterSpec,
    ) -> Self {
        Self {
            name: name.into(),
            boundary: ZoneBoundary::Circle { center, radius_km },
            filter,
        }
    }

    /// Creates a polygon zone.
    #[must_use]
    pub fn polygon(
        name: impl Into<String>,
        vertices: Vec<GeoCoordinate>,
        filter: FilterSpec,
    ) -> Self {
        Self {
            name: name.into(),
            boundary: ZoneBoundary::Polygon { vertices },
            filter,
        }
    }

    /// Validates the zone's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidZone`] for an empty name, a
    /// non-positive radius or a polygon with fewer than three vertices,
    /// and [`ModelError::InvalidIntensity`] for a bad filter intensity.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidZone {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }

        match &self.boundary {
            ZoneBoundary::Circle { radius_km, .. } => {
                if !radius_km.is_finite() || *radius_km <= 0.0 {
                    return Err(invalid("radius_km must be a positive number"));
                }
            }
            ZoneBoundary::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(invalid("polygon needs at least 3 vertices"));
                }
            }
        }

        self.filter.validate()
    }
}
