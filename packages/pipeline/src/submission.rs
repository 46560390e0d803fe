//! The result of one photo submission.

use std::fmt;
use std::sync::Arc;

use geofilter_render::EncodedImage;
use geofilter_zone_models::GeoCoordinate;

/// What the pipeline concluded about where a photo was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOutcome {
    /// Inside the named zone; the rendered image carries its filter.
    Matched(String),
    /// No coordinate could be determined.
    NoCoordinate,
    /// A coordinate was found but no zone contains it.
    OutsideZones,
    /// Extraction or rendering failed.
    ProcessingFailed,
}

impl ZoneOutcome {
    /// The matched zone's name, if any.
    #[must_use]
    pub fn zone_name(&self) -> Option<&str> {
        match self {
            Self::Matched(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the rendered image has a zone filter applied.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

impl fmt::Display for ZoneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(name) => f.write_str(name),
            Self::NoCoordinate => f.write_str("No Location Data"),
            Self::OutsideZones => f.write_str("Outside Special Zones"),
            Self::ProcessingFailed => f.write_str("Processing Error"),
        }
    }
}

/// A completed submission: the original photo plus everything derived
/// from it.
///
/// Dropping the submission releases the original and rendered buffers.
#[derive(Debug, Clone)]
pub struct PhotoSubmission {
    /// File name the photo was submitted under.
    pub original_name: String,
    /// The photo as submitted.
    pub image: Arc<[u8]>,
    /// Where the photo was taken, if known.
    pub coordinate: Option<GeoCoordinate>,
    /// Zone match result or sentinel.
    pub outcome: ZoneOutcome,
    /// Filtered or pass-through output, always displayable.
    pub rendered: EncodedImage,
}

impl PhotoSubmission {
    /// Whether the output carries a zone filter.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.outcome.is_filtered()
    }
}
