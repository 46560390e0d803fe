//! Machine-readable result of a run.

use std::path::Path;

use geofilter_pipeline::PhotoSubmission;
use serde::Serialize;

/// Coordinate rounded to four decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundedCoordinate {
    pub lat: f64,
    pub lng: f64,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub file: String,
    pub strategy: String,
    pub zone: String,
    pub filtered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<RoundedCoordinate>,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub output: Option<String>,
}

impl Summary {
    #[must_use]
    pub fn new(submission: &PhotoSubmission, strategy: &str, output: Option<&Path>) -> Self {
        let (width, height) = submission.rendered.dimensions.unzip();
        Self {
            file: submission.original_name.clone(),
            strategy: strategy.to_string(),
            zone: submission.outcome.to_string(),
            filtered: submission.is_filtered(),
            coordinate: submission.coordinate.map(|c| RoundedCoordinate {
                lat: round4(c.lat()),
                lng: round4(c.lng()),
            }),
            content_type: submission.rendered.content_type.clone(),
            width,
            height,
            output: output.map(|p| p.display().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use geofilter_pipeline::{EncodedImage, ZoneOutcome};
    use geofilter_zone_models::GeoCoordinate;

    fn submission(outcome: ZoneOutcome, coordinate: Option<GeoCoordinate>) -> PhotoSubmission {
        PhotoSubmission {
            original_name: "walk.jpg".to_string(),
            image: Arc::from(&[0u8; 4][..]),
            coordinate,
            outcome,
            rendered: EncodedImage {
                bytes: vec![0xFF, 0xD8],
                content_type: "image/jpeg".to_string(),
                dimensions: Some((640, 480)),
            },
        }
    }

    #[test]
    fn matched_summary_serializes() {
        let coordinate = GeoCoordinate::new(40.782_912_3, -73.965_447_8).unwrap();
        let s = Summary::new(
            &submission(
                ZoneOutcome::Matched("Central Park, NYC".to_string()),
                Some(coordinate),
            ),
            "metadata",
            Some(Path::new("out/filtered_walk_1.jpg")),
        );

        let json: serde_json::Value = serde_json::to_value(&s).unwrap();
        assert_eq!(json["zone"], "Central Park, NYC");
        assert_eq!(json["filtered"], true);
        assert_eq!(json["coordinate"]["lat"], 40.7829);
        assert_eq!(json["coordinate"]["lng"], -73.9654);
        assert_eq!(json["width"], 640);
        assert_eq!(json["output"], "out/filtered_walk_1.jpg");
    }

    #[test]
    fn sentinel_summary_omits_coordinate() {
        let s = Summary::new(&submission(ZoneOutcome::NoCoordinate, None), "live", None);
        let json: serde_json::Value = serde_json::to_value(&s).unwrap();
        assert_eq!(json["zone"], "No Location Data");
        assert_eq!(json["filtered"], false);
        assert!(json.get("coordinate").is_none());
        assert!(json["output"].is_null());
    }
}
