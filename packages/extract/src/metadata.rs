//! EXIF GPS extraction.
//!
//! Parsing is split in two: [`read_gps_tags`] decodes the container's
//! metadata block into a plain [`GpsTags`] map, and
//! [`GpsTags::coordinate`] turns that map into decimal degrees. The second
//! step is a pure function and is what the unit tests exercise directly.

use std::io::Cursor;

use async_trait::async_trait;
use exif::{In, Tag, Value};
use geofilter_zone_models::GeoCoordinate;

use crate::{CoordinateExtractor, ExtractError};

/// The four GPS fields needed to place a photo, as found in the metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsTags {
    /// Latitude as `[degrees, minutes, seconds]`.
    pub latitude: Option<[f64; 3]>,
    /// `"N"` or `"S"`.
    pub latitude_ref: Option<String>,
    /// Longitude as `[degrees, minutes, seconds]`.
    pub longitude: Option<[f64; 3]>,
    /// `"E"` or `"W"`.
    pub longitude_ref: Option<String>,
}

impl GpsTags {
    /// Converts the tags to a coordinate.
    ///
    /// Returns `None` if any of the four fields is missing or the result
    /// falls outside the valid latitude/longitude ranges.
    #[must_use]
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        let (Some(lat), Some(lat_ref), Some(lng), Some(lng_ref)) = (
            self.latitude,
            self.latitude_ref.as_deref(),
            self.longitude,
            self.longitude_ref.as_deref(),
        ) else {
            return None;
        };

        let lat = dms_to_decimal(lat, lat_ref);
        let lng = dms_to_decimal(lng, lng_ref);

        match GeoCoordinate::new(lat, lng) {
            Ok(coordinate) => Some(coordinate),
            Err(e) => {
                log::warn!("Discarding GPS metadata: {e}");
                None
            }
        }
    }
}

/// Converts degrees/minutes/seconds to signed decimal degrees.
///
/// The southern and western hemispheres (`"S"`, `"W"`) are negative.
#[must_use]
pub fn dms_to_decimal([degrees, minutes, seconds]: [f64; 3], reference: &str) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference.trim() {
        "S" | "s" | "W" | "w" => -decimal,
        _ => decimal,
    }
}

/// Extracts the GPS fields from a decoded EXIF block.
#[must_use]
pub fn gps_tags(exif: &exif::Exif) -> GpsTags {
    let rational_triple = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| dms_values(&field.value))
    };
    let ascii = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| first_ascii(&field.value))
    };

    GpsTags {
        latitude: rational_triple(Tag::GPSLatitude),
        latitude_ref: ascii(Tag::GPSLatitudeRef),
        longitude: rational_triple(Tag::GPSLongitude),
        longitude_ref: ascii(Tag::GPSLongitudeRef),
    }
}

/// Reads the GPS tags from an image container held in memory.
///
/// Returns `Ok(None)` when the container has no metadata block or is a
/// format the metadata reader does not understand.
///
/// # Errors
///
/// Returns [`ExtractError::Metadata`] when a metadata block is present but
/// unreadable. Individual malformed fields are skipped rather than failing
/// the whole block.
pub fn read_gps_tags(image_bytes: &[u8]) -> Result<Option<GpsTags>, ExtractError> {
    let mut cursor = Cursor::new(image_bytes);
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);

    match reader.read_from_container(&mut cursor) {
        Ok(exif) => Ok(Some(gps_tags(&exif))),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            log::debug!("Tolerating {} malformed EXIF fields", errors.len());
            Ok(Some(gps_tags(&exif)))
        }
        Err(exif::Error::NotFound(what)) => {
            log::debug!("No EXIF block found ({what})");
            Ok(None)
        }
        Err(exif::Error::InvalidFormat(what)) => {
            log::debug!("Container has no readable EXIF ({what})");
            Ok(None)
        }
        Err(e) => Err(ExtractError::Metadata(e)),
    }
}

/// Reads DMS values from a rational (or signed rational) array.
///
/// Missing minutes/seconds components count as zero.
fn dms_values(value: &Value) -> Option<[f64; 3]> {
    let parts: Vec<f64> = match value {
        Value::Rational(v) => v.iter().map(exif::Rational::to_f64).collect(),
        Value::SRational(v) => v.iter().map(exif::SRational::to_f64).collect(),
        _ => return None,
    };

    if parts.is_empty() || parts.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let mut dms = [0.0; 3];
    for (slot, part) in dms.iter_mut().zip(parts) {
        *slot = part;
    }
    Some(dms)
}

fn first_ascii(value: &Value) -> Option<String> {
    let Value::Ascii(strings) = value else {
        return None;
    };
    let s = String::from_utf8_lossy(strings.first()?).trim().to_string();
    (!s.is_empty()).then_some(s)
}

/// Extracts coordinates from the image's embedded EXIF GPS block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

#[async_trait]
impl CoordinateExtractor for MetadataExtractor {
    fn name(&self) -> &str {
        "metadata"
    }

    async fn extract(&self, image_bytes: &[u8]) -> Result<Option<GeoCoordinate>, ExtractError> {
        let Some(tags) = read_gps_tags(image_bytes)? else {
            return Ok(None);
        };

        log::debug!("EXIF GPS tags: {tags:?}");

        let coordinate = tags.coordinate();
        match coordinate {
            Some(c) => log::info!("Found GPS coordinates in metadata: {c}"),
            None => log::info!("No GPS data found in metadata"),
        }
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{plain_jpeg, tiff_with_gps, with_gps_exif};

    fn central_park_tags() -> GpsTags {
        GpsTags {
            latitude: Some([40.0, 46.0, 58.44]),
            latitude_ref: Some("N".to_string()),
            longitude: Some([73.0, 57.0, 55.56]),
            longitude_ref: Some("W".to_string()),
        }
    }

    #[test]
    fn converts_dms_with_hemisphere() {
        let c = central_park_tags().coordinate().unwrap();
        assert!((c.lat() - 40.7829).abs() < 1e-3, "lat {}", c.lat());
        assert!((c.lng() - -73.9654).abs() < 1e-3, "lng {}", c.lng());
    }

    #[test]
    fn southern_and_eastern_hemispheres() {
        assert!((dms_to_decimal([33.0, 51.0, 54.0], "S") - -33.865).abs() < 1e-9);
        assert!((dms_to_decimal([151.0, 12.0, 36.0], "E") - 151.21).abs() < 1e-9);
        assert!((dms_to_decimal([1.0, 30.0, 0.0], "N") - 1.5).abs() < 1e-9);
    }

    #[test]
    fn any_missing_field_means_no_coordinate() {
        let full = central_park_tags();

        let mut t = full.clone();
        t.latitude = None;
        assert_eq!(t.coordinate(), None);

        let mut t = full.clone();
        t.latitude_ref = None;
        assert_eq!(t.coordinate(), None);

        let mut t = full.clone();
        t.longitude = None;
        assert_eq!(t.coordinate(), None);

        let mut t = full;
        t.longitude_ref = None;
        assert_eq!(t.coordinate(), None);
    }

    #[test]
    fn out_of_range_metadata_is_discarded() {
        let tags = GpsTags {
            latitude: Some([95.0, 0.0, 0.0]),
            ..central_park_tags()
        };
        assert_eq!(tags.coordinate(), None);
    }

    #[test]
    fn reads_gps_block_from_tiff() {
        let tiff = tiff_with_gps([40.0, 46.0, 58.44], "N", [73.0, 57.0, 55.56], "W").unwrap();
        let tags = read_gps_tags(&tiff).unwrap().unwrap();
        assert_eq!(tags.latitude_ref.as_deref(), Some("N"));
        assert_eq!(tags.longitude_ref.as_deref(), Some("W"));
        let c = tags.coordinate().unwrap();
        assert!((c.lat() - 40.7829).abs() < 1e-3);
        assert!((c.lng() - -73.9654).abs() < 1e-3);
    }

    #[tokio::test]
    async fn extracts_from_jpeg_app1_segment() {
        let jpeg = with_gps_exif(
            &plain_jpeg(16, 16),
            [37.0, 49.0, 11.64],
            "N",
            [122.0, 28.0, 41.88],
            "W",
        )
        .unwrap();
        let c = MetadataExtractor.extract(&jpeg).await.unwrap().unwrap();
        assert!((c.lat() - 37.8199).abs() < 1e-3);
        assert!((c.lng() - -122.4783).abs() < 1e-3);
    }

    #[tokio::test]
    async fn jpeg_without_exif_has_no_coordinate() {
        let jpeg = plain_jpeg(8, 8);
        assert_eq!(MetadataExtractor.extract(&jpeg).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_container_has_no_coordinate() {
        let result = MetadataExtractor.extract(b"definitely not an image").await;
        assert!(matches!(result, Ok(None)), "got {result:?}");
    }
}
