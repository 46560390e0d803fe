//! Fixture builders for photos with (and without) an EXIF GPS block.
//!
//! Compiled for this crate's tests and, through the `test-support`
//! feature, for downstream crates' tests.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

const DMS_DENOMINATOR: u32 = 10_000;

fn dms_field(tag: Tag, dms: [f64; 3]) -> Field {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rationals = dms
        .iter()
        .map(|v| Rational {
            num: (v * f64::from(DMS_DENOMINATOR)).round() as u32,
            denom: DMS_DENOMINATOR,
        })
        .collect();
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(rationals),
    }
}

fn ascii_field(tag: Tag, s: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![s.as_bytes().to_vec()]),
    }
}

/// Builds a bare TIFF/EXIF block carrying the four GPS position fields.
///
/// # Errors
///
/// Returns an error if the EXIF writer rejects the fields.
pub fn tiff_with_gps(
    lat: [f64; 3],
    lat_ref: &str,
    lng: [f64; 3],
    lng_ref: &str,
) -> Result<Vec<u8>, exif::Error> {
    let fields = [
        ascii_field(Tag::Make, "geofilter"),
        dms_field(Tag::GPSLatitude, lat),
        ascii_field(Tag::GPSLatitudeRef, lat_ref),
        dms_field(Tag::GPSLongitude, lng),
        ascii_field(Tag::GPSLongitudeRef, lng_ref),
    ];

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false)?;
    Ok(buf.into_inner())
}

/// Inserts an `APP1` EXIF segment with the given GPS position right after
/// the SOI marker of `jpeg`.
///
/// # Errors
///
/// Returns an error if `jpeg` does not start with a JPEG SOI marker or the
/// EXIF block cannot be built.
pub fn with_gps_exif(
    jpeg: &[u8],
    lat: [f64; 3],
    lat_ref: &str,
    lng: [f64; 3],
    lng_ref: &str,
) -> Result<Vec<u8>, exif::Error> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(exif::Error::InvalidFormat("not a JPEG stream"));
    }

    let tiff = tiff_with_gps(lat, lat_ref, lng, lng_ref)?;
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let segment_len = u16::try_from(payload.len() + 2)
        .map_err(|_| exif::Error::TooBig("EXIF block does not fit in one APP1 segment"))?;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    Ok(out)
}

/// Encodes a solid-color JPEG with no metadata.
///
/// # Panics
///
/// Panics if the in-memory JPEG encode fails.
#[must_use]
pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([120, 140, 160]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .expect("in-memory JPEG encode");
    buf.into_inner()
}
