#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone filter rendering.
//!
//! A render decodes the photo, draws it as the bottom layer of a
//! [`canvas::Canvas`] sized to the photo's native dimensions, applies the
//! zone's filter on top, flattens, and encodes a JPEG. The canvas and the
//! decoded buffers are owned values, so they are released on every exit
//! path, including errors.
//!
//! Rendering is CPU-bound; [`Compositor`] runs it on the blocking pool.

pub mod adjust;
pub mod canvas;

use std::sync::Arc;

use geofilter_zone_models::{FilterKind, FilterSpec};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, RgbImage};
use thiserror::Error;

use crate::adjust::Adjustment;
use crate::canvas::Canvas;

/// JPEG quality used for every rendered photo.
pub const JPEG_QUALITY: u8 = 90;

/// MIME type of rendered output.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(#[source] ImageError),

    /// The flattened canvas could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(#[source] ImageError),

    /// The blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An encoded image ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Pixel dimensions, when known.
    pub dimensions: Option<(u32, u32)>,
}

impl EncodedImage {
    /// Wraps bytes that could not be decoded, unchanged.
    #[must_use]
    pub fn original(bytes: &[u8]) -> Self {
        let content_type = image::guess_format(bytes)
            .map_or("application/octet-stream", |format| format.to_mime_type());
        Self {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
            dimensions: None,
        }
    }

    /// Whether this is a rendered JPEG (as opposed to untouched bytes).
    #[must_use]
    pub fn is_jpeg(&self) -> bool {
        self.content_type == JPEG_CONTENT_TYPE
    }
}

/// Decodes `bytes`, guessing the container format from its signature.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the format is unknown or the data is
/// corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    image::load_from_memory(bytes).map_err(RenderError::Decode)
}

/// Renders synchronously. `None` re-encodes without a filter.
///
/// # Errors
///
/// Returns [`RenderError`] if decoding or encoding fails.
pub fn render_blocking(
    bytes: &[u8],
    filter: Option<&FilterSpec>,
    quality: u8,
) -> Result<EncodedImage, RenderError> {
    let base = decode(bytes)?;
    let (width, height) = (base.width(), base.height());
    log::debug!("Decoded {width}x{height} image");

    let mut canvas = Canvas::new(width, height);
    canvas.place_base(base);

    if let Some(filter) = filter {
        apply_filter(&mut canvas, filter);
    }

    let flat = canvas.flatten();
    let bytes = encode_jpeg(&flat, quality)?;
    log::debug!("Encoded {} bytes at quality {quality}", bytes.len());

    Ok(EncodedImage {
        bytes,
        content_type: JPEG_CONTENT_TYPE.to_string(),
        dimensions: Some((width, height)),
    })
}

fn apply_filter(canvas: &mut Canvas, filter: &FilterSpec) {
    match (filter.kind, filter.color) {
        (FilterKind::Overlay, Some(color)) => {
            log::debug!("Applying overlay {color}");
            canvas.fill(color);
        }
        (FilterKind::Overlay, None) => {
            log::warn!("Overlay filter has no color, leaving image unchanged");
        }
        (kind, _) => {
            if let Some(adjustment) = Adjustment::for_filter(filter) {
                log::debug!("Applying {kind} filter");
                canvas.adjust(&adjustment);
            }
        }
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .map_err(RenderError::Encode)?;
    Ok(bytes)
}

/// Runs renders on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    quality: u8,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }
}

impl Compositor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the JPEG quality, clamped to `1..=100`.
    #[must_use]
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    #[must_use]
    pub const fn quality(&self) -> u8 {
        self.quality
    }

    /// Renders `image` with `filter` applied.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the image cannot be decoded or encoded, or
    /// if the render task dies.
    pub async fn render(
        &self,
        image: Arc<[u8]>,
        filter: &FilterSpec,
    ) -> Result<EncodedImage, RenderError> {
        let quality = self.quality;
        let filter = *filter;
        tokio::task::spawn_blocking(move || render_blocking(&image, Some(&filter), quality)).await?
    }

    /// Decodes and re-encodes `image` without any filter.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the image cannot be decoded or encoded, or
    /// if the render task dies.
    pub async fn reencode(&self, image: Arc<[u8]>) -> Result<EncodedImage, RenderError> {
        let quality = self.quality;
        tokio::task::spawn_blocking(move || render_blocking(&image, None, quality)).await?
    }
}
