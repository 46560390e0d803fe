//! Per-pixel color transforms for the non-overlay filter kinds.

use geofilter_zone_models::{FilterKind, FilterSpec};
use image::Rgba;

/// Default brightness lift when a zone does not set an intensity.
pub const DEFAULT_BRIGHTNESS: f32 = 0.2;

/// Row-major 3x4 matrix: RGB weights plus an offset column.
pub type ColorMatrix = [[f32; 4]; 3];

/// Classic sepia weights. No offset column.
const SEPIA: ColorMatrix = [
    [0.393, 0.769, 0.189, 0.0],
    [0.349, 0.686, 0.168, 0.0],
    [0.272, 0.534, 0.131, 0.0],
];

/// Warm faded look. Offsets are in `[0, 1]` channel units.
const VINTAGE: ColorMatrix = [
    [0.627_93, 0.320_21, -0.039_65, 0.037_84],
    [0.025_78, 0.644_11, 0.032_59, 0.029_26],
    [0.046_6, -0.085_12, 0.524_16, 0.020_23],
];

/// A resolved, ready-to-apply pixel transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Mixes the matrix result with the source by `strength`.
    Matrix {
        matrix: ColorMatrix,
        strength: f32,
    },
    /// Adds `amount * 255` to every color channel.
    Brighten { amount: f32 },
}

impl Adjustment {
    /// Resolves the transform for `filter`, or `None` for overlays (which
    /// are drawn as a layer rather than a transform).
    #[must_use]
    pub fn for_filter(filter: &FilterSpec) -> Option<Self> {
        match filter.kind {
            FilterKind::Overlay => None,
            FilterKind::Sepia => Some(Self::Matrix {
                matrix: SEPIA,
                strength: filter.intensity_or(1.0),
            }),
            FilterKind::Vintage => Some(Self::Matrix {
                matrix: VINTAGE,
                strength: filter.intensity_or(1.0),
            }),
            FilterKind::Brightness => Some(Self::Brighten {
                amount: filter.intensity_or(DEFAULT_BRIGHTNESS),
            }),
        }
    }

    /// Transforms one pixel in place. Alpha is untouched.
    pub fn apply(&self, pixel: &mut Rgba<u8>) {
        let [r, g, b, _] = pixel.0;
        let src = [f32::from(r), f32::from(g), f32::from(b)];

        let out = match *self {
            Self::Matrix { matrix, strength } => {
                let strength = strength.clamp(0.0, 1.0);
                let mut out = [0.0; 3];
                for (slot, row) in out.iter_mut().zip(matrix.iter()) {
                    *slot = row[0].mul_add(src[0], row[1].mul_add(src[1], row[2] * src[2]))
                        + row[3] * 255.0;
                }
                [
                    lerp(src[0], out[0], strength),
                    lerp(src[1], out[1], strength),
                    lerp(src[2], out[2], strength),
                ]
            }
            Self::Brighten { amount } => {
                let lift = amount * 255.0;
                [src[0] + lift, src[1] + lift, src[2] + lift]
            }
        };

        pixel.0[0] = to_channel(out[0]);
        pixel.0[1] = to_channel(out[1]);
        pixel.0[2] = to_channel(out[2]);
    }
}

/// `from * (1 - t) + to * t`.
pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(t, from)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: FilterKind, intensity: Option<f32>) -> FilterSpec {
        FilterSpec {
            kind,
            color: None,
            intensity,
        }
    }

    #[test]
    fn overlay_has_no_pixel_transform() {
        let overlay = spec(FilterKind::Overlay, Some(0.3));
        assert_eq!(Adjustment::for_filter(&overlay), None);
    }

    #[test]
    fn full_sepia_on_gray() {
        let adjust = Adjustment::for_filter(&spec(FilterKind::Sepia, None)).unwrap();
        let mut px = Rgba([100, 100, 100, 255]);
        adjust.apply(&mut px);
        // Row sums 1.351, 1.203, 0.937.
        assert_eq!(px.0, [135, 120, 94, 255]);
    }

    #[test]
    fn sepia_saturates_on_white() {
        let adjust = Adjustment::for_filter(&spec(FilterKind::Sepia, None)).unwrap();
        let mut px = Rgba([255, 255, 255, 255]);
        adjust.apply(&mut px);
        assert_eq!(px.0[0], 255);
        assert_eq!(px.0[1], 255);
        assert_eq!(px.0[2], 239);
    }

    #[test]
    fn zero_intensity_is_identity() {
        for kind in [FilterKind::Sepia, FilterKind::Vintage, FilterKind::Brightness] {
            let adjust = Adjustment::for_filter(&spec(kind, Some(0.0))).unwrap();
            let mut px = Rgba([12, 200, 77, 128]);
            adjust.apply(&mut px);
            assert_eq!(px.0, [12, 200, 77, 128], "{kind}");
        }
    }

    #[test]
    fn half_sepia_is_halfway() {
        let adjust = Adjustment::for_filter(&spec(FilterKind::Sepia, Some(0.5))).unwrap();
        let mut px = Rgba([200, 200, 200, 255]);
        adjust.apply(&mut px);
        // Halfway between 200 and the unclamped (270.2, 240.6, 187.4).
        assert_eq!(px.0, [235, 220, 194, 255]);
    }

    #[test]
    fn brightness_lifts_and_clamps() {
        let adjust = Adjustment::for_filter(&spec(FilterKind::Brightness, None)).unwrap();
        let mut px = Rgba([10, 100, 240, 255]);
        adjust.apply(&mut px);
        assert_eq!(px.0, [61, 151, 255, 255]);
    }

    #[test]
    fn vintage_darkens_blue_channel() {
        let adjust = Adjustment::for_filter(&spec(FilterKind::Vintage, None)).unwrap();
        let mut px = Rgba([200, 200, 200, 255]);
        adjust.apply(&mut px);
        assert!(px.0[2] < px.0[0], "{:?}", px.0);
        assert!(px.0[2] < 200);
    }
}
