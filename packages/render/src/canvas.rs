//! In-memory layered canvas.
//!
//! Layers are composited eagerly: each call draws onto the single RGBA
//! buffer the canvas owns, so dropping the canvas releases everything it
//! holds regardless of how rendering exits.

use geofilter_zone_models::RgbaColor;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

use crate::adjust::{Adjustment, lerp, to_channel};

/// A fixed-size RGBA drawing surface that starts fully transparent.
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Creates a transparent canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Draws `base` as the bottom layer with its top-left corner at
    /// `(0, 0)`, scaled to fill the canvas if its size differs.
    pub fn place_base(&mut self, base: DynamicImage) {
        let (width, height) = (self.width(), self.height());
        let layer = if base.width() == width && base.height() == height {
            base.into_rgba8()
        } else {
            log::debug!(
                "Scaling base layer {}x{} to canvas {width}x{height}",
                base.width(),
                base.height()
            );
            imageops::resize(&base.into_rgba8(), width, height, FilterType::Triangle)
        };
        imageops::overlay(&mut self.pixels, &layer, 0, 0);
    }

    /// Composites a rectangle of `color` covering the whole canvas. The
    /// color's alpha is the overlay strength.
    pub fn fill(&mut self, color: RgbaColor) {
        let top_alpha = color.a.clamp(0.0, 1.0);
        if top_alpha <= 0.0 {
            return;
        }
        let top = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];

        for pixel in self.pixels.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let bottom_alpha = f32::from(a) / 255.0;
            let bottom_weight = bottom_alpha * (1.0 - top_alpha);
            let out_alpha = top_alpha + bottom_weight;

            let bottom = [f32::from(r), f32::from(g), f32::from(b)];
            for (channel, (&src, &dst)) in bottom.iter().zip(&top).enumerate() {
                let mixed = dst.mul_add(top_alpha, src * bottom_weight) / out_alpha;
                pixel.0[channel] = to_channel(mixed);
            }
            pixel.0[3] = to_channel(out_alpha * 255.0);
        }
    }

    /// Applies a per-pixel transform to everything drawn so far.
    pub fn adjust(&mut self, adjustment: &Adjustment) {
        for pixel in self.pixels.pixels_mut() {
            adjustment.apply(pixel);
        }
    }

    /// Collapses all layers into an opaque RGB image, compositing any
    /// remaining transparency over black.
    #[must_use]
    pub fn flatten(self) -> RgbImage {
        let mut flat = RgbImage::new(self.width(), self.height());
        for (dst, src) in flat.pixels_mut().zip(self.pixels.pixels()) {
            let [r, g, b, a] = src.0;
            let alpha = f32::from(a) / 255.0;
            *dst = Rgb([
                to_channel(lerp(0.0, f32::from(r), alpha)),
                to_channel(lerp(0.0, f32::from(g), alpha)),
                to_channel(lerp(0.0, f32::from(b), alpha)),
            ]);
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(px)))
    }

    #[test]
    fn base_fills_canvas_exactly() {
        let mut canvas = Canvas::new(6, 4);
        canvas.place_base(solid(6, 4, [10, 20, 30, 255]));
        let flat = canvas.flatten();
        assert_eq!(flat.dimensions(), (6, 4));
        assert!(flat.pixels().all(|p| p.0 == [10, 20, 30]));
    }

    #[test]
    fn mismatched_base_is_scaled_to_canvas() {
        let mut canvas = Canvas::new(8, 8);
        canvas.place_base(solid(2, 2, [90, 90, 90, 255]));
        let flat = canvas.flatten();
        assert_eq!(flat.dimensions(), (8, 8));
        for (x, y) in [(0, 0), (7, 7), (3, 5)] {
            let px = flat.get_pixel(x, y).0;
            assert!(px.iter().all(|&c| c.abs_diff(90) <= 1), "({x}, {y}): {px:?}");
        }
    }

    #[test]
    fn fill_blends_by_alpha_over_opaque_base() {
        let mut canvas = Canvas::new(3, 3);
        canvas.place_base(solid(3, 3, [200, 100, 40, 255]));
        canvas.fill(RgbaColor::new(0, 0, 255, 0.25));
        let flat = canvas.flatten();
        // 200*0.75, 100*0.75, 40*0.75 + 255*0.25
        assert_eq!(flat.get_pixel(1, 1).0, [150, 75, 94]);
    }

    #[test]
    fn transparent_fill_is_a_no_op() {
        let mut canvas = Canvas::new(2, 2);
        canvas.place_base(solid(2, 2, [1, 2, 3, 255]));
        canvas.fill(RgbaColor::new(255, 255, 255, 0.0));
        assert_eq!(canvas.flatten().get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn fill_on_empty_canvas_keeps_its_alpha() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill(RgbaColor::new(255, 0, 0, 0.5));
        // Half-transparent red over black.
        assert_eq!(canvas.flatten().get_pixel(0, 0).0, [128, 0, 0]);
    }

    #[test]
    fn transparent_base_flattens_to_black() {
        let mut canvas = Canvas::new(2, 2);
        canvas.place_base(solid(2, 2, [255, 255, 255, 0]));
        assert_eq!(canvas.flatten().get_pixel(1, 0).0, [0, 0, 0]);
    }
}
