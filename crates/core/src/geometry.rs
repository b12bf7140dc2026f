//! Coordinate mapping between the on-screen viewport and the source image.
//!
//! The selector works in viewport space: the image is fit into a bounding
//! box while keeping its aspect ratio, and every pointer coordinate is
//! relative to that box. Exporting maps the selection back to native pixels
//! with per-axis scale factors.

use crate::error::{AppError, Result};

/// Share of each viewport dimension left as margin around the default selection.
const DEFAULT_MARGIN: f32 = 0.1;

/// The on-screen surface the image is fit into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Fits `native_width x native_height` into `max_width x max_height`.
    ///
    /// Width is tried at its maximum first; if the resulting height overflows,
    /// height is pinned to its maximum instead. The aspect ratio is always
    /// preserved and at least one dimension touches its maximum.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidDimensions`] if any input is not a positive,
    /// finite number.
    pub fn fit(native_width: f32, native_height: f32, max_width: f32, max_height: f32) -> Result<Self> {
        ensure_positive(native_width, native_height)?;
        ensure_positive(max_width, max_height)?;

        let aspect_ratio = native_width / native_height;

        let mut width = max_width;
        let mut height = max_width / aspect_ratio;

        if height > max_height {
            height = max_height;
            width = max_height * aspect_ratio;
        }

        Ok(Self { width, height })
    }

    /// Size of the raster surface backing this viewport.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }

    /// Per-axis ratio of native resolution to viewport resolution.
    pub fn scale_factors(&self, native_width: u32, native_height: u32) -> ScaleFactors {
        ScaleFactors {
            x: native_width as f32 / self.width,
            y: native_height as f32 / self.height,
        }
    }
}

/// Multipliers from viewport space to native image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
}

/// The user-manipulated rectangle, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SelectionRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The centered box covering 80% of each viewport dimension.
    pub fn centered_default(viewport: &Viewport) -> Self {
        Self {
            x: viewport.width * DEFAULT_MARGIN,
            y: viewport.height * DEFAULT_MARGIN,
            width: viewport.width * (1.0 - 2.0 * DEFAULT_MARGIN),
            height: viewport.height * (1.0 - 2.0 * DEFAULT_MARGIN),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Moves the top-left corner to `(x, y)`, keeping the whole rectangle
    /// inside the viewport. Size is untouched.
    pub fn move_to_clamped(&mut self, x: f32, y: f32, viewport: &Viewport) {
        self.x = x.min(viewport.width - self.width).max(0.0);
        self.y = y.min(viewport.height - self.height).max(0.0);
    }

    /// Pulls the rectangle back inside the viewport, shrinking it only when
    /// it is larger than the viewport itself.
    pub fn clamp_to(&mut self, viewport: &Viewport) {
        self.width = self.width.min(viewport.width);
        self.height = self.height.min(viewport.height);
        self.move_to_clamped(self.x, self.y, viewport);
    }

    pub fn is_within(&self, viewport: &Viewport) -> bool {
        const EPSILON: f32 = 1e-3;
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= viewport.width + EPSILON
            && self.bottom() <= viewport.height + EPSILON
    }

    /// Maps this rectangle onto the native pixel grid.
    ///
    /// The region size is `round(width * scale)` per axis, capped at the
    /// image size; the origin is rounded the same way and then pulled in so
    /// the region never leaves the image.
    pub fn to_native(&self, scale: ScaleFactors, native_width: u32, native_height: u32) -> CropRegion {
        let width = scaled(self.width, scale.x).min(native_width);
        let height = scaled(self.height, scale.y).min(native_height);
        let x = scaled(self.x, scale.x).min(native_width - width);
        let y = scaled(self.y, scale.y).min(native_height - height);

        CropRegion::new(x, y, width, height)
    }
}

/// Rectangular region of the source image, in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check if region has valid dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

fn scaled(value: f32, factor: f32) -> u32 {
    (value * factor).round().max(0.0) as u32
}

fn ensure_positive(width: f32, height: f32) -> Result<()> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(AppError::InvalidDimensions { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-3;

    #[test]
    fn wide_image_is_limited_by_width() {
        let viewport = Viewport::fit(1000.0, 500.0, 600.0, 400.0).unwrap();
        assert_eq!(viewport, Viewport { width: 600.0, height: 300.0 });

        let scale = viewport.scale_factors(1000, 500);
        assert!((scale.x - 1.6667).abs() < TOLERANCE);
        assert!((scale.y - 1.6667).abs() < TOLERANCE);
    }

    #[test]
    fn square_image_is_limited_by_height() {
        let viewport = Viewport::fit(400.0, 400.0, 700.0, 500.0).unwrap();
        assert_eq!(viewport, Viewport { width: 500.0, height: 500.0 });

        let rect = SelectionRect::centered_default(&viewport);
        assert_eq!(rect, SelectionRect::new(50.0, 50.0, 400.0, 400.0));
    }

    #[test]
    fn fit_respects_box_and_aspect_ratio() {
        let natives = [
            (1.0, 1.0),
            (3000.0, 20.0),
            (20.0, 3000.0),
            (1920.0, 1080.0),
            (1080.0, 1920.0),
            (601.0, 399.0),
            (7.0, 5.0),
        ];
        let boxes = [(600.0, 400.0), (700.0, 500.0), (100.0, 900.0), (1.0, 1.0)];

        for &(nw, nh) in &natives {
            for &(mw, mh) in &boxes {
                let v = Viewport::fit(nw, nh, mw, mh).unwrap();
                assert!(v.width <= mw + TOLERANCE, "{nw}x{nh} in {mw}x{mh}: {v:?}");
                assert!(v.height <= mh + TOLERANCE, "{nw}x{nh} in {mw}x{mh}: {v:?}");

                let expected = nw / nh;
                let actual = v.width / v.height;
                assert!(
                    ((actual - expected) / expected).abs() < 1e-4,
                    "{nw}x{nh} in {mw}x{mh}: ratio {actual} != {expected}"
                );

                let touches = (v.width - mw).abs() < TOLERANCE || (v.height - mh).abs() < TOLERANCE;
                assert!(touches, "{nw}x{nh} in {mw}x{mh}: {v:?}");
            }
        }
    }

    #[test]
    fn fit_rejects_degenerate_input() {
        assert!(Viewport::fit(0.0, 10.0, 600.0, 400.0).is_err());
        assert!(Viewport::fit(10.0, -1.0, 600.0, 400.0).is_err());
        assert!(Viewport::fit(10.0, 10.0, 0.0, 400.0).is_err());
        assert!(Viewport::fit(f32::NAN, 10.0, 600.0, 400.0).is_err());
    }

    #[test]
    fn export_region_scales_selection() {
        let viewport = Viewport::fit(1000.0, 500.0, 600.0, 400.0).unwrap();
        let scale = viewport.scale_factors(1000, 500);
        let rect = SelectionRect::new(60.0, 30.0, 300.0, 150.0);

        assert_eq!(rect.to_native(scale, 1000, 500), CropRegion::new(100, 50, 500, 250));
    }

    #[test]
    fn native_region_never_leaves_the_image() {
        let viewport = Viewport::fit(1001.0, 333.0, 600.0, 400.0).unwrap();
        let scale = viewport.scale_factors(1001, 333);
        let mut rect = SelectionRect::centered_default(&viewport);
        rect.move_to_clamped(f32::MAX, f32::MAX, &viewport);

        let region = rect.to_native(scale, 1001, 333);
        assert!(region.is_valid());
        assert!(region.x + region.width <= 1001);
        assert!(region.y + region.height <= 333);
    }

    #[test]
    fn move_clamps_to_each_edge() {
        let viewport = Viewport { width: 600.0, height: 300.0 };
        let mut rect = SelectionRect::new(10.0, 10.0, 200.0, 100.0);

        rect.move_to_clamped(-50.0, -50.0, &viewport);
        assert_eq!((rect.x, rect.y), (0.0, 0.0));

        rect.move_to_clamped(1000.0, 1000.0, &viewport);
        assert_eq!((rect.x, rect.y), (400.0, 200.0));
        assert_eq!((rect.width, rect.height), (200.0, 100.0));
    }

    #[test]
    fn oversized_rect_is_shrunk_into_viewport() {
        let viewport = Viewport { width: 100.0, height: 50.0 };
        let mut rect = SelectionRect::new(-5.0, 10.0, 300.0, 20.0);
        rect.clamp_to(&viewport);
        assert_eq!(rect, SelectionRect::new(0.0, 10.0, 100.0, 20.0));
        assert!(rect.is_within(&viewport));
    }
}
