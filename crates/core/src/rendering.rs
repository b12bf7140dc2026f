//! Frame rendering for the region selector.
//!
//! Frames are plain `RgbaImage`s so they can be shown by any surface (the
//! eframe window uploads them as a texture, the CLI writes them as PNG).
//! Rendering is a pure function of the scaled backdrop, the selection and
//! the theme style.

use crate::geometry::{SelectionRect, Viewport};
use crate::theme::ThemeStyle;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

const OVERLAY: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Peak opacity of the innermost halo ring.
const GLOW_STRENGTH: f32 = 0.35;

/// Scales the source image to exactly fill the viewport.
///
/// This is the one full-size pass; every frame afterwards starts from the
/// returned backdrop.
pub fn scale_to_viewport(image: &DynamicImage, viewport: &Viewport) -> RgbaImage {
    let (width, height) = viewport.pixel_size();
    image.resize_exact(width, height, FilterType::Triangle).to_rgba8()
}

/// Draws one frame: dimmed backdrop with a clear window over the selection,
/// then the border and the four corner handles.
pub fn render_frame(backdrop: &RgbaImage, selection: &SelectionRect, style: &ThemeStyle) -> RgbaImage {
    let mut frame = backdrop.clone();

    draw_selection_overlay(&mut frame, selection, style.overlay_alpha);

    if style.border_glow > 0.0 {
        draw_glow(&mut frame, selection, style.border_width / 2.0, style.border_glow, style.accent);
    }
    draw_selection_border(&mut frame, selection, style.border_width, style.accent);
    draw_corner_handles(&mut frame, selection, style);

    frame
}

/// Dims everything outside `selection`.
///
/// The overlay is laid down as four bands (above, below, left, right) so the
/// selection itself is never touched and stays a crisp window.
pub fn draw_selection_overlay(frame: &mut RgbaImage, selection: &SelectionRect, alpha: f32) {
    let (w, h) = (frame.width() as f32, frame.height() as f32);

    // Top region (above selection)
    fill_rect(frame, 0.0, 0.0, w, selection.y, OVERLAY, alpha);
    // Bottom region (below selection)
    fill_rect(frame, 0.0, selection.bottom(), w, h, OVERLAY, alpha);
    // Left region (between top and bottom)
    fill_rect(frame, 0.0, selection.y, selection.x, selection.bottom(), OVERLAY, alpha);
    // Right region (between top and bottom)
    fill_rect(frame, selection.right(), selection.y, w, selection.bottom(), OVERLAY, alpha);
}

/// Strokes a border of `stroke_width` centered on the selection edges.
pub fn draw_selection_border(frame: &mut RgbaImage, selection: &SelectionRect, stroke_width: f32, color: Rgba<u8>) {
    let half = stroke_width / 2.0;
    stroke_ring(frame, selection, -half, half, color, 1.0);
}

/// Fills a square handle centered on each corner of the selection.
pub fn draw_corner_handles(frame: &mut RgbaImage, selection: &SelectionRect, style: &ThemeStyle) {
    for (cx, cy) in corners(selection) {
        let handle = handle_rect(cx, cy, style.handle_size);

        if style.handle_glow > 0.0 {
            draw_glow(frame, &handle, 0.0, style.handle_glow, style.accent);
        }
        fill_rect(
            frame,
            handle.x,
            handle.y,
            handle.right(),
            handle.bottom(),
            style.accent,
            1.0,
        );
    }
}

/// Square of side `size` centered on `(cx, cy)`.
pub fn handle_rect(cx: f32, cy: f32, size: f32) -> SelectionRect {
    let half = size / 2.0;
    SelectionRect::new(cx - half, cy - half, size, size)
}

/// Corners in top-left, top-right, bottom-left, bottom-right order.
pub fn corners(rect: &SelectionRect) -> [(f32, f32); 4] {
    [
        (rect.x, rect.y),
        (rect.right(), rect.y),
        (rect.x, rect.bottom()),
        (rect.right(), rect.bottom()),
    ]
}

/// Soft halo outside `rect`, made of 1px rings fading with distance.
fn draw_glow(frame: &mut RgbaImage, rect: &SelectionRect, offset: f32, radius: f32, color: Rgba<u8>) {
    let rings = radius.round() as u32;
    for ring in 1..=rings {
        let falloff = 1.0 - ring as f32 / (rings as f32 + 1.0);
        let outer = offset + ring as f32;
        stroke_ring(frame, rect, outer - 1.0, outer, color, GLOW_STRENGTH * falloff);
    }
}

/// Paints the band between `rect` grown by `inner` and `rect` grown by `outer`.
fn stroke_ring(frame: &mut RgbaImage, rect: &SelectionRect, inner: f32, outer: f32, color: Rgba<u8>, alpha: f32) {
    let (ox0, oy0, ox1, oy1) = (rect.x - outer, rect.y - outer, rect.right() + outer, rect.bottom() + outer);
    let (ix0, iy0, ix1, iy1) = (rect.x - inner, rect.y - inner, rect.right() + inner, rect.bottom() + inner);

    fill_rect(frame, ox0, oy0, ox1, iy0, color, alpha);
    fill_rect(frame, ox0, iy1, ox1, oy1, color, alpha);
    fill_rect(frame, ox0, iy0, ix0, iy1, color, alpha);
    fill_rect(frame, ix1, iy0, ox1, iy1, color, alpha);
}

/// Blends `color` over the pixels whose rounded span is `[x0, x1) x [y0, y1)`.
fn fill_rect(frame: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>, alpha: f32) {
    let (px0, px1) = pixel_span(x0, x1, frame.width());
    let (py0, py1) = pixel_span(y0, y1, frame.height());

    for y in py0..py1 {
        for x in px0..px1 {
            blend(frame.get_pixel_mut(x, y), color, alpha);
        }
    }
}

fn pixel_span(start: f32, end: f32, limit: u32) -> (u32, u32) {
    let clamp = |v: f32| v.round().clamp(0.0, limit as f32) as u32;
    let (start, end) = (clamp(start), clamp(end));
    (start, end.max(start))
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    for c in 0..3 {
        let mixed = src.0[c] as f32 * a + dst.0[c] as f32 * (1.0 - a);
        dst.0[c] = mixed.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Theme, ACCENT};

    const GREY: Rgba<u8> = Rgba([200, 200, 200, 255]);

    fn backdrop() -> RgbaImage {
        RgbaImage::from_pixel(100, 80, GREY)
    }

    fn selection() -> SelectionRect {
        SelectionRect::new(20.0, 20.0, 60.0, 40.0)
    }

    #[test]
    fn frame_matches_backdrop_size() {
        let frame = render_frame(&backdrop(), &selection(), &Theme::Flat.style());
        assert_eq!(frame.dimensions(), (100, 80));
    }

    #[test]
    fn selection_window_shows_unobstructed_image() {
        let frame = render_frame(&backdrop(), &selection(), &Theme::Flat.style());
        assert_eq!(*frame.get_pixel(50, 40), GREY);
        assert_eq!(*frame.get_pixel(30, 50), GREY);
    }

    #[test]
    fn outside_is_dimmed_by_overlay_opacity() {
        let flat = render_frame(&backdrop(), &selection(), &Theme::Flat.style());
        assert_eq!(*flat.get_pixel(5, 5), Rgba([100, 100, 100, 255]));
        assert_eq!(*flat.get_pixel(95, 75), Rgba([100, 100, 100, 255]));

        let glow = render_frame(&backdrop(), &selection(), &Theme::Glow.style());
        assert_eq!(*glow.get_pixel(5, 5), Rgba([80, 80, 80, 255]));
    }

    #[test]
    fn overlay_bands_do_not_overlap() {
        let mut frame = backdrop();
        draw_selection_overlay(&mut frame, &selection(), 0.5);

        // Every dimmed pixel was dimmed exactly once.
        for pixel in frame.pixels() {
            assert!(*pixel == GREY || *pixel == Rgba([100, 100, 100, 255]));
        }
    }

    #[test]
    fn border_and_handles_use_accent() {
        let frame = render_frame(&backdrop(), &selection(), &Theme::Flat.style());
        // Middle of the top edge.
        assert_eq!(*frame.get_pixel(50, 20), ACCENT);
        // Each corner handle.
        for (x, y) in [(20, 20), (80, 20), (20, 60), (80, 60)] {
            assert_eq!(*frame.get_pixel(x, y), ACCENT, "corner ({x}, {y})");
        }
        // Handle extends beyond the border width.
        assert_eq!(*frame.get_pixel(17, 17), ACCENT);
    }

    #[test]
    fn glow_tints_pixels_outside_the_border() {
        let frame = render_frame(&backdrop(), &selection(), &Theme::Glow.style());
        let halo = frame.get_pixel(50, 17);
        assert!(halo.0[2] > halo.0[0], "expected blue tint, got {halo:?}");

        let flat = render_frame(&backdrop(), &selection(), &Theme::Flat.style());
        assert_eq!(*flat.get_pixel(50, 17), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn handles_at_viewport_edge_are_clipped() {
        let edge = SelectionRect::new(0.0, 0.0, 100.0, 80.0);
        let frame = render_frame(&backdrop(), &edge, &Theme::Glow.style());
        assert_eq!(*frame.get_pixel(0, 0), ACCENT);
        assert_eq!(*frame.get_pixel(99, 79), ACCENT);
    }

    #[test]
    fn backdrop_fills_viewport() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, GREY));
        let viewport = Viewport::fit(40.0, 20.0, 600.0, 400.0).unwrap();
        let scaled = scale_to_viewport(&image, &viewport);
        assert_eq!(scaled.dimensions(), (600, 300));
    }
}
