//! The region selector: a pointer-driven crop rectangle over a fit-scaled image.
//!
//! The selector owns the viewport, the selection and the drag session. Input
//! arrives as pointer events in viewport coordinates; every state change is
//! followed by a synchronous repaint. Confirming exports the selection and
//! hands it to the [`SelectionHost`]; cancelling tells the host to abandon
//! cropping. Either one closes the selector.
//!
//! ```text
//! Idle --pointer_down--> Dragging --pointer_up / pointer_leave--> Idle
//!   \                      |
//!    \--confirm / cancel---+--> Closed
//! ```

use crate::config::SelectorConfig;
use crate::error::{AppError, Result};
use crate::geometry::{SelectionRect, Viewport};
use crate::image_processing::{ExportedImage, ImageProcessor, SourceImage};
use crate::rendering::{corners, render_frame, scale_to_viewport};
use image::RgbaImage;

/// Smallest width/height a resize may leave, in viewport pixels.
///
/// Images shown upscaled need more than this to cover one native pixel; see
/// `Loaded::min_selection_size`.
pub const MIN_SELECTION_SIZE: f32 = 1.0;

/// Receives the outcome of a selector. Each callback fires at most once.
pub trait SelectionHost {
    /// The user confirmed; `image` is the encoded crop at native resolution.
    fn on_selection_complete(&mut self, image: ExportedImage);
    /// The user abandoned cropping.
    fn on_cancel(&mut self);
}

/// Corner grabbed during a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// What a drag is doing to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize(Corner),
}

/// Transient state between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Pointer position minus the selection's top-left corner at press time.
    pub grab_offset: (f32, f32),
    pub mode: DragMode,
}

/// Interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorState {
    Idle,
    Dragging(DragSession),
    /// Confirmed or cancelled; all further input is ignored.
    Closed,
}

/// Everything that only exists once an image is loaded.
struct Loaded {
    source: SourceImage,
    viewport: Viewport,
    backdrop: RgbaImage,
    selection: SelectionRect,
}

impl Loaded {
    /// Per-axis resize floor: one viewport pixel, or one native pixel when
    /// that is wider, so a resized selection always exports.
    fn min_selection_size(&self) -> (f32, f32) {
        let scale = self
            .viewport
            .scale_factors(self.source.native_width(), self.source.native_height());
        (
            MIN_SELECTION_SIZE.max(1.0 / scale.x),
            MIN_SELECTION_SIZE.max(1.0 / scale.y),
        )
    }
}

/// Interactive crop tool.
pub struct RegionSelector {
    config: SelectorConfig,
    loaded: Option<Loaded>,
    state: SelectorState,
    frame: Option<RgbaImage>,
    frame_generation: u64,
}

impl RegionSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            loaded: None,
            state: SelectorState::Idle,
            frame: None,
            frame_generation: 0,
        }
    }

    /// Creates a selector and loads `source` into it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidDimensions`] if the image or the configured
    /// bounding box has a zero dimension.
    pub fn with_image(config: SelectorConfig, source: SourceImage) -> Result<Self> {
        let mut selector = Self::new(config);
        selector.load_image(source)?;
        Ok(selector)
    }

    /// Fits `source` into the configured box, resets the selection to the
    /// centered default and paints the first frame.
    ///
    /// Loading a new image replaces the previous one and ends any drag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidDimensions`] for zero-sized images or boxes,
    /// and [`AppError::SelectorClosed`] once the selector has been closed.
    pub fn load_image(&mut self, source: SourceImage) -> Result<()> {
        if self.is_closed() {
            return Err(AppError::SelectorClosed);
        }

        let viewport = Viewport::fit(
            source.native_width() as f32,
            source.native_height() as f32,
            self.config.max_width,
            self.config.max_height,
        )?;
        let backdrop = scale_to_viewport(source.image(), &viewport);
        let selection = SelectionRect::centered_default(&viewport);

        log::debug!(
            "Loaded {}x{} image into {:.1}x{:.1} viewport",
            source.native_width(),
            source.native_height(),
            viewport.width,
            viewport.height
        );

        self.loaded = Some(Loaded {
            source,
            viewport,
            backdrop,
            selection,
        });
        self.state = SelectorState::Idle;
        self.repaint();
        Ok(())
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectorState::Dragging(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SelectorState::Closed)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.loaded.as_ref().map(|l| l.viewport)
    }

    pub fn selection(&self) -> Option<SelectionRect> {
        self.loaded.as_ref().map(|l| l.selection)
    }

    /// The active drag session, if any.
    pub fn drag_session(&self) -> Option<DragSession> {
        match self.state {
            SelectorState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// The most recently painted frame, `None` until an image is loaded.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Increments on every repaint, so surfaces know when to re-upload.
    pub fn frame_generation(&self) -> u64 {
        self.frame_generation
    }

    /// Starts a drag at `(x, y)`.
    ///
    /// The offset between the pointer and the selection's top-left corner is
    /// kept for the whole drag, so the grabbed point stays under the pointer.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !matches!(self.state, SelectorState::Idle) {
            return;
        }
        let Some(loaded) = &self.loaded else {
            return;
        };

        let selection = loaded.selection;
        let mode = if self.config.resizable {
            self.corner_at(&selection, x, y)
                .map(DragMode::Resize)
                .unwrap_or(DragMode::Move)
        } else {
            DragMode::Move
        };

        self.state = SelectorState::Dragging(DragSession {
            grab_offset: (x - selection.x, y - selection.y),
            mode,
        });
        log::debug!("Drag started at ({:.1}, {:.1}) in {:?} mode", x, y, mode);
        self.repaint();
    }

    /// Updates the selection for a pointer at `(x, y)`. Ignored unless dragging.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let SelectorState::Dragging(session) = self.state else {
            return;
        };
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        match session.mode {
            DragMode::Move => {
                let (dx, dy) = session.grab_offset;
                loaded.selection.move_to_clamped(x - dx, y - dy, &loaded.viewport);
            }
            DragMode::Resize(corner) => {
                let min_size = loaded.min_selection_size();
                loaded.selection = resize_corner(loaded.selection, corner, x, y, min_size, &loaded.viewport);
            }
        }

        self.repaint();
    }

    /// Ends the drag; the selection stays where it is.
    pub fn pointer_up(&mut self) {
        if self.is_dragging() {
            self.state = SelectorState::Idle;
            log::debug!("Drag ended at {:?}", self.selection());
            self.repaint();
        }
    }

    /// Leaving the canvas counts as a release so a drag can never get stuck.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Restores the centered 80% selection and ends any drag.
    pub fn reset(&mut self) {
        if self.is_closed() {
            return;
        }
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        loaded.selection = SelectionRect::centered_default(&loaded.viewport);
        self.state = SelectorState::Idle;
        self.repaint();
    }

    /// Exports the current selection and hands it to `host`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageNotLoaded`] before an image is loaded,
    /// [`AppError::SelectorClosed`] after a previous confirm or cancel, and
    /// the exporter's errors otherwise. The selector stays open on error.
    pub fn confirm(&mut self, host: &mut dyn SelectionHost) -> Result<()> {
        if self.is_closed() {
            return Err(AppError::SelectorClosed);
        }
        let loaded = self.loaded.as_ref().ok_or(AppError::ImageNotLoaded)?;

        let exported = ImageProcessor::export_selection(
            &loaded.source,
            &loaded.selection,
            &loaded.viewport,
            self.config.jpeg_quality,
        )?;

        log::debug!("Selection confirmed, {}x{} exported", exported.width, exported.height);
        self.close();
        host.on_selection_complete(exported);
        Ok(())
    }

    /// Discards all state and tells `host` cropping was abandoned.
    ///
    /// Calling it again after the selector closed does nothing.
    pub fn cancel(&mut self, host: &mut dyn SelectionHost) {
        if self.is_closed() {
            log::warn!("Cancel ignored, selector already closed");
            return;
        }
        log::debug!("Selection cancelled");
        self.close();
        host.on_cancel();
    }

    /// Paints a frame for the current state; a no-op without an image.
    pub fn render(&self) -> Option<RgbaImage> {
        let loaded = self.loaded.as_ref()?;
        Some(render_frame(&loaded.backdrop, &loaded.selection, &self.config.theme.style()))
    }

    fn repaint(&mut self) {
        if let Some(frame) = self.render() {
            self.frame = Some(frame);
            self.frame_generation += 1;
        }
    }

    fn close(&mut self) {
        self.state = SelectorState::Closed;
        self.loaded = None;
        self.frame = None;
    }

    fn corner_at(&self, selection: &SelectionRect, x: f32, y: f32) -> Option<Corner> {
        let reach = self.config.theme.style().handle_size / 2.0;
        Corner::ALL
            .into_iter()
            .zip(corners(selection))
            .find(|(_, (cx, cy))| (x - cx).abs() <= reach && (y - cy).abs() <= reach)
            .map(|(corner, _)| corner)
    }
}

/// Moves one corner to `(x, y)`, keeping the opposite corner fixed.
///
/// The dragged corner is clamped to the viewport and may not cross the
/// opposite corner; the selection never shrinks below `min_size`.
fn resize_corner(
    rect: SelectionRect,
    corner: Corner,
    x: f32,
    y: f32,
    min_size: (f32, f32),
    viewport: &Viewport,
) -> SelectionRect {
    let x = x.clamp(0.0, viewport.width);
    let y = y.clamp(0.0, viewport.height);
    let (right, bottom) = (rect.right(), rect.bottom());
    let (min_w, min_h) = min_size;

    let (left, top, right, bottom) = match corner {
        Corner::TopLeft => (
            x.min(right - min_w),
            y.min(bottom - min_h),
            right,
            bottom,
        ),
        Corner::TopRight => (
            rect.x,
            y.min(bottom - min_h),
            x.max(rect.x + min_w),
            bottom,
        ),
        Corner::BottomLeft => (
            x.min(right - min_w),
            rect.y,
            right,
            y.max(rect.y + min_h),
        ),
        Corner::BottomRight => (
            rect.x,
            rect.y,
            x.max(rect.x + min_w),
            y.max(rect.y + min_h),
        ),
    };

    let mut resized = SelectionRect::new(left, top, right - left, bottom - top);
    resized.clamp_to(viewport);
    resized
}
