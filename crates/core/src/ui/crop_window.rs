//! Desktop crop window.
//!
//! This module contains the `CropWindow` struct which implements the
//! `eframe::App` trait around a [`RegionSelector`]. The selector paints its
//! own frames; the window only uploads them as a texture and forwards
//! pointer and keyboard input.

use super::state::{CropOutcome, SharedHost, UiState};
use crate::config::SelectorConfig;
use crate::error::{AppError, Result};
use crate::image_processing::{ExportedImage, SourceImage};
use crate::selector::RegionSelector;
use crate::theme::Theme;
use eframe::egui;
use std::sync::{Arc, Mutex};

/// Room around the canvas for the title and the button row.
const CHROME_WIDTH: f32 = 48.0;
const CHROME_HEIGHT: f32 = 150.0;

/// The crop window application.
pub struct CropWindow {
    selector: RegionSelector,
    host: SharedHost,
    state: UiState,

    // Texture state
    texture: Option<egui::TextureHandle>,
    uploaded_generation: u64,
}

impl CropWindow {
    /// Creates a crop window for an already loaded selector.
    ///
    /// # Arguments
    /// * `selector` - Selector with the source image loaded
    /// * `outcome` - Shared result container for returning the crop to the caller
    pub fn new(selector: RegionSelector, outcome: Arc<Mutex<CropOutcome>>) -> Self {
        Self {
            selector,
            host: SharedHost::new(outcome),
            state: UiState::Selecting,
            texture: None,
            uploaded_generation: 0,
        }
    }

    /// Uploads the selector's latest frame when it changed since the last upload.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let generation = self.selector.frame_generation();
        if self.texture.is_some() && generation == self.uploaded_generation {
            return;
        }
        let Some(frame) = self.selector.frame() else {
            return;
        };

        let size = [frame.width() as usize, frame.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());

        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("selector-frame", image, egui::TextureOptions::LINEAR));
            }
        }
        self.uploaded_generation = generation;
    }

    /// Translates egui drag events into selector pointer events.
    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, canvas: egui::Rect) {
        if response.drag_started() {
            // The drag is only reported once the pointer moved a little, so
            // use where the button went down, not where it is now.
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = origin {
                let local = pos - canvas.min;
                self.selector.pointer_down(local.x, local.y);
            }
        }

        if response.dragged() && self.selector.is_dragging() {
            match ui.ctx().pointer_latest_pos() {
                Some(pos) if canvas.contains(pos) => {
                    let local = pos - canvas.min;
                    self.selector.pointer_move(local.x, local.y);
                }
                _ => self.selector.pointer_leave(),
            }
        }

        if response.drag_stopped() {
            self.selector.pointer_up();
        }

        if response.hovered() {
            let icon = if self.selector.is_dragging() {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::Move
            };
            ui.ctx().set_cursor_icon(icon);
        }
    }

    fn apply(&mut self, ctx: &egui::Context) {
        match self.selector.confirm(&mut self.host) {
            Ok(()) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Err(e) => {
                log::error!("Failed to export selection: {}", e);
                self.state = UiState::Error(e.to_string());
            }
        }
    }

    fn cancel(&mut self, ctx: &egui::Context) {
        self.selector.cancel(&mut self.host);
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Renders the title and hint above the canvas.
    fn render_header(&self, ui: &mut egui::Ui) {
        let (title, hint) = match self.selector.config().theme {
            Theme::Flat => (
                "Crop Your Document",
                "Drag the blue box to select the area you want to analyze",
            ),
            Theme::Glow => (
                "Select Document Area",
                "Drag the selection area to choose the region you want to analyze",
            ),
        };
        ui.heading(title);
        ui.label(hint);
        ui.add_space(8.0);
    }

    /// Renders the Reset / Cancel / Apply row.
    fn render_actions(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui.button("⟲ Reset").clicked() {
                self.selector.reset();
                self.state = UiState::Selecting;
            }
            if ui.button("✕ Cancel").clicked() {
                self.cancel(ctx);
            }
            if ui.button("✔ Apply Crop").clicked() {
                self.apply(ctx);
            }
        });

        if let UiState::Error(err) = &self.state {
            ui.label(egui::RichText::new(format!("Error: {}", err)).color(egui::Color32::RED));
        }
    }
}

impl eframe::App for CropWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.selector.is_closed() {
            return;
        }

        self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                self.render_header(ui);

                let Some(viewport) = self.selector.viewport() else {
                    ui.spinner();
                    return;
                };

                let size = egui::vec2(viewport.width, viewport.height);
                let (canvas, response) = ui.allocate_exact_size(size, egui::Sense::drag());

                self.handle_pointer(ui, &response, canvas);

                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        canvas,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                ui.add_space(12.0);
                self.render_actions(ui, ctx);
            });
        });

        // Keyboard shortcuts
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.cancel(ctx);
        } else if ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.apply(ctx);
        }

        // Pointer events above may have produced a new frame.
        if self.selector.frame_generation() != self.uploaded_generation {
            ctx.request_repaint();
        }
    }
}

/// Opens the crop window and blocks until it closes.
///
/// # Arguments
/// * `source` - The image to crop
/// * `config` - Selector settings (bounding box, theme, quality)
///
/// # Returns
/// The exported crop, or `None` if the user cancelled or closed the window.
pub fn run(source: SourceImage, config: SelectorConfig) -> Result<Option<ExportedImage>> {
    let selector = RegionSelector::with_image(config, source)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.max_width + CHROME_WIDTH, config.max_height + CHROME_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };

    let result = Arc::new(Mutex::new(CropOutcome::default()));
    let app_result = result.clone();

    eframe::run_native(
        "Document Crop",
        options,
        Box::new(move |_cc| Ok(Box::new(CropWindow::new(selector, app_result)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))?;

    // Extract result from shared state
    let lock = result
        .lock()
        .map_err(|_| AppError::ui("Failed to acquire result lock"))?;

    match (&lock.exported, lock.cancelled) {
        (Some(exported), _) => log::debug!("Crop window returned {}x{}", exported.width, exported.height),
        (None, true) => log::debug!("Crop window cancelled"),
        (None, false) => log::info!("Crop window closed without a selection"),
    }

    Ok(lock.exported.clone())
}
