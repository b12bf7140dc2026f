//! doc-crop Core Library
//!
//! This library provides the core functionality for the doc-crop document
//! tool: an interactive region selector that crops a document image at its
//! native resolution, and the mocked analysis wizard around it.
//!
//! # Overview
//!
//! A document image is fit into a small viewport, the user drags a selection
//! rectangle over it, and confirming exports the selected region of the
//! original image as a JPEG. The library handles:
//!
//! - **Coordinate Mapping**: Viewport fitting and scale factors via [`geometry`]
//! - **Selection**: The pointer-driven state machine in [`selector`]
//! - **Rendering**: Dim overlay, border and handles via [`rendering`]
//! - **Export**: Native-resolution cropping and encoding via [`image_processing`]
//! - **Wizard**: Upload / crop / review / processing / result flow via [`wizard`]
//! - **Mocked Analysis**: Timer-driven fake processing via [`analysis`]
//! - **User Interface**: Desktop crop window via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use doc_crop_core::DocCrop;
//!
//! // Initialize with environment configuration
//! let app = DocCrop::new()?;
//!
//! // Crop interactively
//! if let Some(crop) = app.run_interactive("scan.png")? {
//!     crop.save("scan-cropped.jpg")?;
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`analysis`]: Mocked analysis pipeline and report
//! - [`config`]: Configuration loading and selector presets
//! - [`error`]: Error types and result aliases
//! - [`geometry`]: Viewport, selection and native regions
//! - [`image_processing`]: Image decoding, cropping and encoding
//! - [`rendering`]: Frame rendering
//! - [`selector`]: The region selector state machine
//! - [`theme`]: Visual themes for the selection chrome
//! - [`ui`]: User interface components
//! - [`wizard`]: Host-side wizard state machine

pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_processing;
pub mod rendering;
pub mod selector;
pub mod theme;
pub mod ui;
pub mod wizard;

// Re-export primary types for convenience
pub use config::{Config, ScreenPreset, SelectorConfig};
pub use error::{AppError, Result};
pub use image_processing::{ExportedImage, ImageProcessor, SourceImage};
pub use selector::{RegionSelector, SelectionHost};
pub use theme::Theme;
pub use wizard::Wizard;

use std::path::Path;

/// Main entry point for the doc-crop application.
///
/// This struct provides a facade over the various subsystems, resolving
/// configuration once and handing it to every selector it creates.
///
/// # Example
///
/// ```ignore
/// use doc_crop_core::DocCrop;
///
/// let app = DocCrop::new()?;
/// let mut selector = app.selector_for_path("scan.png")?;
/// selector.pointer_down(100.0, 100.0);
/// selector.pointer_move(80.0, 90.0);
/// selector.pointer_up();
/// ```
pub struct DocCrop {
    config: Config,
}

impl DocCrop {
    /// Creates a new instance with configuration from the environment.
    ///
    /// Loads configuration from environment variables (including `.env` files).
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration variable holds an invalid value.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self { config })
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Creates a selector with `source` loaded, using the configured screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has a zero dimension.
    pub fn selector(&self, source: SourceImage) -> Result<RegionSelector> {
        RegionSelector::with_image(self.config.selector(), source)
    }

    /// Opens an image file and creates a selector for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn selector_for_path(&self, path: impl AsRef<Path>) -> Result<RegionSelector> {
        self.selector(ImageProcessor::open(path)?)
    }

    /// Opens an image file in the crop window.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be decoded or the window fails.
    pub fn run_interactive(&self, path: impl AsRef<Path>) -> Result<Option<ExportedImage>> {
        let source = ImageProcessor::open(path)?;
        ui::run_selector_ui(source, self.config.selector())
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    ///
    /// Allows switching screen or theme after initialization.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
