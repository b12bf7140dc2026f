//! User interface components for doc-crop.
//!
//! This module provides a desktop window hosting the region selector.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Outcome and window state types
//! - [`crop_window`]: The `eframe::App` wrapping a [`RegionSelector`]
//!
//! # Usage
//!
//! ```ignore
//! use doc_crop_core::{ui, ImageProcessor, SelectorConfig};
//!
//! let source = ImageProcessor::open("scan.png")?;
//!
//! if let Some(exported) = ui::run_selector_ui(source, SelectorConfig::default())? {
//!     exported.save("scan-cropped.jpg")?;
//! }
//! ```
//!
//! [`RegionSelector`]: crate::selector::RegionSelector

mod crop_window;
mod state;

// Public API exports
pub use crop_window::CropWindow;
pub use state::{CropOutcome, UiState};

use crate::config::SelectorConfig;
use crate::error::Result;
use crate::image_processing::{ExportedImage, SourceImage};

/// Launches the crop window and returns the user's selection.
///
/// # Arguments
/// * `source` - The image to crop
/// * `config` - Selector settings for the hosting screen
///
/// # Returns
/// - `Ok(Some(image))` - User confirmed; the crop at native resolution
/// - `Ok(None)` - User cancelled or closed the window
/// - `Err(e)` - The window could not be created, or the image has no area
pub fn run_selector_ui(source: SourceImage, config: SelectorConfig) -> Result<Option<ExportedImage>> {
    crop_window::run(source, config)
}
