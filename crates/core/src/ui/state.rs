//! UI state types shared between the crop window and its caller.

use crate::image_processing::ExportedImage;
use crate::selector::SelectionHost;
use std::sync::{Arc, Mutex};

/// Result of a crop window session.
///
/// Filled in by the window when the user confirms or cancels, read by the
/// caller once the event loop returns.
#[derive(Clone, Default)]
pub struct CropOutcome {
    /// The exported selection, when the user confirmed.
    pub exported: Option<ExportedImage>,
    /// Set when the user cancelled explicitly.
    pub cancelled: bool,
}

/// Current state of the crop window.
#[derive(Clone, Debug, PartialEq)]
pub enum UiState {
    /// The user is positioning the selection.
    Selecting,
    /// Exporting failed; the selection is still editable.
    Error(String),
}

/// [`SelectionHost`] that records the outcome for the caller.
pub(crate) struct SharedHost {
    outcome: Arc<Mutex<CropOutcome>>,
}

impl SharedHost {
    pub(crate) fn new(outcome: Arc<Mutex<CropOutcome>>) -> Self {
        Self { outcome }
    }
}

impl SelectionHost for SharedHost {
    fn on_selection_complete(&mut self, image: ExportedImage) {
        match self.outcome.lock() {
            Ok(mut outcome) => outcome.exported = Some(image),
            Err(_) => log::error!("Crop outcome lock poisoned, dropping selection"),
        }
    }

    fn on_cancel(&mut self) {
        match self.outcome.lock() {
            Ok(mut outcome) => outcome.cancelled = true,
            Err(_) => log::error!("Crop outcome lock poisoned, dropping cancel"),
        }
    }
}
