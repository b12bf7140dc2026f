//! The document wizard that hosts the region selector.
//!
//! The wizard walks a document through upload, crop, review, mocked
//! processing and the result table. Its steps form an explicit state machine;
//! every transition goes through [`Wizard::apply`] and the table in
//! [`WizardState::next`].

use crate::analysis::AnalysisReport;
use crate::error::{AppError, Result};
use crate::image_processing::{ExportedImage, SourceImage};
use crate::selector::SelectionHost;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Current wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardState {
    #[default]
    Upload,
    Crop,
    Ready,
    Processing,
    Result,
}

/// Inputs that move the wizard between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    FileSelected,
    CropCompleted,
    CropCancelled,
    StartAnalysis,
    Recrop,
    RemoveImage,
    AnalysisFinished,
    Reset,
}

impl WizardState {
    /// Transition table. `None` means the event is not accepted here.
    pub fn next(self, event: WizardEvent) -> Option<WizardState> {
        use WizardEvent::*;
        use WizardState::*;

        match (self, event) {
            (_, Reset) => Some(Upload),
            (Upload, FileSelected) => Some(Crop),
            (Crop, CropCompleted) => Some(Ready),
            (Crop, CropCancelled) => Some(Upload),
            (Ready, StartAnalysis) => Some(Processing),
            (Ready, Recrop) => Some(Crop),
            (Ready, RemoveImage) => Some(Upload),
            (Processing, AnalysisFinished) => Some(Result),
            _ => None,
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardState::Upload => "upload",
            WizardState::Crop => "crop",
            WizardState::Ready => "ready",
            WizardState::Processing => "processing",
            WizardState::Result => "result",
        };
        write!(f, "{}", name)
    }
}

/// Analyses the user can ask for on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisOption {
    Fraud,
    Text,
    Metadata,
    Signature,
}

impl AnalysisOption {
    /// Options selected when the wizard starts.
    pub const DEFAULTS: [AnalysisOption; 2] = [AnalysisOption::Fraud, AnalysisOption::Text];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisOption::Fraud => "Fraud Detection",
            AnalysisOption::Text => "Text Extraction",
            AnalysisOption::Metadata => "Metadata Analysis",
            AnalysisOption::Signature => "Signature Verification",
        }
    }
}

impl FromStr for AnalysisOption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fraud" => Ok(AnalysisOption::Fraud),
            "text" => Ok(AnalysisOption::Text),
            "metadata" => Ok(AnalysisOption::Metadata),
            "signature" => Ok(AnalysisOption::Signature),
            other => Err(AppError::config(format!("Unknown analysis option '{}'", other))),
        }
    }
}

/// Wizard state plus the data each screen needs.
#[derive(Debug)]
pub struct Wizard {
    state: WizardState,
    uploaded: Option<SourceImage>,
    cropped: Option<ExportedImage>,
    options: Vec<AnalysisOption>,
    report: Option<AnalysisReport>,
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::Upload,
            uploaded: None,
            cropped: None,
            options: AnalysisOption::DEFAULTS.to_vec(),
            report: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn uploaded(&self) -> Option<&SourceImage> {
        self.uploaded.as_ref()
    }

    pub fn cropped(&self) -> Option<&ExportedImage> {
        self.cropped.as_ref()
    }

    pub fn options(&self) -> &[AnalysisOption] {
        &self.options
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    /// Applies `event` if the current state accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidTransition`] otherwise; the state is unchanged.
    pub fn apply(&mut self, event: WizardEvent) -> Result<WizardState> {
        let next = self.state.next(event).ok_or_else(|| {
            log::warn!("Rejected {:?} in {} state", event, self.state);
            AppError::InvalidTransition {
                from: self.state.to_string(),
                event: format!("{:?}", event),
            }
        })?;

        log::debug!("Wizard {} -> {} on {:?}", self.state, next, event);
        self.state = next;
        Ok(next)
    }

    /// Stores the uploaded image and moves to the crop screen.
    pub fn select_file(&mut self, image: SourceImage) -> Result<()> {
        self.apply(WizardEvent::FileSelected)?;
        self.uploaded = Some(image);
        self.cropped = None;
        Ok(())
    }

    /// Goes back from review to crop, keeping the upload.
    pub fn recrop(&mut self) -> Result<()> {
        self.apply(WizardEvent::Recrop)?;
        Ok(())
    }

    /// Drops both images and returns to upload.
    pub fn remove_image(&mut self) -> Result<()> {
        self.apply(WizardEvent::RemoveImage)?;
        self.uploaded = None;
        self.cropped = None;
        Ok(())
    }

    pub fn start_analysis(&mut self) -> Result<()> {
        self.apply(WizardEvent::StartAnalysis)?;
        self.report = None;
        Ok(())
    }

    /// Records the finished report and shows the result screen.
    pub fn finish_analysis(&mut self, report: AnalysisReport) -> Result<()> {
        self.apply(WizardEvent::AnalysisFinished)?;
        self.report = Some(report);
        Ok(())
    }

    /// Toggles an analysis option on the review screen.
    pub fn toggle_option(&mut self, option: AnalysisOption) {
        if let Some(index) = self.options.iter().position(|o| *o == option) {
            self.options.remove(index);
        } else {
            self.options.push(option);
        }
    }

    pub fn set_options(&mut self, options: impl IntoIterator<Item = AnalysisOption>) {
        self.options.clear();
        for option in options {
            if !self.options.contains(&option) {
                self.options.push(option);
            }
        }
    }

    /// Returns to upload and forgets everything.
    pub fn reset(&mut self) {
        // Reset is accepted from every state.
        let _ = self.apply(WizardEvent::Reset);
        self.uploaded = None;
        self.cropped = None;
        self.report = None;
        self.options = AnalysisOption::DEFAULTS.to_vec();
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionHost for Wizard {
    fn on_selection_complete(&mut self, image: ExportedImage) {
        match self.apply(WizardEvent::CropCompleted) {
            Ok(_) => self.cropped = Some(image),
            Err(e) => log::warn!("Dropping crop result: {}", e),
        }
    }

    fn on_cancel(&mut self) {
        if self.apply(WizardEvent::CropCancelled).is_ok() {
            self.uploaded = None;
        }
    }
}
