//! Error types for the doc-crop-core library.
//!
//! This module provides granular error variants for different failure modes,
//! enabling precise error handling and user-friendly error messages.

use thiserror::Error;

/// Errors that can occur within the doc-crop-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (unknown preset, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image bytes could not be decoded into a bitmap.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Width or height was zero, negative or not finite.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    /// The selection area is empty or has zero dimensions.
    #[error("Selection area is empty or invalid")]
    EmptySelection,

    /// An operation needed the source image before it was loaded.
    #[error("No image has been loaded into the selector")]
    ImageNotLoaded,

    /// The selector already confirmed or cancelled.
    #[error("Selector is closed")]
    SelectorClosed,

    /// The wizard received an event its current state does not accept.
    #[error("Invalid wizard transition: {event} while in {from}")]
    InvalidTransition { from: String, event: String },

    /// The mocked analysis run was cancelled before finishing.
    #[error("Analysis was cancelled")]
    AnalysisCancelled,

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
