//! Configuration loading and selector presets.
//!
//! Values come from the environment (including a `.env` file when present).
//! Every setting has a default, so an empty environment is a valid one.

use crate::error::{AppError, Result};
use crate::theme::Theme;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

/// JPEG quality used when exporting a selection.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Which wizard screen hosts the selector.
///
/// Each screen fits the image into its own bounding box and uses its own theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenPreset {
    /// "Crop Your Document": 600x400, flat chrome.
    #[default]
    Crop,
    /// "Select Document Area": 700x500, glowing chrome.
    Select,
}

impl ScreenPreset {
    /// Maximum display box `(width, height)` for this screen.
    pub fn max_size(self) -> (f32, f32) {
        match self {
            ScreenPreset::Crop => (600.0, 400.0),
            ScreenPreset::Select => (700.0, 500.0),
        }
    }

    pub fn theme(self) -> Theme {
        match self {
            ScreenPreset::Crop => Theme::Flat,
            ScreenPreset::Select => Theme::Glow,
        }
    }
}

impl fmt::Display for ScreenPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenPreset::Crop => write!(f, "crop"),
            ScreenPreset::Select => write!(f, "select"),
        }
    }
}

impl FromStr for ScreenPreset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crop" => Ok(ScreenPreset::Crop),
            "select" => Ok(ScreenPreset::Select),
            other => Err(AppError::config(format!(
                "Unknown screen '{}', expected 'crop' or 'select'",
                other
            ))),
        }
    }
}

/// Settings for a single region selector instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    pub max_width: f32,
    pub max_height: f32,
    pub theme: Theme,
    pub jpeg_quality: u8,
    /// Lets corner handles resize the selection instead of being decorative.
    pub resizable: bool,
}

impl SelectorConfig {
    pub fn for_screen(screen: ScreenPreset) -> Self {
        let (max_width, max_height) = screen.max_size();
        Self {
            max_width,
            max_height,
            theme: screen.theme(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resizable: false,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::for_screen(ScreenPreset::default())
    }
}

/// Application configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub screen: ScreenPreset,
    /// Overrides the screen's default theme when set.
    pub theme: Option<Theme>,
    pub jpeg_quality: u8,
    pub resizable: bool,
}

impl Config {
    /// Loads configuration from `.env` and the process environment.
    ///
    /// Recognized variables: `DOC_CROP_SCREEN`, `DOC_CROP_THEME`,
    /// `DOC_CROP_JPEG_QUALITY`, `DOC_CROP_RESIZABLE`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a variable is set to an invalid value.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(screen) = lookup("DOC_CROP_SCREEN") {
            builder = builder.with_screen(screen.parse()?);
        }
        if let Some(theme) = lookup("DOC_CROP_THEME") {
            builder = builder.with_theme(theme.parse()?);
        }
        if let Some(quality) = lookup("DOC_CROP_JPEG_QUALITY") {
            let quality = quality.trim().parse::<u8>().map_err(|_| {
                AppError::config(format!("DOC_CROP_JPEG_QUALITY must be 1-100, got '{}'", quality))
            })?;
            builder = builder.with_jpeg_quality(quality);
        }
        if let Some(resizable) = lookup("DOC_CROP_RESIZABLE") {
            builder = builder.with_resizable(parse_bool(&resizable)?);
        }

        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolves the selector settings for the configured screen.
    pub fn selector(&self) -> SelectorConfig {
        let mut selector = SelectorConfig::for_screen(self.screen);
        if let Some(theme) = self.theme {
            selector.theme = theme;
        }
        selector.jpeg_quality = self.jpeg_quality;
        selector.resizable = self.resizable;
        selector
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen: ScreenPreset::default(),
            theme: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resizable: false,
        }
    }
}

/// Builder for [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    screen: Option<ScreenPreset>,
    theme: Option<Theme>,
    jpeg_quality: Option<u8>,
    resizable: Option<bool>,
}

impl ConfigBuilder {
    pub fn with_screen(mut self, screen: ScreenPreset) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = Some(resizable);
        self
    }

    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the JPEG quality is outside 1-100.
    pub fn build(self) -> Result<Config> {
        let jpeg_quality = self.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY);
        if !(1..=100).contains(&jpeg_quality) {
            return Err(AppError::config(format!(
                "JPEG quality must be 1-100, got {}",
                jpeg_quality
            )));
        }

        Ok(Config {
            screen: self.screen.unwrap_or_default(),
            theme: self.theme,
            jpeg_quality,
            resizable: self.resizable.unwrap_or(false),
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::config(format!("Expected a boolean, got '{}'", other))),
    }
}
