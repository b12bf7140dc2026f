//! Visual themes for the selection chrome.
//!
//! Both crop screens share one state machine and renderer; the theme only
//! decides how the overlay, border and handles look.

use crate::error::AppError;
use image::Rgba;
use std::fmt;
use std::str::FromStr;

/// Accent color used for the border and handles (`#3b82f6`).
pub const ACCENT: Rgba<u8> = Rgba([59, 130, 246, 255]);

/// Selection chrome style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Thin border, small handles, lighter overlay.
    #[default]
    Flat,
    /// Thicker border and handles with a soft accent halo.
    Glow,
}

/// Concrete drawing parameters resolved from a [`Theme`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeStyle {
    /// Opacity of the black overlay outside the selection (0.0..=1.0).
    pub overlay_alpha: f32,
    /// Border stroke width in viewport pixels.
    pub border_width: f32,
    /// Halo radius around the border; `0.0` disables it.
    pub border_glow: f32,
    /// Side length of the square corner handles.
    pub handle_size: f32,
    /// Halo radius around each handle; `0.0` disables it.
    pub handle_glow: f32,
    pub accent: Rgba<u8>,
}

impl Theme {
    pub fn style(self) -> ThemeStyle {
        match self {
            Theme::Flat => ThemeStyle {
                overlay_alpha: 0.5,
                border_width: 2.0,
                border_glow: 0.0,
                handle_size: 8.0,
                handle_glow: 0.0,
                accent: ACCENT,
            },
            Theme::Glow => ThemeStyle {
                overlay_alpha: 0.6,
                border_width: 3.0,
                border_glow: 10.0,
                handle_size: 12.0,
                handle_glow: 5.0,
                accent: ACCENT,
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Flat => write!(f, "flat"),
            Theme::Glow => write!(f, "glow"),
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Theme::Flat),
            "glow" => Ok(Theme::Glow),
            other => Err(AppError::config(format!(
                "Unknown theme '{}', expected 'flat' or 'glow'",
                other
            ))),
        }
    }
}
