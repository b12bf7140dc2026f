//! Image decoding, cropping and encoding.
//!
//! This module turns host-supplied bytes into a [`SourceImage`] and turns a
//! viewport selection back into a standalone JPEG at native resolution.
//!
//! # Coordinate Mapping
//!
//! The selector shows the image fit into a small viewport (e.g. 600x300)
//! while the source may be much larger (e.g. 4000x2000). Exporting scales
//! the selection by the per-axis ratio between the two before cropping, so
//! the output keeps the full source detail.

use crate::error::{AppError, Result};
use crate::geometry::{CropRegion, SelectionRect, Viewport};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// MIME type of every exported selection.
pub const EXPORT_MIME_TYPE: &str = "image/jpeg";

/// An immutable decoded bitmap shared between the host and the selector.
#[derive(Clone, Debug)]
pub struct SourceImage {
    image: Arc<DynamicImage>,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn native_width(&self) -> u32 {
        self.image.width()
    }

    pub fn native_height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl From<DynamicImage> for SourceImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// The encoded result of a confirmed selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// Encodes the payload as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Writes the encoded bytes to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Image processing utilities for the selection workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decodes image bytes (PNG or JPEG).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageDecode`] if the bytes are not a supported image.
    pub fn decode(bytes: &[u8]) -> Result<SourceImage> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AppError::decode(format!("Unsupported or corrupt image: {}", e)))?;
        log::debug!("Decoded {}x{} image", image.width(), image.height());
        Ok(SourceImage::new(image))
    }

    /// Reads and decodes an image file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read, or
    /// [`AppError::ImageDecode`] if its contents are not a supported image.
    pub fn open(path: impl AsRef<Path>) -> Result<SourceImage> {
        let bytes = fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    /// Crops the selected region at native resolution and encodes it as JPEG.
    ///
    /// # Arguments
    ///
    /// * `source` - The full source image
    /// * `selection` - The selected region in viewport coordinates
    /// * `viewport` - The viewport the selection was made in
    /// * `quality` - JPEG quality, 1-100
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptySelection`] if the mapped region has zero area.
    /// Returns [`AppError::ImageProcessing`] if JPEG encoding fails.
    pub fn export_selection(
        source: &SourceImage,
        selection: &SelectionRect,
        viewport: &Viewport,
        quality: u8,
    ) -> Result<ExportedImage> {
        if !(selection.width > 0.0 && selection.height > 0.0) {
            return Err(AppError::EmptySelection);
        }

        let (native_width, native_height) = (source.native_width(), source.native_height());
        let scale = viewport.scale_factors(native_width, native_height);
        let region = selection.to_native(scale, native_width, native_height);

        if !region.is_valid() {
            return Err(AppError::EmptySelection);
        }

        log::debug!(
            "Exporting {}x{} at ({}, {}) from {}x{} source",
            region.width,
            region.height,
            region.x,
            region.y,
            native_width,
            native_height
        );

        let cropped = Self::crop(source.image(), region);
        let bytes = Self::encode_jpeg(&cropped, quality)?;

        Ok(ExportedImage {
            width: region.width,
            height: region.height,
            mime_type: EXPORT_MIME_TYPE,
            bytes,
        })
    }

    /// Crops a native-pixel region (immutable operation, returns new image).
    pub fn crop(image: &DynamicImage, region: CropRegion) -> DynamicImage {
        image.crop_imm(region.x, region.y, region.width, region.height)
    }

    /// Encodes an image as JPEG. Alpha is dropped since JPEG has none.
    fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        let mut buffer: Vec<u8> = Vec::new();

        JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(buffer)
    }

    /// Encodes a rendered frame as PNG, for previews.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if encoding fails.
    pub fn encode_png(frame: &image::RgbaImage) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        frame
            .write_to(&mut buffer, image::ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode preview: {}", e)))?;
        Ok(buffer.into_inner())
    }
}
