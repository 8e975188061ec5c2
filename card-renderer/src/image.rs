//! Image decoding utilities.
//!
//! Turns fetched asset bytes into RGBA pixel data, applies source-space
//! crops, and re-encodes pixels as PNG data URIs for embedding in the SVG
//! intermediate.

use card_core::CropRect;

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA pixel data for one asset.
#[derive(Debug, Clone)]
pub struct PixelData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel.
    pub data: Vec<u8>,
}

/// Supported source image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }
}

/// Decode an image from raw bytes into RGBA pixels.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded.
pub fn decode_pixels(data: &[u8]) -> RenderResult<PixelData> {
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(PixelData {
        width,
        height,
        data: rgba.into_raw(),
    })
}

/// Cut a crop window out of decoded pixels.
///
/// The window is clamped to the source bounds; a window that falls
/// entirely outside the source is an error.
///
/// # Errors
///
/// Returns an error if the clamped window is empty or the pixel buffer is
/// inconsistent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn crop_pixels(source: &PixelData, crop: &CropRect) -> RenderResult<PixelData> {
    let x = (crop.x.max(0.0) as u32).min(source.width);
    let y = (crop.y.max(0.0) as u32).min(source.height);
    let width = (crop.width.max(0.0) as u32).min(source.width - x);
    let height = (crop.height.max(0.0) as u32).min(source.height - y);

    if width == 0 || height == 0 {
        return Err(RenderError::Resource(format!(
            "empty crop window {}x{} at {x},{y}",
            crop.width, crop.height
        )));
    }

    let img = image::RgbaImage::from_raw(source.width, source.height, source.data.clone())
        .ok_or_else(|| RenderError::Resource("Invalid pixel buffer".to_string()))?;

    let cropped = image::imageops::crop_imm(&img, x, y, width, height).to_image();

    Ok(PixelData {
        width,
        height,
        data: cropped.into_raw(),
    })
}

/// Encode pixels as a PNG data URI suitable for an SVG `<image href>`.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn to_png_data_uri(pixels: &PixelData) -> RenderResult<String> {
    use base64::Engine;
    use image::ImageEncoder;

    let mut png = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png);
    encoder
        .write_image(
            &pixels.data,
            pixels.width,
            pixels.height,
            image::ColorType::Rgba8.into(),
        )
        .map_err(|e| RenderError::Resource(format!("PNG encoding failed: {e}")))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{encoded}"))
}

/// Create a solid color texture.
#[must_use]
pub fn create_solid_color(width: u32, height: u32, r: u8, g: u8, b: u8, a: u8) -> PixelData {
    let pixel_count = (width * height) as usize;
    let mut data = Vec::with_capacity(pixel_count * 4);

    for _ in 0..pixel_count {
        data.push(r);
        data.push(g);
        data.push(b);
        data.push(a);
    }

    PixelData {
        width,
        height,
        data,
    }
}
