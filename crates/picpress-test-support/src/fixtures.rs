//! Generated image payloads.
//!
//! Every fixture is rendered in memory so suites never depend on binary files in the tree.

use std::io::Cursor;

use anyhow::Result;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

/// Opaque RGB PNG with a simple gradient.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image.
pub fn png_bytes(width: u32, height: u32) -> Result<Vec<u8>> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

/// PNG with a translucent alpha channel.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image.
pub fn rgba_png_bytes(width: u32, height: u32) -> Result<Vec<u8>> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 2 == 0 { 255 } else { 96 };
        Rgba([channel(x, width), 40, channel(y, height), alpha])
    });
    encode(&DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

/// Baseline JPEG.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image.
pub fn jpeg_bytes(width: u32, height: u32) -> Result<Vec<u8>> {
    encode(&DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

/// GIF (single frame).
///
/// # Errors
///
/// Returns an error if the encoder rejects the image.
pub fn gif_bytes(width: u32, height: u32) -> Result<Vec<u8>> {
    let frame = DynamicImage::ImageRgb8(gradient(width, height)).to_rgba8();
    encode(&DynamicImage::ImageRgba8(frame), ImageFormat::Gif)
}

/// Bytes that match no image signature.
#[must_use]
pub fn corrupt_bytes() -> Vec<u8> {
    b"this payload is definitely not an image".to_vec()
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([channel(x, width), channel(y, height), 128])
    })
}

fn channel(position: u32, extent: u32) -> u8 {
    let scaled = position.saturating_mul(255) / extent.max(1);
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    Ok(buffer.into_inner())
}
