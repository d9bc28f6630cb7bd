//! Codec seam: decode any supported raster image and re-encode it as WebP.
//!
//! # Design
//! - [`Transcoder`] is synchronous and CPU-bound; callers run it on the blocking pool.
//! - Format detection uses content sniffing only. Client extensions and MIME types are ignored.
//! - Animated inputs contribute their first frame.

use std::io::{self, Cursor};

use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use thiserror::Error;

/// Largest width or height a WebP bitstream can describe.
pub const WEBP_MAX_DIMENSION: u32 = 16_383;

/// Errors raised while probing or transcoding one input.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The content did not match any known image signature.
    #[error("unrecognised image format")]
    UnknownFormat,
    /// The content could not be decoded.
    #[error("image decode failed")]
    Decode {
        /// Underlying decoder error.
        source: ImageError,
    },
    /// The in-memory reader failed.
    #[error("image read failed")]
    Read {
        /// Underlying IO error.
        source: io::Error,
    },
    /// The image is too large for the output format.
    #[error("image dimensions unsupported")]
    Dimensions {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
    /// The encoder rejected the pixel data.
    #[error("image encode failed")]
    Encode {
        /// Encoder diagnostic.
        reason: String,
    },
}

impl TranscodeError {
    /// Whether the error is attributable to the input rather than the encoder.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownFormat | Self::Decode { .. } | Self::Read { .. } | Self::Dimensions { .. }
        )
    }
}

/// Result of sniffing an input's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    /// Detected container format.
    pub format: ImageFormat,
    /// Declared width in pixels.
    pub width: u32,
    /// Declared height in pixels.
    pub height: u32,
}

/// Converts encoded image bytes into the archive's output format.
pub trait Transcoder: Send + Sync {
    /// File extension (without dot) of produced entries.
    fn extension(&self) -> &'static str;

    /// Identify the input format and dimensions without decoding pixels.
    ///
    /// # Errors
    ///
    /// Returns an error when the bytes are not a recognisable image.
    fn probe(&self, bytes: &[u8]) -> Result<ImageProbe, TranscodeError>;

    /// Decode `bytes` and encode them in the output format.
    ///
    /// # Errors
    ///
    /// Returns an error when decoding or encoding fails.
    fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Lossy WebP encoder at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct WebpTranscoder {
    quality: f32,
}

impl WebpTranscoder {
    /// Construct an encoder; `quality` is clamped to `0..=100`.
    #[must_use]
    pub fn new(quality: u8) -> Self {
        Self {
            quality: f32::from(quality.min(100)),
        }
    }

    /// Configured quality factor.
    #[must_use]
    pub const fn quality(&self) -> f32 {
        self.quality
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 || width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(TranscodeError::Dimensions { width, height });
        }

        let encoded = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                .encode_simple(false, self.quality)
        } else {
            let rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, self.quality)
        };
        encoded
            .map(|memory| memory.to_vec())
            .map_err(|err| TranscodeError::Encode {
                reason: format!("{err:?}"),
            })
    }
}

impl Default for WebpTranscoder {
    fn default() -> Self {
        Self::new(80)
    }
}

impl Transcoder for WebpTranscoder {
    fn extension(&self) -> &'static str {
        "webp"
    }

    fn probe(&self, bytes: &[u8]) -> Result<ImageProbe, TranscodeError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|source| TranscodeError::Read { source })?;
        let format = reader.format().ok_or(TranscodeError::UnknownFormat)?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|source| TranscodeError::Decode { source })?;
        Ok(ImageProbe {
            format,
            width,
            height,
        })
    }

    fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let image =
            image::load_from_memory(bytes).map_err(|source| TranscodeError::Decode { source })?;
        self.encode(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use picpress_test_support::fixtures;

    fn is_webp(bytes: &[u8]) -> bool {
        bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
    }

    #[test]
    fn probe_sniffs_content_not_names() -> Result<()> {
        let transcoder = WebpTranscoder::default();
        let probe = transcoder.probe(&fixtures::png_bytes(7, 3)?)?;
        assert_eq!(probe.format, ImageFormat::Png);
        assert_eq!((probe.width, probe.height), (7, 3));

        let probe = transcoder.probe(&fixtures::jpeg_bytes(4, 4)?)?;
        assert_eq!(probe.format, ImageFormat::Jpeg);
        Ok(())
    }

    #[test]
    fn probe_rejects_non_images() {
        let transcoder = WebpTranscoder::default();
        let err = transcoder.probe(&fixtures::corrupt_bytes());
        assert!(matches!(err, Err(TranscodeError::UnknownFormat)));
        assert!(matches!(transcoder.probe(&[]), Err(TranscodeError::UnknownFormat)));
    }

    #[test]
    fn transcode_produces_webp_for_opaque_and_alpha_inputs() -> Result<()> {
        let transcoder = WebpTranscoder::new(80);
        assert!(is_webp(&transcoder.transcode(&fixtures::png_bytes(16, 9)?)?));
        assert!(is_webp(&transcoder.transcode(&fixtures::rgba_png_bytes(5, 5)?)?));
        assert!(is_webp(&transcoder.transcode(&fixtures::jpeg_bytes(8, 8)?)?));
        Ok(())
    }

    #[test]
    fn transcode_rejects_truncated_images() -> Result<()> {
        let transcoder = WebpTranscoder::default();
        let png = fixtures::png_bytes(32, 32)?;
        let err = transcoder
            .transcode(&png[..png.len() / 2])
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected decode failure"))?;
        assert!(err.is_invalid_input());
        Ok(())
    }

    #[test]
    fn quality_is_clamped() {
        assert!((WebpTranscoder::new(250).quality() - 100.0).abs() < f32::EPSILON);
        assert!((WebpTranscoder::default().quality() - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn encode_errors_are_not_input_errors() {
        let err = TranscodeError::Encode {
            reason: "VP8_ENC_ERROR_OUT_OF_MEMORY".to_string(),
        };
        assert!(!err.is_invalid_input());
        assert!(TranscodeError::Dimensions { width: 0, height: 1 }.is_invalid_input());
    }
}
