//! Request payload decoding with a decompression-bomb guard.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageError, ImageReader, Limits};
use std::io::Cursor;
use thiserror::Error;

/// The only accepted payload prefix: an inline base64-encoded PNG data URL.
pub const EXPECTED_PREFIX: &str = "data:image/png;base64";

/// Validation errors for an incoming payload. All variants are client faults
/// and terminate the request with a 400 before any further processing.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Unsupported payload type: {0}")]
    UnsupportedType(String),

    #[error("Image dimensions exceed the configured pixel ceiling")]
    TooLarge,

    #[error("Corrupt image stream: {0}")]
    Corrupt(String),
}

/// Decodes `data:image/png;base64,<payload>` bodies into bounded images.
///
/// The pixel-area ceiling is checked against the stream header before any
/// raster is materialized, so an adversarial payload declaring enormous
/// dimensions never causes a matching allocation.
#[derive(Clone, Debug)]
pub struct PayloadDecoder {
    max_width: u32,
    max_height: u32,
}

impl PayloadDecoder {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Maximum decoded pixel area (width * height).
    pub fn max_pixel_area(&self) -> u64 {
        u64::from(self.max_width) * u64::from(self.max_height)
    }

    pub fn decode(&self, raw: &[u8]) -> Result<DynamicImage, DecodeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| DecodeError::Malformed("body is not valid UTF-8".to_string()))?;

        let (prefix, payload) = text
            .split_once(',')
            .ok_or_else(|| DecodeError::Malformed("missing data URL separator".to_string()))?;
        if payload.contains(',') {
            return Err(DecodeError::Malformed(
                "more than one data URL separator".to_string(),
            ));
        }

        if prefix != EXPECTED_PREFIX {
            return Err(DecodeError::UnsupportedType(prefix.to_string()));
        }

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| DecodeError::Malformed(format!("invalid base64 payload: {e}")))?;

        // Phase one: verify the stream header only. `into_dimensions` reads
        // image metadata without materializing pixel data, so the area check
        // happens before any raster allocation.
        let probe = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        if probe.format().is_none() {
            return Err(DecodeError::Corrupt("unrecognized image format".to_string()));
        }
        let (width, height) = probe
            .into_dimensions()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        if u64::from(width) * u64::from(height) > self.max_pixel_area() {
            return Err(DecodeError::TooLarge);
        }

        // Phase two: materialize the raster. Decoder-level limits back up the
        // header check so a stream whose header disagrees with its contents
        // still cannot exhaust memory.
        let mut reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_pixel_area().saturating_mul(8));
        reader.limits(limits);

        let img = reader.decode().map_err(|e| match e {
            ImageError::Limits(_) => DecodeError::TooLarge,
            other => DecodeError::Corrupt(other.to_string()),
        })?;

        tracing::debug!(width, height, "Decoded submission payload");
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn data_url(prefix: &str, bytes: &[u8]) -> Vec<u8> {
        format!("{},{}", prefix, BASE64.encode(bytes)).into_bytes()
    }

    fn decoder() -> PayloadDecoder {
        PayloadDecoder::new(64, 64)
    }

    #[test]
    fn test_decodes_valid_payload() {
        let body = data_url(EXPECTED_PREFIX, &png_bytes(10, 10));
        let img = decoder().decode(&body).unwrap();
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 10);
    }

    #[test]
    fn test_missing_separator_is_malformed() {
        let result = decoder().decode(b"not-base64-at-all");
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_non_utf8_is_malformed() {
        let result = decoder().decode(&[0xff, 0xfe, 0x00, 0x80]);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_extra_separator_is_malformed() {
        let mut body = data_url(EXPECTED_PREFIX, &png_bytes(4, 4));
        body.extend_from_slice(b",trailing");
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_wrong_prefix_is_unsupported_never_malformed() {
        // Valid base64 payload, wrong media type: must be UnsupportedType.
        let body = data_url("data:image/jpeg;base64", &png_bytes(4, 4));
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::UnsupportedType(_))));
    }

    #[test]
    fn test_invalid_base64_is_malformed() {
        let body = format!("{},$$$not base64$$$", EXPECTED_PREFIX).into_bytes();
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_oversized_image_is_too_large() {
        // 100x100 against a 64x64 ceiling: rejected from the header alone.
        let body = data_url(EXPECTED_PREFIX, &png_bytes(100, 100));
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::TooLarge)));
    }

    #[test]
    fn test_garbage_bytes_are_corrupt() {
        let body = data_url(EXPECTED_PREFIX, b"these bytes are no image at all");
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_png_is_corrupt() {
        let full = png_bytes(16, 16);
        let truncated = &full[..full.len() / 2];
        let body = data_url(EXPECTED_PREFIX, truncated);
        let result = decoder().decode(&body);
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn test_area_ceiling_is_product_not_per_axis() {
        // 64x64 ceiling admits a 128x8 image (1024 <= 4096 pixels).
        let body = data_url(EXPECTED_PREFIX, &png_bytes(128, 8));
        let img = decoder().decode(&body).unwrap();
        assert_eq!((img.width(), img.height()), (128, 8));
    }
}
