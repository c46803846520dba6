use crate::error::{HumancamError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};

/// Compress an RGB image to JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| HumancamError::encode(format!("Failed to encode JPEG: {}", e)))?;
    Ok(buffer)
}

/// Text-safe transport encoding of a compressed frame (standard base64, padded)
pub fn encode_payload(jpeg: &[u8]) -> String {
    STANDARD.encode(jpeg)
}
