//! Image encoding for drawings sent to the model
//!
//! Drawings are encoded as PNG (lossless, alpha preserved) and carried in
//! request payloads as base64 data URIs.

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use crate::canvas::Drawing;
use crate::{Error, Result};

/// MIME type of encoded drawings
pub const PNG_MIME: &str = "image/png";

/// Encode a drawing as PNG
///
/// # Errors
///
/// Returns `Error::InvalidImage` if the encoder rejects the buffer
pub fn encode_png(drawing: &Drawing) -> Result<Vec<u8>> {
    encode_rgba(drawing.width(), drawing.height(), drawing.rgba())
}

/// Encode a raw `height × width × 4` RGBA buffer as PNG
///
/// # Errors
///
/// Returns `Error::InvalidImage` on zero dimensions or a buffer whose length
/// does not match them
pub fn encode_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage(format!(
            "cannot encode {width}x{height} image"
        )));
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::InvalidImage(format!(
            "buffer holds {} bytes, expected {expected}",
            rgba.len()
        )));
    }

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| Error::InvalidImage(format!("png encoding failed: {e}")))?;

    tracing::debug!(width, height, bytes = buf.len(), "drawing encoded");
    Ok(buf)
}

/// Decode PNG bytes back into an RGBA drawing
///
/// # Errors
///
/// Returns `Error::InvalidImage` if the bytes are not a readable PNG
pub fn decode_png(bytes: &[u8]) -> Result<Drawing> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| Error::InvalidImage(format!("png decoding failed: {e}")))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Drawing::from_rgba(width, height, img.into_raw())
}

/// Base64 text suitable for embedding in a JSON payload
#[must_use]
pub fn to_transport_text(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Reverse [`to_transport_text`]
///
/// # Errors
///
/// Returns `Error::InvalidImage` if the text is not valid base64
pub fn from_transport_text(text: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| Error::InvalidImage(format!("invalid base64: {e}")))
}

/// `data:` URI for the given bytes
#[must_use]
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", to_transport_text(bytes))
}
