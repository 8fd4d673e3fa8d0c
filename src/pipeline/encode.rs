//! Image encoding for OCR engines.
//!
//! Both engines consume PNG: tesseract reads it from a temp file, vision
//! models receive it base64-wrapped in an `ImageData`. PNG is lossless, so
//! glyph edges survive intact; JPEG artefacts around text hurt recognition.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode a rasterised page as a base64 PNG ready for a vision model.
///
/// `detail: "high"` asks GPT-4-class models for the full tile budget; with
/// `"low"` small print is lost.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let b64 = STANDARD.encode(encode_png(img)?);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
