use crate::error::PreprocessError;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Limits, RgbImage};
use std::io::Cursor;

/// Decode compressed image bytes into a 3-channel 8-bit buffer
/// EXIF orientation is applied, alpha is dropped and gray is replicated
pub fn apply(bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Decode(format!("Failed to read image header: {}", e)))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    // Headers can claim sizes far beyond the payload; refuse before allocating
    let mut limits = Limits::default();
    limits
        .reserve(decoder.total_bytes())
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    // Missing or malformed EXIF is not a decode failure
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);

    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| PreprocessError::Decode(e.to_string()))?;
    image.apply_orientation(orientation);

    into_rgb(image)
}

/// Normalize to RGB8, rejecting zero-area images
fn into_rgb(image: DynamicImage) -> Result<RgbImage, PreprocessError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::Decode(format!(
            "Image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(image.into_rgb8())
}
