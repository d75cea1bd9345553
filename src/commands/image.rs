use crate::error::AppError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use std::path::Path;

const PREVIEW_SIZE: u32 = 512;
const PREVIEW_QUALITY: u8 = 80;

/// Downscaled preview of a picked image as a base64 data URI, so the
/// webview can show the photo without asset-protocol access to the whole
/// filesystem.
#[tauri::command]
pub fn get_image_preview(path: String) -> Result<String, AppError> {
    let img = image::open(Path::new(&path)).map_err(|e| AppError {
        message: format!("Failed to open image: {}", e),
    })?;

    // thumbnail() keeps aspect ratio; JPEG needs alpha stripped
    let rgb = img.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE).to_rgb8();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut Cursor::new(&mut bytes), PREVIEW_QUALITY);
    rgb.write_with_encoder(encoder).map_err(|e| AppError {
        message: format!("Failed to encode preview: {}", e),
    })?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/jpeg;base64,{}", b64))
}
