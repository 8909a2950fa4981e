//! Upload gatekeeping: only image content, only up to the configured size.

use crate::config::UploadConfig;
use crate::error::{DetectionError, Result};
use image::ImageFormat;

/// Checks an upload before any decoding work is spent on it.
///
/// `declared_mime` is the type reported by the uploader, if any. It must be an
/// `image/*` type, and the bytes themselves must carry a recognised image
/// signature regardless of what was declared.
pub fn validate_upload(bytes: &[u8], declared_mime: Option<&str>, config: &UploadConfig) -> Result<ImageFormat> {
    if bytes.is_empty() {
        return Err(DetectionError::InvalidUpload("file is empty".to_string()));
    }
    if bytes.len() > config.max_bytes {
        return Err(DetectionError::UploadTooLarge {
            size: bytes.len(),
            limit: config.max_bytes,
        });
    }
    if let Some(mime) = declared_mime {
        if !mime.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(DetectionError::InvalidUpload(format!(
                "expected an image file, got '{mime}'"
            )));
        }
    }
    image::guess_format(bytes)
        .map_err(|_| DetectionError::InvalidUpload("content is not a recognised image format".to_string()))
}
