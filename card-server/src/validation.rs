//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use. This module
//! provides validators for identifiers, titles, uploads, and whole design
//! documents, including the rule that image layers reference assets by
//! stable storage path and never by signed URL.

use thiserror::Error;
use url::Url;

use card_core::{DesignerDocument, Layer};

/// Maximum length for user IDs.
pub const MAX_USER_ID_LEN: usize = 64;
/// Maximum length for card titles.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum text content length in a single text layer.
pub const MAX_TEXT_CONTENT_LEN: usize = 10_000;
/// Maximum layers per face.
pub const MAX_LAYERS_PER_FACE: usize = 100;
/// Maximum storage path length.
pub const MAX_STORAGE_PATH_LEN: usize = 512;
/// Maximum raw asset upload size.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024; // 10 MB
/// Extensions accepted for raw asset uploads.
pub const ALLOWED_ASSET_EXTS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// User ID exceeds maximum length.
    #[error("user id too long (max {MAX_USER_ID_LEN} chars)")]
    UserIdTooLong,
    /// User ID is empty or contains invalid characters.
    #[error("user id contains invalid characters")]
    UserIdInvalidChars,
    /// Title exceeds maximum length.
    #[error("title too long (max {MAX_TITLE_LEN} chars)")]
    TitleTooLong,
    /// Asset extension is not allowed.
    #[error("unsupported asset extension: {0}")]
    UnsupportedAssetExt(String),
    /// Asset upload exceeds the size limit.
    #[error("asset too large (max {MAX_ASSET_BYTES} bytes)")]
    AssetTooLarge,
    /// Too many layers on one face.
    #[error("too many layers on face {0} (max {MAX_LAYERS_PER_FACE})")]
    TooManyLayers(String),
    /// Text content exceeds maximum length.
    #[error("text content too long on layer {0} (max {MAX_TEXT_CONTENT_LEN} chars)")]
    TextTooLong(String),
    /// An image layer references something other than a stable storage path.
    #[error("layer {0}: image src must be a stable storage path, not a URL")]
    SrcNotStoragePath(String),
}

/// Check if a character is valid for IDs (alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate a user ID taken from the auth boundary.
///
/// # Errors
///
/// Returns an error if the ID is empty, too long, or contains characters
/// unsafe for storage paths.
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_USER_ID_LEN {
        return Err(ValidationError::UserIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::UserIdInvalidChars);
    }
    Ok(())
}

/// Validate a card title.
///
/// # Errors
///
/// Returns an error if the title exceeds [`MAX_TITLE_LEN`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validate a raw-asset upload.
///
/// # Errors
///
/// Returns an error for a disallowed extension or an oversized body.
pub fn validate_asset_upload(ext: &str, size: usize) -> Result<(), ValidationError> {
    let ext = ext.to_lowercase();
    if !ALLOWED_ASSET_EXTS.contains(&ext.as_str()) {
        return Err(ValidationError::UnsupportedAssetExt(ext));
    }
    if size > MAX_ASSET_BYTES {
        return Err(ValidationError::AssetTooLarge);
    }
    Ok(())
}

/// Whether a string is a stable storage path rather than a URL.
///
/// Anything with a scheme, a query string, or a leading slash is rejected:
/// signed URLs expire and leak access tokens if persisted.
#[must_use]
pub fn is_storage_path(src: &str) -> bool {
    if src.is_empty() || src.len() > MAX_STORAGE_PATH_LEN {
        return false;
    }
    if src.starts_with('/') || src.contains('?') || src.contains('#') || src.contains("..") {
        return false;
    }
    // A parseable absolute URL means a scheme is present (https://, data:, ...).
    if Url::parse(src).is_ok() {
        return false;
    }
    true
}

/// Validate a design document's content limits and asset references.
///
/// Shape and version are checked by [`DesignerDocument::validate`]; this
/// adds the service-level bounds on untrusted input.
///
/// # Errors
///
/// Returns the first violated limit.
pub fn validate_design(design: &DesignerDocument) -> Result<(), ValidationError> {
    for (face_id, face) in design.faces.iter() {
        if face.layers.len() > MAX_LAYERS_PER_FACE {
            return Err(ValidationError::TooManyLayers(face_id.to_string()));
        }
        for layer in &face.layers {
            match layer {
                Layer::Text(text) => {
                    if text.text.chars().count() > MAX_TEXT_CONTENT_LEN {
                        return Err(ValidationError::TextTooLong(text.base.id.to_string()));
                    }
                }
                Layer::Image(image) => {
                    if !is_storage_path(&image.src) {
                        return Err(ValidationError::SrcNotStoragePath(
                            image.base.id.to_string(),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
