// MIME lookup by file extension

use crate::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::{Result, TakeoutError};

/// Media class of a file, decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Resolve a media kind and MIME essence from a file extension.
/// Accepts a leading dot and any case. Non-media extensions are an error.
pub fn media_type_from_ext(ext: &str) -> Result<(MediaKind, String)> {
    let e = ext.trim_start_matches('.').to_lowercase();
    if IMAGE_EXTENSIONS.contains(&e.as_str()) {
        return Ok((MediaKind::Image, essence(&e, "image")));
    }
    if VIDEO_EXTENSIONS.contains(&e.as_str()) {
        return Ok((MediaKind::Video, essence(&e, "video")));
    }
    Err(TakeoutError::UnknownExtension(ext.to_string()))
}

fn essence(ext: &str, fallback_type: &str) -> String {
    mime_guess::from_ext(ext)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| format!("{}/{}", fallback_type, ext))
}

/// True when `ext` equals a known media extension missing its final
/// character. The exporter's name cap can cut one character off an
/// embedded extension: `.jp` passes, `.ORIGINAL` and `.COVER` do not.
pub fn is_extension_prefix(ext: &str) -> bool {
    let e = ext.trim_start_matches('.').to_lowercase();
    if e.is_empty() {
        return false;
    }
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS.iter())
        .any(|known| known.len() > 1 && e == known[..known.len() - 1])
}
