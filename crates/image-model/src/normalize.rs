//! Normalization of raw search results into candidates.
//!
//! A raw item becomes a `Candidate` only if it has a usable URL that looks
//! like an image, either by file extension or by declared mime type.
//! Everything else is a `SkipReason`, never an error.

use crate::types::{Candidate, RawImageRecord, SkipReason};
use url::Url;

/// Extensions recognized as image formats (matched anywhere in the URL,
/// since CDNs often append query strings after the extension).
pub const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Check whether a URL (or its declared mime type) indicates an image.
pub fn is_image_url(url: &str, mime_type: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    let url_lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| url_lower.contains(ext))
        || mime_type.trim().to_lowercase().starts_with("image/")
}

/// Extract the host from a display link such as "www.example.com" or
/// "https://example.com/path".
///
/// Falls back to the trimmed input when it cannot be parsed as a URL.
pub fn extract_domain(display_link: &str) -> String {
    let trimmed = display_link.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    match Url::parse(&with_scheme) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| h.to_string())
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}

/// Turn a raw search record into a candidate.
///
/// # Returns
/// * `Ok(Candidate)` - the record carries a usable image URL
/// * `Err(SkipReason::MissingUrl)` - no link at all
/// * `Err(SkipReason::UnrecognizedFormat)` - link does not look like an image
pub fn normalize_record(raw: RawImageRecord) -> Result<Candidate, SkipReason> {
    let url = raw.link.trim().to_string();
    if url.is_empty() {
        return Err(SkipReason::MissingUrl);
    }
    if !is_image_url(&url, &raw.mime_type) {
        return Err(SkipReason::UnrecognizedFormat);
    }

    Ok(Candidate {
        url,
        title: raw.title,
        thumbnail_url: raw.thumbnail_link,
        width: raw.width,
        height: raw.height,
        byte_size: raw.byte_size,
        context_url: raw.context_link,
        source_domain: extract_domain(&raw.display_link),
        mime_type: raw.mime_type,
    })
}
