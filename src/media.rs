//! Image loading and wire encoding.
//!
//! LLM APIs accept images as base64 strings embedded in the JSON request
//! body; the Azure Document Intelligence endpoint takes the raw bytes
//! instead. Both paths start here: existence check, byte load, and
//! extension-based media-type resolution.

use crate::error::Image2MdError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Read the image bytes, failing with [`Image2MdError::ImageNotFound`] if
/// the path does not exist.
///
/// The existence check runs before any backend work so a typo'd path never
/// costs a network round-trip.
pub fn load_image_bytes(image_path: &Path) -> Result<Vec<u8>, Image2MdError> {
    if !image_path.exists() {
        return Err(Image2MdError::ImageNotFound {
            path: image_path.to_path_buf(),
        });
    }
    std::fs::read(image_path).map_err(|source| Image2MdError::ImageReadFailed {
        path: image_path.to_path_buf(),
        source,
    })
}

/// Base64-encode image bytes for JSON transport.
pub fn encode_base64(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    b64
}

/// Resolve the media type from the file extension.
///
/// PNG is the fallback when the extension is missing or unrecognised —
/// providers tolerate a wrong media type better than a missing one.
pub fn media_type(image_path: &Path) -> &'static str {
    match image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Render a `data:` URL for OpenAI-style APIs.
pub fn data_url(media_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", media_type, base64_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn media_type_known_extensions() {
        assert_eq!(media_type(Path::new("a.png")), "image/png");
        assert_eq!(media_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(media_type(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(media_type(Path::new("a.gif")), "image/gif");
        assert_eq!(media_type(Path::new("a.webp")), "image/webp");
    }

    #[test]
    fn media_type_falls_back_to_png() {
        assert_eq!(media_type(Path::new("a.tiff")), "image/png");
        assert_eq!(media_type(Path::new("no_extension")), "image/png");
    }

    #[test]
    fn load_missing_image_fails() {
        let err = load_image_bytes(&PathBuf::from("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, Image2MdError::ImageNotFound { .. }));
    }

    #[test]
    fn encode_base64_round_trips() {
        let encoded = encode_base64(&[1, 2, 3]);
        let decoded = STANDARD.decode(&encoded).expect("valid base64");
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn data_url_shape() {
        let url = data_url("image/png", "QUJD");
        assert_eq!(url, "data:image/png;base64,QUJD");
    }
}
