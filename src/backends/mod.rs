//! Backend converter implementations.
//!
//! Three local stubs (`ocr`, `structure`, `vision`) exercise the contract
//! without network I/O; the provider-backed converters live behind their
//! cargo features so a disabled provider never costs a dependency.

pub mod ocr;
pub mod structure;
pub mod vision;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "azure")]
pub mod azure;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

pub use ocr::OcrConverter;
pub use structure::StructureConverter;
pub use vision::VisionConverter;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicConverter;
#[cfg(feature = "azure")]
pub use azure::AzureDocumentConverter;
#[cfg(feature = "gemini")]
pub use gemini::GeminiConverter;
#[cfg(feature = "openai")]
pub use openai::OpenAiConverter;

use std::path::Path;

/// Display name of the image file, for the stub converters' output.
pub(crate) fn file_name(image_path: &Path) -> String {
    image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_path.display().to_string())
}

/// File stem of the image, for the structure stub's mock title.
pub(crate) fn file_stem(image_path: &Path) -> String {
    image_path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(image_path))
}

/// Existence check shared by the stubs (the network backends check as part
/// of loading bytes).
pub(crate) fn ensure_exists(image_path: &Path) -> Result<(), crate::error::Image2MdError> {
    if !image_path.exists() {
        return Err(crate::error::Image2MdError::ImageNotFound {
            path: image_path.to_path_buf(),
        });
    }
    Ok(())
}
