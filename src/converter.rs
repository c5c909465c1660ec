//! The converter contract every backend implements.

use crate::config::ConvertOptions;
use crate::error::Image2MdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Capability interface for image-to-Markdown conversion.
///
/// A converter is bound to one backend at construction time and fully
/// configured once it exists — it never falls back to a different backend.
/// Calls are independent and stateless with respect to prior calls; the
/// only shared state is the bound credential/config.
///
/// Implementors provide [`convert`](Converter::convert); the provided
/// [`save_markdown`](Converter::save_markdown) covers the common
/// convert-then-persist path.
pub trait Converter: Send + Sync + std::fmt::Debug {
    /// Convert the image at `image_path` to Markdown text.
    ///
    /// # Errors
    /// * [`Image2MdError::ImageNotFound`] if the path does not exist
    /// * [`Image2MdError::Provider`] if the external call fails
    fn convert(&self, image_path: &Path, options: &ConvertOptions)
        -> Result<String, Image2MdError>;

    /// Convert and write the Markdown to `output_path`, defaulting to the
    /// image path with its extension replaced by `.md`. Missing parent
    /// directories are created. Returns the path actually written.
    ///
    /// Errors from [`convert`](Converter::convert) propagate unchanged.
    fn save_markdown(
        &self,
        image_path: &Path,
        output_path: Option<&Path>,
        options: &ConvertOptions,
    ) -> Result<PathBuf, Image2MdError> {
        let markdown = self.convert(image_path, options)?;

        let output_path = match output_path {
            Some(p) => p.to_path_buf(),
            None => image_path.with_extension("md"),
        };

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    Image2MdError::OutputWriteFailed {
                        path: output_path.clone(),
                        source,
                    }
                })?;
            }
        }

        std::fs::write(&output_path, &markdown).map_err(|source| {
            Image2MdError::OutputWriteFailed {
                path: output_path.clone(),
                source,
            }
        })?;

        debug!("Wrote markdown: {}", output_path.display());
        Ok(output_path)
    }
}
