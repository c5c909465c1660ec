//! OCR stub converter.
//!
//! A pure local stand-in for an OCR engine: no network I/O, deterministic
//! output parameterised only by the image file name and the configured
//! language code. Exists to exercise the converter contract end-to-end
//! (registry dispatch, save paths, option plumbing) without a provider.

use crate::backends::{ensure_exists, file_name};
use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_LANGUAGE: &str = "eng";

/// Converts images to Markdown using OCR (stubbed).
#[derive(Debug, Clone)]
pub struct OcrConverter {
    language: String,
    #[allow(dead_code)]
    ocr_options: BTreeMap<String, Value>,
}

impl OcrConverter {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ocr_options: BTreeMap::new(),
        }
    }

    /// Build from a registry configuration bag. Unrelated fields are ignored.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        Ok(Self {
            language: config
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            ocr_options: config.extra.clone(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for OcrConverter {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Converter for OcrConverter {
    fn convert(&self, image_path: &Path, _options: &ConvertOptions) -> Result<String, Image2MdError> {
        ensure_exists(image_path)?;

        Ok(format!(
            "# Content from {name}\n\n\
             This text was extracted using OCR ({language}) from the image.\n\n\
             - First detected text item\n\
             - Second detected text item\n\
             - Third detected text item\n\n\
             > Some quoted text detected in the image\n\n",
            name = file_name(image_path),
            language = self.language,
        ))
    }
}
