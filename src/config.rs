//! Configuration types shared across converters.
//!
//! Two structs with different lifetimes:
//!
//! * [`ConverterConfig`] — the construction-time bag handed to the
//!   registry. Heterogeneous backends read different subsets of it; a
//!   constructor MUST ignore fields irrelevant to it, because the registry
//!   convenience path reuses one bag for both construction and the call.
//!
//! * [`ConvertOptions`] — per-call overrides merged over the converter's
//!   constructor defaults (per-call wins). Built fresh on every `convert`.
//!
//! # Design choice: named optional fields over a string-keyed map
//! The fields every built-in backend understands are typed and named;
//! anything truly backend-specific travels in `extra`, which is forwarded
//! opaquely. This keeps misspelled common options a compile error while
//! still letting custom converters invent their own knobs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Construction-time configuration for any converter.
///
/// All fields are optional; each backend applies its own defaults and
/// ignores what it does not understand.
///
/// # Example
/// ```rust
/// use image2md::ConverterConfig;
///
/// let config = ConverterConfig::new()
///     .model("claude-3-7-sonnet-20250219")
///     .max_tokens(2000)
///     .temperature(0.0);
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Authentication credential. Falls back to the provider-specific
    /// environment variable when absent.
    pub api_key: Option<String>,
    /// Service endpoint URL (Azure only).
    pub endpoint: Option<String>,
    /// Model identifier for LLM backends.
    pub model: Option<String>,
    /// Document model id (Azure only).
    pub model_id: Option<String>,
    /// Wire API version (Azure only).
    pub api_version: Option<String>,
    /// Maximum tokens the model may generate.
    pub max_tokens: Option<u32>,
    /// Token limit under its newer-model-family name (o4-, gpt-5).
    pub max_completion_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// OCR language code (ocr stub only).
    pub language: Option<String>,
    /// Whether the structure stub emits tables.
    pub detect_tables: Option<bool>,
    /// Whether the structure stub emits headings.
    pub detect_headings: Option<bool>,
    /// Whether the structure stub emits lists.
    pub detect_lists: Option<bool>,
    /// Prompt override applied to every call made through the registry
    /// convenience path.
    pub prompt: Option<String>,
    /// Whether to write the provenance-annotated JSON sidecar.
    pub save_json: bool,
    /// Sidecar path; defaults to the image path with a `.json` extension.
    pub json_output_path: Option<PathBuf>,
    /// Backend-specific pass-through options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn max_completion_tokens(mut self, n: u32) -> Self {
        self.max_completion_tokens = Some(n);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn detect_tables(mut self, v: bool) -> Self {
        self.detect_tables = Some(v);
        self
    }

    pub fn detect_headings(mut self, v: bool) -> Self {
        self.detect_headings = Some(v);
        self
    }

    pub fn detect_lists(mut self, v: bool) -> Self {
        self.detect_lists = Some(v);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn save_json(mut self, v: bool) -> Self {
        self.save_json = v;
        self
    }

    pub fn json_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_output_path = Some(path.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Extract the per-call portion of this bag.
    ///
    /// The registry's one-call convenience path constructs the converter
    /// and invokes it from the same `ConverterConfig`; this is the
    /// call-side view of that bag.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            prompt: self.prompt.clone(),
            max_tokens: self.max_tokens,
            max_completion_tokens: self.max_completion_tokens,
            temperature: self.temperature,
            save_json: self.save_json,
            json_output_path: self.json_output_path.clone(),
            extra: self.extra.clone(),
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("temperature", &self.temperature)
            .field("language", &self.language)
            .field("detect_tables", &self.detect_tables)
            .field("detect_headings", &self.detect_headings)
            .field("detect_lists", &self.detect_lists)
            .field("save_json", &self.save_json)
            .field("json_output_path", &self.json_output_path)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Per-call conversion options.
///
/// Everything here overrides the converter's constructor defaults for this
/// call only; `None` means "use the configured default".
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Prompt override for LLM-backed converters.
    pub prompt: Option<String>,
    /// Token-limit override.
    pub max_tokens: Option<u32>,
    /// Token-limit override under the newer-model-family parameter name.
    pub max_completion_tokens: Option<u32>,
    /// Temperature override.
    pub temperature: Option<f32>,
    /// Write the provenance-annotated JSON sidecar next to the Markdown.
    pub save_json: bool,
    /// Sidecar path; defaults to the image path with a `.json` extension.
    pub json_output_path: Option<PathBuf>,
    /// Backend-specific pass-through options.
    pub extra: BTreeMap<String, Value>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn max_completion_tokens(mut self, n: u32) -> Self {
        self.max_completion_tokens = Some(n);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn save_json(mut self, v: bool) -> Self {
        self.save_json = v;
        self
    }

    pub fn json_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_output_path = Some(path.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = ConverterConfig::new().api_key("sk-secret-123");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret-123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn convert_options_carries_call_fields() {
        let config = ConverterConfig::new()
            .prompt("describe")
            .max_tokens(512)
            .save_json(true);
        let options = config.convert_options();
        assert_eq!(options.prompt.as_deref(), Some("describe"));
        assert_eq!(options.max_tokens, Some(512));
        assert!(options.save_json);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let config: ConverterConfig =
            serde_json::from_str(r#"{"model": "gpt-4o", "detail": "high"}"#).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.extra.get("detail"), Some(&Value::from("high")));
    }
}
