//! Provenance records and the JSON sidecar protocol.
//!
//! Every LLM-backed converter can describe *how* a conversion was produced:
//! when it ran, which model and provider served it, what machine it ran on,
//! and the exact request parameters (prompt included). The record is built
//! immediately after a successful response, embedded into a JSON sidecar
//! next to the Markdown output, and then discarded — converters never
//! retain it.
//!
//! The one hard invariant: **the credential never reaches disk**.
//! [`sanitize_params`] strips credential-bearing keys before the parameter
//! map is attached, and the typed fields of [`ProvenanceRecord`] have no
//! slot a key could hide in.

use crate::error::Image2MdError;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Parameter keys that must never be serialized into provenance.
const SENSITIVE_KEYS: &[&str] = &["api_key", "credential"];

/// Structured description of one completed conversion.
///
/// The base shape is shared by every LLM-backed converter; providers add
/// their own fields (`model_family`, `request_id`, `api_version`) which
/// stay out of the JSON entirely when unset.
#[derive(Debug, Clone, Serialize)]
pub struct ProvenanceRecord {
    /// RFC 3339 timestamp captured when the record was built.
    pub timestamp: String,
    /// Model identifier the conversion ran against.
    pub model: String,
    /// Coarse model-version tag derived from the model name prefix.
    pub model_version: Option<String>,
    /// Provider name ("OpenAI", "Anthropic", "Google", "Azure").
    pub provider: String,
    /// Model family ("Claude", "Gemini") for the providers that report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    /// Provider-assigned request identifier, when the response carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Wire API version (Azure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Host/runtime metadata captured fresh at build time.
    pub system_info: BTreeMap<String, String>,
    /// The effective request parameters, credential removed, prompt included.
    pub conversion_params: Map<String, Value>,
}

impl ProvenanceRecord {
    /// Start a record for `provider`/`model`, stamping the current time.
    ///
    /// Timestamp and system info are captured fresh on every call — the
    /// record describes this conversion, not the converter.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            model: model.into(),
            model_version: None,
            provider: provider.into(),
            model_family: None,
            request_id: None,
            api_version: None,
            system_info: BTreeMap::new(),
            conversion_params: Map::new(),
        }
    }

    pub fn model_version(mut self, version: Option<String>) -> Self {
        self.model_version = version;
        self
    }

    pub fn model_family(mut self, family: impl Into<String>) -> Self {
        self.model_family = Some(family.into());
        self
    }

    pub fn request_id(mut self, id: Option<String>) -> Self {
        self.request_id = id;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn system_info(mut self, info: BTreeMap<String, String>) -> Self {
        self.system_info = info;
        self
    }

    /// Attach the effective request parameters, stripping credential keys.
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.conversion_params = sanitize_params(params);
        self
    }

    /// Attach the effective request parameters, stripping credential keys
    /// and injecting the prompt text actually sent.
    pub fn conversion_params(mut self, params: Map<String, Value>, prompt: &str) -> Self {
        let mut safe = sanitize_params(params);
        safe.insert("prompt".to_string(), Value::from(prompt));
        self.conversion_params = safe;
        self
    }
}

/// Remove credential-bearing keys from a parameter map.
pub fn sanitize_params(params: Map<String, Value>) -> Map<String, Value> {
    params
        .into_iter()
        .filter(|(k, _)| !SENSITIVE_KEYS.contains(&k.as_str()))
        .collect()
}

/// Collect host/runtime metadata for provenance.
///
/// `sdk_key`/`sdk_version` record the wire API version the converter
/// speaks — the analogue of an SDK version string when the "SDK" is a
/// plain HTTP client.
pub fn system_info(sdk_key: &str, sdk_version: &str) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();
    info.insert("os".to_string(), std::env::consts::OS.to_string());
    info.insert("arch".to_string(), std::env::consts::ARCH.to_string());
    info.insert("hostname".to_string(), hostname());
    info.insert(
        "library_version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    info.insert(sdk_key.to_string(), sdk_version.to_string());
    info
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// The JSON document written next to the Markdown output when the caller
/// opts in via `save_json`.
#[derive(Debug, Serialize)]
pub struct SidecarDocument {
    /// The normalized Markdown, exactly as returned to the caller.
    pub markdown: String,
    pub provenance: ProvenanceRecord,
    /// RFC 3339 timestamp of the sidecar write.
    pub timestamp: String,
    /// The image the conversion was run on.
    pub image_path: String,
    /// Registry key of the converter that produced this ("llm", "azure", …).
    pub conversion_type: String,
    /// Full raw provider response (OpenAI).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Full raw analyze result (Azure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_result: Option<Value>,
}

impl SidecarDocument {
    pub fn new(
        markdown: impl Into<String>,
        provenance: ProvenanceRecord,
        image_path: &Path,
        conversion_type: impl Into<String>,
    ) -> Self {
        Self {
            markdown: markdown.into(),
            provenance,
            timestamp: Utc::now().to_rfc3339(),
            image_path: image_path.display().to_string(),
            conversion_type: conversion_type.into(),
            response: None,
            azure_result: None,
        }
    }

    pub fn response(mut self, raw: Value) -> Self {
        self.response = Some(raw);
        self
    }

    pub fn azure_result(mut self, raw: Value) -> Self {
        self.azure_result = Some(raw);
        self
    }

    /// Serialize and write this sidecar to `path` (pretty-printed UTF-8).
    pub fn write(&self, path: &Path) -> Result<(), Image2MdError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Image2MdError::Internal(format!("sidecar serialization: {e}")))?;
        std::fs::write(path, json).map_err(|source| Image2MdError::SidecarWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Wrote sidecar: {}", path.display());
        Ok(())
    }
}

/// Resolve the sidecar path: the explicit override, else `<image>.json`.
pub fn resolve_sidecar_path(image_path: &Path, explicit: Option<&Path>) -> std::path::PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => image_path.with_extension("json"),
    }
}
