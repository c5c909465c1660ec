//! Azure Document Intelligence converter.
//!
//! Unlike the LLM backends this one sends the raw image bytes (no base64)
//! to the `:analyze` endpoint and asks the service itself for
//! Markdown-formatted output, which requires API version 2024-11-30 or
//! newer. The analyze operation is asynchronous on the service side: the
//! initial request returns `202 Accepted` with an `operation-location`
//! header that is polled until the analysis reaches a terminal state.

use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use crate::media;
use crate::provenance::{self, ProvenanceRecord, SidecarDocument};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "Azure Document Intelligence";
const DEFAULT_API_VERSION: &str = "2024-11-30";
/// Markdown output first shipped in this API version.
const MIN_MARKDOWN_API_VERSION: &str = "2024-11-30";
const DEFAULT_MODEL_ID: &str = "prebuilt-layout";
const DEFAULT_FEATURES: &str = "keyValuePairs,languages";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Option keys that would conflict with values already bound at
/// construction time; stripped before forwarding extras to the service.
const CONFLICTING_KEYS: &[&str] = &[
    "model_id",
    "api_version",
    "endpoint",
    "api_key",
    "credential",
    "json_output_path",
];

/// Converts images to Markdown using the Azure Document Intelligence service.
#[derive(Debug)]
pub struct AzureDocumentConverter {
    endpoint: String,
    api_key: String,
    api_version: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl AzureDocumentConverter {
    /// Build from a registry configuration bag.
    ///
    /// Endpoint and credential resolve from the config, else the
    /// `AZURE_ENDPOINT` / `AZURE_API_KEY` environment variables; both are
    /// required.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        let endpoint = config
            .endpoint
            .clone()
            .or_else(|| std::env::var("AZURE_ENDPOINT").ok())
            .filter(|e| !e.is_empty());
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("AZURE_API_KEY").ok())
            .filter(|k| !k.is_empty());

        let (endpoint, api_key) = match (endpoint, api_key) {
            (Some(e), Some(k)) => (e, k),
            _ => {
                return Err(Image2MdError::MissingCredential {
                    provider: PROVIDER,
                    env_var: "AZURE_ENDPOINT and AZURE_API_KEY",
                })
            }
        };

        let api_version = config
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        // ISO dates compare correctly as strings.
        if api_version.as_str() < MIN_MARKDOWN_API_VERSION {
            return Err(Image2MdError::InvalidConfig(format!(
                "Azure API version {} does not support markdown output; use {} or newer",
                api_version, MIN_MARKDOWN_API_VERSION
            )));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version,
            model_id: config
                .model_id
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            client: reqwest::blocking::Client::new(),
        })
    }

    fn provider_err(&self, message: impl Into<String>) -> Image2MdError {
        Image2MdError::Provider {
            provider: PROVIDER.into(),
            message: message.into(),
        }
    }

    /// Extras minus the keys already bound at construction time.
    fn forwardable_extras(options: &ConvertOptions) -> Vec<(String, String)> {
        options
            .extra
            .iter()
            .filter(|(k, _)| !CONFLICTING_KEYS.contains(&k.as_str()))
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect()
    }

    fn build_provenance(&self, options: &ConvertOptions, features: &str) -> ProvenanceRecord {
        let mut params = Map::new();
        params.insert("model_id".into(), Value::from(self.model_id.clone()));
        params.insert("api_version".into(), Value::from(self.api_version.clone()));
        params.insert("endpoint".into(), Value::from(mask_endpoint(&self.endpoint)));
        params.insert("features".into(), Value::from(features));
        for (k, v) in Self::forwardable_extras(options) {
            params.insert(k, Value::from(v));
        }

        ProvenanceRecord::new("Azure", &self.model_id)
            .api_version(&self.api_version)
            .system_info(provenance::system_info(
                "azure_api_version",
                &self.api_version,
            ))
            .params(params)
    }

    /// Dispatch the analyze request and poll it to completion, returning
    /// the raw analyze result.
    fn analyze(&self, document_bytes: Vec<u8>, options: &ConvertOptions) -> Result<Value, Image2MdError> {
        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze",
            self.endpoint, self.model_id
        );

        let mut query: Vec<(String, String)> = vec![
            ("api-version".into(), self.api_version.clone()),
            ("outputContentFormat".into(), "markdown".into()),
            ("features".into(), DEFAULT_FEATURES.into()),
            ("stringIndexType".into(), "utf16CodeUnit".into()),
        ];
        query.extend(Self::forwardable_extras(options));

        debug!("Dispatching analyze request to {}", url);
        let resp = self
            .client
            .post(&url)
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(document_bytes)
            .send()
            .map_err(|e| self.provider_err(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(self.provider_err(format!("HTTP {status}: {text}")));
        }

        let operation_url = resp
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| self.provider_err("analyze response missing operation-location"))?;

        // The service processes asynchronously; poll until terminal.
        loop {
            let poll = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .map_err(|e| self.provider_err(format!("poll failed: {e}")))?;

            let poll_status = poll.status();
            if !poll_status.is_success() {
                let text = poll.text().unwrap_or_default();
                return Err(self.provider_err(format!("poll HTTP {poll_status}: {text}")));
            }

            let body: Value = poll
                .json()
                .map_err(|e| self.provider_err(format!("failed to parse poll response: {e}")))?;

            match body.get("status").and_then(Value::as_str) {
                Some("succeeded") => {
                    return body
                        .get("analyzeResult")
                        .cloned()
                        .ok_or_else(|| self.provider_err("succeeded poll missing analyzeResult"));
                }
                Some("failed") => {
                    let detail = body
                        .get("error")
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no error detail".into());
                    return Err(self.provider_err(format!("analysis failed: {detail}")));
                }
                Some("notStarted") | Some("running") => {
                    std::thread::sleep(POLL_INTERVAL);
                }
                other => {
                    return Err(
                        self.provider_err(format!("unexpected analysis status: {:?}", other))
                    );
                }
            }
        }
    }
}

impl Converter for AzureDocumentConverter {
    fn convert(&self, image_path: &Path, options: &ConvertOptions) -> Result<String, Image2MdError> {
        let document_bytes = media::load_image_bytes(image_path)?;

        let result = self.analyze(document_bytes, options)?;

        let markdown = result
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| self.provider_err("analyze result contained no content"))?
            .to_string();

        if options.save_json {
            let record = self.build_provenance(options, DEFAULT_FEATURES);
            let sidecar_path =
                provenance::resolve_sidecar_path(image_path, options.json_output_path.as_deref());
            SidecarDocument::new(markdown.clone(), record, image_path, "azure")
                .azure_result(result)
                .write(&sidecar_path)?;
        }

        Ok(markdown)
    }
}

/// Mask an endpoint URL down to `scheme://host/***` so recorded parameters
/// never leak resource paths or query strings.
fn mask_endpoint(endpoint: &str) -> String {
    if let Some((scheme, rest)) = endpoint.split_once("://") {
        let host = rest.split('/').next().unwrap_or(rest);
        format!("{}://{}/***", scheme, host)
    } else {
        "***".to_string()
    }
}
