//! Anthropic converter using the Messages API.
//!
//! Sends the prompt and a base64 image content block in one user message.
//! The provenance record carries the Claude model family, a coarse
//! model-version tag derived from the model-name prefix, and the
//! provider-assigned message id as the request id.

use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use crate::media;
use crate::postprocess::strip_markdown_fences;
use crate::prompts::ANTHROPIC_DEFAULT_PROMPT;
use crate::provenance::{self, ProvenanceRecord, SidecarDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

const PROVIDER: &str = "Anthropic";
const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Converts images to Markdown using Anthropic's Claude models.
#[derive(Debug)]
pub struct AnthropicConverter {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::blocking::Client,
}

// ── Request types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

// ── Response types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MessagesResponse {
    id: Option<String>,
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

impl AnthropicConverter {
    /// Build from a registry configuration bag.
    ///
    /// The credential resolves from `config.api_key`, else the
    /// `ANTHROPIC_API_KEY` environment variable.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or(Image2MdError::MissingCredential {
                provider: PROVIDER,
                env_var: "ANTHROPIC_API_KEY",
            })?;

        Ok(Self {
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Coarse model-version tag from the model-name prefix.
    fn model_version(&self) -> Option<String> {
        if self.model.starts_with("claude-3-7") {
            Some("3.7".to_string())
        } else if self.model.starts_with("claude-3-5") {
            Some("3.5".to_string())
        } else if self.model.starts_with("claude-3") {
            Some("3".to_string())
        } else {
            None
        }
    }

    fn build_provenance(
        &self,
        params: Map<String, Value>,
        prompt: &str,
        request_id: Option<String>,
    ) -> ProvenanceRecord {
        ProvenanceRecord::new(PROVIDER, &self.model)
            .model_version(self.model_version())
            .model_family("Claude")
            .request_id(request_id)
            .system_info(provenance::system_info("anthropic_version", API_VERSION))
            .conversion_params(params, prompt)
    }
}

impl Converter for AnthropicConverter {
    fn convert(&self, image_path: &Path, options: &ConvertOptions) -> Result<String, Image2MdError> {
        let bytes = media::load_image_bytes(image_path)?;
        let media_type = media::media_type(image_path);
        let base64_image = media::encode_base64(&bytes);

        let prompt = options
            .prompt
            .clone()
            .unwrap_or_else(|| ANTHROPIC_DEFAULT_PROMPT.to_string());
        let max_tokens = options.max_tokens.unwrap_or(self.max_tokens);
        let temperature = options.temperature.unwrap_or(self.temperature);

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Text {
                        text: prompt.clone(),
                    },
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type: media_type.to_string(),
                            data: base64_image,
                        },
                    },
                ],
            }],
        };

        debug!("Dispatching messages request for {}", image_path.display());
        let resp = self
            .client
            .post(ENDPOINT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: format!("request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: format!("HTTP {status}: {text}"),
            });
        }

        let message: MessagesResponse = resp.json().map_err(|e| Image2MdError::Provider {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;

        // The Markdown is the first content block's text.
        let content = message
            .content
            .first()
            .and_then(|c| c.text.as_deref())
            .ok_or_else(|| Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: "response contained no text content".into(),
            })?;

        let markdown = strip_markdown_fences(content).to_string();

        if options.save_json {
            let mut params = Map::new();
            params.insert("model".into(), Value::from(self.model.clone()));
            params.insert("max_tokens".into(), Value::from(max_tokens));
            params.insert("temperature".into(), Value::from(temperature));
            for (k, v) in &options.extra {
                params.insert(k.clone(), v.clone());
            }

            let record = self.build_provenance(params, &prompt, message.id.clone());

            let sidecar_path =
                provenance::resolve_sidecar_path(image_path, options.json_output_path.as_deref());
            SidecarDocument::new(markdown.clone(), record, image_path, "anthropic")
                .write(&sidecar_path)?;
        }

        Ok(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter_for(model: &str) -> AnthropicConverter {
        AnthropicConverter::from_config(
            &ConverterConfig::new().api_key("test-key").model(model),
        )
        .unwrap()
    }

    #[test]
    fn missing_credential_names_env_var() {
        let err = AnthropicConverter::from_config(&ConverterConfig::new().api_key(""))
            .unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn model_version_from_prefix() {
        assert_eq!(
            converter_for("claude-3-7-sonnet-20250219").model_version(),
            Some("3.7".to_string())
        );
        assert_eq!(
            converter_for("claude-3-5-haiku-20241022").model_version(),
            Some("3.5".to_string())
        );
        assert_eq!(
            converter_for("claude-3-opus-20240229").model_version(),
            Some("3".to_string())
        );
        assert_eq!(converter_for("claude-2.1").model_version(), None);
    }

    #[test]
    fn provenance_carries_family_and_request_id() {
        let converter = converter_for("claude-3-7-sonnet-20250219");
        let record = converter.build_provenance(
            Map::new(),
            "prompt",
            Some("msg_012345".to_string()),
        );
        assert_eq!(record.model_family.as_deref(), Some("Claude"));
        assert_eq!(record.request_id.as_deref(), Some("msg_012345"));
        assert_eq!(record.model_version.as_deref(), Some("3.7"));
    }

    #[test]
    fn provenance_excludes_credential() {
        let converter = converter_for("claude-3-7-sonnet-20250219");
        let mut params = Map::new();
        params.insert("api_key".into(), Value::from("test-key"));
        let record = converter.build_provenance(params, "prompt", None);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("test-key"));
    }
}
