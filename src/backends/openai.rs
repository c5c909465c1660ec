//! OpenAI converter using the Chat Completions API.
//!
//! Sends the prompt and a base64 data-URL image part in one user message,
//! preceded by a fixed system message. Registered under the `"llm"` key.
//!
//! ## Newer model families
//! `o4-` and `gpt-5` models take their token limit as
//! `max_completion_tokens` instead of `max_tokens`, and only accept the
//! default sampling temperature. The converter detects the model-name
//! prefix and switches parameter names; for `o4-` models a caller-supplied
//! temperature other than 1.0 is overridden with a warning at
//! construction time.

use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use crate::media;
use crate::postprocess::strip_markdown_fences;
use crate::prompts::{OPENAI_DEFAULT_PROMPT, OPENAI_SYSTEM_PROMPT};
use crate::provenance::{self, ProvenanceRecord, SidecarDocument};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

const PROVIDER: &str = "OpenAI";
const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Converts images to Markdown via OpenAI chat completions.
#[derive(Debug)]
pub struct OpenAiConverter {
    api_key: String,
    model: String,
    max_tokens: u32,
    max_completion_tokens: Option<u32>,
    temperature: f32,
    llm_options: BTreeMap<String, Value>,
    client: reqwest::blocking::Client,
}

// ── Request types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

impl OpenAiConverter {
    /// Build from a registry configuration bag.
    ///
    /// The credential resolves from `config.api_key`, else the
    /// `OPENAI_API_KEY` environment variable; absence is a construction
    /// error, never a deferred failure.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or(Image2MdError::MissingCredential {
                provider: PROVIDER,
                env_var: "OPENAI_API_KEY",
            })?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let requested_temperature = config.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let temperature = if model.starts_with("o4-") {
            if (requested_temperature - 1.0).abs() > f32::EPSILON {
                warn!(
                    "Model {} only supports temperature=1.0; overriding requested value {}",
                    model, requested_temperature
                );
            }
            1.0
        } else {
            requested_temperature
        };

        Ok(Self {
            api_key,
            model,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_completion_tokens: config.max_completion_tokens,
            temperature,
            llm_options: config.extra.clone(),
            client: reqwest::blocking::Client::new(),
        })
    }

    fn is_newer_model_family(&self) -> bool {
        self.model.starts_with("o4-") || self.model.starts_with("gpt-5")
    }

    /// The effective request parameters for this call, per-call overrides
    /// winning over constructor defaults.
    fn effective_params(&self, options: &ConvertOptions) -> (Option<u32>, Option<u32>, Option<f32>) {
        if self.is_newer_model_family() {
            let limit = options
                .max_completion_tokens
                .or(self.max_completion_tokens)
                .or(options.max_tokens)
                .unwrap_or(self.max_tokens);
            // Newer families only accept the default temperature, so the
            // parameter is omitted entirely.
            (None, Some(limit), None)
        } else {
            let limit = options.max_tokens.unwrap_or(self.max_tokens);
            let temperature = options.temperature.unwrap_or(self.temperature);
            (Some(limit), None, Some(temperature))
        }
    }

    fn build_provenance(
        &self,
        params: Map<String, Value>,
        prompt: &str,
        request_id: Option<String>,
    ) -> ProvenanceRecord {
        let model_version = self
            .llm_options
            .get("model_version")
            .and_then(Value::as_str)
            .map(String::from);

        ProvenanceRecord::new(PROVIDER, &self.model)
            .model_version(model_version)
            .request_id(request_id)
            .system_info(provenance::system_info("openai_api_version", "v1"))
            .conversion_params(params, prompt)
    }
}

impl Converter for OpenAiConverter {
    fn convert(&self, image_path: &Path, options: &ConvertOptions) -> Result<String, Image2MdError> {
        let bytes = media::load_image_bytes(image_path)?;
        let media_type = media::media_type(image_path);
        let base64_image = media::encode_base64(&bytes);

        let prompt = options
            .prompt
            .clone()
            .unwrap_or_else(|| OPENAI_DEFAULT_PROMPT.to_string());

        let (max_tokens, max_completion_tokens, temperature) = self.effective_params(options);

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: vec![ChatContent::Text {
                        text: OPENAI_SYSTEM_PROMPT.to_string(),
                    }],
                },
                ChatMessage {
                    role: "user",
                    content: vec![
                        ChatContent::Text {
                            text: prompt.clone(),
                        },
                        ChatContent::ImageUrl {
                            image_url: ImageUrl {
                                url: media::data_url(media_type, &base64_image),
                            },
                        },
                    ],
                },
            ],
            max_tokens,
            max_completion_tokens,
            temperature,
        };

        debug!("Dispatching chat completion for {}", image_path.display());
        let resp = self
            .client
            .post(ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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

        // Parsed as a raw value so the sidecar can embed the full response.
        let raw: Value = resp.json().map_err(|e| Image2MdError::Provider {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        })?;

        let content = raw
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: "response contained no message content".into(),
            })?;

        let markdown = strip_markdown_fences(content).to_string();

        if options.save_json {
            let mut params = Map::new();
            params.insert("model".into(), Value::from(self.model.clone()));
            if let Some(n) = max_tokens {
                params.insert("max_tokens".into(), Value::from(n));
            }
            if let Some(n) = max_completion_tokens {
                params.insert("max_completion_tokens".into(), Value::from(n));
            }
            if let Some(t) = temperature {
                params.insert("temperature".into(), Value::from(t));
            }
            for (k, v) in &options.extra {
                params.insert(k.clone(), v.clone());
            }

            let request_id = raw.get("id").and_then(Value::as_str).map(String::from);
            let record = self.build_provenance(params, &prompt, request_id);

            let sidecar_path =
                provenance::resolve_sidecar_path(image_path, options.json_output_path.as_deref());
            SidecarDocument::new(markdown.clone(), record, image_path, "llm")
                .response(raw)
                .write(&sidecar_path)?;
        }

        Ok(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter_for(model: &str) -> OpenAiConverter {
        OpenAiConverter::from_config(
            &ConverterConfig::new().api_key("test-key").model(model),
        )
        .unwrap()
    }

    #[test]
    fn missing_credential_names_env_var() {
        // An explicit empty key never falls through to a live environment.
        let err = OpenAiConverter::from_config(&ConverterConfig::new().api_key(""))
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn older_models_use_max_tokens_and_temperature() {
        let converter = converter_for("gpt-4o");
        let (max_tokens, max_completion, temperature) =
            converter.effective_params(&ConvertOptions::default());
        assert_eq!(max_tokens, Some(4000));
        assert_eq!(max_completion, None);
        assert_eq!(temperature, Some(0.2));
    }

    #[test]
    fn newer_models_switch_parameter_name_and_drop_temperature() {
        let converter = converter_for("o4-mini");
        let (max_tokens, max_completion, temperature) =
            converter.effective_params(&ConvertOptions::default());
        assert_eq!(max_tokens, None);
        assert_eq!(max_completion, Some(4000));
        assert_eq!(temperature, None);
    }

    #[test]
    fn gpt5_also_uses_completion_tokens() {
        let converter = converter_for("gpt-5-turbo");
        let (_, max_completion, temperature) =
            converter.effective_params(&ConvertOptions::default());
        assert_eq!(max_completion, Some(4000));
        assert_eq!(temperature, None);
    }

    #[test]
    fn o4_temperature_is_clamped_at_construction() {
        let converter = OpenAiConverter::from_config(
            &ConverterConfig::new()
                .api_key("test-key")
                .model("o4-mini")
                .temperature(0.2),
        )
        .unwrap();
        assert_eq!(converter.temperature, 1.0);
    }

    #[test]
    fn per_call_overrides_win() {
        let converter = converter_for("gpt-4o");
        let options = ConvertOptions::new().max_tokens(512).temperature(0.7);
        let (max_tokens, _, temperature) = converter.effective_params(&options);
        assert_eq!(max_tokens, Some(512));
        assert_eq!(temperature, Some(0.7));
    }

    #[test]
    fn provenance_excludes_credential() {
        let converter = converter_for("gpt-4o");
        let mut params = Map::new();
        params.insert("api_key".into(), Value::from("test-key"));
        params.insert("max_tokens".into(), Value::from(4000));
        let record = converter.build_provenance(params, "prompt text", None);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("test-key"));
        assert!(json.contains("prompt text"));
    }
}
