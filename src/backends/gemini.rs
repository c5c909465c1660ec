//! Gemini converter using the generateContent API.
//!
//! Sends the prompt and an inline base64 image part in one content turn;
//! generation limits travel in `generationConfig`. The Markdown is the
//! concatenation of the first candidate's text parts.

use crate::config::{ConvertOptions, ConverterConfig};
use crate::converter::Converter;
use crate::error::Image2MdError;
use crate::media;
use crate::postprocess::strip_markdown_fences;
use crate::prompts::GEMINI_DEFAULT_PROMPT;
use crate::provenance::{self, ProvenanceRecord, SidecarDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

const PROVIDER: &str = "Google";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_VERSION: &str = "v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Converts images to Markdown using Google's Gemini models.
#[derive(Debug)]
pub struct GeminiConverter {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::blocking::Client,
}

// ── Request types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

// ── Response types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiConverter {
    /// Build from a registry configuration bag.
    ///
    /// The credential resolves from `config.api_key`, else the
    /// `GOOGLE_API_KEY` environment variable.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, Image2MdError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or(Image2MdError::MissingCredential {
                provider: PROVIDER,
                env_var: "GOOGLE_API_KEY",
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
        if self.model.starts_with("gemini-2.5") {
            Some("2.5".to_string())
        } else if self.model.starts_with("gemini-2") {
            Some("2.0".to_string())
        } else if self.model.starts_with("gemini-1.5") {
            Some("1.5".to_string())
        } else if self.model.starts_with("gemini-1") {
            Some("1.0".to_string())
        } else {
            None
        }
    }

    fn build_provenance(&self, params: Map<String, Value>, prompt: &str) -> ProvenanceRecord {
        ProvenanceRecord::new(PROVIDER, &self.model)
            .model_version(self.model_version())
            .model_family("Gemini")
            .system_info(provenance::system_info("google_genai_version", API_VERSION))
            .conversion_params(params, prompt)
    }
}

impl Converter for GeminiConverter {
    fn convert(&self, image_path: &Path, options: &ConvertOptions) -> Result<String, Image2MdError> {
        let bytes = media::load_image_bytes(image_path)?;
        let media_type = media::media_type(image_path);
        let base64_image = media::encode_base64(&bytes);

        let prompt = options
            .prompt
            .clone()
            .unwrap_or_else(|| GEMINI_DEFAULT_PROMPT.to_string());
        let max_tokens = options.max_tokens.unwrap_or(self.max_tokens);
        let temperature = options.temperature.unwrap_or(self.temperature);

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: media_type.to_string(),
                            data: base64_image,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature,
            },
        };

        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);
        debug!("Dispatching generateContent for {}", image_path.display());
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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

        let parsed: GenerateContentResponse =
            resp.json().map_err(|e| Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            })?;

        // Aggregate the first candidate's text parts, as the vendor SDK's
        // `response.text` accessor does.
        let content: String = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Image2MdError::Provider {
                provider: PROVIDER.into(),
                message: "response contained no candidate text".into(),
            })?;

        let markdown = strip_markdown_fences(&content).to_string();

        if options.save_json {
            let mut params = Map::new();
            params.insert("model".into(), Value::from(self.model.clone()));
            params.insert("max_tokens".into(), Value::from(max_tokens));
            params.insert("temperature".into(), Value::from(temperature));
            for (k, v) in &options.extra {
                params.insert(k.clone(), v.clone());
            }

            let record = self.build_provenance(params, &prompt);

            let sidecar_path =
                provenance::resolve_sidecar_path(image_path, options.json_output_path.as_deref());
            SidecarDocument::new(markdown.clone(), record, image_path, "gemini")
                .write(&sidecar_path)?;
        }

        Ok(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter_for(model: &str) -> GeminiConverter {
        GeminiConverter::from_config(&ConverterConfig::new().api_key("test-key").model(model))
            .unwrap()
    }

    #[test]
    fn missing_credential_names_env_var() {
        let err =
            GeminiConverter::from_config(&ConverterConfig::new().api_key("")).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn model_version_from_prefix() {
        assert_eq!(
            converter_for("gemini-2.5-flash-preview-04-17").model_version(),
            Some("2.5".to_string())
        );
        assert_eq!(
            converter_for("gemini-2.0-flash").model_version(),
            Some("2.0".to_string())
        );
        assert_eq!(
            converter_for("gemini-1.5-pro").model_version(),
            Some("1.5".to_string())
        );
        assert_eq!(
            converter_for("gemini-1.0-pro").model_version(),
            Some("1.0".to_string())
        );
        assert_eq!(converter_for("palm-2").model_version(), None);
    }

    #[test]
    fn provenance_carries_family() {
        let converter = converter_for("gemini-2.5-flash-preview-04-17");
        let record = converter.build_provenance(Map::new(), "prompt");
        assert_eq!(record.provider, "Google");
        assert_eq!(record.model_family.as_deref(), Some("Gemini"));
        assert!(record.request_id.is_none());
    }
}
