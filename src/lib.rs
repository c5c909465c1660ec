//! # image2md
//!
//! Convert document images to Markdown through one uniform contract,
//! delegating the actual reading to interchangeable backends: OCR,
//! rule-based structure analysis, or a vision-capable LLM.
//!
//! ## Why this crate?
//!
//! Every vision provider exposes a different request shape, response
//! format, and initialisation dance. This crate hides all of that behind a
//! single [`Converter`] trait and a name-keyed [`ConverterRegistry`], so
//! switching a pipeline from OCR to Claude to Azure Document Intelligence
//! is a one-string change — and every backend shares the same response
//! normalization and provenance-tracking protocol.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image (PNG/JPEG/GIF/WEBP)
//!  │
//!  ├─ 1. Select    registry.get("anthropic", config)
//!  ├─ 2. Encode    bytes → base64 content block (raw bytes for Azure)
//!  ├─ 3. Dispatch  one blocking request to the provider
//!  ├─ 4. Extract   provider-specific response shape → text
//!  ├─ 5. Polish    strip stray ```markdown fences
//!  ├─ 6. Sidecar   optional provenance-annotated JSON next to the output
//!  └─ 7. Output    Markdown string / `.md` file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image2md::{ConverterRegistry, ConverterConfig};
//!
//! fn main() -> Result<(), image2md::Image2MdError> {
//!     let registry = ConverterRegistry::with_builtins();
//!     // Credential read from ANTHROPIC_API_KEY
//!     let written = registry.convert_and_save(
//!         "invoice.png".as_ref(),
//!         "anthropic",
//!         None,
//!         &ConverterConfig::new().max_tokens(2000),
//!     )?;
//!     println!("wrote {}", written.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! | Key | Implementation | Network | Feature |
//! |-----|----------------|---------|---------|
//! | `ocr` | [`backends::OcrConverter`] | no (stub) | always |
//! | `structure` | [`backends::StructureConverter`] | no (stub) | always |
//! | `vision` | [`backends::VisionConverter`] | no (stub) | always |
//! | `llm` | `backends::OpenAiConverter` | OpenAI chat completions | `openai` |
//! | `anthropic` | `backends::AnthropicConverter` | Anthropic messages | `anthropic` |
//! | `gemini` | `backends::GeminiConverter` | Gemini generateContent | `gemini` |
//! | `azure` | `backends::AzureDocumentConverter` | Azure Document Intelligence | `azure` |
//!
//! Custom backends implement [`Converter`] and join the table via
//! [`ConverterRegistry::register`].
//!
//! ## Concurrency model
//!
//! Synchronous and blocking throughout: each `convert` call issues one
//! blocking request and waits for the full response. There are no
//! timeouts, retries, or fallback backends in the core — provider errors
//! propagate to the caller, and retry policy is the caller's concern.
//! Callers wanting parallel conversions run one converter instance per
//! worker.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backends;
pub mod config;
pub mod converter;
pub mod error;
pub mod media;
pub mod postprocess;
pub mod prompts;
pub mod provenance;
pub mod registry;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConvertOptions, ConverterConfig};
pub use converter::Converter;
pub use error::Image2MdError;
pub use postprocess::strip_markdown_fences;
pub use provenance::{ProvenanceRecord, SidecarDocument};
pub use registry::{ConverterFactory, ConverterRegistry};

use std::path::{Path, PathBuf};

/// One-call convenience: convert `image_path` with the named backend and
/// save the Markdown, using a registry of built-in backends.
///
/// Equivalent to [`ConverterRegistry::with_builtins`] followed by
/// [`ConverterRegistry::convert_and_save`]. Callers who register custom
/// backends or convert many images should hold their own registry instead.
pub fn convert_and_save(
    image_path: impl AsRef<Path>,
    converter_type: &str,
    output_path: Option<&Path>,
    config: &ConverterConfig,
) -> Result<PathBuf, Image2MdError> {
    ConverterRegistry::with_builtins().convert_and_save(
        image_path.as_ref(),
        converter_type,
        output_path,
        config,
    )
}
