//! Error types for the image2md library.
//!
//! One enum covers the full taxonomy; variants group into four failure
//! modes with different caller remedies:
//!
//! * **Configuration** ([`Image2MdError::MissingCredential`],
//!   [`Image2MdError::InvalidConfig`]) — raised at construction time,
//!   never retried. The converter refuses to exist half-configured rather
//!   than failing on the first `convert` call.
//!
//! * **Not found** ([`Image2MdError::ImageNotFound`],
//!   [`Image2MdError::UnknownConverter`]) — bad caller input; the message
//!   carries the actionable context (the path, or the list of valid keys).
//!
//! * **Provider** ([`Image2MdError::Provider`]) — the external call
//!   failed. Wrapped with a provider-identifying prefix and re-raised;
//!   the core never retries, falls back, or swallows these.
//!
//! * **I/O** ([`Image2MdError::OutputWriteFailed`],
//!   [`Image2MdError::SidecarWriteFailed`], [`Image2MdError::ImageReadFailed`]).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the image2md library.
#[derive(Debug, Error)]
pub enum Image2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// The image file exists but could not be read.
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Registry errors ───────────────────────────────────────────────────
    /// No converter is registered under the requested name.
    #[error("Unknown converter type: '{name}'. Available types: {available}")]
    UnknownConverter { name: String, available: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required credential is neither configured nor present in the environment.
    #[error("{provider} is not configured.\nProvide the credential explicitly or set the {env_var} environment variable.")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Constructor validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Provider errors ───────────────────────────────────────────────────
    /// The external provider call failed (network, auth, quota, malformed request).
    #[error("{provider} API error: {message}")]
    Provider { provider: String, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the JSON sidecar.
    #[error("Failed to write sidecar '{path}': {source}")]
    SidecarWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_not_found_display() {
        let e = Image2MdError::ImageNotFound {
            path: PathBuf::from("scan.png"),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan.png"), "got: {msg}");
        assert!(msg.contains("not found"));
    }

    #[test]
    fn unknown_converter_lists_available() {
        let e = Image2MdError::UnknownConverter {
            name: "tesseract".into(),
            available: "ocr, structure, vision".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tesseract"));
        assert!(msg.contains("ocr, structure, vision"));
    }

    #[test]
    fn missing_credential_names_env_var() {
        let e = Image2MdError::MissingCredential {
            provider: "OpenAI",
            env_var: "OPENAI_API_KEY",
        };
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn provider_error_prefixed() {
        let e = Image2MdError::Provider {
            provider: "Anthropic".into(),
            message: "HTTP 429: rate limited".into(),
        };
        assert!(e.to_string().starts_with("Anthropic API error:"));
    }
}
