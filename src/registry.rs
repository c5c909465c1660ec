//! Converter registry: the named lookup table behind human-facing
//! backend selection.
//!
//! The registry is an explicit object constructed once at process start
//! ([`ConverterRegistry::with_builtins`]) and passed to whoever needs it —
//! there is no process-global table, so tests and concurrent callers each
//! own their registration state. String keys exist only at this outermost
//! boundary; everything past `get` is typed.
//!
//! Registration stores a *factory*, not an instance: `get` constructs a
//! fresh converter per call, forwarding the configuration bag to the
//! factory. The factory signature is the converter contract — anything
//! that is not a converter factory cannot be registered, so an invalid
//! registration is a compile error rather than a runtime check.

use crate::config::ConverterConfig;
use crate::converter::Converter;
use crate::error::Image2MdError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Constructs a converter from a configuration bag.
pub type ConverterFactory =
    Box<dyn Fn(&ConverterConfig) -> Result<Box<dyn Converter>, Image2MdError> + Send + Sync>;

struct Registration {
    type_name: String,
    factory: ConverterFactory,
}

/// Registry of named converter factories.
///
/// Keys are case-insensitive (stored lowercase); registering an existing
/// name overwrites it silently — last write wins.
///
/// # Example
/// ```rust,no_run
/// use image2md::{ConverterRegistry, ConverterConfig};
///
/// let registry = ConverterRegistry::with_builtins();
/// let converter = registry.get("ocr", &ConverterConfig::new().language("fra"))?;
/// # Ok::<(), image2md::Image2MdError>(())
/// ```
pub struct ConverterRegistry {
    entries: BTreeMap<String, Registration>,
}

impl ConverterRegistry {
    /// An empty registry with no backends.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry seeded with every built-in backend compiled into this
    /// binary. Stub backends are always present; provider backends appear
    /// only when their cargo feature is enabled, and a disabled provider
    /// never prevents the others from registering.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register("ocr", "OcrConverter", |config| {
            Ok(Box::new(crate::backends::OcrConverter::from_config(config)?))
        });
        registry.register("vision", "VisionConverter", |config| {
            Ok(Box::new(crate::backends::VisionConverter::from_config(config)?))
        });
        registry.register("structure", "StructureConverter", |config| {
            Ok(Box::new(crate::backends::StructureConverter::from_config(config)?))
        });

        #[cfg(feature = "openai")]
        registry.register("llm", "OpenAiConverter", |config| {
            Ok(Box::new(crate::backends::OpenAiConverter::from_config(config)?))
        });
        #[cfg(feature = "anthropic")]
        registry.register("anthropic", "AnthropicConverter", |config| {
            Ok(Box::new(crate::backends::AnthropicConverter::from_config(config)?))
        });
        #[cfg(feature = "gemini")]
        registry.register("gemini", "GeminiConverter", |config| {
            Ok(Box::new(crate::backends::GeminiConverter::from_config(config)?))
        });
        #[cfg(feature = "azure")]
        registry.register("azure", "AzureDocumentConverter", |config| {
            Ok(Box::new(crate::backends::AzureDocumentConverter::from_config(config)?))
        });

        registry
    }

    /// Register `factory` under `name` (lowercased), overwriting any
    /// existing registration. `type_name` is the human-readable
    /// implementation name surfaced by [`available`](Self::available).
    pub fn register<F>(&mut self, name: &str, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&ConverterConfig) -> Result<Box<dyn Converter>, Image2MdError>
            + Send
            + Sync
            + 'static,
    {
        let key = name.to_lowercase();
        debug!("Registering converter '{}'", key);
        self.entries.insert(
            key,
            Registration {
                type_name: type_name.into(),
                factory: Box::new(factory),
            },
        );
    }

    /// Construct a converter by name (case-insensitive), forwarding
    /// `config` to its factory.
    ///
    /// For the `"llm"` backend with an `o4-` model, a `max_tokens` setting
    /// is carried over to `max_completion_tokens` before construction when
    /// the latter is unset — the newer model family's name for the same
    /// limit.
    pub fn get(
        &self,
        name: &str,
        config: &ConverterConfig,
    ) -> Result<Box<dyn Converter>, Image2MdError> {
        let key = name.to_lowercase();

        let registration =
            self.entries
                .get(&key)
                .ok_or_else(|| Image2MdError::UnknownConverter {
                    name: key.clone(),
                    available: self.keys().join(", "),
                })?;

        let mut config = config.clone();
        if key == "llm" {
            let is_o4 = config
                .model
                .as_deref()
                .is_some_and(|m| m.starts_with("o4-"));
            if is_o4 && config.max_completion_tokens.is_none() {
                config.max_completion_tokens = config.max_tokens;
            }
        }

        (registration.factory)(&config)
    }

    /// A copy of the current registrations: key → implementation name.
    /// Mutating the returned map does not affect the registry.
    pub fn available(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, r)| (k.clone(), r.type_name.clone()))
            .collect()
    }

    /// Construct the named converter and run its convert-and-save path in
    /// one call. The same `config` bag serves construction and the call;
    /// converters ignore the fields irrelevant to them.
    pub fn convert_and_save(
        &self,
        image_path: &Path,
        name: &str,
        output_path: Option<&Path>,
        config: &ConverterConfig,
    ) -> Result<PathBuf, Image2MdError> {
        let converter = self.get(name, config)?;
        converter.save_markdown(image_path, output_path, &config.convert_options())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
