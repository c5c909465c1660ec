//! Integration tests over the public surface: registry dispatch, the
//! converter contract, and the stub backends end-to-end.
//!
//! Everything here runs offline — the network-backed converters are only
//! exercised up to construction (credential resolution), never dispatched.

use image2md::{
    convert_and_save, strip_markdown_fences, ConvertOptions, Converter, ConverterConfig,
    ConverterRegistry, Image2MdError,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn touch_image(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let p = dir.path().join(name);
    std::fs::write(&p, b"\x89PNG\r\n").unwrap();
    p
}

/// A stub converter with fixed output, for contract-level assertions.
#[derive(Debug)]
struct StubConverter;

impl Converter for StubConverter {
    fn convert(&self, _: &Path, _: &ConvertOptions) -> Result<String, Image2MdError> {
        Ok("# Test Content".to_string())
    }
}

// ── Converter contract ───────────────────────────────────────────────────────

#[test]
fn save_markdown_defaults_to_image_stem_md() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "test_image.png");

    let written = StubConverter
        .save_markdown(&image, None, &ConvertOptions::default())
        .unwrap();

    assert_eq!(written, image.with_extension("md"));
    assert_eq!(
        std::fs::read_to_string(&written).unwrap(),
        "# Test Content"
    );
}

#[test]
fn save_markdown_explicit_path_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "test_image.png");
    let target = dir.path().join("does/not/exist/yet/custom_output.md");

    let written = StubConverter
        .save_markdown(&image, Some(&target), &ConvertOptions::default())
        .unwrap();

    assert_eq!(written, target);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "# Test Content");
}

// ── Stub backends through the registry ───────────────────────────────────────

#[test]
fn ocr_stub_end_to_end_with_language() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "scan.png");

    let registry = ConverterRegistry::with_builtins();
    let converter = registry
        .get("ocr", &ConverterConfig::new().language("fra"))
        .unwrap();
    let content = converter.convert(&image, &ConvertOptions::default()).unwrap();

    assert!(content.contains("OCR (fra)"));
    assert!(content.contains("scan.png"));
}

#[test]
fn structure_stub_table_flag_controls_output() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "report.png");
    let registry = ConverterRegistry::with_builtins();

    let default_out = registry
        .get("structure", &ConverterConfig::new())
        .unwrap()
        .convert(&image, &ConvertOptions::default())
        .unwrap();
    assert!(default_out.contains("- Item 1"), "default emits lists");
    assert!(default_out.contains("| Column 1 |"), "default emits tables");

    let no_tables = registry
        .get("structure", &ConverterConfig::new().detect_tables(false))
        .unwrap()
        .convert(&image, &ConvertOptions::default())
        .unwrap();
    assert!(no_tables.contains("- Item 1"), "lists survive");
    assert!(!no_tables.contains('|'), "no table markup at all");
}

#[test]
fn vision_stub_echoes_model_and_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "diagram.png");

    let registry = ConverterRegistry::with_builtins();
    let converter = registry
        .get("vision", &ConverterConfig::new().model("gpt-4-turbo"))
        .unwrap();
    let content = converter
        .convert(&image, &ConvertOptions::new().prompt("List every component"))
        .unwrap();

    assert!(content.contains("gpt-4-turbo"));
    assert!(content.contains("List every component"));
    assert!(content.contains("diagram.png"));
}

#[test]
fn missing_image_fails_before_any_backend_work() {
    let registry = ConverterRegistry::with_builtins();
    let converter = registry.get("ocr", &ConverterConfig::new()).unwrap();
    let err = converter
        .convert(Path::new("/no/such/image.png"), &ConvertOptions::default())
        .unwrap_err();
    assert!(matches!(err, Image2MdError::ImageNotFound { .. }));
}

// ── Registry semantics ───────────────────────────────────────────────────────

#[test]
fn lookup_is_case_insensitive() {
    let registry = ConverterRegistry::with_builtins();
    let config = ConverterConfig::new();
    assert!(registry.get("vision", &config).is_ok());
    assert!(registry.get("VISION", &config).is_ok());
}

#[test]
fn unknown_key_error_lists_every_registered_key() {
    let registry = ConverterRegistry::with_builtins();
    let err = registry
        .get("nonexistent-key", &ConverterConfig::new())
        .unwrap_err();
    let msg = err.to_string();
    for key in registry.available().keys() {
        assert!(msg.contains(key.as_str()), "'{key}' missing from: {msg}");
    }
}

#[test]
fn registration_overwrites_and_is_observable() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "x.png");

    let mut registry = ConverterRegistry::with_builtins();
    registry.register("ocr", "StubConverter", |_| Ok(Box::new(StubConverter)));

    let content = registry
        .get("ocr", &ConverterConfig::new())
        .unwrap()
        .convert(&image, &ConvertOptions::default())
        .unwrap();
    assert_eq!(content, "# Test Content");
}

#[test]
fn available_is_a_snapshot() {
    let registry = ConverterRegistry::with_builtins();
    let mut snapshot = registry.available();
    snapshot.insert("bogus".into(), "Bogus".into());
    assert!(!registry.available().contains_key("bogus"));
}

#[test]
fn convert_and_save_free_function() {
    let dir = tempfile::tempdir().unwrap();
    let image = touch_image(&dir, "doc.png");

    let written = convert_and_save(
        &image,
        "structure",
        None,
        &ConverterConfig::new().detect_lists(false),
    )
    .unwrap();

    assert_eq!(written, image.with_extension("md"));
    let content = std::fs::read_to_string(&written).unwrap();
    assert!(content.contains("Document from doc"));
    assert!(!content.contains("- Item 1"));
}

// ── Fence stripping (public surface) ─────────────────────────────────────────

#[test]
fn fence_stripping_is_exact() {
    assert_eq!(strip_markdown_fences("```markdown\nX\n```"), "X");
    assert_eq!(strip_markdown_fences("```\nX\n```"), "X");
    assert_eq!(strip_markdown_fences("X"), "X");
}

// ── Credential handling ──────────────────────────────────────────────────────

#[cfg(feature = "anthropic")]
#[test]
fn provider_construction_fails_fast_without_credential() {
    let registry = ConverterRegistry::with_builtins();
    // An explicit empty key defeats any ANTHROPIC_API_KEY in the test env.
    let err = registry
        .get("anthropic", &ConverterConfig::new().api_key(""))
        .unwrap_err();
    assert!(matches!(err, Image2MdError::MissingCredential { .. }));
    assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
}
