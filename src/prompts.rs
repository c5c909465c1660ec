//! Default prompts for the LLM-backed converters.
//!
//! Centralising every prompt here keeps the backends free of prose and
//! makes prompt regressions visible in one diff. Callers override any of
//! these per call via [`crate::config::ConvertOptions::prompt`].

/// System message for the OpenAI chat-completions converter.
pub const OPENAI_SYSTEM_PROMPT: &str = "You are a document layout specialist that converts \
images to markdown. Preserve the document structure and layout.";

/// Default user prompt for the OpenAI chat-completions converter.
pub const OPENAI_DEFAULT_PROMPT: &str = "Convert this image to well-formatted markdown. \
Maintain the structure and layout of the document, including proper formatting for headings, \
lists, tables, and other elements. Output only the markdown content without any explanations. \
Do NOT wrap your response in markdown code blocks (```). Just provide the clean markdown \
content directly without any surrounding backticks.";

/// Default prompt for the Anthropic messages converter.
pub const ANTHROPIC_DEFAULT_PROMPT: &str = "Convert this image to well-formatted markdown. \
Maintain the structure and formatting as much as possible, including headings, lists, and \
tables. Important: Do NOT wrap your response in markdown code blocks (```). Just provide the \
clean markdown content directly without any surrounding backticks.";

/// Default prompt for the Gemini converter.
pub const GEMINI_DEFAULT_PROMPT: &str = "Convert this image to well-formatted markdown. \
Maintain the structure and formatting as much as possible, including headings, lists, and \
tables.";

/// Default prompt for the local vision stub.
pub const VISION_DEFAULT_PROMPT: &str =
    "Describe the content of this image in detail and format as markdown";
