//! Post-processing: deterministic cleanup of LLM-generated Markdown.
//!
//! Vision models occasionally wrap their entire output in a Markdown code
//! fence despite the prompt saying "do not wrap in fences". The shared
//! normalizer here strips exactly that artefact and nothing else, so the
//! prompt can stay focused on *what to extract* rather than formatting
//! edge-cases.

/// Strip an outer ` ```markdown ` / ` ``` ` fence wrapping the whole output.
///
/// Matches only exact `\n` adjacency: the text must start with the fence
/// opener followed by a newline and end with a newline followed by the
/// closing fence. Trailing whitespace before the closing fence, nested
/// fences, or nonstandard fencing are left untouched. Do not tighten this
/// into a general fence parser — legitimate fenced code blocks inside the
/// document must survive.
pub fn strip_markdown_fences(text: &str) -> &str {
    if let Some(inner) = text
        .strip_prefix("```markdown\n")
        .and_then(|t| t.strip_suffix("\n```"))
    {
        inner
    } else if let Some(inner) = text
        .strip_prefix("```\n")
        .and_then(|t| t.strip_suffix("\n```"))
    {
        inner
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_tagged_fence() {
        assert_eq!(strip_markdown_fences("```markdown\nX\n```"), "X");
        assert_eq!(
            strip_markdown_fences("```markdown\n# Hello\nWorld\n```"),
            "# Hello\nWorld"
        );
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_markdown_fences("```\nX\n```"), "X");
    }

    #[test]
    fn passes_through_unfenced_text() {
        assert_eq!(strip_markdown_fences("X"), "X");
        assert_eq!(strip_markdown_fences("# Hello\nWorld"), "# Hello\nWorld");
    }

    #[test]
    fn idempotent() {
        let once = strip_markdown_fences("```markdown\nX\n```");
        assert_eq!(strip_markdown_fences(once), once);
    }

    #[test]
    fn trailing_whitespace_defeats_the_match() {
        // Prefix/suffix match only: a trailing space after the closing
        // fence leaves the text wrapped.
        let wrapped = "```markdown\nX\n``` ";
        assert_eq!(strip_markdown_fences(wrapped), wrapped);
    }

    #[test]
    fn inner_fences_untouched() {
        let text = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(strip_markdown_fences(text), text);
    }

    #[test]
    fn opener_without_newline_untouched() {
        let text = "```markdown X```";
        assert_eq!(strip_markdown_fences(text), text);
    }
}
