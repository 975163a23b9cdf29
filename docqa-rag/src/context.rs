//! Formatting retrieved segments into a prompt.

use crate::document::Segment;

/// Appended to a segment's text when it was cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Formats retrieved segments into a bulleted context block.
///
/// Each segment becomes one `- ` line, truncated to `max_chars_per_segment`
/// characters, and lines are separated by a blank line. Order is preserved
/// and duplicates are kept.
///
/// # Example
///
/// ```rust
/// use docqa_rag::ContextAssembler;
///
/// let prompt = ContextAssembler::build_prompt("- wear helmets", "What gear is required?");
/// assert_eq!(prompt, "Context:\n- wear helmets\n\nQuestion:\nWhat gear is required?");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_chars_per_segment: usize,
}

impl ContextAssembler {
    /// Create an assembler with the given per-segment character limit.
    pub fn new(max_chars_per_segment: usize) -> Self {
        Self { max_chars_per_segment }
    }

    /// Build the context block for `segments`.
    pub fn assemble<'a>(&self, segments: impl IntoIterator<Item = &'a Segment>) -> String {
        segments
            .into_iter()
            .map(|segment| format!("- {}", truncate_chars(&segment.text, self.max_chars_per_segment)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Combine a context block and a question into the answerer prompt.
    pub fn build_prompt(context: &str, query: &str) -> String {
        format!("Context:\n{context}\n\nQuestion:\n{query}")
    }
}

/// Convenience form of [`ContextAssembler::assemble`].
pub fn assemble(segments: &[Segment], max_chars_per_segment: usize) -> String {
    ContextAssembler::new(max_chars_per_segment).assemble(segments)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}
