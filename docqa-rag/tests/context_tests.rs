//! Tests for context block assembly and prompt layout.

use std::collections::HashMap;

use docqa_rag::{ContextAssembler, Segment, TRUNCATION_MARKER, assemble};

fn segment(text: &str) -> Segment {
    Segment {
        text: text.to_string(),
        document_id: "doc".to_string(),
        ordinal: 0,
        start_offset: 0,
        end_offset: text.chars().count(),
        metadata: HashMap::new(),
    }
}

#[test]
fn one_bullet_per_segment_separated_by_blank_lines() {
    let context = assemble(&[segment("alpha"), segment("beta")], 300);
    assert_eq!(context, "- alpha\n\n- beta");
}

#[test]
fn long_segments_are_truncated_with_marker() {
    let context = assemble(&[segment("abcdefghij")], 4);
    assert_eq!(context, format!("- abcd{TRUNCATION_MARKER}"));
}

#[test]
fn segment_at_exact_limit_is_not_marked() {
    let context = assemble(&[segment("abcd")], 4);
    assert_eq!(context, "- abcd");
}

#[test]
fn truncation_respects_character_boundaries() {
    let context = assemble(&[segment("ééééé")], 2);
    assert_eq!(context, "- éé...");
}

#[test]
fn duplicates_are_kept_in_input_order() {
    let segments = [segment("same"), segment("other"), segment("same")];
    let context = ContextAssembler::new(100).assemble(&segments);
    assert_eq!(context, "- same\n\n- other\n\n- same");
}

#[test]
fn no_segments_yield_empty_context() {
    assert_eq!(assemble(&[], 10), "");
}

#[test]
fn prompt_places_question_after_blank_line() {
    let prompt = ContextAssembler::build_prompt("- alpha", "What is alpha?");
    assert_eq!(prompt, "Context:\n- alpha\n\nQuestion:\nWhat is alpha?");
}
