//! Plain-text rendering of search results and history.

use docqa_rag::{InteractionRecord, SearchResult};

const PREVIEW_CHARS: usize = 120;

/// One search hit as a header line plus an indented preview of its text.
pub fn format_result(rank: usize, result: &SearchResult) -> String {
    let segment = &result.segment;
    let preview: String = segment.text.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if segment.char_len() > PREVIEW_CHARS { "..." } else { "" };
    format!(
        "{rank}. {} #{} [{}..{}] distance={:.4}\n   {}{ellipsis}",
        segment.document_id,
        segment.ordinal,
        segment.start_offset,
        segment.end_offset,
        result.distance,
        preview.replace('\n', " "),
    )
}

/// One history entry as a timestamped question and answer.
pub fn format_record(turn: usize, record: &InteractionRecord) -> String {
    format!(
        "[{turn}] {}\nQ: {}\nA: {}",
        record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        record.query,
        record.answer
    )
}
