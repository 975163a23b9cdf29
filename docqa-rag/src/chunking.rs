//! Document chunking.
//!
//! [`FixedSizeChunker`] slides a window of `chunk_size` characters over the
//! document text, advancing by `chunk_size - chunk_overlap` each step, so that
//! consecutive segments share exactly `chunk_overlap` characters.

use crate::document::{Document, Segment};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into segments.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered segments.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Vec<Segment>;
}

/// Splits text into fixed-size, overlapping segments by character count.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(500, 50).unwrap();
/// let segments = chunker.chunk(&Document::new("doc", "a".repeat(1200)));
/// assert_eq!(segments.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per segment.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive segments.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Segment> {
        windows(document, self.chunk_size, self.chunk_overlap)
    }
}

/// Split a document with the given parameters.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfig`] if `chunk_size` is zero or
/// `chunk_overlap >= chunk_size`.
pub fn split(document: &Document, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Segment>> {
    validate(chunk_size, chunk_overlap)?;
    Ok(windows(document, chunk_size, chunk_overlap))
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::InvalidConfig("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::InvalidConfig(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

fn windows(document: &Document, chunk_size: usize, chunk_overlap: usize) -> Vec<Segment> {
    let text = document.full_text();
    if text.is_empty() {
        return Vec::new();
    }

    // Byte position of every character, plus the end of the text, so that
    // character offsets can be sliced without splitting a code point.
    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size - chunk_overlap;

    let mut segments = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(char_count);
        segments.push(Segment {
            text: text[boundaries[start]..boundaries[end]].to_string(),
            document_id: document.id.clone(),
            ordinal: segments.len(),
            start_offset: start,
            end_offset: end,
            metadata: document.metadata.clone(),
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    segments
}
