//! Data types for documents, segments, search results, and interaction history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source document made of ordered text pages.
///
/// Pages are concatenated without a separator before chunking, so segment
/// offsets refer to positions in [`Document::full_text`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Raw text pages in reading order. A single-blob document has one page.
    pub pages: Vec<String>,
    /// Key-value metadata copied onto every segment of the document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a single-page document.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_pages(id, vec![text.into()])
    }

    /// Create a document from ordered pages.
    pub fn from_pages(id: impl Into<String>, pages: Vec<String>) -> Self {
        Self { id: id.into(), pages, metadata: HashMap::new(), source_uri: None }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the source URI.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// The pages joined with no separator.
    pub fn full_text(&self) -> String {
        self.pages.concat()
    }
}

/// A contiguous slice of a [`Document`]'s text, the unit of retrieval.
///
/// Offsets count characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// The text of the slice.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this segment within its document, starting at zero.
    pub ordinal: usize,
    /// Inclusive start character offset into the document text.
    pub start_offset: usize,
    /// Exclusive end character offset into the document text.
    pub end_offset: usize,
    /// Metadata inherited from the parent document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Segment {
    /// Number of characters covered by this segment.
    pub fn char_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// A retrieved [`Segment`] with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved segment.
    pub segment: Segment,
    /// Distance under the index metric (lower is more relevant).
    pub distance: f32,
    /// Insertion sequence of the matching index entry.
    pub sequence: u64,
}

/// One completed question/answer round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    /// The question as asked.
    pub query: String,
    /// The generated answer.
    pub answer: String,
    /// When the round completed.
    pub recorded_at: DateTime<Utc>,
}
