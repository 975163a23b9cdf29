//! Loading documents from the filesystem.
//!
//! Text and Markdown files split into pages on form feeds; PDFs keep their
//! own pages. Loading is per file: one unreadable file yields a failed
//! outcome and the rest still load.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use docqa_rag::Document;
use tracing::{debug, warn};

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

/// A path and the document loaded from it, or why it could not be loaded.
pub type LoadOutcome = (PathBuf, anyhow::Result<Document>);

/// Split text into pages on form feeds, dropping empty pages.
pub fn split_pages(text: &str) -> Vec<String> {
    text.split(PAGE_BREAK).filter(|page| !page.is_empty()).map(str::to_string).collect()
}

/// Whether the extension names a format [`load_document`] can read.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Text of each PDF page, in page order, with blank pages dropped.
///
/// Uses `pdf-extract` and falls back to `lopdf` when it errors, panics, or
/// finds no text.
pub fn extract_pdf_pages(data: &[u8]) -> anyhow::Result<Vec<String>> {
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));
    let pages = match extracted {
        Ok(Ok(pages)) => non_blank(pages),
        Ok(Err(e)) => {
            warn!(error = %e, "pdf-extract failed, trying lopdf");
            Vec::new()
        }
        Err(_) => {
            warn!("pdf-extract panicked, trying lopdf");
            Vec::new()
        }
    };
    if !pages.is_empty() {
        return Ok(pages);
    }

    let pages = non_blank(extract_pdf_pages_lopdf(data)?);
    if pages.is_empty() {
        bail!("PDF has no extractable text; it may be image-based or encrypted");
    }
    Ok(pages)
}

fn extract_pdf_pages_lopdf(data: &[u8]) -> anyhow::Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| anyhow!("failed to parse PDF: {e}"))?;
    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => debug!(page_number, error = %e, "no text on page"),
        }
    }
    Ok(pages)
}

fn non_blank(pages: Vec<String>) -> Vec<String> {
    pages
        .into_iter()
        .map(|page| page.replace('\0', "").trim().to_string())
        .filter(|page| !page.is_empty())
        .collect()
}

/// Read one file into a [`Document`] whose id is the file path.
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let pages = if is_pdf(path) {
        let data = fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
        extract_pdf_pages(&data).with_context(|| format!("failed to parse '{}'", path.display()))?
    } else {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        split_pages(&text)
    };
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    debug!(path = %path.display(), page_count = pages.len(), "loaded document");
    Ok(Document::from_pages(path.display().to_string(), pages)
        .with_metadata("source", name)
        .with_source_uri(path.display().to_string()))
}

/// Load every file in `paths`, one outcome per file. Directories contribute
/// their supported files (not recursively) in name order; a directory that
/// cannot be listed is a single failed outcome.
pub fn load_documents(paths: &[PathBuf]) -> Vec<LoadOutcome> {
    let mut outcomes = Vec::new();
    for path in paths {
        if !path.is_dir() {
            outcomes.push((path.clone(), load_document(path)));
            continue;
        }
        let listing = fs::read_dir(path)
            .with_context(|| format!("failed to list '{}'", path.display()));
        let mut files = match listing {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_supported(p))
                .collect::<Vec<_>>(),
            Err(e) => {
                outcomes.push((path.clone(), Err(e)));
                continue;
            }
        };
        files.sort();
        for file in files {
            let document = load_document(&file);
            outcomes.push((file, document));
        }
    }
    outcomes
}
