//! PDF text extraction strategies.
//!
//! Primary: per-page markdown with page headings. Secondary: whole-document
//! plain text. The caller tries them in order and treats empty output as
//! failure.

use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Structured conversion: one markdown section per page.
pub fn to_markdown(path: &Path) -> Option<String> {
    let doc = load(path)?;
    let mut out = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                out.push_str(&format!("## Page {page_number}\n\n"));
                out.push_str(text.trim_end());
                out.push_str("\n\n");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(page = page_number, error = %e, "page extraction failed");
            }
        }
    }
    let out = out.trim_end().to_string();
    if out.is_empty() { None } else { Some(out) }
}

/// Plain-text fallback over every page at once.
pub fn to_plain_text(path: &Path) -> Option<String> {
    let doc = load(path)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    match doc.extract_text(&pages) {
        Ok(text) if !text.trim().is_empty() => {
            Some(format!("# Extracted PDF Text\n\n{}", text.trim()))
        }
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "plain-text extraction failed");
            None
        }
    }
}

fn load(path: &Path) -> Option<Document> {
    match Document::load(path) {
        Ok(doc) => Some(doc),
        Err(e) => {
            debug!(error = %e, "pdf parse failed");
            None
        }
    }
}
