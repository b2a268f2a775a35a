use std::path::Path;

use anyhow::{Context, Result};
use lopdf::Document;
use tracing::debug;

/// Text embedded in a document's content streams, one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLayer {
    pub pages: Vec<String>,
}

impl TextLayer {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages joined by newlines, trimmed.
    pub fn joined(&self) -> String {
        self.pages.join("\n").trim().to_string()
    }
}

/// Reads the text layer of every page.
///
/// A page whose text cannot be decoded (scanned pages, unsupported font
/// encodings) contributes an empty string; only an unreadable document fails.
pub fn load_text_layer(path: &Path) -> Result<TextLayer> {
    let doc = Document::load(path)
        .with_context(|| format!("failed to load PDF {}", path.display()))?;

    // get_pages is keyed by 1-based page number, in order.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let pages = page_numbers
        .into_iter()
        .map(|page_number| match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(err) => {
                debug!(page = page_number, error = %err, "page has no extractable text layer");
                String::new()
            }
        })
        .collect();

    Ok(TextLayer { pages })
}
