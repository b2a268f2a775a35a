use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use super::{
    error::CertificateProcessingError,
    ocr::OcrEngine,
    pdf::load_text_layer,
    preprocess::prepare_for_ocr,
    raster::PageRasterizer,
};

pub const DEFAULT_DPI: u32 = 300;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document: &Path) -> Result<String, CertificateProcessingError>;
}

/// Runs direct text-layer extraction and OCR on every page and merges both.
///
/// Both paths always run; the output is the text layer followed by the OCR
/// text of each page, so duplicated text is expected for digital documents.
pub struct PdfTextExtractor {
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
}

impl PdfTextExtractor {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, ocr: Arc<dyn OcrEngine>, dpi: u32) -> Self {
        Self {
            rasterizer,
            ocr,
            dpi,
        }
    }

    // PDF parsing and pixel passes are CPU bound and run off the async workers.
    async fn extract(&self, document: &Path) -> Result<String> {
        let path = document.to_path_buf();
        let layer = spawn_blocking(move || load_text_layer(&path))
            .await
            .context("text layer task failed")??;
        let direct_text = layer.joined();

        let mut ocr_pages = Vec::with_capacity(layer.page_count());
        if layer.page_count() > 0 {
            let pages = self.rasterizer.rasterize(document, self.dpi).await?;
            for (index, page) in pages.into_iter().enumerate() {
                let binarized = spawn_blocking(move || prepare_for_ocr(&page))
                    .await
                    .context("page preprocessing task failed")?;
                let text = self.ocr.recognize(&binarized).await?;
                debug!(page = index + 1, chars = text.len(), "OCR page complete");
                ocr_pages.push(text);
            }
        }

        Ok(combine_extracted_text(&direct_text, &ocr_pages))
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, document: &Path) -> Result<String, CertificateProcessingError> {
        let text = self
            .extract(document)
            .await
            .map_err(CertificateProcessingError::text_extraction)?;

        info!(
            document = %document.display(),
            chars = text.chars().count(),
            "text extracted"
        );
        debug!(text = %text, "extracted text");
        Ok(text)
    }
}

/// Joins the trimmed text layer and the per-page OCR output with newlines,
/// strips form feeds and trims the result.
pub fn combine_extracted_text(direct_text: &str, ocr_pages: &[String]) -> String {
    let mut parts = Vec::with_capacity(ocr_pages.len() + 1);
    parts.push(direct_text.trim());
    parts.extend(ocr_pages.iter().map(String::as_str));

    parts.join("\n").replace('\u{c}', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_puts_text_layer_first() {
        let ocr = vec!["Jane Doe\n\u{c}".to_string(), "Page two\n".to_string()];
        assert_eq!(
            combine_extracted_text("  Jane Doe  ", &ocr),
            "Jane Doe\nJane Doe\n\nPage two"
        );
    }

    #[test]
    fn combine_scanned_document_has_only_ocr_text() {
        let ocr = vec!["Jane Doe\nCompleted on 5 June 2022\n\u{c}".to_string()];
        assert_eq!(
            combine_extracted_text("", &ocr),
            "Jane Doe\nCompleted on 5 June 2022"
        );
    }

    #[test]
    fn combine_nothing_is_empty() {
        assert_eq!(combine_extracted_text("   ", &[]), "");
    }
}
