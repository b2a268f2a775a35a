#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use certificate_runtime::{
    ai::TextGenerator,
    pipeline::{
        CertificatePipeline, LlmFieldExtractor, OcrEngine, PageRasterizer, PdfTextExtractor,
    },
};
use image::{DynamicImage, GrayImage, Luma};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

/// Writes a PDF with one page per entry; `Some(text)` pages carry a text
/// layer, `None` pages are blank like a scan without OCR layer.
pub fn write_pdf(path: &Path, pages: &[Option<&str>]) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let operations = match page {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// Renders `pages` blank white pages regardless of the document.
pub struct BlankPageRasterizer {
    pub calls: AtomicUsize,
}

impl BlankPageRasterizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageRasterizer for BlankPageRasterizer {
    async fn rasterize(&self, document: &Path, _dpi: u32) -> Result<Vec<DynamicImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page_count = Document::load(document)?.get_pages().len();
        Ok((0..page_count)
            .map(|_| DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([255]))))
            .collect())
    }
}

pub struct FailingRasterizer;

#[async_trait]
impl PageRasterizer for FailingRasterizer {
    async fn rasterize(&self, _document: &Path, _dpi: u32) -> Result<Vec<DynamicImage>> {
        bail!("pdftoppm crashed")
    }
}

/// Returns the same recognized text for every page.
pub struct CannedOcr(pub String);

#[async_trait]
impl OcrEngine for CannedOcr {
    async fn recognize(&self, image: &GrayImage) -> Result<String> {
        assert!(
            image.pixels().all(|Luma([v])| *v == 0 || *v == 255),
            "OCR input must be binarized"
        );
        Ok(self.0.clone())
    }
}

pub struct FailingOcr;

#[async_trait]
impl OcrEngine for FailingOcr {
    async fn recognize(&self, _image: &GrayImage) -> Result<String> {
        bail!("tesseract exited with 1")
    }
}

/// Answers organization and skills prompts with fixed responses.
pub struct ScriptedGenerator {
    pub organization: String,
    pub skills: String,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("issuing organization") {
            Ok(self.organization.clone())
        } else {
            Ok(self.skills.clone())
        }
    }
}

pub struct UnavailableGenerator;

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Network error | connection refused")
    }
}

pub fn pipeline_with(
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    generator: Arc<dyn TextGenerator>,
) -> CertificatePipeline {
    let text_extractor = Arc::new(PdfTextExtractor::new(rasterizer, ocr, 300));
    let fields = Arc::new(LlmFieldExtractor::new(generator));
    CertificatePipeline::with_dependencies(text_extractor, fields.clone(), fields)
}
