pub mod dates;
pub mod document_manager;
pub mod error;
pub mod fields;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod raster;
pub mod text;
pub mod types;

pub use dates::locate_dates;
pub use document_manager::{DocumentManager, normalize_extension};
pub use error::{CertificateProcessingError, ProcessingStage};
pub use fields::{
    LlmFieldExtractor, OrganizationInferrer, SkillsInferrer, organization_or_default,
    skills_or_default,
};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pipeline::CertificatePipeline;
pub use raster::{PageRasterizer, PdftoppmRasterizer};
pub use text::{DEFAULT_DPI, PdfTextExtractor, TextExtractor};
pub use types::{CertificateRecord, LocatedDates};
