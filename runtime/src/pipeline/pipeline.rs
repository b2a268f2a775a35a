use std::{path::Path, sync::Arc};

use anyhow::Result;
use tracing::{info, warn};

use crate::{ai::TextGenerator, config::OcrConfig};

use super::{
    dates::locate_dates,
    error::CertificateProcessingError,
    fields::{
        LlmFieldExtractor, OrganizationInferrer, SkillsInferrer, organization_or_default,
        skills_or_default,
    },
    ocr::TesseractOcr,
    raster::PdftoppmRasterizer,
    text::{PdfTextExtractor, TextExtractor},
    types::{CertificateRecord, DEFAULT_SKILLS, UNNAMED_OWNER},
};

/// Turns one uploaded document into a [`CertificateRecord`].
///
/// Holds no per-document state; one instance serves every request.
pub struct CertificatePipeline {
    text_extractor: Arc<dyn TextExtractor>,
    organization: Arc<dyn OrganizationInferrer>,
    skills: Arc<dyn SkillsInferrer>,
}

impl CertificatePipeline {
    pub fn new(ocr: &OcrConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let text_extractor = Arc::new(PdfTextExtractor::new(
            Arc::new(PdftoppmRasterizer::new(&ocr.pdftoppm_path)),
            Arc::new(TesseractOcr::new(&ocr.tesseract_path, ocr.language.clone())),
            ocr.dpi,
        ));
        let fields = Arc::new(LlmFieldExtractor::new(generator));

        Self::with_dependencies(text_extractor, fields.clone(), fields)
    }

    pub fn with_dependencies(
        text_extractor: Arc<dyn TextExtractor>,
        organization: Arc<dyn OrganizationInferrer>,
        skills: Arc<dyn SkillsInferrer>,
    ) -> Self {
        Self {
            text_extractor,
            organization,
            skills,
        }
    }

    /// Extracts, infers, validates and assembles a record.
    ///
    /// Failures are tagged with the stage they happened in: staged errors
    /// from inner steps pass through unchanged, anything else is reported
    /// as `general_processing`.
    pub async fn process_document(
        &self,
        document: &Path,
    ) -> Result<CertificateRecord, CertificateProcessingError> {
        self.run(document)
            .await
            .map_err(CertificateProcessingError::from_anyhow)
    }

    async fn run(&self, document: &Path) -> Result<CertificateRecord> {
        let text = self.text_extractor.extract_text(document).await?;

        let owner_name = owner_name(&text);
        let dates = locate_dates(&text)?;

        let organization = organization_or_default(self.organization.as_ref(), &text).await;
        let mut skills = skills_or_default(self.skills.as_ref(), &text).await;
        if skills.is_empty() {
            skills = DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect();
        }

        let Some(date) = dates.certification.filter(|_| !is_missing_owner(&owner_name)) else {
            warn!(
                document = %document.display(),
                owner_found = !is_missing_owner(&owner_name),
                date_found = dates.certification.is_some(),
                "required certificate fields missing"
            );
            return Err(CertificateProcessingError::validation(
                "Missing required fields: owner name or date",
            )
            .into());
        };

        info!(
            owner = %owner_name,
            %organization,
            %date,
            skills = skills.len(),
            "certificate processed"
        );

        Ok(CertificateRecord {
            owner_name,
            date,
            expiry_date: dates.expiry,
            organization,
            skills,
        })
    }
}

/// First non-blank line of the extracted text, or the placeholder owner.
pub fn owner_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNNAMED_OWNER)
        .to_string()
}

fn is_missing_owner(owner_name: &str) -> bool {
    owner_name.is_empty() || owner_name == UNNAMED_OWNER
}
