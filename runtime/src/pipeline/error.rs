use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline step a [`CertificateProcessingError`] is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    TextExtraction,
    Validation,
    GeneralProcessing,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::TextExtraction => "text_extraction",
            ProcessingStage::Validation => "validation",
            ProcessingStage::GeneralProcessing => "general_processing",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CertificateProcessingError {
    pub stage: ProcessingStage,
    pub message: String,
    #[source]
    pub cause: Option<anyhow::Error>,
}

impl CertificateProcessingError {
    pub fn new(stage: ProcessingStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        stage: ProcessingStage,
        message: impl Into<String>,
        cause: anyhow::Error,
    ) -> Self {
        Self {
            stage,
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn text_extraction(cause: anyhow::Error) -> Self {
        Self::with_cause(
            ProcessingStage::TextExtraction,
            format!("Text extraction failed: {cause:#}"),
            cause,
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ProcessingStage::Validation, message)
    }

    /// Passes staged errors through untouched and files everything else
    /// under `general_processing`.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<CertificateProcessingError>() {
            Ok(staged) => staged,
            Err(other) => Self::with_cause(
                ProcessingStage::GeneralProcessing,
                format!("Unexpected processing error: {other:#}"),
                other,
            ),
        }
    }

    /// Original error rendered with its context chain, for diagnostics.
    pub fn details(&self) -> Option<String> {
        self.cause.as_ref().map(|cause| format!("{cause:#}"))
    }
}
