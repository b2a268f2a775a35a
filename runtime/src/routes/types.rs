use serde::Serialize;

use crate::{pipeline::ProcessingStage, storage::StoredCertificate};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: StoredCertificate,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<ProcessingStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Option<String>>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stage: None,
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            stage: None,
            details: Some(details),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CertificateListResponse {
    pub total: usize,
    pub certificates: Vec<StoredCertificate>,
}
