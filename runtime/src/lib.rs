//! Certificate ingestion service: uploaded documents go through text
//! extraction (text layer + OCR), model-backed field inference and date
//! location, and the resulting record is stored as JSON.

use std::sync::Arc;

pub mod ai;
pub mod config;
pub mod pipeline;
pub mod routes;
pub mod storage;

use pipeline::{CertificatePipeline, DocumentManager};
use storage::CertificateStore;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CertificatePipeline>,
    pub documents: DocumentManager,
    pub certificates: CertificateStore,
}
