use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::{error, info, warn};

use super::types::{CertificateListResponse, ErrorResponse, UploadResponse};
use crate::{
    AppState,
    pipeline::{CertificateProcessingError, ProcessingStage},
    storage::CertificateFilter,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn certificate_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/upload",
            post(upload_certificate).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/certificates", get(list_certificates))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(message)))
}

fn internal_error(err: &anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_details(
            "Internal server error",
            Some(format!("{err:#}")),
        )),
    )
}

pub(crate) fn processing_error(err: &CertificateProcessingError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.message.clone(),
            stage: Some(err.stage),
            details: Some(err.details()),
        }),
    )
}

async fn upload_certificate(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("invalid multipart payload: {err}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(|name| name.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|err| bad_request(format!("failed to read upload field: {err}")))?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| bad_request("No file uploaded"))?;

    let doc_manager = &state.documents;
    let safe_filename = filename
        .as_deref()
        .and_then(|name| doc_manager.sanitize_filename(name).ok())
        .ok_or_else(|| bad_request("Invalid file"))?;

    if !doc_manager.is_supported_file(&safe_filename) {
        return Err(bad_request(format!(
            "unsupported file type. supported types: {:?}",
            doc_manager.supported_extensions()
        )));
    }

    // Dropping `staged` deletes the file, also when the request is cancelled.
    let staged = doc_manager
        .stage_upload(&safe_filename, bytes)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to stage upload");
            internal_error(&err)
        })?;

    let outcome = state.pipeline.process_document(staged.path()).await;
    if let Err(err) = staged.close() {
        warn!(error = %err, "failed to remove staged upload");
    }

    let record = outcome.map_err(|err| {
        match err.stage {
            ProcessingStage::GeneralProcessing => error!(
                filename = %safe_filename,
                stage = %err.stage,
                details = ?err.details(),
                "certificate processing failed"
            ),
            _ => warn!(
                filename = %safe_filename,
                stage = %err.stage,
                details = ?err.details(),
                "certificate rejected"
            ),
        }
        processing_error(&err)
    })?;

    let saved = state.certificates.save(record).await.map_err(|err| {
        error!(error = %err, "failed to persist certificate");
        internal_error(&err)
    })?;

    info!(filename = %safe_filename, id = %saved.id, "certificate uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Certificate processed successfully".to_string(),
            data: saved,
        }),
    ))
}

async fn list_certificates(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CertificateFilter>,
) -> Result<Json<CertificateListResponse>, ApiError> {
    let certificates = state.certificates.list(&filter).await.map_err(|err| {
        error!(error = %err, "failed to load certificates");
        internal_error(&err)
    })?;

    Ok(Json(CertificateListResponse {
        total: certificates.len(),
        certificates,
    }))
}
