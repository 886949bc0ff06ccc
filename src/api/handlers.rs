//! API request handlers

use axum::extract::Multipart;
use serde_json::Value;
use tracing::info;

use super::models::{ConfigResponse, SummarizeRequest, SummarizeResponse, UploadResponse};
use crate::config::Config;
use crate::error::{Result, SummaryError};
use crate::pipeline::SummaryPipeline;
use crate::storage::JobStorage;

/// A named file received in a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Files of an upload form, keyed by the original form field names
#[derive(Debug, Default)]
pub struct UploadForm {
    pub video_file: Option<UploadedFile>,
    pub transcript_file: Option<UploadedFile>,
}

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "clip-summarizer",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Collect the `video_file` and `transcript_file` parts of a multipart body
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SummaryError::InvalidRequest(format!("malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| SummaryError::InvalidRequest(format!("malformed upload: {}", e)))?
            .to_vec();

        let file = UploadedFile { filename, bytes };
        match name.as_str() {
            "video_file" => form.video_file = Some(file),
            "transcript_file" => form.transcript_file = Some(file),
            _ => {}
        }
    }

    Ok(form)
}

/// Store an upload and hand back its job id
pub async fn upload(storage: &JobStorage, form: UploadForm) -> Result<UploadResponse> {
    let (video, transcript) = match (form.video_file, form.transcript_file) {
        (Some(video), Some(transcript)) => (video, transcript),
        _ => {
            return Err(SummaryError::InvalidRequest(
                "both video_file and transcript_file are required".to_string(),
            ))
        }
    };

    let file_id = storage
        .save_upload(&video.filename, &video.bytes, &transcript.filename, &transcript.bytes)
        .await?;

    Ok(UploadResponse { file_id })
}

/// Run the summary pipeline for a previously uploaded job
pub async fn summarize(
    pipeline: &SummaryPipeline,
    storage: &JobStorage,
    request: SummarizeRequest,
) -> Result<SummarizeResponse> {
    let file_id = request
        .file_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| SummaryError::InvalidRequest("file_id is required".to_string()))?;

    let paths = storage.job_paths(&file_id)?;
    if !paths.exist() {
        return Err(SummaryError::NotFound(format!("no uploaded files for {}", file_id)));
    }

    info!("📨 Summarize request for {} ({} tokens)", file_id, request.summary_length);

    let destination = storage.summary_path(&file_id)?;
    let outcome = pipeline
        .run(
            &file_id,
            &paths.video,
            &paths.captions,
            &destination,
            Some(request.summary_length),
        )
        .await?;

    Ok(SummarizeResponse {
        summary_text: outcome.summary_text,
        summary_video_url: storage.summary_url(&file_id),
        clips_used: outcome.clips_used,
        clips_skipped: outcome.clips_skipped.len(),
        failed_chunks: outcome.failed_chunks.len(),
    })
}

/// Read a finished summary video
pub async fn download(storage: &JobStorage, filename: &str) -> Result<Vec<u8>> {
    let path = storage.resolve_summary(filename)?;
    Ok(tokio::fs::read(path).await?)
}

pub fn config_info(config: &Config) -> ConfigResponse {
    ConfigResponse {
        upload_folder: config.storage.upload_dir.display().to_string(),
        summary_folder: config.storage.summary_dir.display().to_string(),
        debug_mode: config.server.debug,
    }
}
