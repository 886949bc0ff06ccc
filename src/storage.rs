//! Upload and summary folders, job ids and the file naming scheme

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Result, SummaryError};

/// Input files belonging to one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub video: PathBuf,
    pub captions: PathBuf,
}

impl JobPaths {
    pub fn exist(&self) -> bool {
        self.video.is_file() && self.captions.is_file()
    }
}

/// File layout shared by the CLI and the HTTP server
#[derive(Debug, Clone)]
pub struct JobStorage {
    upload_dir: PathBuf,
    summary_dir: PathBuf,
    video_extensions: Vec<String>,
    caption_extensions: Vec<String>,
}

impl JobStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, summary_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            summary_dir: summary_dir.into(),
            video_extensions: vec!["mp4".to_string()],
            caption_extensions: vec!["vtt".to_string()],
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            summary_dir: config.summary_dir.clone(),
            video_extensions: config.video_extensions.clone(),
            caption_extensions: config.caption_extensions.clone(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn summary_dir(&self) -> &Path {
        &self.summary_dir
    }

    pub async fn ensure_folders_exist(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.summary_dir] {
            if !dir.exists() {
                info!("📁 Creating {}", dir.display());
            }
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Store an uploaded video and caption track under a fresh job id
    pub async fn save_upload(
        &self,
        video_name: &str,
        video: &[u8],
        captions_name: &str,
        captions: &[u8],
    ) -> Result<String> {
        check_extension(video_name, &self.video_extensions)?;
        check_extension(captions_name, &self.caption_extensions)?;

        self.ensure_folders_exist().await?;

        let job_id = Uuid::new_v4().to_string();
        let paths = self.paths_for(&job_id);
        tokio::fs::write(&paths.video, video).await?;
        tokio::fs::write(&paths.captions, captions).await?;

        info!(
            "📥 Stored job {} ({} byte video, {} byte captions)",
            job_id,
            video.len(),
            captions.len()
        );
        Ok(job_id)
    }

    /// Locate the inputs of an existing job
    pub fn job_paths(&self, job_id: &str) -> Result<JobPaths> {
        validate_job_id(job_id)?;
        Ok(self.paths_for(job_id))
    }

    pub fn summary_path(&self, job_id: &str) -> Result<PathBuf> {
        validate_job_id(job_id)?;
        Ok(self.summary_dir.join(summary_file_name(job_id)))
    }

    /// Public download path for a job's summary video
    pub fn summary_url(&self, job_id: &str) -> String {
        format!("/summaries/{}", urlencoding::encode(&summary_file_name(job_id)))
    }

    /// Resolve a requested summary file name inside the summary folder
    pub fn resolve_summary(&self, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain {
            return Err(SummaryError::InvalidRequest(format!("invalid file name '{}'", filename)));
        }

        let path = self.summary_dir.join(filename);
        if !path.is_file() {
            return Err(SummaryError::NotFound(filename.to_string()));
        }
        debug!("Serving {}", path.display());
        Ok(path)
    }

    fn paths_for(&self, job_id: &str) -> JobPaths {
        JobPaths {
            video: self.upload_dir.join(format!("{}_video.mp4", job_id)),
            captions: self.upload_dir.join(format!("{}_captions.vtt", job_id)),
        }
    }
}

pub fn summary_file_name(job_id: &str) -> String {
    format!("{}_summary.mp4", job_id)
}

fn validate_job_id(job_id: &str) -> Result<()> {
    Uuid::parse_str(job_id)
        .map(|_| ())
        .map_err(|_| SummaryError::InvalidRequest(format!("invalid file_id '{}'", job_id)))
}

fn check_extension(filename: &str, allowed: &[String]) -> Result<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
        _ => Err(SummaryError::InvalidRequest(format!(
            "file type not allowed: '{}' (expected {})",
            filename,
            allowed.join(", ")
        ))),
    }
}
