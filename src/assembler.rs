//! Cuts important caption spans out of a source video, joins them and overlays the summary

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::captions::CaptionRecord;
use crate::config::VideoConfig;
use crate::error::{Result, SummaryError};
use crate::video::{ClipAlgebra, ClipRange, EncodeSettings, OverlayStyle};

/// A caption whose clip was left out of the condensed video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedClip {
    pub caption_index: usize,
    pub start: f64,
    pub end: f64,
    pub reason: String,
}

/// Result of a successful assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    pub clips_used: usize,
    pub skipped: Vec<SkippedClip>,
    /// Duration of the condensed video before the overlay, in seconds
    pub condensed_duration: f64,
}

/// Builds summary videos through a [`ClipAlgebra`]
pub struct ClipAssembler {
    algebra: Arc<dyn ClipAlgebra>,
    config: VideoConfig,
    work_dir: Option<PathBuf>,
}

impl ClipAssembler {
    pub fn new(algebra: Arc<dyn ClipAlgebra>, config: VideoConfig, work_dir: Option<PathBuf>) -> Self {
        Self {
            algebra,
            config,
            work_dir,
        }
    }

    fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.config.encode_timeout_seconds)
    }

    async fn with_timeout<T, F>(&self, step: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.step_timeout(), future).await {
            Ok(result) => result,
            Err(_) => Err(SummaryError::assembly(format!(
                "{} timed out after {} seconds",
                step, self.config.encode_timeout_seconds
            ))),
        }
    }

    /// Produce the summary video for `captions` at `destination`.
    ///
    /// Captions whose range is empty or outside the source are skipped. All
    /// intermediates live in a per-job scratch directory that is removed
    /// before returning, whatever the outcome. The final file is encoded
    /// under a temporary name next to `destination` and renamed into place
    /// only once complete.
    pub async fn assemble(
        &self,
        job_id: &str,
        source: &Path,
        captions: &[CaptionRecord],
        summary_text: &str,
        destination: &Path,
    ) -> Result<AssemblyReport> {
        if captions.is_empty() {
            return Err(SummaryError::NothingImportant(
                "no caption matched the summary".to_string(),
            ));
        }
        if !source.exists() {
            return Err(SummaryError::missing_file(source));
        }

        let work_root = self.work_dir.clone().unwrap_or_else(std::env::temp_dir);
        tokio::fs::create_dir_all(&work_root)
            .await
            .map_err(|e| SummaryError::assembly(format!("cannot create {}: {}", work_root.display(), e)))?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", job_id))
            .tempdir_in(&work_root)
            .map_err(|e| SummaryError::assembly(format!("cannot create scratch directory: {}", e)))?;

        let result = self
            .render(job_id, source, captions, summary_text, destination, &scratch)
            .await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory {}: {}", scratch_path.display(), e);
        }

        result
    }

    async fn render(
        &self,
        job_id: &str,
        source: &Path,
        captions: &[CaptionRecord],
        summary_text: &str,
        destination: &Path,
        scratch: &TempDir,
    ) -> Result<AssemblyReport> {
        let source_info = self
            .with_timeout("probe", self.algebra.probe(source))
            .await
            .map_err(SummaryError::into_assembly)?;
        let source_duration = source_info.duration_secs();

        info!("✂️ Extracting {} clips from {}", captions.len(), source.display());
        let (clips, skipped) = self
            .extract_clips(source, source_duration, captions, scratch.path())
            .await;

        if clips.is_empty() {
            return Err(SummaryError::NothingImportant(format!(
                "all {} important captions were rejected",
                captions.len()
            )));
        }

        self.finish(job_id, &clips, summary_text, destination, scratch.path())
            .await
            .map(|(output_path, condensed_duration)| AssemblyReport {
                output_path,
                clips_used: clips.len(),
                skipped,
                condensed_duration,
            })
            .map_err(SummaryError::into_assembly)
    }

    /// Concatenate, overlay and encode. Returns the output path and condensed duration.
    async fn finish(
        &self,
        job_id: &str,
        clips: &[PathBuf],
        summary_text: &str,
        destination: &Path,
        scratch: &Path,
    ) -> Result<(PathBuf, f64)> {
        let condensed_path = scratch.join(format!("{}_condensed.mp4", job_id));
        self.with_timeout("concatenation", self.algebra.concatenate(clips, &condensed_path))
            .await?;

        let condensed = self
            .with_timeout("probe", self.algebra.probe(&condensed_path))
            .await?;
        let composition = self
            .algebra
            .overlay_text(&condensed, summary_text, &OverlayStyle::from(&self.config));

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let partial = tempfile::Builder::new()
            .prefix(&format!(".{}-", job_id))
            .suffix(".partial.mp4")
            .tempfile_in(parent)?
            .into_temp_path();

        let settings = EncodeSettings::from(&self.config);
        self.with_timeout("encode", self.algebra.encode(&composition, &settings, &partial))
            .await?;

        partial.persist(destination).map_err(|e| {
            SummaryError::assembly(format!("cannot move output to {}: {}", destination.display(), e))
        })?;

        info!(
            "🎬 Summary video written to {} ({} clips, {:.1}s)",
            destination.display(),
            clips.len(),
            condensed.duration_secs()
        );

        Ok((destination.to_path_buf(), condensed.duration_secs()))
    }

    /// Extract one clip per caption, preserving caption order
    async fn extract_clips(
        &self,
        source: &Path,
        source_duration: f64,
        captions: &[CaptionRecord],
        scratch: &Path,
    ) -> (Vec<PathBuf>, Vec<SkippedClip>) {
        let ranges: Vec<(usize, ClipRange)> = captions
            .iter()
            .map(|caption| ClipRange::new(caption.start.as_secs_f64(), caption.end.as_secs_f64()))
            .enumerate()
            .collect();

        let results: Vec<(usize, ClipRange, Result<PathBuf>)> = stream::iter(ranges)
            .map(move |(index, range)| async move {
                let result = self.extract_clip(source, source_duration, index, range, scratch).await;
                (index, range, result)
            })
            .buffered(self.config.extract_concurrency.max(1))
            .collect()
            .await;

        let mut clips = Vec::new();
        let mut skipped = Vec::new();
        for (index, range, result) in results {
            match result {
                Ok(path) => clips.push(path),
                Err(e) => {
                    warn!("⚠️ Skipping caption {}: {}", index, e);
                    skipped.push(SkippedClip {
                        caption_index: index,
                        start: range.start,
                        end: range.end,
                        reason: e.to_string(),
                    });
                }
            }
        }

        (clips, skipped)
    }

    async fn extract_clip(
        &self,
        source: &Path,
        source_duration: f64,
        index: usize,
        range: ClipRange,
        scratch: &Path,
    ) -> Result<PathBuf> {
        range.validate(source_duration)?;

        let clip_path = scratch.join(format!("clip_{:04}.mp4", index));
        debug!("Clip {}: {:.3}s..{:.3}s", index, range.start, range.end);

        match self
            .with_timeout("clip extraction", self.algebra.extract_range(source, range, &clip_path))
            .await
        {
            Ok(()) => Ok(clip_path),
            Err(e) => Err(SummaryError::ClipRange {
                start: range.start,
                end: range.end,
                reason: e.to_string(),
            }),
        }
    }
}
