//! Job-level orchestration: captions in, summary video out

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::assembler::{ClipAssembler, SkippedClip};
use crate::captions::{self, CaptionRecord};
use crate::config::Config;
use crate::error::{Result, SummaryError};
use crate::selection::select_important;
use crate::summarizer::{summarize_chunks, Summarizer, SummaryConstraints};
use crate::transcript::{build_transcript, TranscriptChunker};
use crate::video::ClipAlgebra;

/// Result of one successful summarize job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub summary_text: String,
    pub important_captions: Vec<CaptionRecord>,
    pub failed_chunks: Vec<usize>,
    pub clips_used: usize,
    pub clips_skipped: Vec<SkippedClip>,
    pub output_path: PathBuf,
    pub condensed_duration: f64,
    pub elapsed: f64,
    pub completed_at: DateTime<Utc>,
}

/// Runs parse, chunk, summarize, select and assemble for one job
pub struct SummaryPipeline {
    config: Config,
    summarizer: Arc<dyn Summarizer>,
    assembler: ClipAssembler,
}

impl SummaryPipeline {
    pub fn new(config: Config, summarizer: Arc<dyn Summarizer>, algebra: Arc<dyn ClipAlgebra>) -> Self {
        let assembler = ClipAssembler::new(algebra, config.video.clone(), config.storage.work_dir.clone());
        Self {
            config,
            summarizer,
            assembler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Length bounds for a request, `summary_length` replacing the configured maximum
    pub fn constraints(&self, summary_length: Option<usize>) -> SummaryConstraints {
        let settings = &self.config.summarization;
        SummaryConstraints::new(summary_length.unwrap_or(settings.max_length), settings.min_length)
    }

    pub async fn run(
        &self,
        job_id: &str,
        video: &Path,
        captions_path: &Path,
        destination: &Path,
        summary_length: Option<usize>,
    ) -> Result<JobOutcome> {
        let start_time = Instant::now();

        for input in [video, captions_path] {
            if !input.is_file() {
                return Err(SummaryError::missing_file(input));
            }
        }

        info!("🎬 Starting job {}", job_id);

        let records = captions::parse_file(captions_path).await?;
        for problem in captions::validate_captions(&records) {
            warn!("Caption track {}: {}", captions_path.display(), problem);
        }

        let transcript = build_transcript(&records);
        let chunks = TranscriptChunker::new(self.config.chunking.max_chunk_tokens).chunk(&transcript);
        info!("📄 {} captions, {} chunks", records.len(), chunks.len());

        let settings = &self.config.summarization;
        let report = summarize_chunks(
            self.summarizer.as_ref(),
            &chunks,
            &self.constraints(summary_length),
            Duration::from_secs(settings.timeout_seconds),
            settings.concurrency,
        )
        .await;

        if report.summary.is_empty() && !chunks.is_empty() {
            warn!("⚠️ Job {} produced an empty summary", job_id);
        }

        let important = select_important(&records, &report.summary);
        info!("⭐ {} of {} captions are important", important.len(), records.len());

        let assembly = self
            .assembler
            .assemble(job_id, video, &important, &report.summary, destination)
            .await?;

        let elapsed = start_time.elapsed().as_secs_f64();
        info!("✅ Job {} finished in {:.2}s", job_id, elapsed);

        Ok(JobOutcome {
            job_id: job_id.to_string(),
            summary_text: report.summary,
            important_captions: important,
            failed_chunks: report.failed_chunks,
            clips_used: assembly.clips_used,
            clips_skipped: assembly.skipped,
            output_path: assembly.output_path,
            condensed_duration: assembly.condensed_duration,
            elapsed,
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::summarizer::providers::ExtractiveSummarizer;
    use crate::video::FfmpegClipAlgebra;

    fn pipeline(summary_max: usize) -> SummaryPipeline {
        let config = ConfigBuilder::new().with_summary_length(10, summary_max).build();
        let algebra = Arc::new(FfmpegClipAlgebra::new(&config.video));
        SummaryPipeline::new(config, Arc::new(ExtractiveSummarizer::new()), algebra)
    }

    #[test]
    fn test_summary_length_overrides_max_length() {
        let pipeline = pipeline(200);
        assert_eq!(pipeline.constraints(None), SummaryConstraints::new(200, 10));
        assert_eq!(pipeline.constraints(Some(50)), SummaryConstraints::new(50, 10));
        assert_eq!(pipeline.constraints(Some(5)).min_length, 5);
    }

    #[tokio::test]
    async fn test_missing_inputs_fail_before_any_work() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = pipeline(200)
            .run(
                "job",
                &dir.path().join("video.mp4"),
                &dir.path().join("captions.vtt"),
                &dir.path().join("out.mp4"),
                None,
            )
            .await;

        assert!(matches!(result, Err(SummaryError::NotFound(_))));
    }
}
