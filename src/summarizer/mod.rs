pub mod providers;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SummarizationConfig;
use crate::error::{Result, SummaryError};
use crate::transcript::TranscriptChunk;

/// Summarizer backend types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SummarizerProvider {
    Extractive,
    HuggingFace,
    LMStudio,
    OpenAI,
}

impl FromStr for SummarizerProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extractive" => Ok(Self::Extractive),
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "lmstudio" => Ok(Self::LMStudio),
            "openai" => Ok(Self::OpenAI),
            other => Err(format!("unknown summarizer provider '{}'", other)),
        }
    }
}

/// Length bounds passed to the backend with every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryConstraints {
    pub max_length: usize,
    pub min_length: usize,
}

impl SummaryConstraints {
    /// Build constraints, clamping `min_length` so it never exceeds `max_length`
    pub fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length: min_length.min(max_length),
        }
    }
}

/// Trait for text-to-text summarization backends
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, constraints: &SummaryConstraints) -> Result<String>;

    fn provider_type(&self) -> SummarizerProvider;
}

/// Create a summarizer based on configuration
pub fn create_summarizer(config: &SummarizationConfig) -> Result<Arc<dyn Summarizer>> {
    match config.provider {
        SummarizerProvider::Extractive => Ok(Arc::new(providers::ExtractiveSummarizer::new())),
        SummarizerProvider::HuggingFace => {
            Ok(Arc::new(providers::HuggingFaceSummarizer::new(config.clone())?))
        }
        SummarizerProvider::LMStudio | SummarizerProvider::OpenAI => {
            Ok(Arc::new(providers::ChatSummarizer::new(config.clone())?))
        }
    }
}

/// Outcome of summarizing every chunk of a transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Successful fragments joined with single spaces, in chunk order
    pub summary: String,
    /// One slot per chunk; `None` where the chunk failed
    pub fragments: Vec<Option<String>>,
    /// Indices of chunks that failed or timed out
    pub failed_chunks: Vec<usize>,
}

impl SummaryReport {
    fn from_results(results: Vec<Result<String>>) -> Self {
        let mut report = Self::default();

        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(fragment) => report.fragments.push(Some(fragment.trim().to_string())),
                Err(e) => {
                    warn!("⚠️ Skipping chunk {}: {}", index, e);
                    report.fragments.push(None);
                    report.failed_chunks.push(index);
                }
            }
        }

        report.summary = report
            .fragments
            .iter()
            .flatten()
            .filter(|fragment| !fragment.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        report
    }

    pub fn succeeded(&self) -> usize {
        self.fragments.len() - self.failed_chunks.len()
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} chunks summarized, {} chars",
            self.succeeded(),
            self.fragments.len(),
            self.summary.len()
        )
    }
}

/// Summarize chunks independently.
///
/// A failing or timed-out chunk is logged and left out of the summary; it
/// never aborts the others. With `concurrency > 1` chunks run in parallel
/// but fragments are still joined in chunk order. If every chunk fails the
/// summary is empty.
pub async fn summarize_chunks(
    summarizer: &dyn Summarizer,
    chunks: &[TranscriptChunk],
    constraints: &SummaryConstraints,
    timeout: Duration,
    concurrency: usize,
) -> SummaryReport {
    info!("📝 Summarizing {} chunks with {:?}", chunks.len(), summarizer.provider_type());

    let jobs: Vec<(usize, String, usize)> = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| (index, chunk.text(), chunk.token_count))
        .collect();

    let results: Vec<Result<String>> = stream::iter(jobs)
        .map(move |(index, text, token_count)| async move {
            debug!("Summarizing chunk {} ({} tokens)", index, token_count);

            match tokio::time::timeout(timeout, summarizer.summarize(&text, constraints)).await {
                Ok(Ok(fragment)) => Ok(fragment),
                Ok(Err(e)) => Err(SummaryError::Summarization {
                    chunk: index,
                    message: e.to_string(),
                }),
                Err(_) => Err(SummaryError::Summarization {
                    chunk: index,
                    message: SummaryError::Timeout(timeout.as_secs()).to_string(),
                }),
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let report = SummaryReport::from_results(results);
    info!("✅ {}", report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::chunk_transcript;

    /// Echoes the first word of each chunk, failing on chunks containing "FAIL"
    struct ScriptedSummarizer;

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(&self, text: &str, _constraints: &SummaryConstraints) -> Result<String> {
            if text.contains("FAIL") {
                return Err(SummaryError::Backend("model rejected input".to_string()));
            }
            if text.contains("SLOW") {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            // Later chunks finish first to exercise ordering
            let delay = 30u64.saturating_sub(text.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(text.split_whitespace().next().unwrap_or_default().to_string())
        }

        fn provider_type(&self) -> SummarizerProvider {
            SummarizerProvider::Extractive
        }
    }

    fn constraints() -> SummaryConstraints {
        SummaryConstraints::new(200, 30)
    }

    #[test]
    fn test_constraints_clamp_min_length() {
        let constraints = SummaryConstraints::new(20, 30);
        assert_eq!(constraints.min_length, 20);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("LMStudio".parse::<SummarizerProvider>().unwrap(), SummarizerProvider::LMStudio);
        assert_eq!("hf".parse::<SummarizerProvider>().unwrap(), SummarizerProvider::HuggingFace);
        assert!("bart".parse::<SummarizerProvider>().is_err());
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let chunks = chunk_transcript("Alpha one. FAIL two. Gamma three.", 3);
        assert_eq!(chunks.len(), 3);

        let report =
            summarize_chunks(&ScriptedSummarizer, &chunks, &constraints(), Duration::from_secs(1), 1).await;

        assert_eq!(report.summary, "Alpha Gamma");
        assert_eq!(report.failed_chunks, vec![1]);
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_yields_empty_summary() {
        let chunks = chunk_transcript("FAIL one. FAIL two.", 3);
        let report =
            summarize_chunks(&ScriptedSummarizer, &chunks, &constraints(), Duration::from_secs(1), 1).await;

        assert!(report.summary.is_empty());
        assert_eq!(report.failed_chunks, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let chunks = chunk_transcript("SLOW one. Fast two.", 3);
        let report =
            summarize_chunks(&ScriptedSummarizer, &chunks, &constraints(), Duration::from_millis(200), 1)
                .await;

        assert_eq!(report.summary, "Fast");
        assert_eq!(report.failed_chunks, vec![0]);
    }

    #[tokio::test]
    async fn test_parallel_summaries_keep_chunk_order() {
        let chunks = chunk_transcript("A b. Cc dd. Eee fff. Gggg hhhh.", 3);
        let report =
            summarize_chunks(&ScriptedSummarizer, &chunks, &constraints(), Duration::from_secs(1), 4).await;

        assert_eq!(report.summary, "A Cc Eee Gggg");
    }
}
