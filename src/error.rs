//! Error types for the summarization pipeline

use std::path::Path;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, SummaryError>;

/// Error types for pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum SummaryError {
    /// Malformed caption file or timestamp
    #[error("Format error: {0}")]
    Format(String),

    /// A single chunk could not be summarized
    #[error("Summarization failed for chunk {chunk}: {message}")]
    Summarization { chunk: usize, message: String },

    /// A caption's time range cannot be cut from the source video
    #[error("Clip range {start:.3}s..{end:.3}s rejected: {reason}")]
    ClipRange { start: f64, end: f64, reason: String },

    /// A summarizer backend rejected or failed a request
    #[error("Summarizer backend error: {0}")]
    Backend(String),

    /// Concatenation, overlay or encode failure
    #[error("Video assembly failed: {0}")]
    VideoAssembly(String),

    #[error("No important captions to assemble: {0}")]
    NothingImportant(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SummaryError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn assembly(message: impl Into<String>) -> Self {
        Self::VideoAssembly(message.into())
    }

    /// Report a failure of a fatal assembly step as `VideoAssembly`
    pub fn into_assembly(self) -> Self {
        match self {
            Self::VideoAssembly(_) => self,
            other => Self::VideoAssembly(other.to_string()),
        }
    }

    pub fn missing_file(path: &Path) -> Self {
        Self::NotFound(path.display().to_string())
    }

    /// Per-chunk and per-caption failures are handled locally and never abort a job
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Summarization { .. } | Self::ClipRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        let chunk = SummaryError::Summarization { chunk: 2, message: "model offline".into() };
        let range = SummaryError::ClipRange { start: 4.0, end: 2.0, reason: "start after end".into() };
        assert!(chunk.is_recoverable());
        assert!(range.is_recoverable());
        assert!(!SummaryError::assembly("concat failed").is_recoverable());
        assert!(!SummaryError::NothingImportant("empty".into()).is_recoverable());
    }

    #[test]
    fn test_into_assembly() {
        let io = SummaryError::from(std::io::Error::new(std::io::ErrorKind::AlreadyExists, "File exists"));
        match io.into_assembly() {
            SummaryError::VideoAssembly(message) => assert!(message.contains("File exists")),
            other => panic!("unexpected {:?}", other),
        }

        match SummaryError::assembly("concat failed").into_assembly() {
            SummaryError::VideoAssembly(message) => assert_eq!(message, "concat failed"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = SummaryError::ClipRange { start: 1.0, end: 12.5, reason: "beyond source duration".into() };
        assert_eq!(err.to_string(), "Clip range 1.000s..12.500s rejected: beyond source duration");
        assert_eq!(SummaryError::format("bad cue").to_string(), "Format error: bad cue");
    }
}
