//! API data models

use serde::{Deserialize, Serialize};

/// Body of `POST /summarize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub file_id: Option<String>,
    #[serde(default = "default_summary_length")]
    pub summary_length: usize,
}

fn default_summary_length() -> usize {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary_text: String,
    pub summary_video_url: String,
    pub clips_used: usize,
    pub clips_skipped: usize,
    pub failed_chunks: usize,
}

/// Public view of the running configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub upload_folder: String,
    pub summary_folder: String,
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_length_defaults_to_200() {
        let request: SummarizeRequest = serde_json::from_str(r#"{"file_id": "abc"}"#).unwrap();
        assert_eq!(request.summary_length, 200);
        assert_eq!(request.file_id.as_deref(), Some("abc"));

        let request: SummarizeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.file_id.is_none());
    }
}
