use super::{Summarizer, SummarizerProvider, SummaryConstraints};
use crate::config::SummarizationConfig;
use crate::error::{Result, SummaryError};
use crate::transcript::{count_tokens, split_sentences};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const HUGGINGFACE_API_BASE: &str = "https://api-inference.huggingface.co/models";
const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Offline summarizer that keeps the leading sentences of each chunk.
///
/// Sentences are returned verbatim, so every one of them can be traced back
/// to the caption it came from.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, text: &str, constraints: &SummaryConstraints) -> Result<String> {
        let mut selected: Vec<String> = Vec::new();
        let mut tokens = 0;

        for sentence in split_sentences(text) {
            let sentence_tokens = count_tokens(&sentence);
            if !selected.is_empty() && tokens + sentence_tokens > constraints.max_length {
                break;
            }
            tokens += sentence_tokens;
            selected.push(sentence);
        }

        if selected.is_empty() {
            return Err(SummaryError::Backend("chunk has no sentences".to_string()));
        }

        debug!("Extractive summary kept {} sentences ({} tokens)", selected.len(), tokens);
        Ok(selected.join(" "))
    }

    fn provider_type(&self) -> SummarizerProvider {
        SummarizerProvider::Extractive
    }
}

/// Hosted inference API for sequence-to-sequence summarization models
pub struct HuggingFaceSummarizer {
    config: SummarizationConfig,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct HuggingFaceRequest<'a> {
    inputs: &'a str,
    parameters: HuggingFaceParameters,
}

#[derive(Debug, Serialize)]
struct HuggingFaceParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct HuggingFaceSummary {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    pub fn new(config: SummarizationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/{}", HUGGINGFACE_API_BASE, config.model));

        Ok(Self { config, client, endpoint })
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str, constraints: &SummaryConstraints) -> Result<String> {
        let request = HuggingFaceRequest {
            inputs: text,
            parameters: HuggingFaceParameters {
                max_length: constraints.max_length,
                min_length: constraints.min_length,
                do_sample: false,
            },
        };

        debug!("Sending {} chars to {}", text.len(), self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SummaryError::Backend(format!("HuggingFace API error {}: {}", status, text)));
        }

        let summaries: Vec<HuggingFaceSummary> = response.json().await?;
        summaries
            .into_iter()
            .next()
            .map(|s| s.summary_text)
            .ok_or_else(|| SummaryError::Backend("Empty response from HuggingFace".to_string()))
    }

    fn provider_type(&self) -> SummarizerProvider {
        SummarizerProvider::HuggingFace
    }
}

const CHAT_SYSTEM_PROMPT: &str = "You summarize video transcripts. Reply with the most important \
sentences of the transcript, copied exactly as written and in their original order. \
Do not paraphrase, add commentary or use bullet points.";

/// OpenAI-compatible chat completions backend (LMStudio, OpenAI)
pub struct ChatSummarizer {
    config: SummarizationConfig,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl ChatSummarizer {
    pub fn new(config: SummarizationConfig) -> Result<Self> {
        let endpoint = match (&config.endpoint, config.provider) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, SummarizerProvider::OpenAI) => OPENAI_CHAT_ENDPOINT.to_string(),
            (None, provider) => {
                return Err(SummaryError::Configuration(format!(
                    "{:?} summarizer endpoint not configured",
                    provider
                )))
            }
        };

        if config.provider == SummarizerProvider::OpenAI && config.api_key.is_none() {
            return Err(SummaryError::Configuration("OpenAI API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client, endpoint })
    }

    fn build_request(&self, text: &str, constraints: &SummaryConstraints) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: CHAT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Summarize in {} to {} words:\n\n{}",
                        constraints.min_length, constraints.max_length, text
                    ),
                },
            ],
            // Words run slightly over one token each
            max_tokens: constraints.max_length * 2,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, text: &str, constraints: &SummaryConstraints) -> Result<String> {
        let request = self.build_request(text, constraints);

        debug!("Sending request to {:?} at {}", self.config.provider, self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SummaryError::Backend(format!(
                "{:?} API error {}: {}",
                self.config.provider, status, text
            )));
        }

        let chat_response: ChatResponse = response.json().await?;
        if let Some(usage) = &chat_response.usage {
            debug!("Chat summary used {} tokens", usage.total_tokens);
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| SummaryError::Backend(format!("No response from {:?}", self.config.provider)))
    }

    fn provider_type(&self) -> SummarizerProvider {
        self.config.provider
    }
}
