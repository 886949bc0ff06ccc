pub mod sentences;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::captions::CaptionRecord;

pub use sentences::{count_tokens, split_sentences, tokenize};

/// Default token ceiling per chunk
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 1000;

/// Join caption payloads, in track order, into one transcript
pub fn build_transcript(captions: &[CaptionRecord]) -> String {
    captions
        .iter()
        .map(|caption| caption.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Contiguous run of whole sentences sent to the summarizer as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub sentences: Vec<String>,
    pub token_count: usize,
}

impl TranscriptChunk {
    fn new() -> Self {
        Self {
            sentences: Vec::new(),
            token_count: 0,
        }
    }

    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }

    pub fn is_blank(&self) -> bool {
        self.sentences.iter().all(|sentence| sentence.trim().is_empty())
    }
}

/// Greedy sentence-aligned chunker
#[derive(Debug, Clone)]
pub struct TranscriptChunker {
    max_tokens: usize,
}

impl TranscriptChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split a transcript into chunks of at most `max_tokens` word tokens.
    ///
    /// Sentences are never split. A sentence longer than the ceiling gets a
    /// chunk of its own, so that chunk may exceed the ceiling.
    pub fn chunk(&self, transcript: &str) -> Vec<TranscriptChunk> {
        let mut chunks = Vec::new();
        let mut current = TranscriptChunk::new();

        for sentence in split_sentences(transcript) {
            let sentence_tokens = count_tokens(&sentence);

            if current.token_count + sentence_tokens > self.max_tokens {
                if !current.is_blank() {
                    chunks.push(current);
                }
                current = TranscriptChunk::new();
            }

            current.token_count += sentence_tokens;
            current.sentences.push(sentence);
        }

        if !current.is_blank() {
            chunks.push(current);
        }

        debug!(
            "Chunked transcript into {} chunks (ceiling {} tokens)",
            chunks.len(),
            self.max_tokens
        );
        chunks
    }
}

impl Default for TranscriptChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_TOKENS)
    }
}

/// Chunk a transcript with the given ceiling
pub fn chunk_transcript(transcript: &str, max_tokens: usize) -> Vec<TranscriptChunk> {
    TranscriptChunker::new(max_tokens).chunk(transcript)
}
