//! Clip Summarizer
//!
//! Condenses a video to the spans whose captions made it into a generated
//! summary, then overlays that summary on the condensed result.

pub mod assembler;
pub mod captions;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod selection;
pub mod storage;
pub mod summarizer;
pub mod timestamp;
pub mod transcript;
pub mod video;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::assembler::{AssemblyReport, ClipAssembler, SkippedClip};
pub use crate::captions::CaptionRecord;
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Result, SummaryError};
pub use crate::pipeline::{JobOutcome, SummaryPipeline};
pub use crate::selection::select_important;
pub use crate::storage::{JobPaths, JobStorage};
pub use crate::summarizer::{create_summarizer, summarize_chunks, Summarizer, SummarizerProvider, SummaryConstraints, SummaryReport};
pub use crate::timestamp::{to_seconds, Timestamp};
pub use crate::transcript::{chunk_transcript, TranscriptChunk, TranscriptChunker};
pub use crate::video::{ClipAlgebra, ClipRange, FfmpegClipAlgebra, MediaInfo};
