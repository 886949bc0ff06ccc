pub mod vtt;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timestamp::Timestamp;

pub use vtt::{parse_file, parse_str};

/// A single time-coded caption cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

impl CaptionRecord {
    pub fn new(start: Timestamp, end: Timestamp, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into().trim().to_string(),
        }
    }

    /// Duration in seconds; zero for inverted cues
    pub fn duration_secs(&self) -> f64 {
        (self.end.as_secs_f64() - self.start.as_secs_f64()).max(0.0)
    }
}

impl fmt::Display for CaptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}\n{}\n", self.start, self.end, self.text)
    }
}

/// List non-fatal issues in a caption track.
///
/// Overlapping and non-monotonic cues are reported here but never rejected
/// by the parser.
pub fn validate_captions(captions: &[CaptionRecord]) -> Vec<String> {
    let mut issues = Vec::new();

    for (i, caption) in captions.iter().enumerate() {
        if caption.end <= caption.start {
            issues.push(format!("Cue {}: End time is not after start time", i + 1));
        }

        if caption.text.trim().is_empty() {
            issues.push(format!("Cue {}: Empty text", i + 1));
        }
    }

    for (i, pair) in captions.windows(2).enumerate() {
        if pair[0].end > pair[1].start {
            issues.push(format!("Cues {} and {}: Overlapping timestamps", i + 1, i + 2));
        }
    }

    issues
}
