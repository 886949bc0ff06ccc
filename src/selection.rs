//! Maps the final summary text back onto the time-coded captions it came from

use tracing::debug;

use crate::captions::CaptionRecord;
use crate::transcript::split_sentences;

/// Select the captions represented in `summary`.
///
/// A caption is kept when any sentence of its own text occurs verbatim
/// (substring match) in the summary. This is a containment heuristic, not a
/// similarity measure: short or generic sentences such as "Yes." match far
/// more often than they should. Order and timing of the kept captions are
/// those of the input.
pub fn select_important(captions: &[CaptionRecord], summary: &str) -> Vec<CaptionRecord> {
    if summary.trim().is_empty() {
        return Vec::new();
    }

    let important: Vec<CaptionRecord> = captions
        .iter()
        .filter(|caption| is_represented(caption, summary))
        .cloned()
        .collect();

    debug!("Selected {} of {} captions", important.len(), captions.len());
    important
}

fn is_represented(caption: &CaptionRecord, summary: &str) -> bool {
    split_sentences(&caption.text)
        .iter()
        .any(|sentence| summary.contains(sentence.as_str()))
}
