//! WebVTT caption track parser

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use super::CaptionRecord;
use crate::error::{Result, SummaryError};
use crate::timestamp::Timestamp;

const HEADER: &str = "WEBVTT";
const TIMING_ARROW: &str = "-->";

/// Read and parse a caption track from disk
pub async fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SummaryError::missing_file(path));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let captions = parse_str(&content)?;
    debug!("Parsed {} cues from {}", captions.len(), path.display());
    Ok(captions)
}

/// Parse WebVTT content into cues, in file order.
///
/// Cue timings are not checked for ordering or overlap.
pub fn parse_str(content: &str) -> Result<Vec<CaptionRecord>> {
    let normalized = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut lines = normalized.lines();
    match lines.next() {
        Some(first) if is_header_line(first) => {}
        _ => return Err(SummaryError::format("missing WEBVTT header")),
    }

    let mut captions = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut block_number = 0;
    // The rest of the header block runs until the first blank line
    let mut in_header = true;

    for line in lines.chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }

        if in_header {
            in_header = false;
            block.clear();
            continue;
        }

        if block.is_empty() {
            continue;
        }

        block_number += 1;
        if let Some(caption) = parse_block(&block, block_number)? {
            captions.push(caption);
        }
        block.clear();
    }

    Ok(captions)
}

fn is_header_line(line: &str) -> bool {
    match line.strip_prefix(HEADER) {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t'),
        None => false,
    }
}

fn is_keyword_block(first_line: &str, keyword: &str) -> bool {
    match first_line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t'),
        None => false,
    }
}

fn parse_block(block: &[&str], block_number: usize) -> Result<Option<CaptionRecord>> {
    let first = block[0];
    if ["NOTE", "STYLE", "REGION"]
        .iter()
        .any(|keyword| is_keyword_block(first, keyword))
    {
        return Ok(None);
    }

    // Optional cue identifier precedes the timing line
    let timing_index = if first.contains(TIMING_ARROW) {
        0
    } else if block.len() > 1 && block[1].contains(TIMING_ARROW) {
        1
    } else {
        return Err(SummaryError::format(format!(
            "cue block {} has no timing line",
            block_number
        )));
    };

    let (start, end) = parse_timing_line(block[timing_index]).map_err(|e| {
        SummaryError::format(format!("cue block {}: {}", block_number, e))
    })?;

    let text = clean_cue_text(&block[timing_index + 1..].join("\n"));
    Ok(Some(CaptionRecord::new(start, end, text)))
}

fn parse_timing_line(line: &str) -> Result<(Timestamp, Timestamp)> {
    let (start, rest) = line
        .split_once(TIMING_ARROW)
        .ok_or_else(|| SummaryError::format(format!("invalid timing line '{}'", line)))?;

    // Cue settings may follow the end timestamp
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| SummaryError::format(format!("missing end time in '{}'", line)))?;

    let start = Timestamp::parse(&start.trim().replace(',', "."))?;
    let end = Timestamp::parse(&end.replace(',', "."))?;
    Ok((start, end))
}

fn cue_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("cue tag pattern is valid"))
}

/// Strip inline cue tags and decode the entities WebVTT allows in payloads
pub fn clean_cue_text(text: &str) -> String {
    let stripped = cue_tag_pattern().replace_all(text, "");
    stripped
        .lines()
        .map(|line| {
            line.replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&nbsp;", " ")
                .replace("&amp;", "&")
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "WEBVTT - sample track\nKind: captions\n\n\
        NOTE produced by hand\n\n\
        1\n00:00:01.000 --> 00:00:03.000 align:start position:10%\nA dog ran.\n\n\
        00:06.000 --> 00:08.500\n<v Narrator>It was <i>quiet</i>.</v>\nThen it rained.\n";

    #[test]
    fn test_parse_sample_track() {
        let captions = parse_str(SAMPLE).unwrap();
        assert_eq!(captions.len(), 2);

        assert_eq!(captions[0].start.as_secs_f64(), 1.0);
        assert_eq!(captions[0].end.as_secs_f64(), 3.0);
        assert_eq!(captions[0].text, "A dog ran.");

        assert_eq!(captions[1].start.as_secs_f64(), 6.0);
        assert_eq!(captions[1].end.as_secs_f64(), 8.5);
        assert_eq!(captions[1].text, "It was quiet.\nThen it rained.");
    }

    #[test]
    fn test_missing_header_is_format_error() {
        let err = parse_str("00:00:01.000 --> 00:00:02.000\nHello\n").unwrap_err();
        assert!(matches!(err, SummaryError::Format(_)));
        assert!(parse_str("WEBVTTX\n\n").is_err());
        assert!(parse_str("").is_err());
    }

    #[test]
    fn test_bad_timestamp_is_format_error() {
        let content = "WEBVTT\n\n00:00:xx.000 --> 00:00:02.000\nHello\n";
        match parse_str(content) {
            Err(SummaryError::Format(message)) => assert!(message.contains("cue block 1")),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_block_without_timing_is_format_error() {
        let content = "WEBVTT\n\nintro\nno timing here\n";
        assert!(matches!(parse_str(content), Err(SummaryError::Format(_))));
    }

    #[test]
    fn test_overlapping_and_unordered_cues_are_kept() {
        let content = "WEBVTT\n\n\
            00:00:05.000 --> 00:00:09.000\nSecond in time.\n\n\
            00:00:01.000 --> 00:00:06.000\nFirst in time.\n\n\
            00:00:04.000 --> 00:00:02.000\nInverted.\n";
        let captions = parse_str(content).unwrap();
        assert_eq!(captions.len(), 3);
        assert_eq!(captions[0].text, "Second in time.");
        assert_eq!(captions[2].text, "Inverted.");
    }

    #[test]
    fn test_crlf_bom_and_comma_decimals() {
        let content = "\u{feff}WEBVTT\r\n\r\n00:00:01,250 --> 00:00:02,750\r\nTom &amp; Jerry\r\n";
        let captions = parse_str(content).unwrap();
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].start.as_secs_f64(), 1.25);
        assert_eq!(captions[0].text, "Tom & Jerry");
    }

    #[test]
    fn test_header_only_track_is_empty() {
        assert!(parse_str("WEBVTT\n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parse_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("captions.vtt");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let captions = parse_file(&path).await.unwrap();
        assert_eq!(captions.len(), 2);

        let missing = parse_file(temp_dir.path().join("missing.vtt")).await;
        assert!(matches!(missing, Err(SummaryError::NotFound(_))));
    }
}
