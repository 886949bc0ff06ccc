//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use clip_summarizer::summarizer::{Summarizer, SummarizerProvider, SummaryConstraints};
use clip_summarizer::video::{ClipAlgebra, ClipRange, Composition, EncodeSettings, MediaInfo};
use clip_summarizer::{Result, SummaryError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Contents of every "video" written by [`FakeClipAlgebra`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeMedia {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub overlay: Option<String>,
}

pub async fn write_fake_video(path: &Path, duration: f64) {
    let media = FakeMedia {
        duration,
        width: 1280,
        height: 720,
        overlay: None,
    };
    tokio::fs::write(path, serde_json::to_vec(&media).unwrap()).await.unwrap();
}

pub fn read_fake_video(path: &Path) -> FakeMedia {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Clip algebra over small JSON files that only carry duration and frame size
#[derive(Default)]
pub struct FakeClipAlgebra {
    pub extracted: Mutex<Vec<ClipRange>>,
    pub concatenated: Mutex<Vec<PathBuf>>,
    pub fail_encode: bool,
}

impl FakeClipAlgebra {
    pub fn failing_encode() -> Self {
        Self {
            fail_encode: true,
            ..Default::default()
        }
    }

    pub fn condensed_paths(&self) -> Vec<PathBuf> {
        self.concatenated.lock().unwrap().clone()
    }
}

async fn read_media(path: &Path) -> Result<FakeMedia> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_media(path: &Path, media: &FakeMedia) -> Result<()> {
    tokio::fs::write(path, serde_json::to_vec(media)?).await?;
    Ok(())
}

#[async_trait]
impl ClipAlgebra for FakeClipAlgebra {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let media = read_media(path).await?;
        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration: Duration::from_secs_f64(media.duration),
            width: media.width,
            height: media.height,
            fps: 30.0,
            has_audio: true,
        })
    }

    async fn extract_range(&self, source: &Path, range: ClipRange, dest: &Path) -> Result<()> {
        let mut media = read_media(source).await?;
        media.duration = range.duration();
        write_media(dest, &media).await?;
        self.extracted.lock().unwrap().push(range);
        Ok(())
    }

    async fn concatenate(&self, clips: &[PathBuf], dest: &Path) -> Result<()> {
        let mut total = 0.0;
        let mut width = 0;
        let mut height = 0;
        for clip in clips {
            let media = read_media(clip).await?;
            total += media.duration;
            width = media.width;
            height = media.height;
        }

        let media = FakeMedia {
            duration: total,
            width,
            height,
            overlay: None,
        };
        write_media(dest, &media).await?;
        self.concatenated.lock().unwrap().push(dest.to_path_buf());
        Ok(())
    }

    async fn encode(&self, composition: &Composition, settings: &EncodeSettings, dest: &Path) -> Result<()> {
        if self.fail_encode {
            tokio::fs::write(dest, b"half written").await?;
            return Err(SummaryError::assembly("encoder exited with status 1"));
        }

        let media = FakeMedia {
            duration: composition.duration,
            width: settings.resolution.width,
            height: settings.resolution.height,
            overlay: Some(composition.text.clone()),
        };
        write_media(dest, &media).await
    }
}

/// Returns each chunk verbatim, failing on chunks that contain a marker word
pub struct EchoSummarizer {
    pub fail_marker: Option<&'static str>,
}

impl EchoSummarizer {
    pub fn new() -> Self {
        Self { fail_marker: None }
    }

    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_marker: Some(marker),
        }
    }
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, text: &str, _constraints: &SummaryConstraints) -> Result<String> {
        match self.fail_marker {
            Some(marker) if text.contains(marker) => {
                Err(SummaryError::Backend(format!("model rejected chunk containing {}", marker)))
            }
            _ => Ok(text.to_string()),
        }
    }

    fn provider_type(&self) -> SummarizerProvider {
        SummarizerProvider::Extractive
    }
}

/// Write a WebVTT file with one cue per `(start, end, text)`
pub async fn write_captions(path: &Path, cues: &[(&str, &str, &str)]) {
    let mut vtt = String::from("WEBVTT\n\n");
    for (index, (start, end, text)) in cues.iter().enumerate() {
        vtt.push_str(&format!("{}\n{} --> {}\n{}\n\n", index + 1, start, end, text));
    }
    tokio::fs::write(path, vtt).await.unwrap();
}
