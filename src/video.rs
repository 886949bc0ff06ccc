use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{Resolution, VideoConfig};
use crate::error::{Result, SummaryError};

/// Media information extracted from a video file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub duration: Duration,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Half-open span of a source video, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the range can be cut from a source of `source_duration` seconds
    pub fn validate(&self, source_duration: f64) -> Result<()> {
        let reason = if self.start >= self.end {
            "start is not before end"
        } else if self.start < 0.0 {
            "starts before the source video"
        } else if self.end > source_duration + RANGE_TOLERANCE_SECS {
            "ends after the source video"
        } else {
            return Ok(());
        };

        Err(SummaryError::ClipRange {
            start: self.start,
            end: self.end,
            reason: format!("{} (source is {:.3}s)", reason, source_duration),
        })
    }
}

/// Container timestamps are rounded to the millisecond
const RANGE_TOLERANCE_SECS: f64 = 0.001;

/// Styling for the summary text layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub font_file: Option<PathBuf>,
}

impl From<&VideoConfig> for OverlayStyle {
    fn from(config: &VideoConfig) -> Self {
        Self {
            font_size: config.font_size,
            font_color: config.font_color.clone(),
            box_color: config.box_color.clone(),
            font_file: config.font_file.clone(),
        }
    }
}

/// Text layer composited over a base video, centered, for its full duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub base: PathBuf,
    /// Overlay text, pre-wrapped to fit `width`
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub style: OverlayStyle,
}

/// Output encoding parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeSettings {
    pub codec: String,
    pub audio_codec: String,
    pub resolution: Resolution,
}

impl From<&VideoConfig> for EncodeSettings {
    fn from(config: &VideoConfig) -> Self {
        Self {
            codec: config.codec.clone(),
            audio_codec: config.audio_codec.clone(),
            resolution: config.resolution,
        }
    }
}

/// Capability set the assembler builds summary videos from.
///
/// Implementations write real media (ffmpeg) or stand-ins for testing; the
/// assembler only relies on durations, widths and call order.
#[async_trait]
pub trait ClipAlgebra: Send + Sync {
    /// Read duration and frame size of a media file
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Cut `range` out of `source` into `dest`
    async fn extract_range(&self, source: &Path, range: ClipRange, dest: &Path) -> Result<()>;

    /// Join clips back to back, in the given order, into `dest`
    async fn concatenate(&self, clips: &[PathBuf], dest: &Path) -> Result<()>;

    /// Build a text layer sized to the base video's width and spanning its whole duration
    fn overlay_text(&self, base: &MediaInfo, text: &str, style: &OverlayStyle) -> Composition {
        // Average glyph is a little over half the font size wide
        let glyph_width = (style.font_size.max(1) as f64 * 0.6).max(1.0);
        let max_chars = ((base.width as f64 * 0.9) / glyph_width).floor().max(1.0) as usize;

        Composition {
            base: base.path.clone(),
            text: wrap_text(text, max_chars),
            width: base.width,
            height: base.height,
            duration: base.duration_secs(),
            style: style.clone(),
        }
    }

    /// Render a composition with the given settings into `dest`
    async fn encode(&self, composition: &Composition, settings: &EncodeSettings, dest: &Path) -> Result<()>;
}

/// Wrap text at a maximum line length in characters
pub fn wrap_text(text: &str, max_line_length: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= max_line_length {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join("\n")
}

/// Clip algebra backed by the ffmpeg and ffprobe command line tools
#[derive(Debug, Clone)]
pub struct FfmpegClipAlgebra {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegClipAlgebra {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }

    /// Report the ffmpeg version, or an error if it cannot be run
    pub async fn check_availability(&self) -> Result<String> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SummaryError::Configuration(format!("{} not runnable: {}", self.ffmpeg_path, e)))?;

        let version = String::from_utf8_lossy(&output.stdout);
        Ok(version.lines().next().unwrap_or("ffmpeg (unknown version)").to_string())
    }

    fn ffmpeg(&self) -> Command {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, mut command: Command, step: &str) -> Result<()> {
        let output = command
            .output()
            .await
            .map_err(|e| SummaryError::assembly(format!("{}: could not start ffmpeg: {}", step, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SummaryError::assembly(format!(
                "{} failed: {}",
                step,
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ClipAlgebra for FfmpegClipAlgebra {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SummaryError::assembly(format!("could not start ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(SummaryError::assembly(format!("ffprobe failed for {}", path.display())));
        }

        let info = parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))?;
        info!(
            "📹 Probed {} ({}x{}, {:.1}fps, {:.1}s)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.duration_secs()
        );
        Ok(info)
    }

    async fn extract_range(&self, source: &Path, range: ClipRange, dest: &Path) -> Result<()> {
        // Fast keyframe seek on input, then an accurate seek on output
        let fast_seek = (range.start - 5.0).max(0.0);
        let accurate_seek = range.start - fast_seek;

        debug!("Extracting {:.3}s..{:.3}s into {}", range.start, range.end, dest.display());

        let mut command = self.ffmpeg();
        command
            .args(["-ss", &format!("{:.3}", fast_seek)])
            .arg("-i")
            .arg(source)
            .args(["-ss", &format!("{:.3}", accurate_seek)])
            .args(["-t", &format!("{:.3}", range.duration())])
            .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "20"])
            .args(["-c:a", "aac", "-b:a", "128k"])
            .args(["-avoid_negative_ts", "make_zero"])
            .arg(dest);

        self.run(command, "clip extraction").await
    }

    async fn concatenate(&self, clips: &[PathBuf], dest: &Path) -> Result<()> {
        if clips.is_empty() {
            return Err(SummaryError::assembly("nothing to concatenate"));
        }

        let list_path = dest.with_extension("concat.txt");
        let list_content: String = clips
            .iter()
            .map(|clip| format!("file '{}'\n", clip.display().to_string().replace('\'', "'\\''")))
            .collect();
        tokio::fs::write(&list_path, list_content)
            .await
            .map_err(|e| SummaryError::assembly(format!("cannot write concat list: {}", e)))?;

        let mut command = self.ffmpeg();
        command
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(dest);

        let result = self.run(command, "concatenation").await;
        let _ = tokio::fs::remove_file(&list_path).await;

        if result.is_ok() {
            info!("🎞️ Concatenated {} clips into {}", clips.len(), dest.display());
        }
        result
    }

    async fn encode(&self, composition: &Composition, settings: &EncodeSettings, dest: &Path) -> Result<()> {
        // drawtext reads the text from a file, which avoids filtergraph escaping of the summary
        let text_file = tempfile::Builder::new()
            .prefix("overlay-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| SummaryError::assembly(format!("cannot create overlay text file: {}", e)))?;
        tokio::fs::write(text_file.path(), &composition.text)
            .await
            .map_err(|e| SummaryError::assembly(format!("cannot write overlay text file: {}", e)))?;

        let filter = build_video_filter(composition, settings, text_file.path());
        debug!("Encoding with filter: {}", filter);

        let mut command = self.ffmpeg();
        command
            .arg("-i")
            .arg(&composition.base)
            .args(["-vf", &filter])
            .args(["-c:v", &settings.codec])
            .args(["-c:a", &settings.audio_codec])
            .args(["-movflags", "+faststart"])
            .arg(dest);

        self.run(command, "encode").await?;
        info!("✅ Encoded {} ({}, {})", dest.display(), settings.codec, settings.resolution);
        Ok(())
    }
}

/// Quote a filter option value.
///
/// The option parser consumes one level of escaping and the graph parser
/// another, so `:` stays escaped inside the quotes and a `'` has to leave them.
fn quote_filter_value(value: &str) -> String {
    let option_level = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:");
    format!("'{}'", option_level.replace('\'', "'\\''"))
}

/// drawtext overlay followed by scaling/padding to the output resolution
fn build_video_filter(composition: &Composition, settings: &EncodeSettings, text_file: &Path) -> String {
    let style = &composition.style;
    let mut drawtext = format!(
        "drawtext=textfile={}:fontsize={}:fontcolor={}:box=1:boxcolor={}@0.6:boxborderw=10:\
         x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,0,{:.3})'",
        quote_filter_value(&text_file.display().to_string()),
        style.font_size,
        style.font_color,
        style.box_color,
        composition.duration,
    );

    if let Some(font_file) = &style.font_file {
        drawtext.push_str(&format!(
            ":fontfile={}",
            quote_filter_value(&font_file.display().to_string())
        ));
    }

    let Resolution { width, height } = settings.resolution;
    format!(
        "{drawtext},scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        drawtext = drawtext,
        w = width,
        h = height,
    )
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output
pub fn parse_probe_output(path: &Path, json: &str) -> Result<MediaInfo> {
    let probe: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SummaryError::assembly(format!("unreadable ffprobe output for {}: {}", path.display(), e)))?;

    let streams = probe["streams"]
        .as_array()
        .ok_or_else(|| SummaryError::assembly(format!("no streams reported for {}", path.display())))?;

    let video_stream = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .ok_or_else(|| SummaryError::assembly(format!("no video stream in {}", path.display())))?;

    let duration = probe["format"]["duration"]
        .as_str()
        .or_else(|| video_stream["duration"].as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| SummaryError::assembly(format!("no duration reported for {}", path.display())))?;

    let fps = video_stream["r_frame_rate"]
        .as_str()
        .and_then(|s| match s.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                (den != 0.0).then(|| num / den)
            }
            None => s.parse().ok(),
        })
        .unwrap_or(0.0);

    Ok(MediaInfo {
        path: path.to_path_buf(),
        duration,
        width: video_stream["width"].as_u64().unwrap_or(0) as u32,
        height: video_stream["height"].as_u64().unwrap_or(0) as u32,
        fps,
        has_audio: streams.iter().any(|s| s["codec_type"] == "audio"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"},
            {"codec_type": "audio", "sample_rate": "48000", "channels": 2}
        ],
        "format": {"duration": "10.010000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
    }"#;

    fn sample_info() -> MediaInfo {
        parse_probe_output(Path::new("/videos/in.mp4"), PROBE_JSON).unwrap()
    }

    #[test]
    fn test_parse_probe_output() {
        let info = sample_info();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert!((info.duration_secs() - 10.01).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn test_probe_without_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(matches!(
            parse_probe_output(Path::new("a.m4a"), json),
            Err(SummaryError::VideoAssembly(_))
        ));
    }

    #[test]
    fn test_probe_without_duration_is_an_error() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360}], "format": {}}"#;
        match parse_probe_output(Path::new("live.ts"), json) {
            Err(SummaryError::VideoAssembly(message)) => assert!(message.contains("no duration")),
            other => panic!("unexpected {:?}", other),
        }

        let json = r#"{"streams": [{"codec_type": "video"}], "format": {"duration": "N/A"}}"#;
        assert!(matches!(
            parse_probe_output(Path::new("live.ts"), json),
            Err(SummaryError::VideoAssembly(_))
        ));
    }

    #[test]
    fn test_unreadable_probe_output_is_assembly_error() {
        assert!(matches!(
            parse_probe_output(Path::new("a.mp4"), "ffprobe: not json"),
            Err(SummaryError::VideoAssembly(_))
        ));
    }

    #[test]
    fn test_quote_filter_value() {
        assert_eq!(quote_filter_value("/tmp/plain.txt"), "'/tmp/plain.txt'");
        assert_eq!(quote_filter_value("C:/fonts/a.ttf"), "'C\\:/fonts/a.ttf'");
        assert_eq!(quote_filter_value("it's.txt"), "'it\\'\\''s.txt'");
        assert_eq!(quote_filter_value("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_clip_range_validation() {
        assert!(ClipRange::new(1.0, 3.0).validate(10.0).is_ok());
        assert!(ClipRange::new(8.0, 10.0005).validate(10.0).is_ok());

        for range in [ClipRange::new(3.0, 3.0), ClipRange::new(4.0, 2.0), ClipRange::new(9.0, 12.0)] {
            match range.validate(10.0) {
                Err(e @ SummaryError::ClipRange { .. }) => assert!(e.is_recoverable()),
                other => panic!("expected clip range error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a very long line that should be wrapped at a specific length", 20);
        assert!(wrapped.lines().all(|line| line.chars().count() <= 20));
        assert_eq!(wrapped.split_whitespace().count(), 14);
        assert_eq!(wrap_text("", 10), "");
    }

    struct NoopAlgebra;

    #[async_trait]
    impl ClipAlgebra for NoopAlgebra {
        async fn probe(&self, path: &Path) -> Result<MediaInfo> {
            Err(SummaryError::missing_file(path))
        }
        async fn extract_range(&self, _: &Path, _: ClipRange, _: &Path) -> Result<()> {
            Ok(())
        }
        async fn concatenate(&self, _: &[PathBuf], _: &Path) -> Result<()> {
            Ok(())
        }
        async fn encode(&self, _: &Composition, _: &EncodeSettings, _: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_overlay_spans_base_video() {
        let style = OverlayStyle::from(&crate::config::Config::default().video);
        let composition = NoopAlgebra.overlay_text(&sample_info(), "A dog ran. It was quiet.", &style);

        assert_eq!(composition.width, 1920);
        assert!((composition.duration - 10.01).abs() < 1e-9);
        assert_eq!(composition.text, "A dog ran. It was quiet.");
        assert_eq!(composition.base, PathBuf::from("/videos/in.mp4"));
    }

    #[test]
    fn test_video_filter_centers_text_and_scales() {
        let config = crate::config::Config::default().video;
        let composition = NoopAlgebra.overlay_text(&sample_info(), "Summary", &OverlayStyle::from(&config));
        let filter = build_video_filter(&composition, &EncodeSettings::from(&config), Path::new("/tmp/o:v.txt"));

        assert!(filter.starts_with("drawtext=textfile='/tmp/o\\:v.txt':fontsize="));
        assert!(filter.contains("x=(w-text_w)/2:y=(h-text_h)/2"));
        assert!(filter.contains("enable='between(t,0,10.010)'"));
        assert!(filter.ends_with("pad=1280:720:(ow-iw)/2:(oh-ih)/2"));
    }
}
