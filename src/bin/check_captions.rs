use anyhow::{anyhow, Result};
use clip_summarizer::captions::{self, validate_captions};
use clip_summarizer::transcript::{build_transcript, TranscriptChunker};
use clip_summarizer::{Config, FfmpegClipAlgebra};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("clip_summarizer=info,check_captions=info")
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: check-captions <FILE.vtt>"))?;

    let config = Config::load().unwrap_or_default();

    info!("🔍 Checking caption track {}", path.display());
    let records = captions::parse_file(&path).await?;
    info!("   - {} cues", records.len());

    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        info!("   - spans {} to {}", first.start, last.end);
    }

    let problems = validate_captions(&records);
    if problems.is_empty() {
        info!("✅ No timing problems found");
    } else {
        for problem in &problems {
            info!("⚠️ {}", problem);
        }
    }

    let transcript = build_transcript(&records);
    let chunker = TranscriptChunker::new(config.chunking.max_chunk_tokens);
    let chunks = chunker.chunk(&transcript);
    let oversized = chunks
        .iter()
        .filter(|chunk| chunk.token_count > chunker.max_tokens())
        .count();

    info!("📄 Transcript: {} chars, {} chunks", transcript.len(), chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        info!("   - chunk {}: {} sentences, {} tokens", index, chunk.sentences.len(), chunk.token_count);
    }
    if oversized > 0 {
        info!("   - {} chunks hold a single sentence above the {} token ceiling", oversized, chunker.max_tokens());
    }

    info!("🎬 Checking ffmpeg availability...");
    match FfmpegClipAlgebra::new(&config.video).check_availability().await {
        Ok(version) => info!("✅ {}", version),
        Err(e) => {
            info!("❌ {}", e);
            info!("💡 Install ffmpeg and ffprobe or set video.ffmpeg_path in the config file");
        }
    }

    Ok(())
}
