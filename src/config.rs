use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::summarizer::SummarizerProvider;
use crate::transcript::DEFAULT_MAX_CHUNK_TOKENS;

const ENV_PREFIX: &str = "CLIP_SUMMARIZER_";

/// Configuration for the clip summarizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcript chunking settings
    pub chunking: ChunkingConfig,

    /// Summarization backend settings
    pub summarization: SummarizationConfig,

    /// Clip extraction, overlay and encode settings
    pub video: VideoConfig,

    /// Upload and summary storage
    pub storage: StorageConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum word tokens per chunk (a single longer sentence may exceed it)
    pub max_chunk_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    /// Summarizer backend
    pub provider: SummarizerProvider,

    /// API endpoint (remote providers)
    pub endpoint: Option<String>,

    /// API key (cloud providers)
    pub api_key: Option<String>,

    /// Model to use
    pub model: String,

    /// Target maximum summary length per chunk
    pub max_length: usize,

    /// Target minimum summary length per chunk
    pub min_length: usize,

    /// Temperature for chat backends (0.0 = deterministic)
    pub temperature: f32,

    /// Per-chunk timeout in seconds
    pub timeout_seconds: u64,

    /// Chunks summarized concurrently (1 = sequential)
    pub concurrency: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Video codec for the final encode
    pub codec: String,

    /// Audio codec for the final encode
    pub audio_codec: String,

    /// Output resolution
    pub resolution: Resolution,

    /// Overlay font size in pixels
    pub font_size: u32,

    /// Overlay text color
    pub font_color: String,

    /// Overlay background box color
    pub box_color: String,

    /// Optional font file for the overlay
    pub font_file: Option<PathBuf>,

    /// ffmpeg binary
    pub ffmpeg_path: String,

    /// ffprobe binary
    pub ffprobe_path: String,

    /// Timeout for each concatenate/encode step in seconds
    pub encode_timeout_seconds: u64,

    /// Clips extracted concurrently (1 = sequential)
    pub extract_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded videos and caption tracks
    pub upload_dir: PathBuf,

    /// Directory for finished summary videos
    pub summary_dir: PathBuf,

    /// Scratch directory for per-job intermediates (system temp dir if unset)
    pub work_dir: Option<PathBuf>,

    /// Accepted video upload extensions
    pub video_extensions: Vec<String>,

    /// Accepted caption upload extensions
    pub caption_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" | "default" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Debug mode
    pub debug: bool,

    /// Deployment profile
    pub environment: Environment,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "clip-summarizer.toml",
            "config/clip-summarizer.toml",
            "/etc/clip-summarizer/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::load_from(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config file {}: {}", path, e),
                }
            }
        }

        // Fall back to defaults plus environment overrides
        Self::from_env()
    }

    /// Load configuration from a specific TOML file, then apply environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults for a deployment profile
    pub fn for_environment(environment: Environment) -> Self {
        let mut config = Self::default();
        config.server.environment = environment;
        config.server.debug = environment == Environment::Development;
        config
    }

    /// Override settings from `CLIP_SUMMARIZER_*` variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(environment) = var("ENV").as_deref().and_then(Environment::parse) {
            self.server.environment = environment;
            self.server.debug = environment == Environment::Development;
        }

        if let Some(tokens) = var("MAX_CHUNK_TOKENS") {
            self.chunking.max_chunk_tokens = tokens.parse().unwrap_or(DEFAULT_MAX_CHUNK_TOKENS);
        }

        if let Some(provider) = var("PROVIDER") {
            match provider.parse() {
                Ok(provider) => self.summarization.provider = provider,
                Err(e) => tracing::warn!("Ignoring {}PROVIDER: {}", ENV_PREFIX, e),
            }
        }

        if let Some(endpoint) = var("ENDPOINT") {
            self.summarization.endpoint = Some(endpoint);
        }

        if let Some(api_key) = var("API_KEY") {
            self.summarization.api_key = Some(api_key);
        }

        if let Some(model) = var("MODEL") {
            self.summarization.model = model;
        }

        if let Some(codec) = var("CODEC") {
            self.video.codec = codec;
        }

        if let Some(upload_dir) = var("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(upload_dir);
        }

        if let Some(summary_dir) = var("SUMMARY_DIR") {
            self.storage.summary_dir = PathBuf::from(summary_dir);
        }

        if let Some(port) = var("PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_tokens == 0 {
            return Err(anyhow!("max_chunk_tokens must be greater than 0"));
        }

        let summarization = &self.summarization;
        if summarization.max_length == 0 {
            return Err(anyhow!("summary max_length must be greater than 0"));
        }
        if summarization.min_length > summarization.max_length {
            return Err(anyhow!(
                "summary min_length ({}) exceeds max_length ({})",
                summarization.min_length,
                summarization.max_length
            ));
        }
        if summarization.timeout_seconds == 0 || self.video.encode_timeout_seconds == 0 {
            return Err(anyhow!("timeouts must be greater than 0"));
        }
        if summarization.concurrency == 0 || self.video.extract_concurrency == 0 {
            return Err(anyhow!("concurrency must be greater than 0"));
        }

        if let Some(endpoint) = &summarization.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| anyhow!("Invalid summarizer endpoint {}: {}", endpoint, e))?;
        }

        match summarization.provider {
            SummarizerProvider::OpenAI if summarization.api_key.is_none() => {
                return Err(anyhow!("API key required for the OpenAI summarizer"));
            }
            SummarizerProvider::LMStudio if summarization.endpoint.is_none() => {
                return Err(anyhow!("Endpoint required for the LMStudio summarizer"));
            }
            _ => {}
        }

        if self.video.resolution.width == 0 || self.video.resolution.height == 0 {
            return Err(anyhow!("resolution must be non-zero"));
        }
        if self.video.codec.trim().is_empty() {
            return Err(anyhow!("video codec must be set"));
        }

        if self.storage.video_extensions.is_empty() || self.storage.caption_extensions.is_empty() {
            return Err(anyhow!("upload extension allow-lists must not be empty"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Clip Summarizer Configuration:\n\
            - Environment: {:?} (debug: {})\n\
            - Chunk Ceiling: {} tokens\n\
            - Summarizer: {:?} ({})\n\
            - Summary Length: {}..{}\n\
            - Codec: {} @ {}\n\
            - Upload Directory: {}\n\
            - Summary Directory: {}\n\
            - Allowed Extensions: {} / {}",
            self.server.environment,
            self.server.debug,
            self.chunking.max_chunk_tokens,
            self.summarization.provider,
            self.summarization.model,
            self.summarization.min_length,
            self.summarization.max_length,
            self.video.codec,
            self.video.resolution,
            self.storage.upload_dir.display(),
            self.storage.summary_dir.display(),
            self.storage.video_extensions.join(", "),
            self.storage.caption_extensions.join(", "),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig {
                max_chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            },
            summarization: SummarizationConfig {
                provider: SummarizerProvider::Extractive,
                endpoint: None,
                api_key: None,
                model: "facebook/bart-large-cnn".to_string(),
                max_length: 200,
                min_length: 30,
                temperature: 0.0,
                timeout_seconds: 120,
                concurrency: 1,
            },
            video: VideoConfig {
                codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                resolution: Resolution { width: 1280, height: 720 },
                font_size: 24,
                font_color: "white".to_string(),
                box_color: "black".to_string(),
                font_file: None,
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                encode_timeout_seconds: 1800, // 30 minutes
                extract_concurrency: 1,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                summary_dir: PathBuf::from("summaries"),
                work_dir: None,
                video_extensions: vec!["mp4".to_string()],
                caption_extensions: vec!["vtt".to_string()],
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                debug: true,
                environment: Environment::Development,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_max_chunk_tokens(mut self, tokens: usize) -> Self {
        self.config.chunking.max_chunk_tokens = tokens;
        self
    }

    pub fn with_provider(mut self, provider: SummarizerProvider) -> Self {
        self.config.summarization.provider = provider;
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.config.summarization.endpoint = Some(endpoint);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.summarization.api_key = Some(api_key);
        self
    }

    pub fn with_summary_length(mut self, min_length: usize, max_length: usize) -> Self {
        self.config.summarization.min_length = min_length;
        self.config.summarization.max_length = max_length;
        self
    }

    pub fn with_codec(mut self, codec: &str) -> Self {
        self.config.video.codec = codec.to_string();
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.config.video.resolution = Resolution { width, height };
        self
    }

    pub fn with_storage_dirs(mut self, upload_dir: PathBuf, summary_dir: PathBuf) -> Self {
        self.config.storage.upload_dir = upload_dir;
        self.config.storage.summary_dir = summary_dir;
        self
    }

    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.config.storage.work_dir = Some(work_dir);
        self
    }

    /// Summarize chunks and extract clips in parallel, one task per core (max 8)
    pub fn with_parallelism(mut self) -> Self {
        let workers = num_cpus::get().clamp(1, 8);
        self.config.summarization.concurrency = workers;
        self.config.video.extract_concurrency = workers;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
