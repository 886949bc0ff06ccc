use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use clip_summarizer::{create_summarizer, Config, FfmpegClipAlgebra, SummaryPipeline};

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Configuration file (TOML)");

    let summarize = Command::new("summarize")
        .about("Summarize a video from its caption track")
        .arg(
            Arg::new("video")
                .long("video")
                .value_name("FILE")
                .help("Source video")
                .required(true),
        )
        .arg(
            Arg::new("captions")
                .long("captions")
                .value_name("FILE")
                .help("WebVTT caption track for the video")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the summary video (defaults to the summary folder)"),
        )
        .arg(
            Arg::new("summary-length")
                .short('l')
                .long("summary-length")
                .value_name("TOKENS")
                .help("Maximum summary length per chunk")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(config_arg.clone());

    let command = Command::new("Clip Summarizer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Condense a video to its important captions and overlay a summary")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(summarize)
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(config_arg.clone()),
        );

    #[cfg(feature = "api")]
    let command = command.subcommand(
        Command::new("serve")
            .about("Run the HTTP API")
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .help("Port to listen on (overrides configuration)")
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(config_arg),
    );

    command
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };
    config.validate()?;
    Ok(config)
}

fn build_pipeline(config: &Config) -> Result<SummaryPipeline> {
    let summarizer = create_summarizer(&config.summarization)?;
    let algebra = Arc::new(FfmpegClipAlgebra::new(&config.video));
    Ok(SummaryPipeline::new(config.clone(), summarizer, algebra))
}

async fn run_summarize(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    let video = PathBuf::from(matches.get_one::<String>("video").ok_or_else(|| anyhow!("--video is required"))?);
    let captions = PathBuf::from(
        matches
            .get_one::<String>("captions")
            .ok_or_else(|| anyhow!("--captions is required"))?,
    );
    let summary_length = matches.get_one::<usize>("summary-length").copied();

    let job_id = uuid::Uuid::new_v4().to_string();
    let output = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => config.storage.summary_dir.join(clip_summarizer::storage::summary_file_name(&job_id)),
    };

    info!("🚀 Clip Summarizer starting...");
    info!("🎞️ Video: {}", video.display());
    info!("💬 Captions: {}", captions.display());
    info!("📂 Output: {}", output.display());

    let pipeline = build_pipeline(&config)?;
    let outcome = pipeline.run(&job_id, &video, &captions, &output, summary_length).await?;

    info!("🎉 Finished in {:.2}s", outcome.elapsed);
    info!("✅ Clips used: {}", outcome.clips_used);
    if !outcome.clips_skipped.is_empty() {
        info!("⏭️ Clips skipped: {}", outcome.clips_skipped.len());
    }
    if !outcome.failed_chunks.is_empty() {
        info!("⚠️ Chunks failed: {:?}", outcome.failed_chunks);
    }

    println!("{}", outcome.summary_text);
    println!("{}", outcome.output_path.display());
    Ok(())
}

#[cfg(feature = "api")]
async fn run_serve(matches: &ArgMatches) -> Result<()> {
    use clip_summarizer::api::ApiServer;

    let config = load_config(matches)?;
    let port = matches.get_one::<u16>("port").copied().unwrap_or(config.server.port);

    let pipeline = Arc::new(build_pipeline(&config)?);
    ApiServer::new(pipeline, Arc::new(config), port).start().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let filter = if matches.get_flag("verbose") {
        "clip_summarizer=debug,info"
    } else {
        "clip_summarizer=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match matches.subcommand() {
        Some(("summarize", sub)) => run_summarize(sub).await,
        Some(("config", sub)) => load_config(sub).map(|config| println!("{}", config.summary())),
        #[cfg(feature = "api")]
        Some(("serve", sub)) => run_serve(sub).await,
        _ => Err(anyhow!("unknown command")),
    };

    if let Err(e) = &result {
        error!("❌ {}", e);
    }
    result
}
