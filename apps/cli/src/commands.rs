//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use feedforge_core::pipeline::{
    FeedBuildResult, FeedPipeline, FeedRequest, ProgressReporter, SourceContent,
};
use feedforge_segmentation::{ChunkingPipeline, VideoSegmenter};
use feedforge_shared::{
    AppConfig, Concept, FeedConfig, TranscriptUnit, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

/// Crates whose logs the default filter enables.
const LOG_TARGETS: [&str; 6] = [
    "feedforge",
    "feedforge_core",
    "feedforge_feed",
    "feedforge_providers",
    "feedforge_segmentation",
    "feedforge_shared",
];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// FeedForge: turn long-form learning content into a paced feed.
#[derive(Parser)]
#[command(
    name = "feedforge",
    version,
    about = "Segment transcripts and articles by topic and assemble interleaved learning feeds.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.feedforge/feedforge.toml.
    #[arg(long, global = true, env = "FEEDFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Split an article into topic-coherent chunks of propositions.
    Chunk {
        /// Plain-text article file.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Segment a timed transcript into duration-bounded video segments.
    Segment {
        /// JSON array of `{text, start, end}` transcript units.
        #[arg(short, long)]
        transcript: PathBuf,

        /// Total video duration in seconds (defaults to the last unit's end).
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// Assemble a learning feed from a source.
    Feed {
        /// JSON source: transcript, article, segments, or chunks.
        #[arg(short, long)]
        source: PathBuf,

        /// Source id embedded in every feed item id.
        #[arg(long)]
        source_id: String,

        /// JSON array of concepts with optional sample questions.
        #[arg(short, long)]
        concepts: Option<PathBuf>,

        /// Seed for quiz question selection.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

fn default_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Chunk { input } => cmd_chunk(config_path.as_deref(), &input).await,
        Command::Segment {
            transcript,
            duration,
        } => cmd_segment(config_path.as_deref(), &transcript, duration).await,
        Command::Feed {
            source,
            source_id,
            concepts,
            seed,
        } => {
            cmd_feed(
                config_path.as_deref(),
                &source,
                &source_id,
                concepts.as_deref(),
                seed,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_chunk(config_path: Option<&Path>, input: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let text = std::fs::read_to_string(input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;

    let chunker = ChunkingPipeline::from_app_config(&config)?;

    info!(input = %input.display(), chars = text.len(), "chunking article");
    let spinner = CliProgress::new();
    spinner.phase("Chunking article");
    let chunks = chunker.chunk_text(&text).await;
    spinner.finish();
    let chunks = chunks?;

    print_json(&chunks)
}

async fn cmd_segment(
    config_path: Option<&Path>,
    transcript: &Path,
    duration: Option<f64>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let units: Vec<TranscriptUnit> = read_json(transcript)?;
    let total = duration
        .or_else(|| units.last().map(|u| u.end))
        .unwrap_or(0.0);

    let segmenter = VideoSegmenter::from_app_config(&config)?;

    info!(units = units.len(), total, "segmenting transcript");
    let spinner = CliProgress::new();
    spinner.phase("Segmenting transcript");
    let segments = segmenter.segment(&units, total).await;
    spinner.finish();
    let segments = segments?;

    print_json(&segments)
}

async fn cmd_feed(
    config_path: Option<&Path>,
    source: &Path,
    source_id: &str,
    concepts: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    if source_id.trim().is_empty() {
        return Err(eyre!("--source-id must not be empty"));
    }

    let config = resolve_config(config_path)?;
    let source: SourceContent = read_json(source)?;
    let concepts: Vec<Concept> = match concepts {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    // Only raw sources need the provider-backed stages.
    let mut pipeline = FeedPipeline::new(FeedConfig::from(&config));
    match &source {
        SourceContent::Transcript { .. } => {
            pipeline = pipeline.with_segmenter(VideoSegmenter::from_app_config(&config)?);
        }
        SourceContent::Article { .. } => {
            pipeline = pipeline.with_chunker(ChunkingPipeline::from_app_config(&config)?);
        }
        SourceContent::Segments { .. } | SourceContent::Chunks { .. } => {}
    }

    let request = FeedRequest {
        concepts,
        seed,
        ..FeedRequest::new(source_id, source)
    };

    let reporter = CliProgress::new();
    let result = reporter.settle(pipeline.build(&request, &reporter).await)?;
    print_json(&result.feed)
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    /// Clear the spinner if `result` is an error; `done` clears it otherwise.
    fn settle<T, E>(&self, result: std::result::Result<T, E>) -> std::result::Result<T, E> {
        if result.is_err() {
            self.finish();
        }
        result
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, result: &FeedBuildResult) {
        self.finish();
        info!(
            items = result.feed.len(),
            content_units = result.content_units,
            elapsed_secs = result.elapsed.as_secs_f64(),
            "feed ready"
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_feed_command() {
        let cli = Cli::try_parse_from([
            "feedforge",
            "-vv",
            "feed",
            "--source",
            "lecture.json",
            "--source-id",
            "lec-1",
            "--seed",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Feed {
                source_id, seed, ..
            } => {
                assert_eq!(source_id, "lec-1");
                assert_eq!(seed, Some(3));
            }
            _ => panic!("expected feed command"),
        }
    }

    #[test]
    fn failed_build_clears_spinner() {
        let progress = CliProgress::new();
        let ok: std::result::Result<u8, &str> = progress.settle(Ok(1));
        assert_eq!(ok, Ok(1));
        assert!(!progress.spinner.is_finished());

        let failed: std::result::Result<u8, &str> = progress.settle(Err("build failed"));
        assert!(failed.is_err());
        assert!(progress.spinner.is_finished());
    }

    #[test]
    fn default_filter_covers_every_crate() {
        let filter = default_filter(1);
        assert!(filter.contains("feedforge_segmentation=debug"));
        assert!(filter.contains("feedforge=debug"));
        assert_eq!(filter.split(',').count(), LOG_TARGETS.len());
    }
}
