//! FeedForge CLI: turn transcripts and articles into paced learning feeds.
//!
//! Segments raw content by topic and assembles an interleaved feed of
//! content, quizzes, facts, and synthesis checkpoints.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
