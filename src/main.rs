mod animation;
mod app;
mod atlas;
mod codec;
mod config;
mod dispatch;
mod game;
mod input;
mod interface;
mod model;
mod render;
mod scheduler;
mod sim;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "pokegotchi")]
#[command(about = "A pocket monster that lives in your terminal")]
pub(crate) struct Cli {
    /// RNG seed for a reproducible run
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Ignore the save file and hatch a new pet
    #[arg(long)]
    pub(crate) fresh: bool,

    /// Draw in monochrome
    #[arg(long)]
    pub(crate) no_color: bool,

    /// TexturePacker JSON atlas to use instead of the built-in one
    #[arg(long)]
    pub(crate) atlas: Option<PathBuf>,
}

/// The terminal belongs to the game, so logs go to a file.
fn init_tracing(paths: &config::Paths) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
        .with_context(|| format!("opening {}", paths.log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pokegotchi=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing the log subscriber: {e}"))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = config::project_paths()?;
    init_tracing(&paths)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pokegotchi starting");
    app::run(cli, paths)
}
