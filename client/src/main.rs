mod coordinator;
mod input;
mod remote;
mod render;

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use console::Term;

use crate::coordinator::Coordinator;
use crate::render::Renderer;

const LOG_FILE: &str = ".tetrisLog";

/// Terminal Tetris - play solo or head-to-head over a relay server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging to ~/.tetrisLog
    #[arg(long)]
    debug: bool,

    /// Disable the ghost piece
    #[arg(long)]
    noghost: bool,

    /// Current player's name
    #[arg(long, default_value = "noName")]
    name: String,

    /// Tetris server address
    #[arg(long, default_value = "127.0.0.1:9000")]
    address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let term = Term::stdout();
    term.hide_cursor().context("failed to prepare the terminal")?;
    term.clear_screen()?;

    let renderer = Renderer::new(term.clone(), !args.noghost, args.name.clone());
    let keys = input::spawn_reader();
    let mut coordinator = Coordinator::new(renderer, keys, args.name, args.address);
    let result = coordinator.run().await;

    let _ = term.clear_screen();
    let _ = term.show_cursor();
    result
}

/// Debug runs append JSON records to `~/.tetrisLog`; otherwise logging stays
/// off because the raw-mode terminal owns stdout.
fn init_logging(debug: bool) -> anyhow::Result<()> {
    if !debug {
        return Ok(());
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    let path = PathBuf::from(home).join(LOG_FILE);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("unable to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
