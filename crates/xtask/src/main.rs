//! Development tasks for the battle engine.
//!
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, ReadSnapshot, Simulate};

/// Development tasks for the battle engine
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the battle engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Resolve every attack of a RON scenario headlessly
    Simulate(Simulate),

    /// Read and inspect a saved battle snapshot
    ReadSnapshot(ReadSnapshot),

    /// Clean save data and logs
    Clean(Clean),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for BATTLE_DATA_DIR and RUST_LOG)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(cmd) => cmd.execute(),
        Command::ReadSnapshot(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
