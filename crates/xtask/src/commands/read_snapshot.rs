//! Read and inspect battle snapshots
//!
//! Deserializes snapshot_{sequence}.bin files and displays their contents.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use battle_runtime::{BattleSnapshot, FileStateRepository, StateRepository};

use crate::{dirs, utils};

/// Read and inspect a saved snapshot
#[derive(Parser)]
pub struct ReadSnapshot {
    /// Sequence of the snapshot to read; the newest one if omitted
    #[arg(value_name = "SEQUENCE")]
    sequence: Option<u64>,

    /// Session ID to read from; the most recent session if omitted
    #[arg(short, long, value_name = "SESSION")]
    session: Option<String>,

    /// Read this file directly instead of looking up a session
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["session", "sequence"])]
    file: Option<PathBuf>,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Territories, pending battles and records
    Summary,
    /// Full JSON output
    Json,
    /// Pretty-printed debug format
    Debug,
}

impl ReadSnapshot {
    pub fn execute(self) -> Result<()> {
        let path = match self.file {
            Some(path) => path,
            None => self.locate()?,
        };

        let bytes = std::fs::metadata(&path)
            .with_context(|| format!("Snapshot not found: {}", path.display()))?
            .len() as usize;
        let snapshot = FileStateRepository::read_file(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        println!("{} {}", style("Snapshot File:").bold().cyan(), path.display());
        println!("{} {}", style("File Size:").bold().cyan(), utils::format_bytes(bytes));
        println!("{} {}", style("Sequence:").bold().cyan(), snapshot.sequence);
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&snapshot),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            OutputFormat::Debug => println!("{:#?}", snapshot),
        }

        Ok(())
    }

    fn locate(&self) -> Result<PathBuf> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()?,
        };
        let session_id = match &self.session {
            Some(id) => id.clone(),
            None => utils::find_latest_session(&data_dir)?,
        };
        let snapshots_dir = data_dir.join(&session_id).join("snapshots");
        let repo = FileStateRepository::new(&snapshots_dir)?;

        let sequence = match self.sequence {
            Some(sequence) => sequence,
            None => repo
                .list_sequences()?
                .into_iter()
                .max()
                .with_context(|| {
                    format!("No snapshots found in {}", snapshots_dir.display())
                })?,
        };
        Ok(snapshots_dir.join(format!("snapshot_{}.bin", sequence)))
    }
}

fn print_summary(snapshot: &BattleSnapshot) {
    println!("{}", style("=== Battle Snapshot Summary ===").bold().green());
    println!();

    println!("{}", style("Territories:").bold().yellow());
    for (id, territory) in snapshot.world.territories() {
        let owner = territory
            .owner
            .map(|owner| owner.to_string())
            .unwrap_or_else(|| "neutral".to_string());
        println!("  {} owner {} units {}", id, owner, territory.units.len());
    }
    println!();

    println!("{}", style("Pending Battles:").bold().yellow());
    let mut pending = 0;
    for battle in snapshot.tracker.battles() {
        pending += 1;
        let state = battle.state();
        let waiting = state
            .pending_decision()
            .map(|request| format!(", waiting on {}", request.kind()))
            .unwrap_or_default();
        println!(
            "  {} {} at {} round {}{} blocked by {:?}",
            battle.id(),
            battle.kind(),
            battle.site(),
            state.round(),
            waiting,
            snapshot.tracker.dependencies_of(battle.id())
        );
    }
    if pending == 0 {
        println!("  {}", style("none").dim());
    }
    println!();

    println!("{}", style("Records:").bold().yellow());
    for record in snapshot.tracker.records() {
        println!(
            "  {} {} at {}: {} ({})",
            record.battle, record.kind, record.site, record.outcome.who_won, record.outcome.description
        );
    }
}
