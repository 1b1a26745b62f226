//! Resolve a scenario headlessly
//!
//! Every participant answers with the default provider, so the run is fully
//! determined by the scenario and its seed.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use battle_core::{BattleRecord, WhoWon};
use battle_runtime::{Runtime, Scenario, SnapshotService};

use crate::{dirs, utils};

/// Resolve every attack of a RON scenario
#[derive(Parser, Debug)]
pub struct Simulate {
    /// Scenario file (RON)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Override the scenario's game seed
    #[arg(long)]
    seed: Option<u64>,

    /// Save the final snapshot under the data directory
    #[arg(long)]
    save: bool,

    /// Custom data directory (defaults to platform-specific location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Print the battle records as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        let session_id = utils::new_session_id();
        let _guard = utils::init_logging(&session_id)?;

        let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        rt.block_on(self.run(session_id))
    }

    async fn run(self, session_id: String) -> Result<()> {
        let mut scenario = Scenario::load_from_file(&self.scenario)
            .with_context(|| format!("Failed to load scenario: {}", self.scenario.display()))?;
        if let Some(seed) = self.seed {
            scenario.config.game_seed = seed;
        }
        let setup = scenario.build()?;

        let runtime = Runtime::builder()
            .oracles(setup.oracles)
            .world(setup.world)
            .build()
            .await?;

        for attack in &setup.attacks {
            let battle = runtime.declare(attack).await?;
            tracing::info!(%battle, site = %attack.route.end, "attack declared");
        }

        runtime.fight_all().await?;

        let handle = runtime.handle();
        let records = handle.records().await?;
        let leftover = handle.battles().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            print_records(&scenario.name, &records);
        }

        if !leftover.is_empty() {
            println!(
                "{} {} battle(s) could not be resolved",
                style("!").yellow().bold(),
                leftover.len()
            );
        }

        if self.save {
            let data_dir = match self.data_dir {
                Some(dir) => dir,
                None => dirs::data_dir()?,
            };
            let snapshot = handle.snapshot().await?;
            let service = SnapshotService::new_file_based(data_dir.join(&session_id))?;
            let checkpoint =
                service.save_snapshot(session_id.as_str(), &snapshot, Some(scenario.name.clone()))?;
            println!(
                "{} snapshot {} saved to {}",
                style("✓").green(),
                checkpoint.sequence,
                style(data_dir.join(&session_id).display()).dim()
            );
        }

        runtime.shutdown().await?;
        Ok(())
    }
}

fn print_records(name: &str, records: &[BattleRecord]) {
    println!("{}", style(format!("=== {} ===", name)).bold().green());
    println!();
    if records.is_empty() {
        println!("{}", style("No battles were fought").dim());
        return;
    }
    for record in records {
        let winner = match record.outcome.who_won {
            WhoWon::Attacker => style(record.outcome.who_won.to_string()).green(),
            WhoWon::Defender => style(record.outcome.who_won.to_string()).red(),
            _ => style(record.outcome.who_won.to_string()).yellow(),
        };
        println!(
            "{} {} at {}: {} ({})",
            style(record.battle).cyan(),
            record.kind,
            record.site,
            winner,
            record.outcome.description
        );
        println!(
            "    rounds {}  attacker lost {}  defender lost {}",
            record.outcome.rounds,
            record.outcome.attacker_lost_value,
            record.outcome.defender_lost_value
        );
    }
}
