//! Clean save data and logs
//!
//! Removes whole session directories from the data and log roots. Prompts
//! before deleting unless `--yes` is given.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::dirs;

/// Clean save data and logs
#[derive(Parser, Debug)]
pub struct Clean {
    /// Clean only logs
    #[arg(long)]
    pub logs: bool,

    /// Clean only saved snapshots
    #[arg(long)]
    pub data: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Only this session
    #[arg(long)]
    pub session: Option<String>,

    /// Keep the newest N sessions
    #[arg(long, value_name = "N", conflicts_with = "session")]
    pub keep: Option<usize>,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        let clean_logs = self.logs || !self.data;
        let clean_data = self.data || !self.logs;

        let mut targets = Vec::new();
        if clean_logs {
            targets.extend(self.targets("logs", dirs::log_dir()?)?);
        }
        if clean_data {
            targets.extend(self.targets("data", dirs::data_dir()?)?);
        }

        if targets.is_empty() {
            println!("{}", style("Nothing to clean").dim());
            return Ok(());
        }

        println!("{}", style("Clean battle data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        for (label, path) in &targets {
            println!("  {} {}", style("→").cyan(), style(label).bold());
            println!("    {}", style(path.display()).dim());
        }
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for (label, path) in targets {
            print!("Deleting {}... ", label);
            io::stdout().flush()?;

            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to delete: {}", path.display()))?;

            println!("{}", style("✓").green());
        }

        println!();
        println!("{}", style("✓ Cleanup complete!").green().bold());

        Ok(())
    }

    /// Session directories of `root` selected by `--session` and `--keep`.
    fn targets(&self, kind: &str, root: PathBuf) -> Result<Vec<(String, PathBuf)>> {
        let sessions = dirs::list_sessions(&root)?;
        let selected = match (&self.session, self.keep) {
            (Some(session), _) => sessions
                .into_iter()
                .filter(|(id, _)| id == session)
                .collect(),
            (None, Some(keep)) => sessions.into_iter().skip(keep).collect(),
            (None, None) => sessions,
        };
        Ok(selected
            .into_iter()
            .map(|(id, path)| (format!("{} {}", kind, id), path))
            .collect())
    }
}

fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
