//! CLI for the tabdl catalog downloader.

mod args;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabdl_core::config;

pub use args::DownloadArgs;
use commands::{run_download, run_repair, run_summary};

/// Top-level CLI for tabdl.
#[derive(Debug, Parser)]
#[command(name = "tabdl")]
#[command(about = "tabdl: paced, multi-worker tablature catalog downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every tab listed in the stored band records.
    Download(DownloadArgs),

    /// Rename Power Tab files saved with a wrong extension to `.ptb`.
    RepairExtensions {
        /// Output directory to scan (recursively).
        dir: PathBuf,

        /// Directory with the band_<id>.json records (default: DIR).
        #[arg(long, value_name = "DIR")]
        records_dir: Option<PathBuf>,

        /// When the `.ptb` target exists: drop identical duplicates, delete both if they differ.
        #[arg(long)]
        destructive: bool,

        /// Report what would happen without touching any file.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the summary of the last download run in DIR.
    Summary {
        /// Output directory of the run.
        #[arg(default_value = "tabs")]
        dir: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Download(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_download(cfg, &args).await?;
            }
            CliCommand::RepairExtensions {
                dir,
                records_dir,
                destructive,
                dry_run,
            } => run_repair(&dir, records_dir, destructive, dry_run).await?,
            CliCommand::Summary { dir } => run_summary(&dir)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
