//! `tabdl repair-extensions` – fix Power Tab files saved with a wrong extension.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tabdl_core::repair::{self, RepairOptions};

pub async fn run_repair(
    dir: &Path,
    records_dir: Option<PathBuf>,
    destructive: bool,
    dry_run: bool,
) -> Result<()> {
    let opts = RepairOptions {
        records_dir,
        destructive,
        dry_run,
    };
    let dir = dir.to_path_buf();
    let report =
        tokio::task::spawn_blocking(move || repair::repair_pwr_extensions(&dir, &opts)).await??;

    if report.found == 0 {
        println!("No PWR files with incorrect extensions found.");
        return Ok(());
    }
    let verb = if dry_run { "Would be" } else { "Files" };
    println!("Found {} misnamed PWR file(s)", report.found);
    println!("  {} renamed: {}", verb, report.renamed);
    println!("  Duplicates removed: {}", report.removed_duplicate);
    println!("  Both copies deleted: {}", report.deleted_both);
    println!("  Skipped (target exists): {}", report.exists_skip);
    println!("  Errors: {}", report.errors);
    if !dry_run {
        println!("  Records updated: {}", report.records_updated);
    }
    if report.exists_skip > 0 && !destructive {
        println!("Use --destructive to compare and resolve files whose .ptb target already exists.");
    }
    Ok(())
}
