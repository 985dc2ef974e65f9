//! `tabdl summary` – print the last run's summary file.

use anyhow::Result;
use std::path::Path;
use tabdl_core::scheduler;

pub fn run_summary(dir: &Path) -> Result<()> {
    let summary = scheduler::read_summary(dir)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
