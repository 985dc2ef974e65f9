//! Temp-file-then-rename writer.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use super::{PayloadSink, TEMP_SUFFIX};

/// Writes through a temp file in the destination directory and renames it
/// over the final path once synced.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileSink;

impl PayloadSink for AtomicFileSink {
    fn write(&self, dest: &Path, parts: &[&[u8]]) -> Result<u64> {
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".tabdl-")
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;

        let mut written = 0u64;
        for part in parts {
            tmp.write_all(part)
                .with_context(|| format!("failed to write temp file for {}", dest.display()))?;
            written += part.len() as u64;
        }
        tmp.as_file()
            .sync_all()
            .context("storage sync failed")?;

        tmp.persist(dest)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to rename temp file to {}", dest.display()))?;
        Ok(written)
    }
}
