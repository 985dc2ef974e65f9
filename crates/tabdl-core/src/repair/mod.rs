//! Repair of Power Tab files saved under a non-`.ptb` extension.
//!
//! Older runs sniffed PWR payloads like Guitar Pro files and saved them as
//! `<title>_PWR_<id>.gp5` (or similar). This walks an output tree, renames
//! each such file to `.ptb` and fixes the `output_path` in the owning group
//! record. When the `.ptb` target already exists, nothing is touched unless
//! `destructive` is set: identical copies are deduplicated, differing ones are
//! both deleted so the next run fetches the file again.

mod digest;

pub use digest::{same_contents, sha256_path};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::catalog::{group_record_path, load_group, save_group};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOptions {
    /// Where the `band_<id>.json` records live; None = next to the output folders.
    pub records_dir: Option<PathBuf>,
    pub destructive: bool,
    /// Classify every file but change nothing.
    pub dry_run: bool,
}

/// What happened (or would happen) to one misnamed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    Renamed,
    RemovedDuplicate,
    DeletedBoth,
    ExistsSkip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub found: u64,
    pub renamed: u64,
    pub removed_duplicate: u64,
    pub deleted_both: u64,
    pub exists_skip: u64,
    pub errors: u64,
    pub records_updated: u64,
}

impl RepairReport {
    fn count(&mut self, action: RepairAction) {
        match action {
            RepairAction::Renamed => self.renamed += 1,
            RepairAction::RemovedDuplicate => self.removed_duplicate += 1,
            RepairAction::DeletedBoth => self.deleted_both += 1,
            RepairAction::ExistsSkip => self.exists_skip += 1,
        }
    }
}

/// `<name>_PWR_<digits>.<ext>` with `ext` anything but `ptb`: returns the tab id.
pub fn misnamed_pwr_id(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || ext.eq_ignore_ascii_case("ptb") {
        return None;
    }
    let at = stem.to_ascii_uppercase().rfind("_PWR_")?;
    let id = &stem[at + "_PWR_".len()..];
    let named = at > 0;
    (named && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id)
}

/// Group id encoded in an output folder name `<band name>_<digits>`.
fn folder_group_id(dir: &Path) -> Option<&str> {
    let name = dir.file_name()?.to_str()?;
    let (_, id) = name.rsplit_once('_')?;
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id)
}

fn collect_misnamed(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_misnamed(&path, out)?;
        } else if file_type.is_file()
            && entry.file_name().to_str().and_then(misnamed_pwr_id).is_some()
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Every misnamed PWR file under `dir`, sorted.
pub fn find_misnamed(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_misnamed(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn classify(old: &Path, target: &Path, destructive: bool) -> Result<RepairAction> {
    if !target.exists() {
        return Ok(RepairAction::Renamed);
    }
    if !destructive {
        return Ok(RepairAction::ExistsSkip);
    }
    Ok(if same_contents(old, target)? {
        RepairAction::RemovedDuplicate
    } else {
        RepairAction::DeletedBoth
    })
}

fn apply(old: &Path, target: &Path, action: RepairAction) -> Result<()> {
    match action {
        RepairAction::Renamed => std::fs::rename(old, target).with_context(|| {
            format!("rename {} to {}", old.display(), target.display())
        })?,
        RepairAction::RemovedDuplicate => {
            std::fs::remove_file(old).with_context(|| format!("remove {}", old.display()))?
        }
        RepairAction::DeletedBoth => {
            std::fs::remove_file(old).with_context(|| format!("remove {}", old.display()))?;
            std::fs::remove_file(target)
                .with_context(|| format!("remove {}", target.display()))?;
        }
        RepairAction::ExistsSkip => {}
    }
    Ok(())
}

/// Point the job's `output_path` at the repaired file, or clear it when both
/// copies were deleted. Returns whether the record changed.
fn update_record(records_dir: &Path, old: &Path, target: &Path, action: RepairAction) -> Result<bool> {
    let (Some(group_id), Some(tab_id)) = (
        old.parent().and_then(folder_group_id),
        old.file_name().and_then(|n| n.to_str()).and_then(misnamed_pwr_id),
    ) else {
        tracing::warn!(path = %old.display(), "cannot tell which record owns this file");
        return Ok(false);
    };
    let record = group_record_path(records_dir, group_id);
    if !record.is_file() {
        tracing::warn!(record = %record.display(), "group record not found");
        return Ok(false);
    }
    let mut group = load_group(&record)?;
    let Some(job) = group.get_mut(tab_id) else {
        return Ok(false);
    };
    let Some(stored) = job.output_path.clone() else {
        return Ok(false);
    };
    if stored.file_name() != old.file_name() {
        return Ok(false);
    }
    job.output_path = match action {
        RepairAction::DeletedBoth => None,
        RepairAction::Renamed | RepairAction::RemovedDuplicate => match target.file_name() {
            Some(name) => Some(stored.with_file_name(name)),
            None => return Ok(false),
        },
        RepairAction::ExistsSkip => return Ok(false),
    };
    save_group(&record, &group)?;
    tracing::info!(record = %record.display(), tab = tab_id, "updated output path");
    Ok(true)
}

/// Repair every misnamed PWR file under `dir`. Per-file problems are logged
/// and counted in `errors`; only an unreadable `dir` fails the whole call.
pub fn repair_pwr_extensions(dir: &Path, opts: &RepairOptions) -> Result<RepairReport> {
    let records_dir = opts.records_dir.as_deref().unwrap_or(dir);
    let files = find_misnamed(dir)?;
    let mut report = RepairReport {
        found: files.len() as u64,
        ..RepairReport::default()
    };

    for old in &files {
        let target = old.with_extension("ptb");
        let action = match classify(old, &target, opts.destructive) {
            Ok(a) => a,
            Err(e) => {
                report.errors += 1;
                tracing::warn!(path = %old.display(), "{:#}", e);
                continue;
            }
        };
        if opts.dry_run {
            tracing::info!(path = %old.display(), ?action, "dry run");
            report.count(action);
            continue;
        }
        if let Err(e) = apply(old, &target, action) {
            report.errors += 1;
            tracing::warn!(path = %old.display(), "{:#}", e);
            continue;
        }
        tracing::info!(path = %old.display(), ?action, "repaired");
        report.count(action);
        match update_record(records_dir, old, &target, action) {
            Ok(true) => report.records_updated += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(path = %old.display(), "record update failed: {:#}", e),
        }
    }
    Ok(report)
}
