//! Discovery and pruning of files a previous run left for a job.

use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::TabType;
use crate::naming::extension_of;

/// Files in `dir` named `<base>.<anything>`, sorted by file name.
/// A missing directory has no existing files.
pub fn find_existing(dir: &Path, base: &str) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let matches = name
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|ext| !ext.is_empty());
        if matches {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn has_allowed_extension(path: &Path, kind: &TabType) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(extension_of)
        .is_some_and(|ext| kind.allowed_extensions().contains(&ext.as_str()))
}

fn remove(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed ambiguous duplicate");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not remove duplicate: {}", e);
            false
        }
    }
}

/// Reduce several candidates for one job to at most one. Files whose
/// extension is not legal for `kind` are deleted first, then every survivor
/// but the first by name. Returns the file to treat as existing.
pub fn prune_duplicates(candidates: Vec<PathBuf>, kind: &TabType) -> Option<PathBuf> {
    let mut kept = Vec::with_capacity(candidates.len());
    for path in candidates {
        if has_allowed_extension(&path, kind) || !remove(&path) {
            kept.push(path);
        }
    }
    let mut kept = kept.into_iter();
    let first = kept.next();
    for extra in kept {
        remove(&extra);
    }
    first
}
