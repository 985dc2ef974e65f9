//! File naming: job base names, filename hints from headers and URLs.
//!
//! Everything here is pure string handling; no filesystem access.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::content_disposition_filename;
pub use path::{extension_of, url_path_extension};
pub use sanitize::sanitize_component;

use crate::catalog::Job;

/// Deterministic base name (no extension) for a job's output file:
/// `<title>_<type>_<id>`, each part sanitized.
pub fn job_base_name(job: &Job) -> String {
    format!(
        "{}_{}_{}",
        sanitize_component(&job.title, "untitled"),
        sanitize_component(job.kind.as_str(), "untitled"),
        sanitize_component(&job.id, "untitled"),
    )
}
