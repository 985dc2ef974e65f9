//! CLI command handlers, one file per command.

mod download;
mod repair;
mod summary;

pub use download::run_download;
pub use repair::run_repair;
pub use summary::run_summary;
