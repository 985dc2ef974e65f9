//! Payload persistence.
//!
//! Every output file is written to a temp file in its destination directory,
//! synced, then renamed into place, so a crash never leaves a half-written
//! tab under its final name.

mod writer;

pub use writer::AtomicFileSink;

use anyhow::Result;
use std::path::Path;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Destination for downloaded payloads. The materializer only talks to this
/// trait; tests swap in sinks that misbehave.
pub trait PayloadSink: Send + Sync {
    /// Write `parts` back to back into `dest`, replacing any existing file.
    /// Returns the number of bytes written.
    fn write(&self, dest: &Path, parts: &[&[u8]]) -> Result<u64>;
}
