//! Output extension resolution for downloaded payloads.
//!
//! The same download endpoint serves several competing binary formats and
//! only weak, inconsistently present hints tell them apart. Hints are tried
//! in a fixed order and the first usable one wins:
//!
//! 1. type with a single legal format (PWR, text types)
//! 2. Content-Disposition filename
//! 3. final URL path
//! 4. Content-Type keywords
//! 5. magic-byte signature
//! 6. default for the binary family

mod signature;

pub use signature::sniff;

use crate::catalog::TabType;
use crate::naming::{content_disposition_filename, extension_of, url_path_extension};
use crate::source::ResponseHeaders;

/// Extension for binary tabs when nothing else matches.
pub const DEFAULT_BINARY_EXTENSION: &str = ".gp5";
/// Extension for tabs delivered as page text.
pub const TEXT_EXTENSION: &str = ".txt";

/// Extensions a binary tab may legitimately end up with.
const BINARY_FAMILY: &[&str] = &[
    ".gp3", ".gp4", ".gp5", ".gp6", ".gp7", ".gp", ".gpx", ".tg", ".ptb",
];

/// Content-Type keyword families, most specific first.
const CONTENT_TYPE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["powertab", "ptb"], ".ptb"),
    (&["tuxguitar"], ".tg"),
    (&["guitar-pro", "guitarpro", "x-gp"], ".gp5"),
];

/// Which hint produced the extension; logged for diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    FixedType,
    ContentDisposition,
    UrlPath,
    ContentType,
    Signature,
    Fallback,
}

/// Everything known about one payload.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    pub kind: &'a TabType,
    pub body: &'a [u8],
    pub headers: Option<&'a ResponseHeaders>,
    pub final_url: Option<&'a str>,
}

fn in_binary_family(ext: &str) -> bool {
    BINARY_FAMILY.contains(&ext)
}

fn from_content_type(content_type: &str) -> Option<&'static str> {
    let ct = content_type.to_ascii_lowercase();
    CONTENT_TYPE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| ct.contains(k)))
        .map(|(_, ext)| *ext)
}

/// Resolve the extension (lowercase, with dot) and the hint it came from.
pub fn resolve_with_basis(payload: &Payload<'_>) -> (String, Basis) {
    match payload.kind {
        TabType::Pwr => return (".ptb".to_string(), Basis::FixedType),
        kind if !kind.is_binary() => return (TEXT_EXTENSION.to_string(), Basis::FixedType),
        _ => {}
    }

    if let Some(ext) = payload
        .headers
        .and_then(ResponseHeaders::content_disposition)
        .and_then(content_disposition_filename)
        .and_then(|name| extension_of(&name))
        .filter(|e| in_binary_family(e))
    {
        return (ext, Basis::ContentDisposition);
    }

    if let Some(ext) = payload
        .final_url
        .and_then(url_path_extension)
        .filter(|e| in_binary_family(e))
    {
        return (ext, Basis::UrlPath);
    }

    if let Some(ext) = payload
        .headers
        .and_then(ResponseHeaders::content_type)
        .and_then(from_content_type)
    {
        return (ext.to_string(), Basis::ContentType);
    }

    if let Some(ext) = sniff(payload.body) {
        return (ext.to_string(), Basis::Signature);
    }

    (DEFAULT_BINARY_EXTENSION.to_string(), Basis::Fallback)
}

/// Resolve the most probable extension for a payload.
pub fn resolve_extension(payload: &Payload<'_>) -> String {
    resolve_with_basis(payload).0
}
