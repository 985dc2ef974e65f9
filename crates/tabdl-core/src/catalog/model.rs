use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of tab. Unknown tags are kept verbatim so records round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TabType {
    /// Guitar Pro file (binary, several competing formats).
    Pro,
    /// Power Tab file (binary, always `.ptb`).
    Pwr,
    Tab,
    Crd,
    Bass,
    Drums,
    Ukulele,
    Video,
    Official,
    Unknown(String),
}

impl TabType {
    pub fn as_str(&self) -> &str {
        match self {
            TabType::Pro => "PRO",
            TabType::Pwr => "PWR",
            TabType::Tab => "TAB",
            TabType::Crd => "CRD",
            TabType::Bass => "BASS",
            TabType::Drums => "DRUMS",
            TabType::Ukulele => "UKULELE",
            TabType::Video => "VID",
            TabType::Official => "OFFICIAL",
            TabType::Unknown(raw) => raw,
        }
    }

    /// True for types delivered as a binary file rather than page text.
    pub fn is_binary(&self) -> bool {
        matches!(self, TabType::Pro | TabType::Pwr)
    }

    /// Types that are never downloadable (site-only content).
    pub fn is_always_skipped(&self) -> bool {
        matches!(self, TabType::Video | TabType::Official)
    }

    /// Extensions (lowercase, with dot) a materialized file of this type may have.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            TabType::Pro => &[".gp3", ".gp4", ".gp5", ".gp6", ".gp7", ".gp", ".gpx", ".tg"],
            TabType::Pwr => &[".ptb"],
            _ => &[".txt"],
        }
    }
}

impl From<String> for TabType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PRO" => TabType::Pro,
            "PWR" => TabType::Pwr,
            "TAB" => TabType::Tab,
            "CRD" | "CHORDS" => TabType::Crd,
            "BASS" => TabType::Bass,
            "DRUMS" => TabType::Drums,
            "UKULELE" | "UKE" => TabType::Ukulele,
            "VID" | "VIDEO" => TabType::Video,
            "OFFICIAL" => TabType::Official,
            _ => TabType::Unknown(raw),
        }
    }
}

impl From<&str> for TabType {
    fn from(raw: &str) -> Self {
        TabType::from(raw.to_string())
    }
}

impl From<TabType> for String {
    fn from(t: TabType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids are strings, but older records may carry them as JSON numbers.
fn id_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// One remote item to fetch and materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TabType,
    #[serde(rename = "url")]
    pub source_url: String,
    /// Set only after a successful materialization.
    #[serde(
        default,
        alias = "file_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: impl Into<TabType>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: kind.into(),
            source_url: source_url.into(),
            output_path: None,
            metadata: None,
        }
    }
}

/// A band and its tabs, in the order they were discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobGroup {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "tabs", default, with = "super::ordered")]
    jobs: Vec<Job>,
}

impl JobGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            jobs: Vec::new(),
        }
    }

    /// Insert a job, replacing an existing job with the same id in place.
    pub fn add_job(&mut self, job: Job) {
        match self.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(slot) => *slot = job,
            None => self.jobs.push(job),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut [Job] {
        &mut self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Folder name for this band's files: `<sanitized name>_<id>`.
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}",
            crate::naming::sanitize_component(&self.name, "unknown_band"),
            self.id
        )
    }
}
