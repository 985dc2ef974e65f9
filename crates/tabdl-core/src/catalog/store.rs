//! One JSON record per group: `<dir>/band_<id>.json`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::model::JobGroup;
use crate::storage::{AtomicFileSink, PayloadSink};

const RECORD_PREFIX: &str = "band_";
const RECORD_SUFFIX: &str = ".json";

/// A stored group record, identified without parsing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: String,
    pub path: PathBuf,
}

/// Record path for a group id.
pub fn group_record_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{RECORD_PREFIX}{id}{RECORD_SUFFIX}"))
}

/// Group id encoded in a record file name, if it is one.
pub fn group_id_from_record_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.strip_prefix(RECORD_PREFIX)?.strip_suffix(RECORD_SUFFIX)?;
    (!id.is_empty()).then(|| id.to_string())
}

/// All group records in `dir`, sorted by file name so runs are deterministic.
pub fn list_group_records(dir: &Path) -> Result<Vec<GroupRef>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read record dir {}", dir.display()))?;
    let mut refs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read record dir {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(id) = group_id_from_record_path(&path) {
            refs.push(GroupRef { id, path });
        }
    }
    refs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(refs)
}

/// Read and parse one group record.
pub fn load_group(path: &Path) -> Result<JobGroup> {
    let data = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let group: JobGroup =
        serde_json::from_slice(&data).with_context(|| format!("parse {}", path.display()))?;
    if let Some(file_id) = group_id_from_record_path(path) {
        if file_id != group.id {
            tracing::warn!(
                path = %path.display(),
                stored_id = %group.id,
                "record file name does not match stored group id"
            );
        }
    }
    Ok(group)
}

/// Write a group record atomically through [`AtomicFileSink`].
pub fn save_group(path: &Path, group: &JobGroup) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let json = serde_json::to_vec_pretty(group)
        .with_context(|| format!("serialize group {}", group.id))?;
    AtomicFileSink.write(path, &[json.as_slice(), &b"\n"[..]])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Job, TabType};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn record_path_and_id_roundtrip() {
        let p = group_record_path(Path::new("/data"), "123");
        assert_eq!(p, PathBuf::from("/data/band_123.json"));
        assert_eq!(group_id_from_record_path(&p).as_deref(), Some("123"));
        assert_eq!(group_id_from_record_path(Path::new("/data/bands_summary.json")), None);
        assert_eq!(group_id_from_record_path(Path::new("/data/band_.json")), None);
    }

    #[test]
    fn save_then_load_keeps_job_order_and_fields() {
        let dir = tempdir().unwrap();
        let mut g = JobGroup::new("7", "Zebra", "https://example.com/artist/7");
        for id in ["30", "10", "20"] {
            g.add_job(Job::new(id, format!("Song {id}"), "PRO", format!("https://x/{id}")));
        }
        let job = g.get_mut("10").unwrap();
        job.output_path = Some(PathBuf::from("/out/Zebra_7/Song 10_PRO_10.gp5"));
        job.metadata = Some(BTreeMap::from([("Tuning".to_string(), "E A D G B E".to_string())]));

        let path = group_record_path(dir.path(), &g.id);
        save_group(&path, &g).unwrap();
        let loaded = load_group(&path).unwrap();
        assert_eq!(loaded, g);
        let ids: Vec<_> = loaded.jobs().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["30", "10", "20"]);
    }

    #[test]
    fn save_creates_dir_and_replaces_record_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = group_record_path(&dir.path().join("records"), "4");
        let mut g = JobGroup::new("4", "Queen", "https://example.com/artist/4");
        save_group(&path, &g).unwrap();
        g.add_job(Job::new("1", "Song", "TAB", "https://x/1"));
        save_group(&path, &g).unwrap();

        assert_eq!(load_group(&path).unwrap(), g);
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["band_4.json"]);
    }

    #[test]
    fn loads_legacy_record_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("band_5.json");
        fs::write(
            &path,
            r#"{
              "id": 5,
              "name": "Legacy",
              "url": "https://example.com/artist/5",
              "tabs": {
                "99": {"id": "99", "title": "Old", "type": "Pwr", "url": "https://x/99",
                       "file_path": "/out/Legacy_5/Old_Pwr_99.ptb", "metadata": {}},
                "98": {"id": 98, "title": "Older", "type": "Harmonica", "url": "https://x/98",
                       "file_path": null}
              }
            }"#,
        )
        .unwrap();
        let g = load_group(&path).unwrap();
        assert_eq!(g.id, "5");
        assert_eq!(g.len(), 2);
        let first = &g.jobs()[0];
        assert_eq!(first.kind, TabType::Pwr);
        assert_eq!(
            first.output_path.as_deref(),
            Some(Path::new("/out/Legacy_5/Old_Pwr_99.ptb"))
        );
        let second = &g.jobs()[1];
        assert_eq!(second.id, "98");
        assert_eq!(second.kind, TabType::Unknown("Harmonica".to_string()));
        assert!(second.output_path.is_none());
    }

    #[test]
    fn missing_or_null_tabs_is_empty_group() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("band_1.json");
        fs::write(&a, r#"{"id": "1", "name": "A", "url": "u"}"#).unwrap();
        assert!(load_group(&a).unwrap().is_empty());
        let b = dir.path().join("band_2.json");
        fs::write(&b, r#"{"id": "2", "name": "B", "url": "u", "tabs": null}"#).unwrap();
        assert!(load_group(&b).unwrap().is_empty());
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("band_3.json");
        fs::write(&p, "{ not json").unwrap();
        assert!(load_group(&p).is_err());
    }

    #[test]
    fn list_is_sorted_and_ignores_other_files() {
        let dir = tempdir().unwrap();
        for name in ["band_2.json", "band_10.json", "bands_summary.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("band_9.json")).unwrap();
        let refs = list_group_records(dir.path()).unwrap();
        let ids: Vec<_> = refs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["10", "2"]);
    }
}
