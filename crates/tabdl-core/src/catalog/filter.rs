//! Which groups and jobs a run processes.

use super::model::{Job, JobGroup, TabType};

/// Band letter categories in catalog order.
pub const LETTER_CATEGORIES: [&str; 27] = [
    "0-9", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q",
    "r", "s", "t", "u", "v", "w", "x", "y", "z",
];

/// Letter category of a band name: its lowercase first letter if that is
/// `a`..=`z`, otherwise `0-9` (digits, symbols, non-Latin letters, empty).
pub fn letter_category(name: &str) -> &'static str {
    let first = name.trim().chars().next().map(|c| c.to_ascii_lowercase());
    match first {
        Some(c @ 'a'..='z') => LETTER_CATEGORIES[(c as u8 - b'a') as usize + 1],
        _ => LETTER_CATEGORIES[0],
    }
}

fn category_index(letter: &str) -> Option<usize> {
    let letter = letter.trim().to_ascii_lowercase();
    LETTER_CATEGORIES.iter().position(|c| *c == letter)
}

/// Selection rules applied when turning stored records into work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    /// Upper-cased allowed type tags; None = every downloadable type.
    pub allowed_types: Option<Vec<String>>,
    pub max_jobs_per_group: Option<usize>,
    pub starting_letter: Option<String>,
    pub end_letter: Option<String>,
}

impl JobFilter {
    /// True when the band's letter category falls inside the configured range.
    /// Unknown letters fall back to the full range on that side.
    pub fn accepts_group(&self, group: &JobGroup) -> bool {
        if self.starting_letter.is_none() && self.end_letter.is_none() {
            return true;
        }
        let start = self
            .starting_letter
            .as_deref()
            .and_then(category_index)
            .unwrap_or(0);
        let end = self
            .end_letter
            .as_deref()
            .and_then(category_index)
            .unwrap_or(LETTER_CATEGORIES.len() - 1);
        category_index(letter_category(&group.name)).is_some_and(|i| i >= start && i <= end)
    }

    pub fn accepts_type(&self, kind: &TabType) -> bool {
        if kind.is_always_skipped() {
            return false;
        }
        match &self.allowed_types {
            None => true,
            Some(allowed) => allowed
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(kind.as_str())),
        }
    }

    /// Ids of the jobs to process, in discovery order. The per-group cap
    /// applies to the stored order before the type filter, like the catalog
    /// listing it came from.
    pub fn select<'a>(&self, group: &'a JobGroup) -> Vec<&'a Job> {
        let cap = self.max_jobs_per_group.unwrap_or(usize::MAX);
        group
            .jobs()
            .iter()
            .take(cap)
            .filter(|j| self.accepts_type(&j.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> JobGroup {
        let mut g = JobGroup::new("1", name, "u");
        g.add_job(Job::new("1", "a", "TAB", "u"));
        g.add_job(Job::new("2", "b", "OFFICIAL", "u"));
        g.add_job(Job::new("3", "c", "PRO", "u"));
        g.add_job(Job::new("4", "d", "VID", "u"));
        g.add_job(Job::new("5", "e", "CRD", "u"));
        g
    }

    #[test]
    fn letter_category_maps_non_latin_to_digits() {
        assert_eq!(letter_category("Metallica"), "m");
        assert_eq!(letter_category("  abba"), "a");
        assert_eq!(letter_category("311"), "0-9");
        assert_eq!(letter_category("!!!"), "0-9");
        assert_eq!(letter_category("Ärzte"), "0-9");
        assert_eq!(letter_category(""), "0-9");
    }

    #[test]
    fn letter_range_is_inclusive() {
        let f = JobFilter {
            starting_letter: Some("b".into()),
            end_letter: Some("d".into()),
            ..JobFilter::default()
        };
        assert!(!f.accepts_group(&group("Abba")));
        assert!(f.accepts_group(&group("Beatles")));
        assert!(f.accepts_group(&group("Doors")));
        assert!(!f.accepts_group(&group("Eagles")));
        assert!(!f.accepts_group(&group("311")));
    }

    #[test]
    fn official_and_video_always_skipped() {
        let f = JobFilter::default();
        let g = group("x");
        let ids: Vec<_> = f.select(&g).iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["1", "3", "5"]);
    }

    #[test]
    fn allowed_types_and_cap() {
        let f = JobFilter {
            allowed_types: Some(vec!["crd".into(), "TAB".into()]),
            max_jobs_per_group: Some(3),
            ..JobFilter::default()
        };
        let g = group("x");
        let ids: Vec<_> = f.select(&g).iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["1"]);
    }
}
