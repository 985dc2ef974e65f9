//! Serialize a job list as a JSON object keyed by job id, keeping order.

use std::fmt;

use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserializer, Serializer};

use super::model::Job;

pub(super) fn serialize<S: Serializer>(jobs: &[Job], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(jobs.len()))?;
    for job in jobs {
        map.serialize_entry(&job.id, job)?;
    }
    map.end()
}

pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Job>, D::Error> {
    deserializer.deserialize_option(OptionalJobs)
}

struct OptionalJobs;

impl<'de> Visitor<'de> for OptionalJobs {
    type Value = Vec<Job>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of job id to job, or null")
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(JobMap)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        JobMap.visit_map(map)
    }
}

struct JobMap;

impl<'de> Visitor<'de> for JobMap {
    type Value = Vec<Job>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of job id to job")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut jobs: Vec<Job> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, job)) = access.next_entry::<String, Job>()? {
            if key != job.id {
                return Err(A::Error::custom(format!(
                    "job key {key:?} does not match its id {:?}",
                    job.id
                )));
            }
            if jobs.iter().any(|j| j.id == key) {
                return Err(A::Error::custom(format!("duplicate job id {key:?}")));
            }
            jobs.push(job);
        }
        Ok(jobs)
    }
}
