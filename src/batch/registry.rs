use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::api::StatusSnapshot;

use super::job::{JobEvent, JobRecord, JobState};

/// In-memory map of job id to [`JobRecord`] for one batch run.
///
/// Owns all mutable job state. Records only ever exist for ids returned by a
/// successful submission; snapshots for any other id are ignored, since the
/// check endpoint may report account-wide jobs.
#[derive(Debug, Default)]
pub struct BatchRegistry {
    jobs: BTreeMap<String, JobRecord>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `Pending` record for a freshly submitted job.
    pub fn seed(&mut self, job_id: String, source_path: PathBuf, submitted_at: DateTime<Utc>) {
        self.jobs.insert(
            job_id.clone(),
            JobRecord::new(job_id, source_path, submitted_at),
        );
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    /// Jobs in a given state, in deterministic (id) order.
    pub fn in_state(&self, state: JobState) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values().filter(move |job| job.state == state)
    }

    /// Ids still awaiting a terminal state, the set each poll tick queries.
    pub fn outstanding_ids(&self) -> Vec<String> {
        self.jobs
            .values()
            .filter(|job| !job.state.is_terminal())
            .map(|job| job.job_id.clone())
            .collect()
    }

    /// The batch is drained iff every record is terminal. Sole stop condition
    /// for the polling loop.
    pub fn is_drained(&self) -> bool {
        self.jobs.values().all(|job| job.state.is_terminal())
    }

    /// Apply one canonical status snapshot to the matching record.
    ///
    /// Unknown ids and already-terminal records yield [`JobEvent::Ignored`];
    /// repeating an unchanged snapshot mutates nothing beyond refreshed
    /// progress.
    pub fn apply(&mut self, job_id: &str, snapshot: StatusSnapshot, now: DateTime<Utc>) -> JobEvent {
        let Some(record) = self.jobs.get_mut(job_id) else {
            return JobEvent::Ignored;
        };
        match snapshot {
            StatusSnapshot::Progress { progress } => record.observe_progress(progress),
            StatusSnapshot::Succeeded {
                tracks,
                duration_secs,
            } => record.complete_success(tracks, duration_secs, now),
            StatusSnapshot::Failed { detail } => record.complete_failure(detail, now),
        }
    }

    /// Move every non-terminal record into `TimedOut`, returning how many
    /// records were affected. Used when a caller-imposed deadline expires.
    pub fn mark_timed_out(&mut self, now: DateTime<Utc>) -> usize {
        let mut affected = 0;
        for record in self.jobs.values_mut() {
            if record.time_out(now) != JobEvent::Ignored {
                affected += 1;
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TrackKind;
    use std::collections::BTreeMap as Map;

    fn seeded(ids: &[&str]) -> BatchRegistry {
        let mut registry = BatchRegistry::new();
        for id in ids {
            registry.seed((*id).into(), format!("{id}.mp3").into(), Utc::now());
        }
        registry
    }

    fn success_snapshot() -> StatusSnapshot {
        let mut tracks = Map::new();
        tracks.insert(TrackKind::StemTrack, "https://cdn/stem".into());
        tracks.insert(TrackKind::BackTrack, "https://cdn/back".into());
        StatusSnapshot::Succeeded {
            tracks,
            duration_secs: 90.0,
        }
    }

    #[test]
    fn empty_registry_is_drained() {
        assert!(BatchRegistry::new().is_drained());
    }

    #[test]
    fn seeded_registry_is_not_drained() {
        let registry = seeded(&["a", "b"]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_drained());
        assert_eq!(registry.outstanding_ids(), vec!["a", "b"]);
    }

    #[test]
    fn snapshot_for_unknown_id_is_ignored() {
        // The check endpoint may be account-wide; foreign jobs never create
        // records here.
        let mut registry = seeded(&["a"]);
        let event = registry.apply("someone-elses-job", success_snapshot(), Utc::now());
        assert_eq!(event, JobEvent::Ignored);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("someone-elses-job").is_none());
    }

    #[test]
    fn terminal_jobs_leave_the_outstanding_set() {
        let mut registry = seeded(&["a", "b"]);
        registry.apply("a", success_snapshot(), Utc::now());
        assert_eq!(registry.outstanding_ids(), vec!["b"]);
        assert!(!registry.is_drained());

        registry.apply(
            "b",
            StatusSnapshot::Failed {
                detail: "processing error".into(),
            },
            Utc::now(),
        );
        assert!(registry.is_drained());
        assert!(registry.outstanding_ids().is_empty());
    }

    #[test]
    fn reapplying_an_unchanged_snapshot_mutates_nothing() {
        let mut registry = seeded(&["a"]);
        registry.apply("a", StatusSnapshot::Progress { progress: 55 }, Utc::now());
        let before = registry.get("a").unwrap().clone();

        let event = registry.apply("a", StatusSnapshot::Progress { progress: 55 }, Utc::now());
        assert_eq!(event, JobEvent::Progressed { progress: 55 });

        let after = registry.get("a").unwrap();
        assert_eq!(after.state, before.state);
        assert_eq!(after.progress, before.progress);
        assert_eq!(after.completed_at, before.completed_at);
    }

    #[test]
    fn success_after_success_does_not_transition_twice() {
        let mut registry = seeded(&["a"]);
        let first = registry.apply("a", success_snapshot(), Utc::now());
        assert_eq!(first, JobEvent::Succeeded);
        let completed_at = registry.get("a").unwrap().completed_at;

        let second = registry.apply("a", success_snapshot(), Utc::now());
        assert_eq!(second, JobEvent::Ignored);
        assert_eq!(registry.get("a").unwrap().completed_at, completed_at);
    }

    #[test]
    fn mark_timed_out_only_touches_non_terminal_records() {
        let mut registry = seeded(&["a", "b", "c"]);
        registry.apply("a", success_snapshot(), Utc::now());
        registry.apply("b", StatusSnapshot::Progress { progress: 10 }, Utc::now());

        let affected = registry.mark_timed_out(Utc::now());
        assert_eq!(affected, 2);
        assert_eq!(registry.get("a").unwrap().state, JobState::Succeeded);
        assert_eq!(registry.get("b").unwrap().state, JobState::TimedOut);
        assert_eq!(registry.get("c").unwrap().state, JobState::TimedOut);
        assert!(registry.is_drained());
    }
}
