use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::api::TrackKind;

/// Lifecycle state of one submitted job.
///
/// Transitions form a subsequence of
/// `Pending → InProgress → {Succeeded, Failed}`; `TimedOut` is the distinct
/// outcome applied by a caller-imposed deadline. Terminal states admit no
/// further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::InProgress => write!(f, "in progress"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed => write!(f, "failed"),
            JobState::TimedOut => write!(f, "timed out"),
        }
    }
}

/// What applying a status snapshot to a record actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// Nothing changed: unknown job id, or the record is already terminal.
    Ignored,
    /// First non-terminal observation moved the record out of `Pending`.
    Started { progress: u8 },
    /// The record was already running; its progress was refreshed.
    Progressed { progress: u8 },
    Succeeded,
    Failed { detail: String },
}

/// One tracked job: all mutable state the batch owns for a submitted input.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Identifier issued by the service at submission time.
    pub job_id: String,
    /// Local input the job was created from.
    pub source_path: PathBuf,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    /// Set exactly once, on the first observed terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Latest reported percentage; the service may re-queue, so regressions
    /// are reported as-is rather than rejected.
    pub progress: u8,
    /// Artifact locators, populated only on success.
    pub result_refs: BTreeMap<TrackKind, String>,
    /// Populated only on failure or timeout.
    pub error_detail: Option<String>,
    /// Media duration in seconds as reported by the service, for throughput
    /// metrics. Zero until the job succeeds.
    pub source_duration_secs: f64,
}

impl JobRecord {
    pub fn new(job_id: String, source_path: PathBuf, submitted_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            source_path,
            state: JobState::Pending,
            submitted_at,
            completed_at: None,
            progress: 0,
            result_refs: BTreeMap::new(),
            error_detail: None,
            source_duration_secs: 0.0,
        }
    }

    /// Record a progress observation. `Pending` records start on the first
    /// observation; terminal records are left untouched.
    pub fn observe_progress(&mut self, progress: u8) -> JobEvent {
        match self.state {
            JobState::Pending => {
                self.state = JobState::InProgress;
                self.progress = progress;
                JobEvent::Started { progress }
            }
            JobState::InProgress => {
                self.progress = progress;
                JobEvent::Progressed { progress }
            }
            _ => JobEvent::Ignored,
        }
    }

    /// Transition into `Succeeded`, valid only with a fully populated set of
    /// artifact locators and only from a non-terminal state.
    pub fn complete_success(
        &mut self,
        tracks: BTreeMap<TrackKind, String>,
        duration_secs: f64,
        now: DateTime<Utc>,
    ) -> JobEvent {
        if self.state.is_terminal() {
            return JobEvent::Ignored;
        }
        self.state = JobState::Succeeded;
        self.progress = 100;
        self.result_refs = tracks;
        self.source_duration_secs = duration_secs;
        self.completed_at = Some(now);
        JobEvent::Succeeded
    }

    /// Transition into `Failed`; the detail is mandatory.
    pub fn complete_failure(&mut self, detail: String, now: DateTime<Utc>) -> JobEvent {
        if self.state.is_terminal() {
            return JobEvent::Ignored;
        }
        self.state = JobState::Failed;
        self.error_detail = Some(detail.clone());
        self.completed_at = Some(now);
        JobEvent::Failed { detail }
    }

    /// Transition into `TimedOut`. Distinct from `Failed`: the service never
    /// reported a terminal state, the caller's deadline expired.
    pub fn time_out(&mut self, now: DateTime<Utc>) -> JobEvent {
        if self.state.is_terminal() {
            return JobEvent::Ignored;
        }
        self.state = JobState::TimedOut;
        self.error_detail = Some("deadline expired before the job finished".into());
        self.completed_at = Some(now);
        JobEvent::Failed {
            detail: "deadline expired before the job finished".into(),
        }
    }

    /// Wall time from submission to completion, in seconds.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.completed_at
            .map(|done| (done - self.submitted_at).num_milliseconds() as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new("job-1".into(), "song.mp3".into(), Utc::now())
    }

    fn tracks() -> BTreeMap<TrackKind, String> {
        let mut map = BTreeMap::new();
        map.insert(TrackKind::StemTrack, "https://cdn/stem".into());
        map.insert(TrackKind::BackTrack, "https://cdn/back".into());
        map
    }

    #[test]
    fn new_record_is_pending() {
        let r = record();
        assert_eq!(r.state, JobState::Pending);
        assert_eq!(r.progress, 0);
        assert!(r.completed_at.is_none());
        assert!(r.result_refs.is_empty());
        assert!(r.error_detail.is_none());
    }

    #[test]
    fn first_progress_observation_starts_the_job() {
        let mut r = record();
        assert_eq!(r.observe_progress(0), JobEvent::Started { progress: 0 });
        assert_eq!(r.state, JobState::InProgress);

        assert_eq!(r.observe_progress(40), JobEvent::Progressed { progress: 40 });
        assert_eq!(r.progress, 40);
    }

    #[test]
    fn progress_regression_is_reported_as_is() {
        let mut r = record();
        r.observe_progress(60);
        r.observe_progress(20);
        assert_eq!(r.progress, 20);
    }

    #[test]
    fn success_populates_refs_and_completion_time() {
        let mut r = record();
        r.observe_progress(50);
        let now = Utc::now();
        assert_eq!(r.complete_success(tracks(), 120.0, now), JobEvent::Succeeded);
        assert_eq!(r.state, JobState::Succeeded);
        assert_eq!(r.completed_at, Some(now));
        assert_eq!(r.result_refs.len(), 2);
        assert_eq!(r.source_duration_secs, 120.0);
    }

    #[test]
    fn failure_requires_and_keeps_detail() {
        let mut r = record();
        let ev = r.complete_failure("processing error".into(), Utc::now());
        assert_eq!(
            ev,
            JobEvent::Failed {
                detail: "processing error".into()
            }
        );
        assert_eq!(r.error_detail.as_deref(), Some("processing error"));
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut r = record();
        let first_completion = Utc::now();
        r.complete_success(tracks(), 60.0, first_completion);

        assert_eq!(r.observe_progress(10), JobEvent::Ignored);
        assert_eq!(
            r.complete_failure("late error".into(), Utc::now()),
            JobEvent::Ignored
        );
        assert_eq!(r.time_out(Utc::now()), JobEvent::Ignored);

        // completed_at was set exactly once.
        assert_eq!(r.completed_at, Some(first_completion));
        assert_eq!(r.state, JobState::Succeeded);
        assert!(r.error_detail.is_none());
    }

    #[test]
    fn timeout_is_distinct_from_failed() {
        let mut r = record();
        r.observe_progress(30);
        r.time_out(Utc::now());
        assert_eq!(r.state, JobState::TimedOut);
        assert_ne!(r.state, JobState::Failed);
        assert!(r.error_detail.is_some());
    }

    #[test]
    fn elapsed_uses_completion_time() {
        let mut r = record();
        assert!(r.elapsed_secs().is_none());
        let done = r.submitted_at + chrono::Duration::milliseconds(2_500);
        r.complete_failure("x".into(), done);
        assert_eq!(r.elapsed_secs(), Some(2.5));
    }
}
