use std::path::PathBuf;

use super::job::JobState;
use super::registry::BatchRegistry;

/// Timing summary for one succeeded job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub job_id: String,
    pub source_path: PathBuf,
    /// Wall time from submission to the first observed terminal state.
    pub elapsed_secs: f64,
    /// Media duration reported by the service.
    pub source_duration_secs: f64,
    /// `elapsed / duration`; `None` when the duration is zero.
    pub speed: Option<f64>,
}

/// Failure summary for one job that did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureSummary {
    pub job_id: String,
    pub source_path: PathBuf,
    pub state: JobState,
    pub detail: String,
}

/// Aggregated batch metrics, computed once the batch has drained.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub succeeded: Vec<JobSummary>,
    pub failed: Vec<FailureSummary>,
    /// Inputs that never became jobs because their upload failed.
    pub upload_failures: Vec<(PathBuf, String)>,
    /// Sum of media durations across succeeded jobs, in seconds.
    pub total_duration_secs: f64,
    /// Longest wall time of any succeeded job, in seconds.
    pub max_elapsed_secs: f64,
    /// Batch throughput: max elapsed over total duration. `None` means
    /// undefined (zero total duration), never a division fault.
    pub average_speed: Option<f64>,
}

impl BatchReport {
    pub fn from_registry(registry: &BatchRegistry) -> Self {
        let mut report = Self::default();

        for job in registry.jobs() {
            match job.state {
                JobState::Succeeded => {
                    let elapsed_secs = job.elapsed_secs().unwrap_or(0.0);
                    let duration = job.source_duration_secs;
                    report.succeeded.push(JobSummary {
                        job_id: job.job_id.clone(),
                        source_path: job.source_path.clone(),
                        elapsed_secs,
                        source_duration_secs: duration,
                        speed: (duration > 0.0).then(|| elapsed_secs / duration),
                    });
                    report.total_duration_secs += duration;
                    report.max_elapsed_secs = report.max_elapsed_secs.max(elapsed_secs);
                }
                JobState::Failed | JobState::TimedOut => {
                    report.failed.push(FailureSummary {
                        job_id: job.job_id.clone(),
                        source_path: job.source_path.clone(),
                        state: job.state,
                        detail: job
                            .error_detail
                            .clone()
                            .unwrap_or_else(|| "no detail recorded".into()),
                    });
                }
                JobState::Pending | JobState::InProgress => {
                    // Reports are only computed after draining; a non-terminal
                    // record here is a caller bug, counted as a failure rather
                    // than dropped silently.
                    report.failed.push(FailureSummary {
                        job_id: job.job_id.clone(),
                        source_path: job.source_path.clone(),
                        state: job.state,
                        detail: "batch reported before draining".into(),
                    });
                }
            }
        }

        report.average_speed = (report.total_duration_secs > 0.0)
            .then(|| report.max_elapsed_secs / report.total_duration_secs);
        report
    }

    pub fn with_upload_failures(mut self, failures: Vec<(PathBuf, String)>) -> Self {
        self.upload_failures = failures;
        self
    }
}
