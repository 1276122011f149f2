//! Result materialization: fetch the artifacts of every succeeded job.
//!
//! Failure isolation is per job and per artifact: one bad download is
//! recorded against that job's artifact and nothing else. Failed and
//! timed-out jobs contribute no download attempts.

use std::path::{Path, PathBuf};

use crate::api::{ApiError, SplitterApi, TrackKind};
use crate::batch::{BatchRegistry, JobState};
use crate::ui;

/// Result of one artifact download attempt.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub job_id: String,
    pub kind: TrackKind,
    pub result: Result<PathBuf, ApiError>,
}

/// Download every artifact of every succeeded job into `output_dir`.
pub async fn materialize(
    api: &impl SplitterApi,
    registry: &BatchRegistry,
    output_dir: &Path,
) -> Vec<DownloadOutcome> {
    let mut outcomes = Vec::new();

    for job in registry.in_state(JobState::Succeeded) {
        for (kind, url) in &job.result_refs {
            ui::info(&format!(
                "Downloading the {kind} for \"{}\"...",
                job.source_path.display()
            ));
            let result = api.download(url, output_dir).await;
            match &result {
                Ok(path) => {
                    ui::success(&format!("{kind} downloaded to \"{}\"", path.display()));
                }
                Err(error) => {
                    ui::failure(&format!(
                        "failed to download the {kind} for job {}: {error}",
                        job.job_id
                    ));
                }
            }
            outcomes.push(DownloadOutcome {
                job_id: job.job_id.clone(),
                kind: *kind,
                result,
            });
        }
    }

    outcomes
}

/// Remove every tracked source (and its result tracks) from service storage.
/// Best-effort: a failed delete is reported and skipped.
pub async fn delete_sources(api: &impl SplitterApi, registry: &BatchRegistry) {
    for job in registry.jobs() {
        match api.delete(&job.job_id).await {
            Ok(()) => ui::info(&format!("Deleted job {} from storage", job.job_id)),
            Err(error) => {
                ui::warn(&format!(
                    "could not delete job {} from storage: {error}",
                    job.job_id
                ));
            }
        }
    }
}
