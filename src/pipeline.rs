//! End-to-end batch pipeline: upload → submit → poll → download → report.
//!
//! Two modes, matching the CLI toggle. Batch mode submits every input in one
//! request and drains them together; sequential mode runs the full cycle one
//! file at a time, isolating each file's failures. In both, per-file and
//! per-job failures are reported without touching the process exit code; only
//! the submission call itself is fatal.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::{SplitOptions, SplitterApi};
use crate::batch::BatchReport;
use crate::download;
use crate::error::SplitError;
use crate::poll::{Clock, Poller, SystemClock};
use crate::submit;
use crate::ui;

pub struct Pipeline<'a, A> {
    api: &'a A,
    options: SplitOptions,
    output_dir: PathBuf,
    poll_interval: Duration,
    timeout: Option<Duration>,
    delete_after_download: bool,
}

impl<'a, A: SplitterApi> Pipeline<'a, A> {
    pub fn new(
        api: &'a A,
        options: SplitOptions,
        output_dir: PathBuf,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            options,
            output_dir,
            poll_interval,
            timeout: None,
            delete_after_download: false,
        }
    }

    /// Bound the wait: when the timeout expires, still-outstanding jobs are
    /// reported as timed out instead of blocking indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delete sources and result tracks from service storage after download.
    pub fn with_cleanup(mut self, delete_after_download: bool) -> Self {
        self.delete_after_download = delete_after_download;
        self
    }

    /// Submit all inputs as one batch and track it to completion.
    pub async fn run_batch(&self, inputs: &[PathBuf]) -> Result<BatchReport, SplitError> {
        let submission = submit::submit_batch(self.api, inputs, &self.options).await?;
        let mut registry = submission.registry;

        let clock = SystemClock;
        let deadline = self
            .timeout
            .and_then(|timeout| chrono::Duration::from_std(timeout).ok())
            .map(|timeout| clock.now() + timeout);
        Poller::new(self.api, &clock, self.poll_interval)
            .with_deadline(deadline)
            .drain(&mut registry)
            .await;

        let outcomes = download::materialize(self.api, &registry, &self.output_dir).await;
        let failed_downloads = outcomes.iter().filter(|o| o.result.is_err()).count();
        if failed_downloads > 0 {
            ui::warn(&format!("{failed_downloads} artifact download(s) failed"));
        }

        if self.delete_after_download {
            download::delete_sources(self.api, &registry).await;
        }

        let upload_failures = submission
            .upload_failures
            .into_iter()
            .map(|failure| (failure.path, failure.error.to_string()))
            .collect();
        Ok(BatchReport::from_registry(&registry).with_upload_failures(upload_failures))
    }

    /// Run the full cycle for each input on its own, continuing past
    /// per-file failures.
    pub async fn run_sequential(&self, inputs: &[PathBuf]) -> Result<(), SplitError> {
        // Validate once up front; a bad option combination is a caller error,
        // not a per-file condition.
        self.options.validate().map_err(SplitError::InvalidOptions)?;

        for path in inputs {
            match self.run_batch(std::slice::from_ref(path)).await {
                Ok(report) => {
                    if report.failed.is_empty() && report.upload_failures.is_empty() {
                        ui::success(&format!(
                            "\"{}\" has been successfully split",
                            path.display()
                        ));
                    }
                }
                Err(error) => {
                    ui::failure(&format!("cannot process \"{}\": {error}", path.display()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{
        FilterLevel, SnapshotResult, SplitterModel, StatusSnapshot, Stem, TrackKind,
    };
    use crate::api::ApiError;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};
    use std::path::Path;

    /// Service double: every uploaded file becomes a job that reports
    /// progress once and then succeeds, except ids configured to fail.
    struct FakeService {
        fail_upload_containing: Option<&'static str>,
        fail_job: Option<&'static str>,
        checks: RefCell<HashMap<String, u32>>,
        downloads: RefCell<Vec<String>>,
        deletes: RefCell<Vec<String>>,
    }

    impl FakeService {
        fn new() -> Self {
            Self {
                fail_upload_containing: None,
                fail_job: None,
                checks: RefCell::new(HashMap::new()),
                downloads: RefCell::new(Vec::new()),
                deletes: RefCell::new(Vec::new()),
            }
        }
    }

    impl SplitterApi for FakeService {
        async fn upload(&self, path: &Path) -> Result<String, ApiError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if let Some(pattern) = self.fail_upload_containing
                && name.contains(pattern)
            {
                return Err(ApiError::Service {
                    status: 400,
                    message: "corrupt file".into(),
                });
            }
            Ok(format!("src-{name}"))
        }

        async fn submit(
            &self,
            _source_ids: &[String],
            _options: &SplitOptions,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn check_status(
            &self,
            job_ids: &[String],
        ) -> Result<HashMap<String, SnapshotResult>, ApiError> {
            let mut checks = self.checks.borrow_mut();
            let mut snapshots = HashMap::new();
            for id in job_ids {
                let seen = checks.entry(id.clone()).or_insert(0);
                *seen += 1;
                let snapshot = if *seen == 1 {
                    Ok(StatusSnapshot::Progress { progress: 50 })
                } else if self.fail_job.is_some_and(|f| id.contains(f)) {
                    Ok(StatusSnapshot::Failed {
                        detail: "processing error".into(),
                    })
                } else {
                    let mut tracks = BTreeMap::new();
                    tracks.insert(TrackKind::StemTrack, format!("https://cdn/{id}/stem"));
                    tracks.insert(TrackKind::BackTrack, format!("https://cdn/{id}/back"));
                    Ok(StatusSnapshot::Succeeded {
                        tracks,
                        duration_secs: 30.0,
                    })
                };
                snapshots.insert(id.clone(), snapshot);
            }
            Ok(snapshots)
        }

        async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
            self.downloads.borrow_mut().push(url.to_string());
            Ok(dest_dir.join("track.mp3"))
        }

        async fn delete(&self, source_id: &str) -> Result<(), ApiError> {
            self.deletes.borrow_mut().push(source_id.to_string());
            Ok(())
        }
    }

    fn options() -> SplitOptions {
        SplitOptions {
            stem: Stem::Vocals,
            filter: FilterLevel::Normal,
            splitter: SplitterModel::Phoenix,
        }
    }

    fn pipeline(api: &FakeService) -> Pipeline<'_, FakeService> {
        Pipeline::new(
            api,
            options(),
            PathBuf::from("/out"),
            Duration::from_millis(1),
        )
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn batch_mode_end_to_end() {
        let api = FakeService::new();
        let report = pipeline(&api)
            .run_batch(&paths(&["a.mp3", "b.mp3"]))
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert!(report.failed.is_empty());
        // Two artifacts per succeeded job.
        assert_eq!(api.downloads.borrow().len(), 4);
        // No cleanup unless asked for.
        assert!(api.deletes.borrow().is_empty());
    }

    #[tokio::test]
    async fn mixed_outcome_batch_is_fully_reported() {
        let mut api = FakeService::new();
        api.fail_upload_containing = Some("unreadable");
        api.fail_job = Some("doomed");

        let report = pipeline(&api)
            .run_batch(&paths(&["ok.mp3", "doomed.mp3", "unreadable.mp3"]))
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.upload_failures.len(), 1);
        // Only the succeeded job's artifacts were fetched.
        assert_eq!(api.downloads.borrow().len(), 2);
        assert!(api
            .downloads
            .borrow()
            .iter()
            .all(|url| url.contains("src-ok.mp3")));
    }

    #[tokio::test]
    async fn cleanup_deletes_every_job_after_download() {
        let api = FakeService::new();
        pipeline(&api)
            .with_cleanup(true)
            .run_batch(&paths(&["a.mp3"]))
            .await
            .unwrap();
        assert_eq!(*api.deletes.borrow(), vec!["src-a.mp3".to_string()]);
    }

    #[tokio::test]
    async fn sequential_mode_processes_every_file_despite_failures() {
        let mut api = FakeService::new();
        api.fail_upload_containing = Some("broken");

        pipeline(&api)
            .run_sequential(&paths(&["a.mp3", "broken.mp3", "c.mp3"]))
            .await
            .unwrap();

        // Both healthy files were processed end to end.
        assert_eq!(api.downloads.borrow().len(), 4);
    }

    #[tokio::test]
    async fn sequential_mode_rejects_invalid_options_up_front() {
        let api = FakeService::new();
        let bad = SplitOptions {
            stem: Stem::Wind,
            filter: FilterLevel::Mild,
            splitter: SplitterModel::Orion,
        };
        let result = Pipeline::new(
            &api,
            bad,
            PathBuf::from("/out"),
            Duration::from_millis(1),
        )
        .run_sequential(&paths(&["a.mp3"]))
        .await;
        assert!(matches!(result, Err(SplitError::InvalidOptions(_))));
    }
}
