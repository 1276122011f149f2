//! Batch submission: upload every input, then one atomic split request.
//!
//! A failed upload excludes that file but never blocks the rest of the batch;
//! the point is to admit as much work as possible under partial failure. The
//! submission call itself is all-or-nothing: if the service rejects it, no
//! jobs were created and the whole batch fails.

use std::path::PathBuf;

use chrono::Utc;

use crate::api::{ApiError, SplitOptions, SplitterApi};
use crate::batch::BatchRegistry;
use crate::error::SplitError;
use crate::ui;

/// An input that never became a job because its upload failed.
#[derive(Debug)]
pub struct UploadFailure {
    pub path: PathBuf,
    pub error: ApiError,
}

/// Outcome of a successful batch submission: one `Pending` record per
/// uploaded input, plus the inputs that were given up on.
#[derive(Debug)]
pub struct Submission {
    pub registry: BatchRegistry,
    pub upload_failures: Vec<UploadFailure>,
}

/// Upload `inputs` in order and submit one split request covering every
/// successfully uploaded file.
///
/// Processing options are validated here, at the boundary, before any network
/// traffic. When no upload succeeds the submission call is skipped and an
/// empty registry is returned; only a rejected submission is fatal.
pub async fn submit_batch(
    api: &impl SplitterApi,
    inputs: &[PathBuf],
    options: &SplitOptions,
) -> Result<Submission, SplitError> {
    options.validate().map_err(SplitError::InvalidOptions)?;

    let mut uploaded: Vec<(PathBuf, String)> = Vec::new();
    let mut upload_failures = Vec::new();

    for path in inputs {
        ui::info(&format!("Uploading \"{}\"...", path.display()));
        match api.upload(path).await {
            Ok(source_id) => {
                ui::success(&format!(
                    "\"{}\" uploaded (source id: {source_id})",
                    path.display()
                ));
                uploaded.push((path.clone(), source_id));
            }
            Err(error) => {
                ui::failure(&format!("cannot upload \"{}\": {error}", path.display()));
                upload_failures.push(UploadFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    let mut registry = BatchRegistry::new();
    if uploaded.is_empty() {
        return Ok(Submission {
            registry,
            upload_failures,
        });
    }

    let source_ids: Vec<String> = uploaded.iter().map(|(_, id)| id.clone()).collect();
    api.submit(&source_ids, options)
        .await
        .map_err(SplitError::Submission)?;

    let now = Utc::now();
    for (path, source_id) in uploaded {
        registry.seed(source_id, path, now);
    }

    Ok(Submission {
        registry,
        upload_failures,
    })
}
