use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("license key required (pass --license or set STEMSPLIT_LICENSE)")]
    MissingLicense,

    #[error("no input files found at {}", .0.display())]
    NoInputs(PathBuf),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The single submission call was rejected; no jobs were created, so this
    /// is fatal for the whole batch.
    #[error("batch submission failed: {0}")]
    Submission(#[source] ApiError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_failure_display_names_the_cause() {
        let err = SplitError::Submission(ApiError::Service {
            status: 400,
            message: "bad params".into(),
        });
        assert_eq!(
            err.to_string(),
            "batch submission failed: service error (status 400): bad params"
        );
    }

    #[test]
    fn no_inputs_display_includes_path() {
        let err = SplitError::NoInputs(PathBuf::from("/tmp/empty"));
        assert!(err.to_string().contains("/tmp/empty"));
    }
}
