mod api;
mod batch;
mod cli;
mod config;
mod download;
mod error;
mod pipeline;
mod poll;
mod submit;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use api::{ApiClient, SplitOptions};
use cli::Cli;
use config::SplitterConfig;
use error::SplitError;
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SplitterConfig::load()?;

    let license = cli
        .license
        .clone()
        .filter(|key| !key.is_empty())
        .or_else(|| (!config.license.is_empty()).then(|| config.license.clone()))
        .ok_or(SplitError::MissingLicense)?;

    let inputs = collect_inputs(&cli.input)?;
    std::fs::create_dir_all(&cli.output)?;

    let client = ApiClient::with_base_url(license, config.api_base_url.clone());
    let options = SplitOptions {
        stem: cli.stem,
        filter: cli.filter,
        splitter: cli.splitter,
    };
    let interval = Duration::from_secs(cli.poll_interval.unwrap_or(config.poll_interval_secs));

    let pipeline = Pipeline::new(&client, options, cli.output.clone(), interval)
        .with_timeout(cli.timeout.map(Duration::from_secs))
        .with_cleanup(cli.delete);

    if cli.batch {
        let report = pipeline.run_batch(&inputs).await?;
        ui::print_report(&report);
    } else {
        pipeline.run_sequential(&inputs).await?;
    }

    Ok(())
}

/// Expand a file-or-directory argument into the list of input files
/// (directories are read non-recursively, in name order).
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, SplitError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if input.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(SplitError::NoInputs(input.to_path_buf()));
        }
        return Ok(files);
    }
    Err(SplitError::NoInputs(input.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_inputs_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(collect_inputs(&file).unwrap(), vec![file]);
    }

    #[test]
    fn collect_inputs_directory_is_sorted_and_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let inputs = collect_inputs(dir.path()).unwrap();
        assert_eq!(
            inputs,
            vec![dir.path().join("a.mp3"), dir.path().join("b.mp3")]
        );
    }

    #[test]
    fn collect_inputs_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            collect_inputs(dir.path()),
            Err(SplitError::NoInputs(_))
        ));
    }

    #[test]
    fn collect_inputs_missing_path_is_an_error() {
        assert!(matches!(
            collect_inputs(Path::new("/no/such/path")),
            Err(SplitError::NoInputs(_))
        ));
    }
}
