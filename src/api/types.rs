//! Wire types for the splitting-service API and their canonical form.
//!
//! The raw serde structs mirror the JSON the service actually returns. The
//! service's endpoint variants do not agree on one status vocabulary
//! (`progress`/`success`/`error` on the batch check endpoint, `cancelled` on
//! others), so everything is folded into [`StatusSnapshot`] in exactly one
//! place, [`CheckEntry::canonicalize`]. Anything outside the known vocabulary
//! becomes [`ApiError::Protocol`] rather than being guessed at.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Stem selection, validated before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stem {
    Vocals,
    Voice,
    Drum,
    Bass,
    Piano,
    ElectricGuitar,
    AcousticGuitar,
    Synthesizer,
    Strings,
    Wind,
}

impl Stem {
    /// Name the service expects in split parameters (underscored, unlike the
    /// kebab-case CLI spelling).
    pub fn wire_name(self) -> &'static str {
        match self {
            Stem::Vocals => "vocals",
            Stem::Voice => "voice",
            Stem::Drum => "drum",
            Stem::Bass => "bass",
            Stem::Piano => "piano",
            Stem::ElectricGuitar => "electric_guitar",
            Stem::AcousticGuitar => "acoustic_guitar",
            Stem::Synthesizer => "synthesizer",
            Stem::Strings => "strings",
            Stem::Wind => "wind",
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Separation aggressiveness, sent to the service as 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterLevel {
    Mild,
    Normal,
    Aggressive,
}

impl FilterLevel {
    pub fn level(self) -> u8 {
        match self {
            FilterLevel::Mild => 0,
            FilterLevel::Normal => 1,
            FilterLevel::Aggressive => 2,
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterLevel::Mild => write!(f, "mild"),
            FilterLevel::Normal => write!(f, "normal"),
            FilterLevel::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Neural network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitterModel {
    Orion,
    Phoenix,
}

impl SplitterModel {
    pub fn wire_name(self) -> &'static str {
        match self {
            SplitterModel::Orion => "orion",
            SplitterModel::Phoenix => "phoenix",
        }
    }
}

impl fmt::Display for SplitterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Batch-wide processing options carried by one submission.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub stem: Stem,
    pub filter: FilterLevel,
    pub splitter: SplitterModel,
}

impl SplitOptions {
    /// Reject option combinations the service does not support. The orion
    /// network only handles the vocals and voice stems.
    pub fn validate(&self) -> Result<(), String> {
        if self.splitter == SplitterModel::Orion
            && !matches!(self.stem, Stem::Vocals | Stem::Voice)
        {
            return Err(format!(
                "the orion splitter only supports the vocals and voice stems, not \"{}\"",
                self.stem
            ));
        }
        Ok(())
    }

    pub(crate) fn to_params<'a>(&self, id: &'a str) -> SplitParams<'a> {
        SplitParams {
            id,
            stem: self.stem.wire_name(),
            filter: self.filter.level(),
            splitter: self.splitter.wire_name(),
        }
    }
}

/// One entry of the JSON array posted to the split endpoint.
#[derive(Debug, Serialize)]
pub struct SplitParams<'a> {
    pub id: &'a str,
    pub stem: &'a str,
    pub filter: u8,
    pub splitter: &'a str,
}

/// Kind of downloadable result artifact produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackKind {
    StemTrack,
    BackTrack,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::StemTrack => write!(f, "stem track"),
            TrackKind::BackTrack => write!(f, "back track"),
        }
    }
}

/// Canonical per-job status, decoded from one check-endpoint entry.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSnapshot {
    /// The job is queued or running; `progress` is the latest reported
    /// percentage (the service may re-queue, so no monotonicity is assumed).
    Progress { progress: u8 },
    /// The job finished; every result artifact locator is present.
    Succeeded {
        tracks: BTreeMap<TrackKind, String>,
        duration_secs: f64,
    },
    /// The job reached a terminal failure on the service side.
    Failed { detail: String },
}

/// A per-job snapshot, or the protocol error that kept it from decoding.
pub type SnapshotResult = Result<StatusSnapshot, ApiError>;

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response shape shared by the split and delete endpoints.
#[derive(Debug, Deserialize)]
pub struct AckResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: std::collections::HashMap<String, CheckEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CheckEntry {
    #[serde(default)]
    pub task: Option<TaskInfo>,
    #[serde(default)]
    pub split: Option<SplitInfo>,
}

#[derive(Debug, Deserialize)]
pub struct TaskInfo {
    pub state: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitInfo {
    pub stem_track: String,
    pub back_track: String,
    #[serde(default)]
    pub duration: f64,
}

impl CheckEntry {
    /// Fold this entry into the canonical status vocabulary.
    ///
    /// Mapping: `progress` → [`StatusSnapshot::Progress`]; `success` →
    /// [`StatusSnapshot::Succeeded`] (requires the split result, otherwise a
    /// protocol error); `error` and `cancelled` → [`StatusSnapshot::Failed`]
    /// with the detail preserved. Any other state string is a protocol error.
    pub fn canonicalize(&self) -> SnapshotResult {
        let task = self
            .task
            .as_ref()
            .ok_or_else(|| ApiError::Protocol("check entry is missing the task object".into()))?;

        match task.state.as_str() {
            "progress" => Ok(StatusSnapshot::Progress {
                progress: task.progress.unwrap_or(0).min(100),
            }),
            "success" => {
                let split = self.split.as_ref().ok_or_else(|| {
                    ApiError::Protocol("task is successful but carries no split result".into())
                })?;
                let mut tracks = BTreeMap::new();
                tracks.insert(TrackKind::StemTrack, split.stem_track.clone());
                tracks.insert(TrackKind::BackTrack, split.back_track.clone());
                Ok(StatusSnapshot::Succeeded {
                    tracks,
                    duration_secs: split.duration,
                })
            }
            "error" => Ok(StatusSnapshot::Failed {
                detail: task
                    .error
                    .clone()
                    .unwrap_or_else(|| "unspecified processing error".into()),
            }),
            "cancelled" => Ok(StatusSnapshot::Failed {
                detail: "task cancelled by the service".into(),
            }),
            other => Err(ApiError::Protocol(format!("unknown task state {other:?}"))),
        }
    }
}
