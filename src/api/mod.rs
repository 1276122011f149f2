pub mod client;
pub mod disposition;
pub mod error;
pub mod types;

pub use client::{ApiClient, SplitterApi};
pub use error::ApiError;
pub use types::{
    FilterLevel, SnapshotResult, SplitOptions, SplitterModel, StatusSnapshot, Stem, TrackKind,
};
