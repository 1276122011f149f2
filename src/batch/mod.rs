pub mod job;
pub mod registry;
pub mod report;

pub use job::{JobEvent, JobRecord, JobState};
pub use registry::BatchRegistry;
pub use report::{BatchReport, FailureSummary, JobSummary};
