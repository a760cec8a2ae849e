//! Job tracking for analysis runs.
//!
//! Every submitted locator becomes a [`Job`] keyed by its video id. The
//! pipeline task for that job is the only writer; any number of pollers read
//! snapshots through [`JobRegistry::get`].

mod registry;
mod types;

pub use registry::JobRegistry;
pub use types::{AnalysisResult, Job, NOT_STARTED_MESSAGE};
