//! Trait definitions for the acquisition module.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::error::AcquisitionError;
use super::types::AcquiredMedia;
use crate::locator::SourceLocator;

/// Fetches the media behind a locator into a local directory.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    /// Returns the name of this acquirer implementation.
    fn name(&self) -> &str;

    /// Downloads the media into `dest_dir`, creating it if needed.
    async fn acquire(
        &self,
        locator: &SourceLocator,
        dest_dir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError>;
}

/// Receives periodic callbacks while a bounded acquisition is pending.
#[async_trait]
pub trait AcquisitionObserver: Send + Sync {
    /// Called every progress interval with the time waited so far.
    async fn on_waiting(&self, elapsed: Duration, timeout: Duration);
}

/// Observer that ignores all callbacks.
#[async_trait]
impl AcquisitionObserver for () {
    async fn on_waiting(&self, _elapsed: Duration, _timeout: Duration) {}
}
