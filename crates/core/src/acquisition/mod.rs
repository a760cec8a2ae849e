//! Media acquisition.
//!
//! A [`MediaAcquirer`] fetches the media behind a [`SourceLocator`] into a
//! local directory. [`BoundedAcquisition`] runs an acquirer on its own task
//! so the caller can report progress while waiting and give up after a
//! deadline.
//!
//! [`SourceLocator`]: crate::locator::SourceLocator

mod bounded;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use bounded::BoundedAcquisition;
pub use error::AcquisitionError;
pub use traits::{AcquisitionObserver, MediaAcquirer};
pub use types::AcquiredMedia;
pub use ytdlp::{AcquisitionMode, YtDlpAcquirer};
