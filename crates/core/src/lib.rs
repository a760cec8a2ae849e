pub mod acquisition;
pub mod assembler;
pub mod audio;
pub mod clicks;
pub mod config;
pub mod detect;
pub mod job;
pub mod locator;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod separate;
pub mod steps;
pub mod testing;
pub mod tool;
pub mod visualize;

pub use acquisition::{AcquiredMedia, AcquisitionError, BoundedAcquisition, MediaAcquirer};
pub use assembler::{AssemblyInput, ResultAssembler};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    StorageConfig,
};
pub use job::{AnalysisResult, Job, JobRegistry, NOT_STARTED_MESSAGE};
pub use locator::{LocatorError, SourceLocator};
pub use pipeline::{Collaborators, PipelineError, PipelineOrchestrator, Stage, SubmitError};
pub use steps::{FixedVocabularySteps, StepAnnotation, StepStrategy};
