//! Analysis pipeline orchestration.
//!
//! One job runs the stages below strictly in sequence on its own task:
//!
//! | stage        | band      | on failure                                   |
//! |--------------|-----------|----------------------------------------------|
//! | acquire      | 5..15     | one fallback attempt, then job error         |
//! | prepare      | 15..20    | re-acquire via fallback if unused, else error|
//! | separate     | 40..48    | job error                                    |
//! | detect       | 55..70    | empty events at 120 BPM                      |
//! | steps        | 70..72    | cannot fail                                  |
//! | visualize    | 72..80    | empty image                                  |
//! | click_tracks | 80..95    | all click tracks empty                       |
//! | assemble     | 95..100   | cannot fail                                  |
//!
//! Only acquisition has a deadline. Other stages run as long as their
//! collaborator takes.

mod bands;
mod collaborators;
mod error;
mod orchestrator;

pub use bands::{Stage, StageBand};
pub use collaborators::Collaborators;
pub use error::{PipelineError, SubmitError};
pub use orchestrator::PipelineOrchestrator;
