//! Event bus — lifecycle signals flowing from the pipeline coordinator to the UI.

pub mod queue;
pub mod types;

pub use queue::{EventBus, EventSender};
pub use types::{EventEnvelope, PipelineEvent};
