//! SnapSolve pipeline — turns screenshots into normalized answers.
//!
//! Modules:
//! - `coordinator`: solve/debug flows, cancellation, reinit-once, events
//! - `classifier`: code vs. multiple-choice vs. prose classification
//! - `sections`: labeled section extraction and complexity normalization
//! - `json_scan`: tolerant JSON recovery for the problem-extraction stage
//! - `debug`: five-section debug reply parsing
//! - `prompts`: prompt templates
//! - `screenshots`: screenshot queue trait and directory-backed source
//! - `config_source`: where the coordinator reloads configuration from

pub mod classifier;
pub mod config_source;
pub mod coordinator;
pub mod debug;
pub mod json_scan;
pub mod prompts;
pub mod screenshots;
pub mod sections;

pub use classifier::{classify, AnswerClassifier};
pub use config_source::{ConfigSource, FileConfigSource};
pub use coordinator::{PipelineCoordinator, RunState};
pub use debug::{parse_debug, DebugReport, DebugSection};
pub use screenshots::{DirScreenshotSource, ScreenshotSource};
