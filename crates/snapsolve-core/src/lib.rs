//! SnapSolve core — shared types, configuration, event bus, and errors.
//!
//! This crate contains:
//! - **types**: provider identities, credentials, image payloads, answers
//! - **config**: JSON schema, loader, and env var overrides
//! - **bus**: pipeline lifecycle events and the channel carrying them
//! - **error**: the `SolveError` taxonomy surfaced to the UI boundary

pub mod bus;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::SolveError;
pub use types::{
    AnswerType, Credentials, ImagePayload, NormalizedAnswer, PipelineKind, ProblemContext,
    ProviderId, QuestionType,
};
