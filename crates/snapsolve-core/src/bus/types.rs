//! Bus event types — the fixed set of lifecycle signals the core emits.

use chrono::{DateTime, Utc};

use crate::types::{NormalizedAnswer, PipelineKind, ProblemContext};

/// A lifecycle signal published by the pipeline coordinator.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// A solve run started.
    Start,
    /// A run was requested but the relevant screenshot queue was empty.
    NoInput { kind: PipelineKind },
    /// The solve pipeline produced a problem description.
    ProblemExtracted(ProblemContext),
    SolutionSuccess(NormalizedAnswer),
    SolutionError(String),
    /// Credentials are missing, malformed, or were rejected by the provider.
    CredentialInvalid(String),
    DebugStart,
    DebugSuccess(NormalizedAnswer),
    DebugError(String),
    /// A run was aborted; neutral, never an error.
    Canceled { kind: PipelineKind },
    /// UX-only progress feedback.
    Progress {
        kind: PipelineKind,
        message: String,
        percent: u8,
    },
}

impl PipelineEvent {
    /// Progress notification, clamping `percent` to 0–100.
    pub fn progress(kind: PipelineKind, message: impl Into<String>, percent: u8) -> Self {
        PipelineEvent::Progress {
            kind,
            message: message.into(),
            percent: percent.min(100),
        }
    }

    /// Stable signal name for UI subscriptions (e.g. `"solution-success"`).
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Start => "start",
            PipelineEvent::NoInput { .. } => "no-input",
            PipelineEvent::ProblemExtracted(_) => "problem-extracted",
            PipelineEvent::SolutionSuccess(_) => "solution-success",
            PipelineEvent::SolutionError(_) => "solution-error",
            PipelineEvent::CredentialInvalid(_) => "credential-invalid",
            PipelineEvent::DebugStart => "debug-start",
            PipelineEvent::DebugSuccess(_) => "debug-success",
            PipelineEvent::DebugError(_) => "debug-error",
            PipelineEvent::Canceled { .. } => "canceled",
            PipelineEvent::Progress { .. } => "progress",
        }
    }

    /// Whether this event ends a run (success, failure, or cancellation).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::SolutionSuccess(_)
                | PipelineEvent::SolutionError(_)
                | PipelineEvent::CredentialInvalid(_)
                | PipelineEvent::DebugSuccess(_)
                | PipelineEvent::DebugError(_)
                | PipelineEvent::Canceled { .. }
        )
    }
}

/// An event plus the moment it was published.
#[derive(Clone, Debug)]
pub struct EventEnvelope {
    pub event: PipelineEvent,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: PipelineEvent) -> Self {
        EventEnvelope {
            event,
            timestamp: Utc::now(),
        }
    }
}
