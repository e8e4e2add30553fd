//! Pipeline coordinator — runs the solve and debug flows.
//!
//! Per kind the lifecycle is `Idle → Running → {Success, Failed, Canceled} → Idle`.
//! Shared state (client registry, problem context, the two run slots) sits
//! behind one `tokio::sync::Mutex` that is never held across a provider call.
//! Each run owns a `CancellationToken` and a generation number; when a run
//! finishes it checks both against its slot, and a run that was superseded
//! or canceled publishes only `Canceled`.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use snapsolve_core::bus::{EventSender, PipelineEvent};
use snapsolve_core::config::Config;
use snapsolve_core::types::{ImagePayload, NormalizedAnswer, PipelineKind, ProblemContext, ProviderId, QuestionType};
use snapsolve_core::SolveError;
use snapsolve_providers::{spec_for, ClientRegistry, VisionProvider};

use crate::classifier::AnswerClassifier;
use crate::config_source::ConfigSource;
use crate::debug::parse_debug;
use crate::json_scan::problem_from_reply;
use crate::prompts::{debug_prompt, extraction_prompt, single_shot_prompt, solution_prompt};
use crate::screenshots::ScreenshotSource;

/// Observable state of one pipeline kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

struct PipelineRun {
    token: CancellationToken,
    generation: u64,
}

struct Inner {
    registry: ClientRegistry,
    config: Config,
    context: Option<ProblemContext>,
    runs: [Option<PipelineRun>; 2],
    next_generation: u64,
}

impl Inner {
    fn cancel_slot(&mut self, kind: PipelineKind) -> bool {
        match self.runs[kind.index()].take() {
            Some(run) => {
                run.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// What a finished run turned out to be, decided under the state lock.
enum Settled<T> {
    Done(T),
    Failed(SolveError),
    Canceled,
}

pub struct PipelineCoordinator {
    inner: Mutex<Inner>,
    events: EventSender,
    screenshots: Arc<dyn ScreenshotSource>,
    config_source: Arc<dyn ConfigSource>,
}

impl PipelineCoordinator {
    /// Create a coordinator and build the initial client from the config
    /// source. A missing or bad key is not fatal here; runs report it.
    pub fn new(
        mut registry: ClientRegistry,
        screenshots: Arc<dyn ScreenshotSource>,
        config_source: Arc<dyn ConfigSource>,
        events: EventSender,
    ) -> Self {
        let config = config_source.load();
        if let Err(e) = registry.apply_config(&config) {
            warn!(error = %e, "no usable provider client at startup");
        }
        Self {
            inner: Mutex::new(Inner {
                registry,
                config,
                context: None,
                runs: [None, None],
                next_generation: 0,
            }),
            events,
            screenshots,
            config_source,
        }
    }

    // ────────────── Control surface ──────────────

    /// Rebuild the client from a new config. Runs in flight keep the client
    /// they started with.
    pub async fn apply_config(&self, config: Config) -> Result<(), SolveError> {
        let mut inner = self.inner.lock().await;
        let result = inner.registry.apply_config(&config);
        inner.config = config;
        result
    }

    /// Abort the run of `kind`, if any. Canceling a solve also drops the
    /// problem context it would have replaced.
    pub async fn cancel(&self, kind: PipelineKind) {
        let mut inner = self.inner.lock().await;
        if inner.cancel_slot(kind) {
            info!(kind = %kind, "run canceled");
        }
        if kind == PipelineKind::Solve {
            inner.context = None;
        }
    }

    /// Cancel everything and forget the problem context.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.cancel_slot(PipelineKind::Solve);
        inner.cancel_slot(PipelineKind::Debug);
        inner.context = None;
        info!("pipeline reset");
    }

    pub async fn state(&self, kind: PipelineKind) -> RunState {
        let inner = self.inner.lock().await;
        if inner.runs[kind.index()].is_some() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    pub async fn problem_context(&self) -> Option<ProblemContext> {
        self.inner.lock().await.context.clone()
    }

    /// Seed the problem context from an earlier session, so a debug run can
    /// follow a solve that happened in another process.
    pub async fn restore_context(&self, context: ProblemContext) {
        self.inner.lock().await.context = Some(context);
    }

    pub async fn active_provider(&self) -> Option<ProviderId> {
        self.inner.lock().await.registry.active_provider()
    }

    /// Apply every config published on `rx` until the sender goes away.
    pub fn spawn_config_listener(self: Arc<Self>, mut rx: watch::Receiver<Config>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let config = rx.borrow_and_update().clone();
                debug!(provider = %config.api_provider, "config change received");
                if let Err(e) = self.apply_config(config).await {
                    warn!(error = %e, "config change left no usable client");
                }
            }
            debug!("config listener stopped");
        })
    }

    // ────────────── Solve ──────────────

    /// Solve the problem in the main screenshot queue.
    pub async fn process_solve(&self) -> Result<NormalizedAnswer, SolveError> {
        let kind = PipelineKind::Solve;
        let images = self.load_queue(kind).await;
        if images.is_empty() {
            self.events.publish(PipelineEvent::NoInput { kind }).await;
            return Err(SolveError::NoInput);
        }

        let (token, generation) = self.begin_run(kind).await;
        self.events.publish(PipelineEvent::Start).await;

        let work = async {
            let (client, config) = self.client().await?;
            self.solve_with(client.as_ref(), &config, &images).await
        };
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(SolveError::Canceled),
            result = work => result,
        };

        match self.settle(kind, &token, generation, outcome).await {
            Settled::Done((context, answer)) => {
                self.inner.lock().await.context = Some(context);
                self.events.publish(PipelineEvent::SolutionSuccess(answer.clone())).await;
                if let Err(e) = self.screenshots.clear_extra_queue().await {
                    warn!(error = %e, "failed to clear extra screenshot queue");
                }
                Ok(answer)
            }
            Settled::Failed(e) => {
                let event = if e.is_credential_error() {
                    PipelineEvent::CredentialInvalid(e.user_message())
                } else {
                    PipelineEvent::SolutionError(e.user_message())
                };
                self.events.publish(event).await;
                Err(e)
            }
            Settled::Canceled => {
                self.events.publish(PipelineEvent::Canceled { kind }).await;
                Err(SolveError::Canceled)
            }
        }
    }

    async fn solve_with(
        &self,
        client: &dyn VisionProvider,
        config: &Config,
        images: &[ImagePayload],
    ) -> Result<(ProblemContext, NormalizedAnswer), SolveError> {
        let kind = PipelineKind::Solve;
        let provider = client.provider();
        let language = config.language.as_str();
        let two_stage = config
            .providers
            .get(provider)
            .structured_protocol
            .unwrap_or(spec_for(provider).structured_protocol);

        debug!(provider = %provider, two_stage, images = images.len(), "solving");

        let (mut context, answer) = if two_stage {
            self.progress(kind, "Extracting problem from screenshots", 20).await;
            let reply = client.complete(&extraction_prompt(language), images).await?;
            let context = problem_from_reply(&reply, language)?;
            self.events
                .publish(PipelineEvent::ProblemExtracted(context.clone()))
                .await;

            self.progress(kind, "Generating solution", 60).await;
            let text = client.complete(&solution_prompt(&context), &[]).await?;
            let answer = AnswerClassifier::new(language).with_sections(true).classify(&text);
            (context, answer)
        } else {
            self.progress(kind, "Solving from screenshots", 30).await;
            let text = client.complete(&single_shot_prompt(language), images).await?;
            let answer = AnswerClassifier::new(language).classify(&text);
            let question_type = if answer.is_code() {
                QuestionType::Coding
            } else if answer.chosen_letter.is_some() {
                QuestionType::MultipleChoice
            } else {
                QuestionType::Other
            };
            let context = ProblemContext {
                question_type,
                language: language.to_string(),
                ..Default::default()
            };
            self.events
                .publish(PipelineEvent::ProblemExtracted(context.clone()))
                .await;
            (context, answer)
        };

        context.previous_answer = Some(if answer.is_code() {
            answer.code.clone()
        } else {
            answer.content.clone()
        });
        self.progress(kind, "Solution ready", 100).await;
        Ok((context, answer))
    }

    // ────────────── Debug ──────────────

    /// Debug the earlier solution against the extra screenshot queue.
    pub async fn process_debug(&self) -> Result<NormalizedAnswer, SolveError> {
        let kind = PipelineKind::Debug;
        let Some(context) = self.problem_context().await else {
            self.events
                .publish(PipelineEvent::DebugError(SolveError::NoContext.user_message()))
                .await;
            return Err(SolveError::NoContext);
        };

        let extra = self.load_queue(kind).await;
        if extra.is_empty() {
            self.events.publish(PipelineEvent::NoInput { kind }).await;
            return Err(SolveError::NoInput);
        }
        let mut images = self.load_queue(PipelineKind::Solve).await;
        images.extend(extra);

        let (token, generation) = self.begin_run(kind).await;
        self.events.publish(PipelineEvent::DebugStart).await;

        let work = async {
            let (client, _) = self.client().await?;
            self.progress(kind, "Analyzing your changes", 30).await;
            let text = client.complete(&debug_prompt(&context), &images).await?;
            let answer = parse_debug(&text).into_answer();
            self.progress(kind, "Debug analysis ready", 100).await;
            Ok(answer)
        };
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(SolveError::Canceled),
            result = work => result,
        };

        match self.settle(kind, &token, generation, outcome).await {
            Settled::Done(answer) => {
                self.events.publish(PipelineEvent::DebugSuccess(answer.clone())).await;
                Ok(answer)
            }
            Settled::Failed(e) => {
                let event = if e.is_credential_error() {
                    PipelineEvent::CredentialInvalid(e.user_message())
                } else {
                    PipelineEvent::DebugError(e.user_message())
                };
                self.events.publish(event).await;
                Err(e)
            }
            Settled::Canceled => {
                self.events.publish(PipelineEvent::Canceled { kind }).await;
                Err(SolveError::Canceled)
            }
        }
    }

    // ────────────── Helpers ──────────────

    async fn load_queue(&self, kind: PipelineKind) -> Vec<ImagePayload> {
        let result = match kind {
            PipelineKind::Solve => self.screenshots.main_queue().await,
            PipelineKind::Debug => self.screenshots.extra_queue().await,
        };
        result.unwrap_or_else(|e| {
            warn!(kind = %kind, error = %e, "failed to read screenshot queue");
            Vec::new()
        })
    }

    /// Claim the slot for `kind`. Any run of either kind is canceled first,
    /// so at most one run is ever in flight.
    async fn begin_run(&self, kind: PipelineKind) -> (CancellationToken, u64) {
        let mut inner = self.inner.lock().await;
        for k in [kind, kind.other()] {
            if inner.cancel_slot(k) {
                info!(canceled = %k, by = %kind, "superseding in-flight run");
            }
        }
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let token = CancellationToken::new();
        inner.runs[kind.index()] = Some(PipelineRun {
            token: token.clone(),
            generation,
        });
        debug!(kind = %kind, generation, "run started");
        (token, generation)
    }

    /// Release the slot (if still ours) and decide how the run ended.
    async fn settle<T>(
        &self,
        kind: PipelineKind,
        token: &CancellationToken,
        generation: u64,
        outcome: Result<T, SolveError>,
    ) -> Settled<T> {
        let mut inner = self.inner.lock().await;
        let slot = &mut inner.runs[kind.index()];
        let current = slot.as_ref().is_some_and(|run| run.generation == generation);
        if current {
            *slot = None;
        }

        if token.is_cancelled() || !current {
            debug!(kind = %kind, generation, "run superseded or canceled");
            return Settled::Canceled;
        }
        match outcome {
            Ok(value) => Settled::Done(value),
            Err(SolveError::Canceled) => Settled::Canceled,
            Err(e) => {
                warn!(kind = %kind, error = %e, "run failed");
                Settled::Failed(e)
            }
        }
    }

    /// The client for the active provider. When the registry is empty the
    /// config source is re-read and applied once before giving up.
    async fn client(&self) -> Result<(Arc<dyn VisionProvider>, Config), SolveError> {
        let mut inner = self.inner.lock().await;
        let provider = inner.config.api_provider;
        match inner.registry.get_client(provider) {
            Ok(client) => return Ok((client, inner.config.clone())),
            Err(e) if inner.registry.active().is_some() => return Err(e),
            Err(_) => {}
        }

        info!(provider = %provider, "no provider client, reloading config once");
        let config = self.config_source.load();
        let applied = inner.registry.apply_config(&config);
        inner.config = config;
        applied?;
        let client = inner.registry.get_client(inner.config.api_provider)?;
        Ok((client, inner.config.clone()))
    }

    async fn progress(&self, kind: PipelineKind, message: &str, percent: u8) {
        self.events
            .publish(PipelineEvent::progress(kind, message, percent))
            .await;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
