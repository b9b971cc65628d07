//! Step executor.
//!
//! Runs one step on one stream:
//!
//! ```text
//! StepStart -> before hook -> [body, unless failed] -> after hook -> StepEnd
//! ```
//!
//! Test failures reported by the runner are recorded on the result and
//! cascaded into the execution context; they never stop later phases. The
//! after hook always runs. Artifact errors are logged and dropped.
//!
//! Screenshot decode, encode and file IO run on tokio's blocking pool so one
//! stream persisting a large batch does not stall the others.

use crate::events::EventBus;
use crate::hooks::{self, HookKind};
use crate::plugins::PluginHandler;
use crate::runner::Runner;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use step_core::{
    ArtifactArea, ArtifactError, ArtifactStore, ExecuteStepRequest, ExecutionContext, ExecutionEvent, Message,
    ResolvedStep, Step, StepResult,
};
use tracing::{debug, error, info, warn};

/// Phases of a single step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepPhase {
    NotStarted,
    BeforeHookRunning,
    BeforeHookFailed,
    BeforeHookOk,
    Skipped,
    BodyRunning,
    BodyFailed,
    BodyOk,
    AfterHookRunning,
    Done,
}

impl StepPhase {
    fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::BeforeHookRunning => "before_hook_running",
            Self::BeforeHookFailed => "before_hook_failed",
            Self::BeforeHookOk => "before_hook_ok",
            Self::Skipped => "skipped",
            Self::BodyRunning => "body_running",
            Self::BodyFailed => "body_failed",
            Self::BodyOk => "body_ok",
            Self::AfterHookRunning => "after_hook_running",
            Self::Done => "done",
        }
    }
}

fn advance(phase: &mut StepPhase, next: StepPhase, stream: u32) {
    debug!(
        stream,
        from = phase.as_str(),
        to = next.as_str(),
        "step phase transition"
    );
    *phase = next;
}

/// Holds the context's current step for the duration of one execution and
/// clears it on drop, whichever way the execution ends.
struct CurrentStepGuard<'a> {
    context: &'a mut ExecutionContext,
}

impl<'a> CurrentStepGuard<'a> {
    fn begin(context: &'a mut ExecutionContext, request: ExecuteStepRequest) -> Self {
        context.begin_step(request);
        Self { context }
    }
}

impl Deref for CurrentStepGuard<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &ExecutionContext {
        self.context
    }
}

impl DerefMut for CurrentStepGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionContext {
        self.context
    }
}

impl Drop for CurrentStepGuard<'_> {
    fn drop(&mut self) {
        self.context.clear_current_step();
    }
}

/// Executes steps for a single stream.
///
/// Owns the stream's [`ExecutionContext`] and its runner connection.
/// `execute_step` takes `&mut self`, so one stream never has two steps in
/// flight. Plugins, the event bus and the artifact directories are shared
/// across streams.
pub struct StepExecutor {
    stream: u32,
    runner: Box<dyn Runner>,
    plugins: Arc<dyn PluginHandler>,
    events: Arc<dyn EventBus>,
    artifacts: ArtifactStore,
    context: ExecutionContext,
}

impl std::fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepExecutor")
            .field("stream", &self.stream)
            .field("artifacts", &self.artifacts)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl StepExecutor {
    pub fn new(
        stream: u32,
        runner: Box<dyn Runner>,
        plugins: Arc<dyn PluginHandler>,
        events: Arc<dyn EventBus>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            stream,
            runner,
            plugins,
            events,
            artifacts,
            context: ExecutionContext::new(stream),
        }
    }

    pub fn stream(&self) -> u32 {
        self.stream
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Mutable access for the caller to set spec/scenario info between steps.
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Execute `step` with the values from `resolved`.
    ///
    /// Never fails: runner-reported failures end up in the returned result's
    /// `failed` flag and in the context's cascading failure flag.
    pub async fn execute_step(&mut self, step: &Step, resolved: &ResolvedStep) -> StepResult {
        let stream = self.stream;
        let request = ExecuteStepRequest::from_resolved(resolved);
        let mut context = CurrentStepGuard::begin(&mut self.context, request.clone());

        if !resolved.is_aligned_with(step) {
            warn!(
                stream,
                step = %step.line_text,
                expected = step.fragments.len(),
                got = resolved.fragments.len(),
                "resolved step fragments do not line up with step"
            );
        }
        let step = step.resolve(resolved);
        let mut result = StepResult::new(&resolved.actual_text);
        let mut phase = StepPhase::NotStarted;

        info!(stream, step = %resolved.actual_text, "executing step");
        self.events.publish(ExecutionEvent::step_start(
            step.clone(),
            stream,
            context.snapshot(),
        ));

        advance(&mut phase, StepPhase::BeforeHookRunning, stream);
        hooks::run_hook(
            HookKind::BeforeStep,
            self.runner.as_ref(),
            self.plugins.as_ref(),
            &mut context,
            &mut result,
        )
        .await;

        if result.failed {
            advance(&mut phase, StepPhase::BeforeHookFailed, stream);
            advance(&mut phase, StepPhase::Skipped, stream);
            result.skipped = true;
        } else {
            advance(&mut phase, StepPhase::BeforeHookOk, stream);
            advance(&mut phase, StepPhase::BodyRunning, stream);
            run_body(
                self.runner.as_ref(),
                &self.artifacts,
                request,
                &mut context,
                &mut result,
            )
            .await;
            let next = if result.failed {
                StepPhase::BodyFailed
            } else {
                StepPhase::BodyOk
            };
            advance(&mut phase, next, stream);
        }

        advance(&mut phase, StepPhase::AfterHookRunning, stream);
        hooks::run_hook(
            HookKind::AfterStep,
            self.runner.as_ref(),
            self.plugins.as_ref(),
            &mut context,
            &mut result,
        )
        .await;
        advance(&mut phase, StepPhase::Done, stream);

        self.events.publish(ExecutionEvent::step_end(
            step,
            result.clone(),
            stream,
            context.snapshot(),
        ));
        info!(
            stream,
            step = %resolved.actual_text,
            failed = result.failed,
            skipped = result.skipped,
            duration_ms = result.execution_time_ms,
            "step finished"
        );

        drop(context);
        result
    }
}

/// Persist one payload on the blocking pool.
async fn persist_artifact(
    artifacts: &ArtifactStore,
    raw: Vec<u8>,
    area: ArtifactArea,
) -> Result<PathBuf, ArtifactError> {
    let store = artifacts.clone();
    tokio::task::spawn_blocking(move || store.persist(&raw, area))
        .await
        .map_err(|e| ArtifactError::Io(io::Error::other(e)))?
}

/// Send the step body to the runner and fold the response into `result`.
async fn run_body(
    runner: &dyn Runner,
    artifacts: &ArtifactStore,
    request: ExecuteStepRequest,
    context: &mut ExecutionContext,
    result: &mut StepResult,
) {
    let stream = context.stream;
    let mut status = runner
        .execute_and_get_status(Message::ExecuteStep(request))
        .await;
    status.messages = result.merge_messages(&status.messages);

    // Artifact paths only ever point at files written here.
    status.screenshot_files.clear();
    status.failure_screenshot_file = None;

    debug!(
        stream,
        count = status.screenshots.len(),
        "persisting step screenshots"
    );
    for (index, raw) in status.screenshots.iter().enumerate() {
        match persist_artifact(artifacts, raw.clone(), ArtifactArea::Screenshots).await {
            Ok(path) => {
                debug!(stream, path = %path.display(), "saved screenshot");
                status.screenshot_files.push(path);
            }
            Err(e) => {
                error!(stream, index, error = %e, "unable to save screenshot");
            }
        }
    }

    if status.failed {
        context.record_step_error(&status.error_message, &status.stack_trace);
        context.set_step_failure();
        result.set_step_failure();
    }

    if status.has_failure_screenshot() {
        let raw = status.failure_screenshot.clone();
        match persist_artifact(artifacts, raw, ArtifactArea::FailureScreenshots).await {
            Ok(path) => {
                debug!(stream, path = %path.display(), "saved failure screenshot");
                status.clear_failure_screenshot();
                status.failure_screenshot_file = Some(path);
            }
            Err(e) => {
                error!(
                    stream,
                    area = ArtifactArea::FailureScreenshots.as_str(),
                    error = %e,
                    "unable to save failure screenshot"
                );
            }
        }
    }

    result.set_execution_result(status);
}
