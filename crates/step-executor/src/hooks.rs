//! Before/after step hook phase.
//!
//! A hook run notifies plugins that the hook is about to run, asks the runner
//! to execute it, files the outcome into the hook's own slot of the step
//! result, and notifies plugins again with the updated result.

use crate::plugins::PluginHandler;
use crate::runner::Runner;
use step_core::protocol::{StepExecutionEndingRequest, StepExecutionStartingRequest};
use step_core::{ExecutionContext, ExecutionStatus, Message, StepResult};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeStep,
    AfterStep,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeStep => "before_step",
            Self::AfterStep => "after_step",
        }
    }

    /// Lifecycle message for this hook.
    pub fn message(&self, context: ExecutionContext, result: Option<StepResult>) -> Message {
        match self {
            Self::BeforeStep => Message::StepExecutionStarting(StepExecutionStartingRequest {
                current_execution_info: context,
                step_result: result,
            }),
            Self::AfterStep => Message::StepExecutionEnding(StepExecutionEndingRequest {
                current_execution_info: context,
                step_result: result,
            }),
        }
    }
}

/// Run one hook and record its outcome on `result` and `context`.
///
/// Returns the runner's outcome; a failure has already been applied to both
/// the context (cascading flag) and the result (slot-specific failure).
pub async fn run_hook(
    kind: HookKind,
    runner: &dyn Runner,
    plugins: &dyn PluginHandler,
    context: &mut ExecutionContext,
    result: &mut StepResult,
) -> ExecutionStatus {
    let message = kind.message(context.snapshot(), None);
    plugins.notify_plugins(&message);

    let outcome = runner.execute_and_get_status(message).await;
    result.add_execution_time(outcome.execution_time_ms);

    match kind {
        HookKind::BeforeStep => {
            result.pre_hook_messages.clone_from(&outcome.messages);
            result.pre_hook_screenshots.clone_from(&outcome.screenshots);
        }
        HookKind::AfterStep => {
            result.post_hook_messages.clone_from(&outcome.messages);
            result.post_hook_screenshots.clone_from(&outcome.screenshots);
        }
    }

    if outcome.failed {
        info!(
            stream = context.stream,
            hook = kind.as_str(),
            error = %outcome.error_message,
            "hook failed"
        );
        context.set_step_failure();
        match kind {
            HookKind::BeforeStep => result.add_pre_hook_failure(&outcome),
            HookKind::AfterStep => result.add_post_hook_failure(&outcome),
        }
    }

    debug!(
        stream = context.stream,
        hook = kind.as_str(),
        "notifying plugins of hook outcome"
    );
    plugins.notify_plugins(&kind.message(context.snapshot(), Some(result.clone())));

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginBroadcaster;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedRunner {
        outcome: ExecutionStatus,
        received: Mutex<Vec<&'static str>>,
    }

    impl FixedRunner {
        fn new(outcome: ExecutionStatus) -> Self {
            Self {
                outcome,
                received: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Runner for FixedRunner {
        async fn execute_and_get_status(&self, message: Message) -> ExecutionStatus {
            self.received.lock().unwrap().push(message.message_type());
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn failed_before_hook_marks_context_and_pre_slot() {
        let runner = FixedRunner::new(
            ExecutionStatus::failed("setup broke", "trace").with_messages(["hook says hi"]),
        );
        let plugins = PluginBroadcaster::new();
        let mut context = ExecutionContext::new(1);
        let mut result = StepResult::new("step");

        let outcome = run_hook(
            HookKind::BeforeStep,
            &runner,
            &plugins,
            &mut context,
            &mut result,
        )
        .await;

        assert!(outcome.failed);
        assert!(context.is_failed());
        assert!(result.failed);
        assert_eq!(result.pre_hook_messages, vec!["hook says hi"]);
        assert_eq!(
            result.pre_hook_failure.as_ref().unwrap().error_message,
            "setup broke"
        );
        assert!(result.post_hook_failure.is_none());
        assert_eq!(
            *runner.received.lock().unwrap(),
            vec!["StepExecutionStarting"]
        );
    }

    #[tokio::test]
    async fn passing_after_hook_fills_post_slot_only() {
        let mut outcome = ExecutionStatus::passed().with_messages(["cleaned up"]);
        outcome.screenshots = vec![vec![1, 2, 3]];
        outcome.execution_time_ms = 12;
        let runner = FixedRunner::new(outcome);
        let plugins = PluginBroadcaster::new();
        let mut context = ExecutionContext::new(1);
        let mut result = StepResult::new("step");

        run_hook(
            HookKind::AfterStep,
            &runner,
            &plugins,
            &mut context,
            &mut result,
        )
        .await;

        assert!(!context.is_failed());
        assert!(!result.failed);
        assert!(result.pre_hook_messages.is_empty());
        assert_eq!(result.post_hook_messages, vec!["cleaned up"]);
        assert_eq!(result.post_hook_screenshots, vec![vec![1, 2, 3]]);
        assert_eq!(result.execution_time_ms, 12);
        assert_eq!(
            *runner.received.lock().unwrap(),
            vec!["StepExecutionEnding"]
        );
    }

    #[tokio::test]
    async fn plugins_are_notified_before_and_after() {
        let runner = FixedRunner::new(ExecutionStatus::failed("nope", ""));
        let plugins = PluginBroadcaster::new();
        let mut rx = plugins.register();
        let mut context = ExecutionContext::new(1);
        let mut result = StepResult::new("step");

        run_hook(
            HookKind::AfterStep,
            &runner,
            &plugins,
            &mut context,
            &mut result,
        )
        .await;

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(rx.try_recv().is_err());

        assert!(first.step_result().is_none());
        let reported = second.step_result().unwrap();
        assert!(reported.failed);
        assert!(reported.post_hook_failure.is_some());
        match second {
            Message::StepExecutionEnding(req) => assert!(req.current_execution_info.failed),
            other => panic!("unexpected message: {}", other.message_type()),
        }
    }

    #[test]
    fn hook_kind_builds_matching_message() {
        let ctx = ExecutionContext::new(1);
        assert_eq!(
            HookKind::BeforeStep.message(ctx.clone(), None).message_type(),
            "StepExecutionStarting"
        );
        assert_eq!(
            HookKind::AfterStep.message(ctx, None).message_type(),
            "StepExecutionEnding"
        );
    }
}
