//! Aggregated result of one step execution.

use crate::protocol::ExecutionStatus;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Failure recorded by a before- or after-step hook.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HookFailure {
    pub error_message: String,
    pub stack_trace: String,
}

impl From<&ExecutionStatus> for HookFailure {
    fn from(status: &ExecutionStatus) -> Self {
        Self {
            error_message: status.error_message.clone(),
            stack_trace: status.stack_trace.clone(),
        }
    }
}

/// Result of a single step: hook slots, body outcome and persisted artifacts.
///
/// Hook outputs live in their own slots so the failing phase can be told
/// apart without reading messages. `messages` holds the ordered output of the
/// step: anything accumulated before the body, then the body's messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepResult {
    pub step_text: String,
    pub failed: bool,
    /// The body never ran because an earlier phase failed.
    pub skipped: bool,
    pub messages: Vec<String>,
    pub pre_hook_messages: Vec<String>,
    pub pre_hook_screenshots: Vec<Vec<u8>>,
    pub pre_hook_failure: Option<HookFailure>,
    pub post_hook_messages: Vec<String>,
    pub post_hook_screenshots: Vec<Vec<u8>>,
    pub post_hook_failure: Option<HookFailure>,
    /// Runner response for the body, with artifact paths filled in.
    pub execution_result: Option<ExecutionStatus>,
    pub execution_time_ms: u64,
}

impl StepResult {
    pub fn new(step_text: impl Into<String>) -> Self {
        Self {
            step_text: step_text.into(),
            ..Self::default()
        }
    }

    pub fn set_step_failure(&mut self) {
        self.failed = true;
    }

    pub fn add_pre_hook_failure(&mut self, outcome: &ExecutionStatus) {
        self.pre_hook_failure = Some(HookFailure::from(outcome));
        self.set_step_failure();
    }

    pub fn add_post_hook_failure(&mut self, outcome: &ExecutionStatus) {
        self.post_hook_failure = Some(HookFailure::from(outcome));
        self.set_step_failure();
    }

    pub fn add_execution_time(&mut self, ms: u64) {
        self.execution_time_ms = self.execution_time_ms.saturating_add(ms);
    }

    /// Messages already on the result, followed by the body's.
    pub fn merge_messages(&self, body_messages: &[String]) -> Vec<String> {
        self.messages
            .iter()
            .chain(body_messages)
            .cloned()
            .collect()
    }

    /// Attach the body response. `status.messages` must already be merged.
    pub fn set_execution_result(&mut self, status: ExecutionStatus) {
        self.messages.clone_from(&status.messages);
        self.add_execution_time(status.execution_time_ms);
        self.execution_result = Some(status);
    }

    /// Persisted body screenshots, in response order.
    pub fn screenshot_files(&self) -> &[PathBuf] {
        self.execution_result
            .as_ref()
            .map(|s| s.screenshot_files.as_slice())
            .unwrap_or_default()
    }

    pub fn failure_screenshot_file(&self) -> Option<&Path> {
        self.execution_result
            .as_ref()
            .and_then(|s| s.failure_screenshot_file.as_deref())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.execution_result
            .as_ref()
            .filter(|s| s.failed)
            .map(|s| s.error_message.as_str())
    }
}
