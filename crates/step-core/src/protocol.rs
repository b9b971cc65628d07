//! Messages exchanged with the runner process.
//!
//! Every request is a [`Message`]; the runner answers each one with an
//! [`ExecutionStatus`]. Messages serialize as
//! `{"messageType": "...", "payload": {...}}` so they can ride any transport.

use crate::context::ExecutionContext;
use crate::result::StepResult;
use crate::types::{Parameter, ResolvedStep};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Body of an `ExecuteStep` message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecuteStepRequest {
    pub actual_step_text: String,
    pub parsed_step_text: String,
    pub parameters: Vec<Parameter>,
}

impl ExecuteStepRequest {
    pub fn from_resolved(step: &ResolvedStep) -> Self {
        Self {
            actual_step_text: step.actual_text.clone(),
            parsed_step_text: step.parsed_text.clone(),
            parameters: step.parameters(),
        }
    }
}

/// Body of the before-step lifecycle message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionStartingRequest {
    pub current_execution_info: ExecutionContext,
    /// Filled in for the second plugin notification, once the hook ran.
    pub step_result: Option<StepResult>,
}

/// Body of the after-step lifecycle message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionEndingRequest {
    pub current_execution_info: ExecutionContext,
    pub step_result: Option<StepResult>,
}

/// Protocol envelope. Exactly one payload per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "messageType", content = "payload")]
pub enum Message {
    ExecuteStep(ExecuteStepRequest),
    StepExecutionStarting(StepExecutionStartingRequest),
    StepExecutionEnding(StepExecutionEndingRequest),
}

impl Message {
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ExecuteStep(_) => "ExecuteStep",
            Self::StepExecutionStarting(_) => "StepExecutionStarting",
            Self::StepExecutionEnding(_) => "StepExecutionEnding",
        }
    }

    pub fn step_result(&self) -> Option<&StepResult> {
        match self {
            Self::StepExecutionStarting(req) => req.step_result.as_ref(),
            Self::StepExecutionEnding(req) => req.step_result.as_ref(),
            Self::ExecuteStep(_) => None,
        }
    }
}

/// Runner response for a step body or a hook.
///
/// The `*_file(s)` fields are never set by the runner; the executor fills
/// them in after persisting the raw payloads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub failed: bool,
    /// Carried through from the runner; not acted upon.
    pub recoverable: bool,
    pub error_message: String,
    pub stack_trace: String,
    pub execution_time_ms: u64,
    pub messages: Vec<String>,
    /// Raw image payloads captured during execution.
    pub screenshots: Vec<Vec<u8>>,
    /// Raw image captured at the point of failure. Empty when absent.
    pub failure_screenshot: Vec<u8>,
    /// Legacy single-screenshot buffer, cleared together with `failure_screenshot`.
    pub screenshot: Vec<u8>,
    pub screenshot_files: Vec<PathBuf>,
    pub failure_screenshot_file: Option<PathBuf>,
}

impl ExecutionStatus {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn failed(error_message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self {
            failed: true,
            error_message: error_message.into(),
            stack_trace: stack_trace.into(),
            ..Self::default()
        }
    }

    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_screenshots(mut self, screenshots: Vec<Vec<u8>>) -> Self {
        self.screenshots = screenshots;
        self
    }

    pub fn with_failure_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.failure_screenshot = bytes;
        self
    }

    pub fn has_failure_screenshot(&self) -> bool {
        !self.failure_screenshot.is_empty()
    }

    /// Drop the raw failure payloads once they have been persisted.
    pub fn clear_failure_screenshot(&mut self) {
        self.failure_screenshot = Vec::new();
        self.screenshot = Vec::new();
    }
}
