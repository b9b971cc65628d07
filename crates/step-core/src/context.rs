//! Per-stream execution context.
//!
//! One [`ExecutionContext`] exists per stream. The executor installs a
//! [`StepInfo`] while a step is in flight and clears it afterwards; failures
//! cascade from the step up to the scenario, the specification and the
//! context itself. Snapshots (plain clones) are sent to plugins and events.

use crate::protocol::ExecuteStepRequest;
use serde::{Deserialize, Serialize};

/// Specification currently executing on this stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecInfo {
    pub name: String,
    pub file_name: String,
    pub is_failed: bool,
    pub tags: Vec<String>,
}

/// Scenario currently executing on this stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub is_failed: bool,
    pub tags: Vec<String>,
}

/// Step currently executing on this stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub step: ExecuteStepRequest,
    pub is_failed: bool,
    pub error_message: String,
    pub stack_trace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub stream: u32,
    pub project_name: String,
    pub current_spec: Option<SpecInfo>,
    pub current_scenario: Option<ScenarioInfo>,
    pub current_step: Option<StepInfo>,
    /// Cascading failure flag. Once set it stays set until the caller resets it.
    pub failed: bool,
}

impl ExecutionContext {
    pub fn new(stream: u32) -> Self {
        Self {
            stream,
            ..Self::default()
        }
    }

    /// Install a fresh, not-failed step record.
    pub fn begin_step(&mut self, request: ExecuteStepRequest) {
        self.current_step = Some(StepInfo {
            step: request,
            ..StepInfo::default()
        });
    }

    pub fn clear_current_step(&mut self) {
        self.current_step = None;
    }

    /// Record the runner's diagnostics on the step in flight.
    pub fn record_step_error(&mut self, error_message: &str, stack_trace: &str) {
        if let Some(step) = self.current_step.as_mut() {
            step.error_message = error_message.to_string();
            step.stack_trace = stack_trace.to_string();
        }
    }

    /// Mark the step, scenario, specification and context failed.
    pub fn set_step_failure(&mut self) {
        if let Some(step) = self.current_step.as_mut() {
            step.is_failed = true;
        }
        if let Some(scenario) = self.current_scenario.as_mut() {
            scenario.is_failed = true;
        }
        if let Some(spec) = self.current_spec.as_mut() {
            spec.is_failed = true;
        }
        self.failed = true;
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
