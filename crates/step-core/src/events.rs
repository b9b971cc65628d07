//! Step lifecycle events published to the event bus.

use crate::context::ExecutionContext;
use crate::result::StepResult;
use crate::types::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    StepStart,
    StepEnd,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StepStart => "STEP_START",
            Self::StepEnd => "STEP_END",
        }
    }
}

/// An event emitted around a single step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub event_type: EventType,
    pub step: Step,
    /// Final result; only present on `StepEnd`.
    pub result: Option<StepResult>,
    pub stream: u32,
    pub execution_info: ExecutionContext,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    pub fn step_start(step: Step, stream: u32, execution_info: ExecutionContext) -> Self {
        Self {
            event_type: EventType::StepStart,
            step,
            result: None,
            stream,
            execution_info,
            timestamp: Utc::now(),
        }
    }

    pub fn step_end(
        step: Step,
        result: StepResult,
        stream: u32,
        execution_info: ExecutionContext,
    ) -> Self {
        Self {
            event_type: EventType::StepEnd,
            step,
            result: Some(result),
            stream,
            execution_info,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_correctly() {
        assert_eq!(
            serde_json::to_string(&EventType::StepStart).unwrap(),
            "\"STEP_START\""
        );
        assert_eq!(EventType::StepEnd.as_str(), "STEP_END");
    }

    #[test]
    fn step_start_has_no_result() {
        let event = ExecutionEvent::step_start(Step::default(), 3, ExecutionContext::new(3));
        assert_eq!(event.event_type, EventType::StepStart);
        assert!(event.result.is_none());
        assert_eq!(event.stream, 3);
    }

    #[test]
    fn step_end_carries_result() {
        let event = ExecutionEvent::step_end(
            Step::default(),
            StepResult::new("done"),
            1,
            ExecutionContext::new(1),
        );
        assert_eq!(event.result.unwrap().step_text, "done");
    }
}
