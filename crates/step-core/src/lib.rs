pub mod artifacts;
pub mod config;
pub mod context;
pub mod events;
pub mod protocol;
pub mod result;
pub mod types;

pub use artifacts::{ArtifactArea, ArtifactError, ArtifactStore};
pub use config::{Config, ConfigProvider};
pub use context::ExecutionContext;
pub use events::{EventType, ExecutionEvent};
pub use protocol::{ExecuteStepRequest, ExecutionStatus, Message};
pub use result::{HookFailure, StepResult};
pub use types::*;
