//! Step execution core.
//!
//! Drives one step through before-hook, body and after-hook against a
//! [`Runner`], notifying plugins and the event bus along the way.
//! Each stream owns one [`StepExecutor`]; streams run in parallel.

pub mod events;
pub mod executor;
pub mod hooks;
pub mod logging;
pub mod plugins;
pub mod runner;

pub use events::{BroadcastEventBus, EventBus};
pub use executor::StepExecutor;
pub use hooks::HookKind;
pub use plugins::{PluginBroadcaster, PluginHandler};
pub use runner::Runner;
