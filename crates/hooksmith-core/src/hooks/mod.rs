//! Hook vocabulary shared by the settings engine
//!
//! The engine never executes hooks. It only needs to know which lifecycle
//! events exist and how a configuration's matcher selects tool names.

pub mod events;
pub mod matcher;

pub use events::{HookEvent, UnknownHookEvent};
