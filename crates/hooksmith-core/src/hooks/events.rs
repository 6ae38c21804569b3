//! Hook event types
//!
//! Defines the lifecycle events a settings document can attach hooks to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hook events that can carry hook configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before tool execution
    PreToolUse,
    /// After tool execution
    PostToolUse,
    /// User submits a prompt
    UserPromptSubmit,
    /// Notification event
    Notification,
    /// Main agent is stopping
    Stop,
    /// Sub-agent stops
    SubagentStop,
    /// Session starts
    SessionStart,
    /// Session ends
    SessionEnd,
    /// Before context compaction
    PreCompact,
}

impl HookEvent {
    /// Name used as the key under `hooks` in the settings file
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::Notification => "Notification",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
            HookEvent::PreCompact => "PreCompact",
        }
    }

    /// Whether configurations under this event are filtered by a tool matcher
    pub fn supports_matcher(&self) -> bool {
        matches!(self, HookEvent::PreToolUse | HookEvent::PostToolUse)
    }

    /// Get a human-readable description of this event
    pub fn description(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "Before tool execution",
            HookEvent::PostToolUse => "After tool execution",
            HookEvent::UserPromptSubmit => "User submits a prompt",
            HookEvent::Notification => "Notification event",
            HookEvent::Stop => "Agent is stopping",
            HookEvent::SubagentStop => "Sub-agent stops",
            HookEvent::SessionStart => "Session starts",
            HookEvent::SessionEnd => "Session ends",
            HookEvent::PreCompact => "Before context compaction",
        }
    }

    /// Returns all possible hook events
    pub fn all() -> &'static [HookEvent] {
        &[
            HookEvent::PreToolUse,
            HookEvent::PostToolUse,
            HookEvent::UserPromptSubmit,
            HookEvent::Notification,
            HookEvent::Stop,
            HookEvent::SubagentStop,
            HookEvent::SessionStart,
            HookEvent::SessionEnd,
            HookEvent::PreCompact,
        ]
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook event '{0}'")]
pub struct UnknownHookEvent(pub String);

impl FromStr for HookEvent {
    type Err = UnknownHookEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::all()
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownHookEvent(s.to_string()))
    }
}
