//! Settings type definitions
//!
//! This module defines the persisted settings document. One document exists
//! per scope (global, project, local); each stores ordered hook
//! configurations keyed by lifecycle event together with version metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::hooks::HookEvent;

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

/// Version assumed for documents without a usable `version` field
pub const LEGACY_VERSION: &str = "0.0.0";

/// Informational `$schema` reference stamped into new documents
pub const SCHEMA_REF: &str = "https://json.schemastore.org/claude-code-settings.json";

/// Timeouts above this many milliseconds are flagged
pub const MAX_RECOMMENDED_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Settings scope, lowest to highest precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsScope {
    /// Per-user settings (~/.claude/settings.json)
    Global,
    /// Per-repository settings, committed (.claude/settings.json)
    Project,
    /// Per-repository settings, untracked (.claude/settings.local.json)
    Local,
}

impl SettingsScope {
    /// All scopes in merge order
    pub fn all() -> [SettingsScope; 3] {
        [
            SettingsScope::Global,
            SettingsScope::Project,
            SettingsScope::Local,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsScope::Global => "global",
            SettingsScope::Project => "project",
            SettingsScope::Local => "local",
        }
    }

    /// Write-target selection used by the CLI layer
    ///
    /// `--global` wins over `--local`; with neither flag the project scope is used.
    pub fn from_flags(global: bool, local: bool) -> Self {
        if global {
            SettingsScope::Global
        } else if local {
            SettingsScope::Local
        } else {
            SettingsScope::Project
        }
    }
}

impl fmt::Display for SettingsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root persisted settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedSettings {
    /// Schema the document claims to follow (informational only)
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema_ref: Option<String>,

    /// Semantic version of the document's schema
    #[serde(default = "current_version")]
    pub version: String,

    /// Ordered hook configurations per event
    #[serde(default)]
    pub hooks: BTreeMap<HookEvent, Vec<HookConfiguration>>,

    /// Timestamps, origin and migration history
    #[serde(default)]
    pub meta: SettingsMeta,

    /// Keys owned by other tools sharing the file, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn current_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

impl VersionedSettings {
    /// Create an empty document at the current schema version
    pub fn new(scope: SettingsScope, now: DateTime<Utc>) -> Self {
        Self {
            schema_ref: Some(SCHEMA_REF.to_string()),
            version: current_version(),
            hooks: BTreeMap::new(),
            meta: SettingsMeta {
                created_at: Some(now),
                updated_at: Some(now),
                source: Some(scope),
                migrations: Vec::new(),
            },
            extra: Map::new(),
        }
    }

    /// Hook configurations registered for an event, in execution order
    pub fn hooks_for(&self, event: HookEvent) -> &[HookConfiguration] {
        self.hooks.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a configuration to the end of an event's list
    pub fn add_hook(&mut self, event: HookEvent, configuration: HookConfiguration) {
        self.hooks.entry(event).or_default().push(configuration);
    }

    /// Append a command to the configuration with the same matcher, or create one
    pub fn add_command(&mut self, event: HookEvent, matcher: Option<String>, command: HookCommand) {
        let configurations = self.hooks.entry(event).or_default();
        match configurations
            .iter_mut()
            .find(|c| c.matcher_str() == matcher.as_deref().unwrap_or_default())
        {
            Some(existing) => existing.hooks.push(command),
            None => configurations.push(HookConfiguration::new(matcher, vec![command])),
        }
    }

    /// Remove a whole configuration; empty event lists are dropped
    pub fn remove_configuration(
        &mut self,
        event: HookEvent,
        index: usize,
    ) -> Option<HookConfiguration> {
        let configurations = self.hooks.get_mut(&event)?;
        if index >= configurations.len() {
            return None;
        }
        let removed = configurations.remove(index);
        if configurations.is_empty() {
            self.hooks.remove(&event);
        }
        Some(removed)
    }

    /// Remove a single command; a configuration left without commands is removed too
    pub fn remove_command(
        &mut self,
        event: HookEvent,
        configuration_index: usize,
        command_index: usize,
    ) -> Option<HookCommand> {
        let configuration = self.hooks.get_mut(&event)?.get_mut(configuration_index)?;
        if command_index >= configuration.hooks.len() {
            return None;
        }
        let removed = configuration.hooks.remove(command_index);
        if configuration.hooks.is_empty() {
            self.remove_configuration(event, configuration_index);
        }
        Some(removed)
    }

    /// Drop every hook (delete is an overwrite with an empty document)
    pub fn clear_hooks(&mut self) {
        self.hooks.clear();
    }

    /// Total number of commands across all events
    pub fn command_count(&self) -> usize {
        self.hooks
            .values()
            .flatten()
            .map(|configuration| configuration.hooks.len())
            .sum()
    }

    /// Stamp the update timestamp and origin scope before persisting
    pub fn touch(&mut self, scope: SettingsScope, now: DateTime<Utc>) {
        if self.meta.created_at.is_none() {
            self.meta.created_at = Some(now);
        }
        self.meta.updated_at = Some(now);
        self.meta.source = Some(scope);
    }
}

/// Document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Scope the document was last written for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SettingsScope>,

    /// Append-only migration history, oldest first
    #[serde(default)]
    pub migrations: Vec<MigrationRecord>,
}

/// Commands grouped under an optional matcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfiguration {
    /// Tool-name pattern; empty or absent means "always apply"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,

    /// Commands executed in order
    #[serde(default)]
    pub hooks: Vec<HookCommand>,
}

impl HookConfiguration {
    pub fn new(matcher: Option<String>, hooks: Vec<HookCommand>) -> Self {
        Self { matcher, hooks }
    }

    /// Matcher as a plain string, empty when absent
    pub fn matcher_str(&self) -> &str {
        self.matcher.as_deref().unwrap_or_default()
    }

    /// Whether this configuration applies to a tool name
    pub fn applies_to(&self, tool_name: &str) -> bool {
        crate::hooks::matcher::matches(self.matcher.as_deref(), tool_name)
    }
}

/// Hook command discriminator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookCommandType {
    /// Shell command
    #[default]
    Command,
}

/// A unit of execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(rename = "type", default)]
    pub kind: HookCommandType,

    /// Shell command line
    pub command: String,

    /// Timeout in milliseconds, consumed by the hook executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl HookCommand {
    /// Create a new command hook
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            kind: HookCommandType::Command,
            command: command.into(),
            timeout: None,
        }
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

impl fmt::Display for HookCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        if let Some(timeout) = self.timeout {
            write!(f, " (timeout {}ms)", timeout)?;
        }
        Ok(())
    }
}

/// Immutable migration log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    /// Version reached by this migration
    pub version: String,

    pub applied_at: DateTime<Utc>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_document_is_current_and_empty() {
        let settings = VersionedSettings::new(SettingsScope::Project, fixed_now());
        assert_eq!(settings.version, CURRENT_SCHEMA_VERSION);
        assert!(settings.hooks.is_empty());
        assert_eq!(settings.meta.source, Some(SettingsScope::Project));
        assert!(settings.meta.migrations.is_empty());
    }

    #[test]
    fn test_scope_from_flags() {
        assert_eq!(SettingsScope::from_flags(true, true), SettingsScope::Global);
        assert_eq!(SettingsScope::from_flags(false, true), SettingsScope::Local);
        assert_eq!(
            SettingsScope::from_flags(false, false),
            SettingsScope::Project
        );
    }

    #[test]
    fn test_add_command_groups_by_matcher() {
        let mut settings = VersionedSettings::new(SettingsScope::Local, fixed_now());
        settings.add_command(
            HookEvent::PreToolUse,
            Some("Bash".to_string()),
            HookCommand::new("echo one"),
        );
        settings.add_command(
            HookEvent::PreToolUse,
            Some("Bash".to_string()),
            HookCommand::new("echo two"),
        );
        settings.add_command(HookEvent::PreToolUse, None, HookCommand::new("echo all"));

        let configurations = settings.hooks_for(HookEvent::PreToolUse);
        assert_eq!(configurations.len(), 2);
        assert_eq!(configurations[0].hooks.len(), 2);
        assert_eq!(configurations[1].matcher, None);
        assert_eq!(settings.command_count(), 3);
    }

    #[test]
    fn test_remove_command_drops_empty_configuration() {
        let mut settings = VersionedSettings::new(SettingsScope::Local, fixed_now());
        settings.add_hook(
            HookEvent::Stop,
            HookConfiguration::new(None, vec![HookCommand::new("notify-send done")]),
        );

        let removed = settings.remove_command(HookEvent::Stop, 0, 0).unwrap();
        assert_eq!(removed.command, "notify-send done");
        assert!(settings.hooks_for(HookEvent::Stop).is_empty());
        assert!(!settings.hooks.contains_key(&HookEvent::Stop));
        assert!(settings.remove_command(HookEvent::Stop, 0, 0).is_none());
    }

    #[test]
    fn test_serialization_preserves_foreign_keys() {
        let json = r#"{
            "$schema": "x",
            "version": "1.0.0",
            "permissions": {"allow": ["Bash(npm test)"]},
            "hooks": {
                "PostToolUse": [
                    {"matcher": "Edit|Write", "hooks": [{"type": "command", "command": "cargo fmt", "timeout": 30000}]}
                ]
            },
            "meta": {"createdAt": "2025-03-01T12:00:00Z", "source": "project", "migrations": []}
        }"#;

        let settings: VersionedSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.extra["permissions"]["allow"][0], "Bash(npm test)");
        assert_eq!(
            settings.hooks_for(HookEvent::PostToolUse)[0].hooks[0].timeout,
            Some(30000)
        );

        let reparsed: VersionedSettings =
            serde_json::from_value(serde_json::to_value(&settings).unwrap()).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[test]
    fn test_touch_keeps_created_at() {
        let mut settings = VersionedSettings::new(SettingsScope::Global, fixed_now());
        let later = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        settings.touch(SettingsScope::Global, later);
        assert_eq!(settings.meta.created_at, Some(fixed_now()));
        assert_eq!(settings.meta.updated_at, Some(later));
    }
}
