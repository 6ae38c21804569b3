//! Settings document validation
//!
//! Validation runs on the raw JSON document so that every problem can be
//! reported with its path, including shapes that would not deserialize. All
//! issues are collected; nothing stops at the first error.

pub mod patterns;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::error::{IssueLocation, SettingsError, SettingsResult};
use crate::hooks::{HookEvent, matcher};
use crate::settings::types::{MAX_RECOMMENDED_TIMEOUT_MS, SettingsScope, VersionedSettings};
use crate::version::SemVer;

pub use patterns::{DangerousMatch, check_dangerous_patterns};

/// Rule family an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Structure,
    Event,
    Matcher,
    Security,
    Timeout,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Structure => "structure",
            IssueCategory::Event => "event",
            IssueCategory::Matcher => "matcher",
            IssueCategory::Security => "security",
            IssueCategory::Timeout => "timeout",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Location such as `hooks.PreToolUse[0].hooks[1].command`
    pub path: String,
    pub message: String,
    pub category: IssueCategory,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>, category: IssueCategory) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            category,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.path, self.message)
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggestions: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Convert errors into a `ValidationFailed` error, or `Ok(self)` when valid
    pub fn into_result(self, path: Option<PathBuf>) -> SettingsResult<Self> {
        if self.valid {
            return Ok(self);
        }
        let issues = self
            .errors
            .iter()
            .map(|issue| IssueLocation {
                path: issue.path.clone(),
                message: format!("[{}] {}", issue.category, issue.message),
            })
            .collect();
        Err(SettingsError::validation(path, issues))
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Validator behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Treat dangerous commands as errors instead of warnings
    pub strict: bool,
}

/// Structural and custom-rule validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Validator that rejects dangerous commands
    pub fn strict() -> Self {
        Self::with_options(ValidatorOptions { strict: true })
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Validate a raw settings document
    pub fn validate(&self, document: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();

        let Some(root) = document.as_object() else {
            result.errors.push(ValidationIssue::new(
                "$",
                "settings document must be a JSON object",
                IssueCategory::Structure,
            ));
            return result.finish();
        };

        self.check_header(root, &mut result);

        match root.get("hooks") {
            None => {}
            Some(Value::Object(hooks)) => {
                for (event_name, configurations) in hooks {
                    self.check_event(event_name, configurations, &mut result);
                }
            }
            Some(_) => result.errors.push(ValidationIssue::new(
                "hooks",
                "hooks must be an object keyed by event name",
                IssueCategory::Structure,
            )),
        }

        result.finish()
    }

    /// Validate a typed document
    pub fn validate_settings(&self, settings: &VersionedSettings) -> SettingsResult<ValidationResult> {
        let document = serde_json::to_value(settings)?;
        Ok(self.validate(&document))
    }

    fn check_header(&self, root: &Map<String, Value>, result: &mut ValidationResult) {
        match root.get("version") {
            None => {}
            Some(Value::String(raw)) => {
                if let Err(err) = SemVer::parse(raw) {
                    result.errors.push(ValidationIssue::new(
                        "version",
                        err.to_string(),
                        IssueCategory::Structure,
                    ));
                }
            }
            Some(_) => result.errors.push(ValidationIssue::new(
                "version",
                "version must be a string",
                IssueCategory::Structure,
            )),
        }

        if let Some(schema) = root.get("$schema") {
            if !schema.is_string() {
                result.errors.push(ValidationIssue::new(
                    "$schema",
                    "$schema must be a string",
                    IssueCategory::Structure,
                ));
            }
        }

        match root.get("meta") {
            None => {}
            Some(Value::Object(meta)) => self.check_meta(meta, result),
            Some(_) => result.errors.push(ValidationIssue::new(
                "meta",
                "meta must be an object",
                IssueCategory::Structure,
            )),
        }
    }

    fn check_meta(&self, meta: &Map<String, Value>, result: &mut ValidationResult) {
        for key in ["createdAt", "updatedAt"] {
            match meta.get(key) {
                None | Some(Value::Null) => {}
                Some(value) => check_timestamp(&format!("meta.{}", key), value, result),
            }
        }

        match meta.get("source") {
            None | Some(Value::Null) => {}
            Some(Value::String(source))
                if SettingsScope::all()
                    .iter()
                    .any(|scope| scope.as_str() == source.as_str()) => {}
            Some(other) => result.errors.push(ValidationIssue::new(
                "meta.source",
                format!("source must be one of global, project, local (got {})", other),
                IssueCategory::Structure,
            )),
        }

        match meta.get("migrations") {
            None => {}
            Some(Value::Array(records)) => {
                for (index, record) in records.iter().enumerate() {
                    check_migration_record(&format!("meta.migrations[{}]", index), record, result);
                }
            }
            Some(_) => result.errors.push(ValidationIssue::new(
                "meta.migrations",
                "migrations must be an array",
                IssueCategory::Structure,
            )),
        }
    }

    fn check_event(&self, event_name: &str, configurations: &Value, result: &mut ValidationResult) {
        let path = format!("hooks.{}", event_name);

        let event = match event_name.parse::<HookEvent>() {
            Ok(event) => Some(event),
            Err(err) => {
                result
                    .errors
                    .push(ValidationIssue::new(&path, err.to_string(), IssueCategory::Event));
                None
            }
        };

        let Some(configurations) = configurations.as_array() else {
            result.errors.push(ValidationIssue::new(
                &path,
                "event must map to an array of hook configurations",
                IssueCategory::Structure,
            ));
            return;
        };

        for (index, configuration) in configurations.iter().enumerate() {
            self.check_configuration(
                event,
                &format!("{}[{}]", path, index),
                configuration,
                result,
            );
        }
    }

    fn check_configuration(
        &self,
        event: Option<HookEvent>,
        path: &str,
        configuration: &Value,
        result: &mut ValidationResult,
    ) {
        let Some(configuration) = configuration.as_object() else {
            result.errors.push(ValidationIssue::new(
                path,
                "hook configuration must be an object",
                IssueCategory::Structure,
            ));
            return;
        };

        let matcher_path = format!("{}.matcher", path);
        match configuration.get("matcher") {
            None | Some(Value::Null) => {}
            Some(Value::String(pattern)) => {
                self.check_matcher(event, &matcher_path, pattern, result)
            }
            Some(_) => result.errors.push(ValidationIssue::new(
                matcher_path,
                "matcher must be a string",
                IssueCategory::Matcher,
            )),
        }

        let hooks_path = format!("{}.hooks", path);
        let Some(commands) = configuration.get("hooks").and_then(Value::as_array) else {
            result.errors.push(ValidationIssue::new(
                hooks_path,
                "hooks must be an array of commands",
                IssueCategory::Structure,
            ));
            return;
        };

        for (index, command) in commands.iter().enumerate() {
            self.check_command(&format!("{}[{}]", hooks_path, index), command, result);
        }
    }

    fn check_matcher(
        &self,
        event: Option<HookEvent>,
        path: &str,
        pattern: &str,
        result: &mut ValidationResult,
    ) {
        let Some(event) = event else {
            return;
        };
        if matcher::is_wildcard(Some(pattern)) {
            return;
        }

        if event.supports_matcher() {
            if let Err(err) = matcher::compile(Some(pattern)) {
                result.errors.push(ValidationIssue::new(
                    path,
                    format!("invalid matcher pattern '{}': {}", pattern, err),
                    IssueCategory::Matcher,
                ));
            }
        } else {
            result.suggestions.push(ValidationIssue::new(
                path,
                format!(
                    "{} hooks ignore matchers; remove '{}' or move the hook to a tool event",
                    event, pattern
                ),
                IssueCategory::Matcher,
            ));
        }
    }

    fn check_command(&self, path: &str, command: &Value, result: &mut ValidationResult) {
        let Some(command) = command.as_object() else {
            result.errors.push(ValidationIssue::new(
                path,
                "hook command must be an object",
                IssueCategory::Structure,
            ));
            return;
        };

        match command.get("type").and_then(Value::as_str) {
            Some("command") => {}
            Some(other) => result.errors.push(ValidationIssue::new(
                format!("{}.type", path),
                format!("unsupported hook type '{}', expected 'command'", other),
                IssueCategory::Structure,
            )),
            None => result.errors.push(ValidationIssue::new(
                format!("{}.type", path),
                "hook type is required and must be 'command'",
                IssueCategory::Structure,
            )),
        }

        let command_path = format!("{}.command", path);
        match command.get("command").and_then(Value::as_str) {
            Some(line) if !line.trim().is_empty() => {
                for found in check_dangerous_patterns(line) {
                    let issue = ValidationIssue::new(
                        &command_path,
                        format!("dangerous command ({}): {}", found.reason, line),
                        IssueCategory::Security,
                    );
                    if self.options.strict {
                        result.errors.push(issue);
                    } else {
                        result.warnings.push(issue);
                    }
                }
            }
            _ => result.errors.push(ValidationIssue::new(
                command_path,
                "command must be a non-empty string",
                IssueCategory::Structure,
            )),
        }

        if let Some(timeout) = command.get("timeout") {
            check_timeout(&format!("{}.timeout", path), timeout, result);
        }
    }
}

fn check_timestamp(path: &str, value: &Value, result: &mut ValidationResult) {
    let parsed = value
        .as_str()
        .map(|raw| raw.parse::<DateTime<Utc>>().is_ok());
    if parsed != Some(true) {
        result.errors.push(ValidationIssue::new(
            path,
            format!("expected an ISO-8601 timestamp, got {}", value),
            IssueCategory::Structure,
        ));
    }
}

fn check_migration_record(path: &str, record: &Value, result: &mut ValidationResult) {
    let Some(record) = record.as_object() else {
        result.errors.push(ValidationIssue::new(
            path,
            "migration record must be an object",
            IssueCategory::Structure,
        ));
        return;
    };

    let version_path = format!("{}.version", path);
    match record.get("version").and_then(Value::as_str) {
        Some(raw) => {
            if let Err(err) = SemVer::parse(raw) {
                result.errors.push(ValidationIssue::new(
                    version_path,
                    err.to_string(),
                    IssueCategory::Structure,
                ));
            }
        }
        None => result.errors.push(ValidationIssue::new(
            version_path,
            "migration record needs a version string",
            IssueCategory::Structure,
        )),
    }

    let applied_at_path = format!("{}.appliedAt", path);
    match record.get("appliedAt") {
        Some(value) => check_timestamp(&applied_at_path, value, result),
        None => result.errors.push(ValidationIssue::new(
            applied_at_path,
            "migration record needs an appliedAt timestamp",
            IssueCategory::Structure,
        )),
    }

    if !record.get("description").is_some_and(Value::is_string) {
        result.errors.push(ValidationIssue::new(
            format!("{}.description", path),
            "migration record needs a description string",
            IssueCategory::Structure,
        ));
    }

    match record.get("changes") {
        None | Some(Value::Null) => {}
        Some(Value::Array(changes)) if changes.iter().all(Value::is_string) => {}
        Some(_) => result.errors.push(ValidationIssue::new(
            format!("{}.changes", path),
            "changes must be an array of strings",
            IssueCategory::Structure,
        )),
    }
}

fn check_timeout(path: &str, timeout: &Value, result: &mut ValidationResult) {
    if timeout.is_null() {
        return;
    }
    match timeout.as_u64() {
        Some(ms) if ms > MAX_RECOMMENDED_TIMEOUT_MS => result.warnings.push(ValidationIssue::new(
            path,
            format!(
                "timeout of {}ms exceeds one hour ({}ms)",
                ms, MAX_RECOMMENDED_TIMEOUT_MS
            ),
            IssueCategory::Timeout,
        )),
        Some(_) => {}
        None if timeout.as_f64().is_some_and(|ms| ms < 0.0) => {
            result.errors.push(ValidationIssue::new(
                path,
                "timeout must not be negative",
                IssueCategory::Timeout,
            ))
        }
        None => result.errors.push(ValidationIssue::new(
            path,
            "timeout must be a whole number of milliseconds",
            IssueCategory::Timeout,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "$schema": "https://json.schemastore.org/claude-code-settings.json",
            "version": "1.0.0",
            "hooks": {
                "PreToolUse": [
                    {"matcher": "Edit|Write", "hooks": [{"type": "command", "command": "cargo fmt"}]}
                ],
                "Stop": [
                    {"hooks": [{"type": "command", "command": "notify-send done", "timeout": 5000}]}
                ]
            },
            "meta": {"migrations": []}
        })
    }

    #[test]
    fn test_valid_document() {
        let result = Validator::new().validate(&valid_document());
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_object_is_valid() {
        assert!(Validator::new().validate(&json!({})).valid);
    }

    #[test]
    fn test_rm_rf_is_security_warning() {
        let document = json!({
            "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "rm -rf /"}]}]}
        });
        let result = Validator::new().validate(&document);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].category, IssueCategory::Security);
        assert_eq!(result.warnings[0].path, "hooks.Stop[0].hooks[0].command");
    }

    #[test]
    fn test_strict_mode_promotes_security_warnings() {
        let document = json!({
            "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "mkfs.ext4 /dev/sdb"}]}]}
        });
        let result = Validator::strict().validate(&document);

        assert!(!result.valid);
        assert_eq!(result.errors[0].category, IssueCategory::Security);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_negative_timeout_is_error() {
        let document = json!({
            "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "ls", "timeout": -1}]}]}
        });
        let result = Validator::new().validate(&document);

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].category, IssueCategory::Timeout);
        assert_eq!(result.errors[0].path, "hooks.Stop[0].hooks[0].timeout");
    }

    #[test]
    fn test_long_timeout_is_warning() {
        let document = json!({
            "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "ls", "timeout": 3_600_001}]}]}
        });
        let result = Validator::new().validate(&document);

        assert!(result.valid);
        assert_eq!(result.warnings[0].category, IssueCategory::Timeout);
    }

    #[test]
    fn test_timeout_at_limit_is_fine() {
        let document = json!({
            "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "ls", "timeout": 3_600_000}]}]}
        });
        let result = Validator::new().validate(&document);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_matcher_regex() {
        let document = json!({
            "hooks": {"PreToolUse": [{"matcher": "Bash(", "hooks": [{"type": "command", "command": "ls"}]}]}
        });
        let result = Validator::new().validate(&document);

        assert!(!result.valid);
        assert_eq!(result.errors[0].category, IssueCategory::Matcher);
        assert!(result.errors[0].message.contains("Bash("));
    }

    #[test]
    fn test_matcher_on_non_tool_event_is_suggestion() {
        let document = json!({
            "hooks": {"Stop": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "ls"}]}]}
        });
        let result = Validator::new().validate(&document);

        assert!(result.valid);
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].path, "hooks.Stop[0].matcher");
    }

    #[test]
    fn test_collects_all_structural_errors() {
        let document = json!({
            "version": 3,
            "hooks": {
                "OnSave": [],
                "PreToolUse": [
                    "bare",
                    {"matcher": 7, "hooks": [{"type": "script", "command": ""}]},
                    {"matcher": "Edit"}
                ]
            }
        });
        let result = Validator::new().validate(&document);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();

        assert!(!result.valid);
        assert!(paths.contains(&"version"));
        assert!(paths.contains(&"hooks.OnSave"));
        assert!(paths.contains(&"hooks.PreToolUse[0]"));
        assert!(paths.contains(&"hooks.PreToolUse[1].matcher"));
        assert!(paths.contains(&"hooks.PreToolUse[1].hooks[0].type"));
        assert!(paths.contains(&"hooks.PreToolUse[1].hooks[0].command"));
        assert!(paths.contains(&"hooks.PreToolUse[2].hooks"));
        assert_eq!(result.error_count(), 7);
    }

    #[test]
    fn test_non_object_hooks() {
        let result = Validator::new().validate(&json!({"hooks": []}));
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "hooks");
    }

    #[test]
    fn test_meta_fields_are_checked() {
        let document = json!({
            "version": "1.0.0",
            "hooks": {},
            "meta": {
                "createdAt": "yesterday",
                "source": "team",
                "migrations": [{"version": "1.0.0"}, "bare"]
            }
        });
        let result = Validator::new().validate(&document);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();

        assert!(!result.valid);
        assert_eq!(
            paths,
            vec![
                "meta.createdAt",
                "meta.source",
                "meta.migrations[0].appliedAt",
                "meta.migrations[0].description",
                "meta.migrations[1]",
            ]
        );
        assert!(
            result
                .errors
                .iter()
                .all(|issue| issue.category == IssueCategory::Structure)
        );
    }

    #[test]
    fn test_well_formed_meta_passes() {
        let document = json!({
            "version": "1.0.0",
            "meta": {
                "createdAt": "2025-03-01T12:00:00Z",
                "updatedAt": "2025-03-02T08:15:00.250Z",
                "source": "local",
                "migrations": [{
                    "version": "1.0.0",
                    "appliedAt": "2025-03-01T12:00:00Z",
                    "description": "Normalize legacy hook entries",
                    "changes": ["Added version field"]
                }]
            }
        });
        assert!(Validator::new().validate(&document).valid);
    }

    #[test]
    fn test_into_result_maps_to_settings_error() {
        let result = Validator::new().validate(&json!([]));
        let err = result.into_result(None).unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].path, "$");
    }

    #[test]
    fn test_validate_typed_settings() {
        use crate::settings::types::{HookCommand, SettingsScope};
        use chrono::Utc;

        let mut settings = VersionedSettings::new(SettingsScope::Project, Utc::now());
        settings.add_command(HookEvent::PostToolUse, None, HookCommand::new("cargo check"));

        let result = Validator::new().validate_settings(&settings).unwrap();
        assert!(result.valid);
    }
}
