//! Built-in migration registry
//!
//! Adding a schema version means adding one entry to [`builtin_steps`].

use serde_json::{Map, Value, json};

use crate::error::SettingsResult;
use crate::settings::types::{CURRENT_SCHEMA_VERSION, LEGACY_VERSION, SCHEMA_REF};
use crate::version::SemVer;

/// Output of a transform: the upgraded document and what changed
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub document: Value,
    pub changes: Vec<String>,
}

/// Pure transform from one schema shape to the next
///
/// Receives a JSON object and must not look at migration history.
pub type MigrationTransform = fn(Value) -> Result<Transformed, String>;

/// One registry entry
#[derive(Debug, Clone)]
pub struct MigrationStep {
    pub from: SemVer,
    pub to: SemVer,
    pub description: String,
    pub transform: MigrationTransform,
}

impl MigrationStep {
    pub fn new(
        from: &str,
        to: &str,
        description: impl Into<String>,
        transform: MigrationTransform,
    ) -> SettingsResult<Self> {
        Ok(Self {
            from: SemVer::parse(from)?,
            to: SemVer::parse(to)?,
            description: description.into(),
            transform,
        })
    }
}

/// The registry shipped with this build
pub fn builtin_steps() -> Vec<MigrationStep> {
    vec![MigrationStep {
        from: SemVer::legacy(),
        to: SemVer::current(),
        description: format!(
            "Upgrade unversioned settings ({}) to schema {}",
            LEGACY_VERSION, CURRENT_SCHEMA_VERSION
        ),
        transform: legacy_to_v1,
    }]
}

/// Unversioned documents to 1.0.0
///
/// Legacy files listed hooks directly under an event, either as bare command
/// strings or as `{ "command": ... }` objects. Both are wrapped into a
/// matcher-less configuration. Entries of any other shape are left for the
/// validator to report.
fn legacy_to_v1(document: Value) -> Result<Transformed, String> {
    let Value::Object(mut root) = document else {
        return Err("settings document must be a JSON object".to_string());
    };
    let mut changes = Vec::new();

    if !root.contains_key("$schema") {
        root.insert("$schema".to_string(), Value::String(SCHEMA_REF.to_string()));
        changes.push("Added $schema reference".to_string());
    }

    if let Some(Value::Object(hooks)) = root.get_mut("hooks") {
        for (event, entries) in hooks.iter_mut() {
            let Value::Array(entries) = entries else {
                continue;
            };
            let mut wrapped = 0usize;
            for entry in entries.iter_mut() {
                if let Some(configuration) = wrap_legacy_entry(entry) {
                    *entry = configuration;
                    wrapped += 1;
                }
            }
            if wrapped > 0 {
                changes.push(format!(
                    "Wrapped {} legacy hook entr{} under {}",
                    wrapped,
                    if wrapped == 1 { "y" } else { "ies" },
                    event
                ));
            }
        }
    }

    Ok(Transformed {
        document: Value::Object(root),
        changes,
    })
}

fn wrap_legacy_entry(entry: &Value) -> Option<Value> {
    match entry {
        Value::String(command) => Some(json!({
            "matcher": "",
            "hooks": [{ "type": "command", "command": command }],
        })),
        Value::Object(fields) if fields.contains_key("command") && !fields.contains_key("hooks") => {
            let mut command = Map::new();
            command.insert(
                "type".to_string(),
                fields
                    .get("type")
                    .cloned()
                    .unwrap_or_else(|| Value::String("command".to_string())),
            );
            command.insert("command".to_string(), fields["command"].clone());
            if let Some(timeout) = fields.get("timeout") {
                command.insert("timeout".to_string(), timeout.clone());
            }
            Some(json!({
                "matcher": fields.get("matcher").cloned().unwrap_or_else(|| Value::String(String::new())),
                "hooks": [Value::Object(command)],
            }))
        }
        _ => None,
    }
}
