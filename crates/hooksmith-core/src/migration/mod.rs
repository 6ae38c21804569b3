//! Schema migration
//!
//! The [`Migrator`] walks a registry of [`MigrationStep`]s from a document's
//! detected version up to the running schema version. Every applied step is
//! appended to `meta.migrations`; the history is never rewritten.
//!
//! Migrations operate on raw JSON so that legacy shapes which no longer
//! deserialize into [`VersionedSettings`](crate::settings::VersionedSettings)
//! can still be upgraded.

mod steps;

pub use steps::{MigrationStep, MigrationTransform, Transformed, builtin_steps};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{SettingsError, SettingsResult};
use crate::settings::types::MigrationRecord;
use crate::version::{SemVer, VersionSource, VersionStatus, VersionTracker};

/// Outcome of [`Migrator::migrate`]
#[derive(Debug, Clone, PartialEq)]
pub struct MigratedResult {
    /// The upgraded (or untouched) document
    pub document: Value,
    /// Version detected before migrating
    pub from_version: SemVer,
    /// Records appended by this call, oldest first
    pub applied: Vec<MigrationRecord>,
}

impl MigratedResult {
    pub fn was_migrated(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Applies the migration chain
#[derive(Debug, Clone)]
pub struct Migrator {
    tracker: VersionTracker,
    steps: Vec<MigrationStep>,
    clock: fn() -> DateTime<Utc>,
}

impl Migrator {
    /// Migrator with the built-in registry
    pub fn new() -> Self {
        Self {
            tracker: VersionTracker::new(),
            steps: builtin_steps(),
            clock: Utc::now,
        }
    }

    /// Migrator with a custom tracker and registry
    ///
    /// Rejects steps that do not move forward and duplicate `from -> to` pairs.
    pub fn with_registry(
        tracker: VersionTracker,
        steps: Vec<MigrationStep>,
    ) -> SettingsResult<Self> {
        for (index, step) in steps.iter().enumerate() {
            if step.to.precedence(&step.from) != Ordering::Greater {
                return Err(SettingsError::InvalidMigrationRegistry(format!(
                    "step {} -> {} does not move forward",
                    step.from, step.to
                )));
            }
            if steps[..index]
                .iter()
                .any(|earlier| earlier.from == step.from && earlier.to == step.to)
            {
                return Err(SettingsError::InvalidMigrationRegistry(format!(
                    "step {} -> {} is registered twice",
                    step.from, step.to
                )));
            }
        }
        Ok(Self {
            tracker,
            steps,
            clock: Utc::now,
        })
    }

    /// Override the timestamp source for migration records
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Bring a document to the running schema version
    ///
    /// Documents that are already current are returned unchanged. When no
    /// registered step continues the chain, the whole call fails with
    /// `UnmigratableVersion`; the caller's document is never half upgraded.
    pub fn migrate(&self, document: Value) -> SettingsResult<MigratedResult> {
        let (detected, status) = self.tracker.classify_document(&document);
        let from_version = detected.version.clone();
        let target = self.tracker.current().clone();

        if status == VersionStatus::Current {
            return Ok(MigratedResult {
                document,
                from_version,
                applied: Vec::new(),
            });
        }

        if !document.is_object() {
            return Err(SettingsError::MigrationFailed {
                from: from_version.to_string(),
                to: target.to_string(),
                message: "settings document must be a JSON object".to_string(),
            });
        }

        tracing::debug!(
            "Migrating settings from {} ({}) to {}",
            from_version,
            status,
            target
        );

        let mut document = document;
        let mut current = from_version.clone();
        let mut applied = Vec::new();

        while current != target {
            let step = self.next_step(&current).ok_or_else(|| {
                SettingsError::UnmigratableVersion {
                    from: match &detected.source {
                        VersionSource::Malformed(raw) => raw.clone(),
                        _ => from_version.to_string(),
                    },
                    target: target.to_string(),
                }
            })?;

            let Transformed {
                document: upgraded,
                mut changes,
            } = (step.transform)(document).map_err(|message| SettingsError::MigrationFailed {
                from: step.from.to_string(),
                to: step.to.to_string(),
                message,
            })?;

            if applied.is_empty() {
                if let VersionSource::Malformed(raw) = &detected.source {
                    changes.insert(0, format!("Replaced malformed version {}", raw));
                }
            }

            let record = MigrationRecord {
                version: step.to.to_string(),
                applied_at: (self.clock)(),
                description: step.description.clone(),
                changes: (!changes.is_empty()).then_some(changes),
            };
            document = stamp(upgraded, step, &record)?;

            tracing::info!("Applied settings migration {} -> {}", step.from, step.to);
            applied.push(record);
            current = step.to.clone();
        }

        Ok(MigratedResult {
            document,
            from_version,
            applied,
        })
    }

    /// The step leaving `current` with the lowest target above it
    fn next_step(&self, current: &SemVer) -> Option<&MigrationStep> {
        self.steps
            .iter()
            .filter(|step| &step.from == current)
            .filter(|step| step.to.precedence(current) == Ordering::Greater)
            .min_by(|a, b| a.to.precedence(&b.to))
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Set the version field and append the record to `meta.migrations`
fn stamp(document: Value, step: &MigrationStep, record: &MigrationRecord) -> SettingsResult<Value> {
    let failed = |message: String| SettingsError::MigrationFailed {
        from: step.from.to_string(),
        to: step.to.to_string(),
        message,
    };

    let Value::Object(mut root) = document else {
        return Err(failed("transform did not return a JSON object".to_string()));
    };
    root.insert("version".to_string(), Value::String(step.to.to_string()));

    let meta = root
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        return Err(failed("meta must be a JSON object".to_string()));
    }
    let history = meta
        .as_object_mut()
        .map(|meta| {
            meta.entry("migrations")
                .or_insert_with(|| Value::Array(Vec::new()))
        })
        .and_then(Value::as_array_mut)
        .ok_or_else(|| failed("meta.migrations must be an array".to_string()))?;

    if let Some(last) = history
        .last()
        .and_then(|last| last.get("version"))
        .and_then(Value::as_str)
        .and_then(|v| SemVer::parse(v).ok())
    {
        if last.precedence(&step.to) != Ordering::Less {
            return Err(failed(format!(
                "migration history already records version {}",
                last
            )));
        }
    }

    history.push(serde_json::to_value(record)?);
    Ok(Value::Object(root))
}
