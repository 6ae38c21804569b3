//! Settings manager
//!
//! The manager is the context object for one invocation. It resolves scope
//! paths, and runs every document through the same pipeline:
//!
//! read → parse → migrate → validate → (caller mutates) → touch → validate →
//! optimistic check → atomic write → read-back verification
//!
//! Nothing here is global; callers build a manager and pass it around.

mod report;

pub use report::{ScopeReport, ValidationReport};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::{IssueLocation, SettingsError, SettingsResult};
use crate::hooks::HookEvent;
use crate::migration::Migrator;
use crate::scope::{EffectiveSettings, ScopeResolver};
use crate::settings::locations::ScopeLocations;
use crate::settings::types::{
    HookCommand, HookConfiguration, MigrationRecord, SettingsScope, VersionedSettings,
};
use crate::store::{AtomicStore, FileSystem, StdFileSystem, WriteReceipt};
use crate::validation::{IssueCategory, ValidationIssue, ValidationResult, Validator};
use crate::version::SemVer;

/// What the file looked like when it was loaded
///
/// Compared against the file on disk right before a save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSnapshot {
    pub existed: bool,
    pub version: Option<Value>,
    pub updated_at: Option<Value>,
}

impl LoadSnapshot {
    fn absent() -> Self {
        Self::default()
    }

    fn of(document: &Value) -> Self {
        Self {
            existed: true,
            version: document.get("version").cloned(),
            updated_at: document
                .get("meta")
                .and_then(|meta| meta.get("updatedAt"))
                .cloned(),
        }
    }
}

/// A scope's settings, ready for mutation
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub scope: SettingsScope,
    pub path: PathBuf,
    pub settings: VersionedSettings,
    /// Version the file declared before migrating
    pub from_version: SemVer,
    /// Migrations applied in memory by this load
    pub migrations: Vec<MigrationRecord>,
    pub validation: ValidationResult,
    pub snapshot: LoadSnapshot,
}

impl LoadedSettings {
    pub fn existed(&self) -> bool {
        self.snapshot.existed
    }

    pub fn was_migrated(&self) -> bool {
        !self.migrations.is_empty()
    }
}

/// What `remove_hook` took out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovedHook {
    Configuration(HookConfiguration),
    Command(HookCommand),
}

/// Result of `init`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

/// Result of `migrate_scope`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub scope: SettingsScope,
    pub path: PathBuf,
    pub existed: bool,
    pub from_version: SemVer,
    pub applied: Vec<MigrationRecord>,
    pub written: bool,
}

/// Orchestrates storage, migration and validation for all scopes
#[derive(Debug)]
pub struct SettingsManager<F: FileSystem = StdFileSystem> {
    locations: ScopeLocations,
    store: AtomicStore<F>,
    migrator: Migrator,
    validator: Validator,
    config: EngineConfig,
    clock: fn() -> DateTime<Utc>,
}

impl SettingsManager<StdFileSystem> {
    /// Manager on the real filesystem
    pub fn new(locations: ScopeLocations, config: EngineConfig) -> Self {
        Self::with_filesystem(locations, StdFileSystem, config)
    }
}

impl<F: FileSystem> SettingsManager<F> {
    pub fn with_filesystem(locations: ScopeLocations, fs: F, config: EngineConfig) -> Self {
        Self {
            locations,
            store: AtomicStore::new(fs, config.backup),
            migrator: Migrator::new(),
            validator: Validator::with_options(config.validator_options()),
            config,
            clock: Utc::now,
        }
    }

    /// Override the timestamp source, for the manager and its migrator
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self.migrator = self.migrator.with_clock(clock);
        self
    }

    pub fn locations(&self) -> &ScopeLocations {
        &self.locations
    }

    pub fn path_for(&self, scope: SettingsScope) -> PathBuf {
        self.locations.path_for(scope)
    }

    /// Load a scope, migrating and validating in memory
    ///
    /// A missing file yields a fresh empty document. Validation errors fail
    /// the load; warnings and suggestions are returned with the settings.
    pub fn load(&self, scope: SettingsScope) -> SettingsResult<LoadedSettings> {
        let path = self.scope_path(scope)?;

        let Some(content) = self.store.read(&path)? else {
            return Ok(LoadedSettings {
                scope,
                settings: VersionedSettings::new(scope, (self.clock)()),
                path,
                from_version: SemVer::current(),
                migrations: Vec::new(),
                validation: ValidationResult {
                    valid: true,
                    ..Default::default()
                },
                snapshot: LoadSnapshot::absent(),
            });
        };

        let document = parse_document(&path, &content)?;
        let snapshot = LoadSnapshot::of(&document);
        let migrated = self.migrator.migrate(document)?;
        if migrated.was_migrated() {
            tracing::info!(
                "Migrated {} settings in memory from {} ({} step(s))",
                scope,
                migrated.from_version,
                migrated.applied.len()
            );
        }

        let validation = self
            .validator
            .validate(&migrated.document)
            .into_result(Some(path.clone()))?;
        let settings = deserialize_settings(&path, migrated.document)?;

        tracing::debug!(
            "Loaded {} settings from {} ({} command(s))",
            scope,
            path.display(),
            settings.command_count()
        );

        Ok(LoadedSettings {
            scope,
            path,
            settings,
            from_version: migrated.from_version,
            migrations: migrated.applied,
            validation,
            snapshot,
        })
    }

    /// Persist a loaded document
    ///
    /// On success the snapshot is refreshed so the same value can be saved
    /// again. If the written file does not read back as the saved document,
    /// the previous file is restored and the save fails.
    pub fn save(&self, loaded: &mut LoadedSettings) -> SettingsResult<WriteReceipt> {
        loaded.settings.touch(loaded.scope, (self.clock)());

        let validation = self
            .validator
            .validate_settings(&loaded.settings)?
            .into_result(Some(loaded.path.clone()))?;
        let expected = serde_json::to_value(&loaded.settings)?;
        let mut content = serde_json::to_string_pretty(&expected)?;
        content.push('\n');

        if self.config.optimistic_lock {
            self.check_unchanged(&loaded.path, &loaded.snapshot)?;
        }

        let receipt = self.store.write(&loaded.path, &content)?;
        if let Err(err) = self.verify_written(&loaded.path, &expected) {
            self.roll_back(&loaded.path, &receipt, &loaded.snapshot);
            return Err(err);
        }

        loaded.snapshot = LoadSnapshot::of(&expected);
        loaded.validation = validation;
        loaded.migrations.clear();
        Ok(receipt)
    }

    /// Append a command under `event`, grouping it with an existing matcher
    pub fn apply_hook(
        &self,
        scope: SettingsScope,
        event: HookEvent,
        matcher: Option<String>,
        command: HookCommand,
    ) -> SettingsResult<LoadedSettings> {
        let mut loaded = self.load(scope)?;
        loaded.settings.add_command(event, matcher, command);
        self.save(&mut loaded)?;
        Ok(loaded)
    }

    /// Remove a configuration, or a single command from it
    ///
    /// Out-of-range indices remove nothing and write nothing.
    pub fn remove_hook(
        &self,
        scope: SettingsScope,
        event: HookEvent,
        configuration_index: usize,
        command_index: Option<usize>,
    ) -> SettingsResult<Option<RemovedHook>> {
        let mut loaded = self.load(scope)?;
        let removed = match command_index {
            Some(command_index) => loaded
                .settings
                .remove_command(event, configuration_index, command_index)
                .map(RemovedHook::Command),
            None => loaded
                .settings
                .remove_configuration(event, configuration_index)
                .map(RemovedHook::Configuration),
        };
        if removed.is_some() {
            self.save(&mut loaded)?;
        }
        Ok(removed)
    }

    /// Overwrite a scope with no hooks, keeping history and foreign keys
    pub fn clear(&self, scope: SettingsScope) -> SettingsResult<WriteReceipt> {
        let mut loaded = self.load(scope)?;
        loaded.settings.clear_hooks();
        self.save(&mut loaded)
    }

    /// Create an empty settings file if the scope has none
    pub fn init(&self, scope: SettingsScope) -> SettingsResult<InitOutcome> {
        let mut loaded = self.load(scope)?;
        if loaded.existed() {
            return Ok(InitOutcome::AlreadyExists(loaded.path));
        }
        self.save(&mut loaded)?;
        Ok(InitOutcome::Created(loaded.path))
    }

    /// Migrate a scope's file on disk
    pub fn migrate_scope(
        &self,
        scope: SettingsScope,
        dry_run: bool,
    ) -> SettingsResult<MigrationOutcome> {
        let mut loaded = self.load(scope)?;
        let applied = loaded.migrations.clone();
        let written = loaded.was_migrated() && !dry_run;
        if written {
            self.save(&mut loaded)?;
        }
        Ok(MigrationOutcome {
            scope,
            path: loaded.path,
            existed: loaded.snapshot.existed,
            from_version: loaded.from_version,
            applied,
            written,
        })
    }

    /// Restore a scope from its most recent backup
    pub fn restore(&self, scope: SettingsScope) -> SettingsResult<PathBuf> {
        self.store.restore_backup(&self.scope_path(scope)?)
    }

    /// Merge all scopes into the effective view
    ///
    /// Outside a project the project scope is skipped rather than read as a
    /// second copy of the global file.
    pub fn resolve_effective(&self) -> SettingsResult<EffectiveSettings> {
        let global = self.load(SettingsScope::Global)?;
        let project = if self.locations.project_is_global() {
            None
        } else {
            Some(self.load(SettingsScope::Project)?)
        };
        let local = self.load(SettingsScope::Local)?;
        Ok(ScopeResolver::resolve(
            Some(&global.settings),
            project.as_ref().map(|loaded| &loaded.settings),
            Some(&local.settings),
        ))
    }

    /// Validate every scope without writing anything
    pub fn validate_all(&self) -> ValidationReport {
        let scopes = SettingsScope::all()
            .into_iter()
            .map(|scope| self.validate_scope(scope))
            .collect();
        ValidationReport { scopes }
    }

    fn validate_scope(&self, scope: SettingsScope) -> ScopeReport {
        let path = self.path_for(scope);
        if self.scope_path(scope).is_err() {
            // Reported under the global scope already
            return ScopeReport::missing(scope, path);
        }
        let content = match self.store.read(&path) {
            Ok(Some(content)) => content,
            Ok(None) => return ScopeReport::missing(scope, path),
            Err(err) => return ScopeReport::failed(scope, path, err.to_string()),
        };
        let migrated = match parse_document(&path, &content)
            .and_then(|document| self.migrator.migrate(document))
        {
            Ok(migrated) => migrated,
            Err(err) => return ScopeReport::failed(scope, path, err.to_string()),
        };
        let mut validation = self.validator.validate(&migrated.document);
        if validation.valid {
            // Same gate as `load`, so a passing scope always loads
            if let Err(err) = serde_json::from_value::<VersionedSettings>(migrated.document) {
                validation.errors.push(ValidationIssue {
                    path: "$".to_string(),
                    message: err.to_string(),
                    category: IssueCategory::Structure,
                });
                validation.valid = false;
            }
        }
        ScopeReport::from_validation(scope, path, validation, migrated.applied.len())
    }

    fn scope_path(&self, scope: SettingsScope) -> SettingsResult<PathBuf> {
        let path = self.path_for(scope);
        if scope == SettingsScope::Project && self.locations.project_is_global() {
            return Err(SettingsError::NoProjectScope { path });
        }
        Ok(path)
    }

    fn check_unchanged(&self, path: &Path, snapshot: &LoadSnapshot) -> SettingsResult<()> {
        let current = match self.store.read(path)? {
            None => LoadSnapshot::absent(),
            Some(content) => match serde_json::from_str::<Value>(&content) {
                Ok(document) => LoadSnapshot::of(&document),
                Err(_) => {
                    return Err(SettingsError::ConcurrentModification {
                        path: path.to_path_buf(),
                    });
                }
            },
        };
        if &current != snapshot {
            tracing::warn!(
                "{} changed on disk since it was loaded, refusing to overwrite",
                path.display()
            );
            return Err(SettingsError::ConcurrentModification {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn verify_written(&self, path: &Path, expected: &Value) -> SettingsResult<()> {
        let written = parse_document(path, &self.store.read_required(path)?)?;
        if &written != expected {
            return Err(SettingsError::validation(
                Some(path.to_path_buf()),
                vec![IssueLocation {
                    path: "$".to_string(),
                    message: "written file does not match the saved document".to_string(),
                }],
            ));
        }
        Ok(())
    }

    fn roll_back(&self, path: &Path, receipt: &WriteReceipt, snapshot: &LoadSnapshot) {
        let result = match (&receipt.backup, snapshot.existed) {
            (Some(backup), _) => self.store.restore_from(path, backup),
            (None, false) => self.store.remove(path),
            (None, true) => {
                tracing::warn!(
                    "No backup of {} to roll back to; leaving the new file in place",
                    path.display()
                );
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!("Failed to roll back {}: {}", path.display(), err);
        }
    }
}

fn parse_document(path: &Path, content: &str) -> SettingsResult<Value> {
    serde_json::from_str(content).map_err(|err| SettingsError::malformed(path, err.to_string()))
}

/// Well-formed JSON that does not fit the typed model is a validation failure
fn deserialize_settings(path: &Path, document: Value) -> SettingsResult<VersionedSettings> {
    serde_json::from_value(document).map_err(|err| {
        SettingsError::validation(
            Some(path.to_path_buf()),
            vec![IssueLocation {
                path: "$".to_string(),
                message: err.to_string(),
            }],
        )
    })
}
