//! Hooksmith Core Library
//!
//! Versioning, migration, validation and atomic persistence for hook
//! settings stored at global, project and local scope.

pub mod config;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod migration;
pub mod scope;
pub mod settings;
pub mod store;
pub mod validation;
pub mod version;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{IssueLocation, SettingsError, SettingsResult};
pub use hooks::{HookEvent, UnknownHookEvent};
pub use manager::{
    InitOutcome, LoadedSettings, MigrationOutcome, RemovedHook, ScopeReport, SettingsManager,
    ValidationReport,
};
pub use migration::{MigratedResult, MigrationStep, Migrator};
pub use scope::{EffectiveSettings, ScopeResolver, ScopedHookConfiguration};
pub use settings::{
    HookCommand, HookConfiguration, MigrationRecord, ScopeLocations, SettingsScope,
    VersionedSettings,
};
pub use store::{AtomicStore, BackupPolicy, FileSystem, MemoryFileSystem, StdFileSystem};
pub use validation::{IssueCategory, ValidationIssue, ValidationResult, Validator};
pub use version::{SemVer, VersionStatus, VersionTracker};
