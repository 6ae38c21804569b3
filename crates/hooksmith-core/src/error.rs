//! Error types for the settings engine

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for settings engine operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A single validation problem, addressed by a JSON-ish path into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueLocation {
    /// Path such as `hooks.PreToolUse[0].hooks[1].command`
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Main error type for the settings engine
///
/// Every variant maps to a stable error code (see [`SettingsError::error_code`])
/// so the CLI layer can render structured output without matching on messages.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Read target is absent. Callers that accept absence use `AtomicStore::read`
    /// instead and substitute defaults.
    #[error("Settings file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// I/O failure while reading
    #[error("Failed to read {}: {source}", path.display())]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while writing (temp file, backup, rename or directory creation)
    #[error("Failed to write {}: {source}", path.display())]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process lacks permission for the path
    #[error("Permission denied while trying to {operation} {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        operation: &'static str,
    },

    /// The device holding the path has no space left
    #[error("No space left on device while writing {}", path.display())]
    DiskFull { path: PathBuf },

    /// The file exists but is not valid JSON
    #[error("Malformed JSON in {}: {message}", path.display())]
    MalformedJson { path: PathBuf, message: String },

    /// Unparseable semantic version string
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// No migration path from the detected version to the current schema
    #[error("No migration path from version {from} to {target}")]
    UnmigratableVersion { from: String, target: String },

    /// A migration transform rejected its input
    #[error("Migration {from} -> {to} failed: {message}")]
    MigrationFailed {
        from: String,
        to: String,
        message: String,
    },

    /// The migration registry contains a step that would make the chain ambiguous
    #[error("Invalid migration registry: {0}")]
    InvalidMigrationRegistry(String),

    /// Structural or security rule violations
    #[error("Settings validation failed with {} error(s)", issues.len())]
    ValidationFailed {
        path: Option<PathBuf>,
        issues: Vec<IssueLocation>,
    },

    /// The file changed on disk between load and save
    #[error("Settings file {} was modified by another process", path.display())]
    ConcurrentModification { path: PathBuf },

    /// The project scope resolved onto the global settings file
    #[error("No project found: {} is the global settings file; run inside a project or pass --project-dir", path.display())]
    NoProjectScope { path: PathBuf },

    /// Serialization of an in-memory document failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SettingsError {
    /// Classify an I/O error raised while reading `path`
    pub fn read_failed(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path,
                operation: "read",
            },
            _ => Self::FileReadFailed { path, source },
        }
    }

    /// Classify an I/O error raised while writing `path`
    pub fn write_failed(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path,
                operation: "write",
            },
            std::io::ErrorKind::StorageFull => Self::DiskFull { path },
            _ => Self::FileWriteFailed { path, source },
        }
    }

    /// Create a malformed JSON error
    pub fn malformed(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::MalformedJson {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(path: Option<PathBuf>, issues: Vec<IssueLocation>) -> Self {
        Self::ValidationFailed { path, issues }
    }

    /// Stable error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::FileReadFailed { .. } => "FILE_READ_FAILED",
            Self::FileWriteFailed { .. } => "FILE_WRITE_FAILED",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::DiskFull { .. } => "DISK_FULL",
            Self::MalformedJson { .. } => "MALFORMED_JSON",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::UnmigratableVersion { .. } => "UNMIGRATABLE_VERSION",
            Self::MigrationFailed { .. } => "MIGRATION_FAILED",
            Self::InvalidMigrationRegistry(_) => "INVALID_MIGRATION_REGISTRY",
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::NoProjectScope { .. } => "NO_PROJECT_SCOPE",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }

    /// Whether the caller may recover by substituting defaults
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }

    /// Validation issues carried by this error, if any
    pub fn issues(&self) -> &[IssueLocation] {
        match self {
            Self::ValidationFailed { issues, .. } => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
