//! Atomic settings file storage
//!
//! Writes go to a temporary file in the destination directory, are synced and
//! then renamed over the target, so readers see either the old or the new
//! file and never a partial one. The previous file is copied aside first so
//! a caller can roll back after a failed post-write check.

mod fs;
mod memory;

pub use fs::FileSystem;
#[cfg(test)]
pub use fs::MockFileSystem;
pub use fs::StdFileSystem;
pub use memory::{FsOperation, MemoryFileSystem};

use chrono::{NaiveDateTime, Utc};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{SettingsError, SettingsResult};

/// Timestamped backups kept per settings file
pub const MAX_TIMESTAMPED_BACKUPS: usize = 10;

/// How the previous file is kept before it is replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupPolicy {
    /// No backup
    None,
    /// `<path>.bak`, overwritten on every write
    #[default]
    Sibling,
    /// `<path>.bak.<YYYYmmdd_HHMMSS>`
    Timestamped,
}

impl BackupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupPolicy::None => "none",
            BackupPolicy::Sibling => "sibling",
            BackupPolicy::Timestamped => "timestamped",
        }
    }
}

impl FromStr for BackupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(BackupPolicy::None),
            "sibling" | "bak" => Ok(BackupPolicy::Sibling),
            "timestamped" => Ok(BackupPolicy::Timestamped),
            other => Err(format!("unknown backup policy '{}'", other)),
        }
    }
}

/// What a successful write left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: PathBuf,
    /// Copy of the replaced file, if one existed and backups are enabled
    pub backup: Option<PathBuf>,
}

/// Reads and atomically replaces settings files
#[derive(Debug, Clone, Default)]
pub struct AtomicStore<F = StdFileSystem> {
    fs: F,
    backup: BackupPolicy,
}

impl<F: FileSystem> AtomicStore<F> {
    pub fn new(fs: F, backup: BackupPolicy) -> Self {
        Self { fs, backup }
    }

    /// Read a file; `None` when it does not exist yet
    pub fn read(&self, path: &Path) -> SettingsResult<Option<String>> {
        match self.fs.read_to_string(path) {
            Ok(content) => {
                tracing::debug!("Read {} bytes from {}", content.len(), path.display());
                Ok(Some(content))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Settings file {} does not exist", path.display());
                Ok(None)
            }
            Err(err) => Err(SettingsError::read_failed(path, err)),
        }
    }

    /// Read a file that must exist
    pub fn read_required(&self, path: &Path) -> SettingsResult<String> {
        self.read(path)?.ok_or_else(|| SettingsError::FileNotFound {
            path: path.to_path_buf(),
        })
    }

    /// Atomically replace `path` with `content`, backing up the old file
    pub fn write(&self, path: &Path, content: &str) -> SettingsResult<WriteReceipt> {
        let backup = if self.fs.exists(path) {
            self.create_backup(path)?
        } else {
            None
        };
        self.replace(path, content)?;
        tracing::info!("Wrote settings to {}", path.display());
        Ok(WriteReceipt {
            path: path.to_path_buf(),
            backup,
        })
    }

    /// Put the most recent backup back in place
    ///
    /// Under the timestamped policy this is the newest `<path>.bak.<stamp>`,
    /// falling back to `<path>.bak`; otherwise it is `<path>.bak`.
    pub fn restore_backup(&self, path: &Path) -> SettingsResult<PathBuf> {
        let newest = match self.backup {
            BackupPolicy::Timestamped => self.timestamped_backups(path)?.pop(),
            BackupPolicy::None | BackupPolicy::Sibling => None,
        };
        let backup = newest.unwrap_or_else(|| sibling_backup_path(path));
        self.restore_from(path, &backup)?;
        Ok(backup)
    }

    /// Timestamped backups of `path`, oldest first
    pub fn timestamped_backups(&self, path: &Path) -> SettingsResult<Vec<PathBuf>> {
        let dir = parent_dir(path);
        let entries = match self.fs.list_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(SettingsError::read_failed(&dir, err)),
        };

        let prefix = match sibling_backup_path(path).file_name() {
            Some(name) => format!("{}.", name.to_string_lossy()),
            None => return Ok(Vec::new()),
        };
        let mut backups: Vec<PathBuf> = entries
            .into_iter()
            .filter(|entry| {
                entry
                    .file_name()
                    .map(|name| name.to_string_lossy())
                    .and_then(|name| name.strip_prefix(&prefix).map(is_backup_stamp))
                    .unwrap_or(false)
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    /// Atomically replace `path` with the contents of `backup`
    pub fn restore_from(&self, path: &Path, backup: &Path) -> SettingsResult<()> {
        let content = self.read_required(backup)?;
        self.replace(path, &content)?;
        tracing::info!(
            "Restored {} from backup {}",
            path.display(),
            backup.display()
        );
        Ok(())
    }

    /// Remove a file, treating absence as success
    pub fn remove(&self, path: &Path) -> SettingsResult<()> {
        match self.fs.remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SettingsError::write_failed(path, err)),
        }
    }

    /// Where the next backup of `path` goes under the current policy
    pub fn backup_path(&self, path: &Path) -> Option<PathBuf> {
        match self.backup {
            BackupPolicy::None => None,
            BackupPolicy::Sibling => Some(sibling_backup_path(path)),
            BackupPolicy::Timestamped => {
                let mut name = sibling_backup_path(path).into_os_string();
                name.push(format!(".{}", Utc::now().format(BACKUP_STAMP_FORMAT)));
                Some(PathBuf::from(name))
            }
        }
    }

    fn create_backup(&self, path: &Path) -> SettingsResult<Option<PathBuf>> {
        let Some(backup) = self.backup_path(path) else {
            return Ok(None);
        };
        if let Err(err) = self.fs.copy(path, &backup) {
            tracing::warn!(
                "Failed to back up {} to {}: {}",
                path.display(),
                backup.display(),
                err
            );
            return Err(SettingsError::write_failed(&backup, err));
        }
        tracing::debug!("Created backup: {}", backup.display());
        if self.backup == BackupPolicy::Timestamped {
            self.prune_backups(path);
        }
        Ok(Some(backup))
    }

    /// Keep only the newest `MAX_TIMESTAMPED_BACKUPS`
    fn prune_backups(&self, path: &Path) {
        let backups = match self.timestamped_backups(path) {
            Ok(backups) => backups,
            Err(err) => {
                tracing::warn!("Failed to list backups of {}: {}", path.display(), err);
                return;
            }
        };
        let excess = backups.len().saturating_sub(MAX_TIMESTAMPED_BACKUPS);
        for old in &backups[..excess] {
            match self.fs.remove_file(old) {
                Ok(()) => tracing::debug!("Pruned old backup {}", old.display()),
                Err(err) => {
                    tracing::warn!("Failed to prune backup {}: {}", old.display(), err)
                }
            }
        }
    }

    /// Temp file, sync, rename
    fn replace(&self, path: &Path, content: &str) -> SettingsResult<()> {
        let parent = parent_dir(path);
        if !self.fs.exists(&parent) {
            tracing::debug!("Creating settings directory {}", parent.display());
            self.fs
                .create_dir_all(&parent)
                .map_err(|err| SettingsError::write_failed(&parent, err))?;
        }

        let temp_path = temp_path_for(&parent, path);
        if let Err(err) = self.fs.write_synced(&temp_path, content.as_bytes()) {
            self.discard_temp(&temp_path);
            return Err(SettingsError::write_failed(path, err));
        }
        if let Err(err) = self.fs.rename(&temp_path, path) {
            self.discard_temp(&temp_path);
            return Err(SettingsError::write_failed(path, err));
        }
        Ok(())
    }

    fn discard_temp(&self, temp_path: &Path) {
        match self.fs.remove_file(temp_path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(
                "Failed to remove temp file {}: {}",
                temp_path.display(),
                err
            ),
        }
    }
}

/// `<path>.bak`
pub fn sibling_backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

fn is_backup_stamp(stamp: &str) -> bool {
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).is_ok()
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `.<name>.<uuid>.tmp` next to the target
fn temp_path_for(parent: &Path, path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".to_string());
    parent.join(format!(".{}.{}.tmp", name, Uuid::new_v4()))
}
