//! Per-scope settings documents
//!
//! # Settings Hierarchy
//!
//! Hooks are read from three files and merged additively (global first):
//!
//! 1. **Global settings** - `~/.claude/settings.json`
//! 2. **Project settings** - `.claude/settings.json` (committed to git)
//! 3. **Local settings** - `.claude/settings.local.json` (gitignored)
//!
//! # File Format
//!
//! ```json,ignore
//! {
//!   "$schema": "https://json.schemastore.org/claude-code-settings.json",
//!   "version": "1.0.0",
//!   "hooks": {
//!     "PreToolUse": [
//!       {
//!         "matcher": "Bash",
//!         "hooks": [{ "type": "command", "command": "rch", "timeout": 5000 }]
//!       }
//!     ]
//!   },
//!   "meta": {
//!     "createdAt": "2025-01-01T00:00:00Z",
//!     "updatedAt": "2025-01-02T00:00:00Z",
//!     "source": "project",
//!     "migrations": []
//!   }
//! }
//! ```

pub mod locations;
pub mod types;

pub use locations::{SETTINGS_DIR, ScopeLocations};
pub use types::{
    CURRENT_SCHEMA_VERSION, HookCommand, HookCommandType, HookConfiguration,
    LEGACY_VERSION, MigrationRecord, SettingsMeta, SettingsScope, VersionedSettings,
};
