//! CLI argument definitions using clap
//!
//! - hooksmith init                          # Create an empty project settings file
//! - hooksmith add PreToolUse "rch" -m Bash  # Append a hook
//! - hooksmith list                          # Show the merged hooks of all scopes
//! - hooksmith validate                      # Check every scope, non-zero exit on failure

use clap::{Args, Parser, Subcommand, ValueEnum};
use hooksmith_core::{HookEvent, SettingsScope};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hooksmith")]
#[command(about = "Hooksmith - versioned hook settings for global, project and local scopes")]
#[command(version)]
pub struct Cli {
    /// Project directory (defaults to the nearest ancestor with .claude or .git)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Write-target selection; `--global` wins over `--local`, default is project
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ScopeArgs {
    /// Target the per-user settings file
    #[arg(long)]
    pub global: bool,

    /// Target the untracked local settings file
    #[arg(long)]
    pub local: bool,
}

impl ScopeArgs {
    pub fn scope(&self) -> SettingsScope {
        SettingsScope::from_flags(self.global, self.local)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty settings file for a scope
    Init {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Append a command hook to an event
    Add {
        /// Lifecycle event, e.g. PreToolUse
        event: HookEvent,

        /// Shell command to run
        command: String,

        /// Tool-name pattern (tool events only)
        #[arg(long, short)]
        matcher: Option<String>,

        /// Timeout in milliseconds
        #[arg(long, short)]
        timeout: Option<u64>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Remove a hook configuration, or one command within it
    Remove {
        event: HookEvent,

        /// Index of the configuration under the event (see `list`)
        config_index: usize,

        /// Remove only this command of the configuration
        #[arg(long)]
        command_index: Option<usize>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Remove every hook from a scope
    Clear {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show the effective hooks of all scopes
    List {
        /// Only this event
        #[arg(long)]
        event: Option<HookEvent>,

        /// Only configurations whose matcher accepts this tool
        #[arg(long)]
        tool: Option<String>,
    },

    /// Validate every scope
    Validate {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Migrate settings files to the current schema version
    Migrate {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore a scope from its most recent backup (`.bak`, or the newest
    /// `.bak.<stamp>` with HOOKSMITH_BACKUP=timestamped)
    Restore {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}
