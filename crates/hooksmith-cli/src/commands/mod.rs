//! Command implementations

pub mod hooks;
pub mod migrate;
pub mod validate;

use anyhow::Result;
use hooksmith_core::{EngineConfig, ScopeLocations, SettingsManager};
use std::process::ExitCode;

use crate::args::{Cli, Commands};
use crate::console::CLIConsole;

/// Build the manager for this invocation and dispatch
pub fn run(cli: &Cli, console: &CLIConsole) -> Result<ExitCode> {
    let manager = build_manager(cli);
    console.info(&format!(
        "Project root: {}",
        manager.locations().project_root.display()
    ));

    match &cli.command {
        Commands::Init { scope } => hooks::init(&manager, console, scope.scope()),
        Commands::Add {
            event,
            command,
            matcher,
            timeout,
            scope,
        } => hooks::add(
            &manager,
            console,
            scope.scope(),
            *event,
            command,
            matcher.clone(),
            *timeout,
        ),
        Commands::Remove {
            event,
            config_index,
            command_index,
            scope,
        } => hooks::remove(
            &manager,
            console,
            scope.scope(),
            *event,
            *config_index,
            *command_index,
        ),
        Commands::Clear { scope } => hooks::clear(&manager, console, scope.scope()),
        Commands::List { event, tool } => hooks::list(&manager, console, *event, tool.as_deref()),
        Commands::Validate { format } => validate::validate(&manager, console, *format),
        Commands::Migrate { dry_run } => migrate::migrate(&manager, console, *dry_run),
        Commands::Restore { scope } => hooks::restore(&manager, console, scope.scope()),
    }
}

fn build_manager(cli: &Cli) -> SettingsManager {
    let locations = match &cli.project_dir {
        Some(dir) => ScopeLocations {
            project_root: dir.clone(),
            ..ScopeLocations::discover_from(dir)
        },
        None => ScopeLocations::discover(),
    };

    let mut config = EngineConfig::default();
    config.apply_env_overrides();
    tracing::debug!("Engine configuration: {:?}", config);

    SettingsManager::new(locations, config)
}
