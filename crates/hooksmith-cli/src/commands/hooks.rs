//! Hook editing commands

use anyhow::{Context, Result};
use colored::*;
use hooksmith_core::manager::{InitOutcome, RemovedHook};
use hooksmith_core::{
    EffectiveSettings, FileSystem, HookCommand, HookEvent, LoadedSettings, SettingsManager,
    SettingsScope,
};
use std::process::ExitCode;

use crate::console::CLIConsole;

/// Create an empty settings file
pub fn init<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    scope: SettingsScope,
) -> Result<ExitCode> {
    match manager.init(scope)? {
        InitOutcome::Created(path) => {
            console.success(&format!("Created {} settings at {}", scope, path.display()))
        }
        InitOutcome::AlreadyExists(path) => console.warn(&format!(
            "{} settings already exist at {}",
            scope,
            path.display()
        )),
    }
    Ok(ExitCode::SUCCESS)
}

/// Append a hook command
pub fn add<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    scope: SettingsScope,
    event: HookEvent,
    command: &str,
    matcher: Option<String>,
    timeout: Option<u64>,
) -> Result<ExitCode> {
    let mut hook = HookCommand::new(command);
    if let Some(timeout) = timeout {
        hook = hook.with_timeout(timeout);
    }

    let loaded = manager
        .apply_hook(scope, event, matcher, hook)
        .with_context(|| format!("Failed to add {} hook to {} settings", event, scope))?;

    console.success(&format!(
        "Added {} hook to {}",
        event,
        loaded.path.display()
    ));
    print_findings(console, &loaded);
    Ok(ExitCode::SUCCESS)
}

/// Remove a configuration or a single command
pub fn remove<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    scope: SettingsScope,
    event: HookEvent,
    config_index: usize,
    command_index: Option<usize>,
) -> Result<ExitCode> {
    match manager.remove_hook(scope, event, config_index, command_index)? {
        Some(RemovedHook::Configuration(configuration)) => {
            console.success(&format!(
                "Removed {} configuration #{} ({} command(s)) from {} settings",
                event,
                config_index,
                configuration.hooks.len(),
                scope
            ));
            Ok(ExitCode::SUCCESS)
        }
        Some(RemovedHook::Command(command)) => {
            console.success(&format!(
                "Removed '{}' from {} settings",
                command, scope
            ));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            console.error(&format!(
                "No {} hook at index {} in {} settings",
                event, config_index, scope
            ));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Remove every hook from a scope
pub fn clear<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    scope: SettingsScope,
) -> Result<ExitCode> {
    let receipt = manager.clear(scope)?;
    console.success(&format!("Cleared hooks in {}", receipt.path.display()));
    if let Some(backup) = receipt.backup {
        console.info(&format!("Previous file saved to {}", backup.display()));
    }
    Ok(ExitCode::SUCCESS)
}

/// Restore a scope from its most recent backup
pub fn restore<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    scope: SettingsScope,
) -> Result<ExitCode> {
    let backup = manager
        .restore(scope)
        .with_context(|| format!("Failed to restore {} settings", scope))?;
    console.success(&format!(
        "Restored {} settings from {}",
        scope,
        backup.display()
    ));
    Ok(ExitCode::SUCCESS)
}

/// Print the effective hooks
pub fn list<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    event: Option<HookEvent>,
    tool: Option<&str>,
) -> Result<ExitCode> {
    let effective = manager.resolve_effective()?;
    console.print_header("Effective Hooks");

    let events: Vec<HookEvent> = match event {
        Some(event) => vec![event],
        None => effective.events().collect(),
    };
    let mut shown = 0usize;
    for event in events {
        shown += print_event(console, &effective, event, tool);
    }

    if shown == 0 {
        console.warn("No hooks configured");
    } else {
        console.print_separator();
        console.info(&format!("{} command(s) in total", effective.command_count()));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_event(
    console: &CLIConsole,
    effective: &EffectiveSettings,
    event: HookEvent,
    tool: Option<&str>,
) -> usize {
    let entries = match tool {
        Some(tool) => effective.matching(event, tool),
        None => effective.hooks_for(event).iter().collect(),
    };
    if entries.is_empty() {
        return 0;
    }

    console.line(&format!(
        "{} {}",
        event.as_str().cyan().bold(),
        format!("({})", event.description()).dimmed()
    ));
    // Indices are per scope file, which is what `remove` expects
    let mut per_scope = [0usize; 3];
    for scoped in &entries {
        let slot = match scoped.scope {
            SettingsScope::Global => 0,
            SettingsScope::Project => 1,
            SettingsScope::Local => 2,
        };
        let index = match tool {
            Some(_) => None,
            None => Some(per_scope[slot]),
        };
        per_scope[slot] += 1;

        let matcher = match scoped.configuration.matcher_str() {
            "" => "*".to_string(),
            other => other.to_string(),
        };
        let label = match index {
            Some(index) => format!("[{} #{}]", scoped.scope, index),
            None => format!("[{}]", scoped.scope),
        };
        console.line(&format!("  {} {}", label.dimmed(), matcher.yellow()));
        for command in &scoped.configuration.hooks {
            console.line(&format!("    {}", command));
        }
    }
    entries.len()
}

fn print_findings(console: &CLIConsole, loaded: &LoadedSettings) {
    for warning in &loaded.validation.warnings {
        console.warn(&warning.to_string());
    }
    for suggestion in &loaded.validation.suggestions {
        console.hint(&suggestion.to_string());
    }
}
