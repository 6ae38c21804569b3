//! Schema migration command

use anyhow::{Context, Result};
use hooksmith_core::{FileSystem, SettingsManager, SettingsScope};
use std::process::ExitCode;

use crate::console::CLIConsole;

/// Migrate every existing scope file to the current schema version
pub fn migrate<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    dry_run: bool,
) -> Result<ExitCode> {
    console.print_header(if dry_run {
        "Settings Migration (dry run)"
    } else {
        "Settings Migration"
    });

    let mut failed = false;
    for scope in SettingsScope::all() {
        if scope == SettingsScope::Project && manager.locations().project_is_global() {
            console.info("project: no project found, skipped");
            continue;
        }
        let outcome = match manager
            .migrate_scope(scope, dry_run)
            .with_context(|| format!("Failed to migrate {} settings", scope))
        {
            Ok(outcome) => outcome,
            Err(err) => {
                console.error(&format!("{:#}", err));
                failed = true;
                continue;
            }
        };

        if !outcome.existed {
            console.info(&format!("{}: no settings file", scope));
            continue;
        }
        if outcome.applied.is_empty() {
            console.success(&format!(
                "{}: already at version {}",
                scope, outcome.from_version
            ));
            continue;
        }

        let verb = if outcome.written { "Migrated" } else { "Would migrate" };
        console.success(&format!(
            "{} {} settings from {} ({})",
            verb,
            scope,
            outcome.from_version,
            outcome.path.display()
        ));
        for record in &outcome.applied {
            console.line(&format!("  → {}: {}", record.version, record.description));
            for change in record.changes.iter().flatten() {
                console.line(&format!("      {}", change));
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooksmith_core::{EngineConfig, ScopeLocations};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_migrate_legacy_project_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(
            ScopeLocations::new(temp_dir.path().join("home"), temp_dir.path().join("repo")),
            EngineConfig::default(),
        );
        let console = CLIConsole::new(false);
        let dir = temp_dir.path().join("repo/.claude");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(&path, r#"{"hooks": {"Stop": ["notify-send done"]}}"#).unwrap();

        assert_eq!(migrate(&manager, &console, true).unwrap(), ExitCode::SUCCESS);
        assert!(!fs::read_to_string(&path).unwrap().contains("\"version\""));

        assert_eq!(migrate(&manager, &console, false).unwrap(), ExitCode::SUCCESS);
        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["version"], "1.0.0");
        assert_eq!(document["meta"]["migrations"][0]["version"], "1.0.0");
    }

    #[test]
    fn test_unmigratable_scope_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(
            ScopeLocations::new(temp_dir.path().join("home"), temp_dir.path().join("repo")),
            EngineConfig::default(),
        );
        let dir = temp_dir.path().join("home/.claude");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("settings.json"), r#"{"version": "7.0.0"}"#).unwrap();

        let code = migrate(&manager, &CLIConsole::new(false), false).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn test_home_without_project_skips_project_scope() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        let manager = SettingsManager::new(ScopeLocations::new(&home, &home), EngineConfig::default());
        fs::create_dir_all(home.join(".claude")).unwrap();
        fs::write(home.join(".claude/settings.json"), "{}").unwrap();

        let code = migrate(&manager, &CLIConsole::new(false), false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(home.join(".claude/settings.json")).unwrap())
                .unwrap();
        assert_eq!(document["meta"]["source"], "global");
        assert_eq!(document["meta"]["migrations"].as_array().unwrap().len(), 1);
    }
}
