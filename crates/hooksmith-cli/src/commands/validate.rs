//! Settings validation command

use anyhow::Result;
use colored::*;
use hooksmith_core::{FileSystem, ScopeReport, SettingsManager, ValidationReport};
use std::process::ExitCode;

use crate::args::OutputFormat;
use crate::console::CLIConsole;

/// Validate every scope; exit code is non-zero when any scope fails
pub fn validate<F: FileSystem>(
    manager: &SettingsManager<F>,
    console: &CLIConsole,
    format: OutputFormat,
) -> Result<ExitCode> {
    let report = manager.validate_all();

    match format {
        OutputFormat::Json => console.line(&serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(console, &report),
    }

    Ok(exit_code(&report))
}

pub fn exit_code(report: &ValidationReport) -> ExitCode {
    ExitCode::from(report.exit_code() as u8)
}

fn print_report(console: &CLIConsole, report: &ValidationReport) {
    console.print_header("Settings Validation");

    for scope in &report.scopes {
        print_scope(console, scope);
    }

    console.print_separator();
    let summary = format!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    if report.passed() {
        console.success(&format!("All scopes valid ({})", summary));
    } else {
        console.error(&format!("Validation failed ({})", summary));
    }
}

fn print_scope(console: &CLIConsole, scope: &ScopeReport) {
    let title = format!("{:<8} {}", scope.scope.as_str(), scope.path.display());
    if !scope.exists {
        console.line(&format!("{} {}", "-".dimmed(), title.dimmed()));
        return;
    }

    if scope.passed {
        console.success(&title);
    } else {
        console.error(&title);
    }
    for issue in &scope.errors {
        console.error(&format!("  {}", issue));
    }
    for issue in &scope.warnings {
        console.warn(&format!("  {}", issue));
    }
    for issue in &scope.suggestions {
        console.hint(&format!("  {}", issue));
    }
    if scope.pending_migrations > 0 {
        console.info(&format!(
            "  {} migration(s) pending; run `hooksmith migrate`",
            scope.pending_migrations
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hooksmith_core::{EngineConfig, ScopeLocations};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_exit_code_reflects_failures() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(
            ScopeLocations::new(temp_dir.path().join("home"), temp_dir.path().join("repo")),
            EngineConfig::default(),
        );
        let console = CLIConsole::new(false);

        let report = manager.validate_all();
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            validate(&manager, &console, OutputFormat::Json).unwrap(),
            ExitCode::SUCCESS
        );

        let dir = temp_dir.path().join("repo/.claude");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("settings.json"),
            r#"{"version": "1.0.0", "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "ls", "timeout": -1}]}]}}"#,
        )
        .unwrap();

        let report = manager.validate_all();
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.scopes[1].errors[0].category.as_str(), "timeout");
        assert_eq!(
            validate(&manager, &console, OutputFormat::Text).unwrap(),
            ExitCode::FAILURE
        );
    }
}
