//! Per-scope validation report

use serde::Serialize;
use std::path::PathBuf;

use crate::settings::types::SettingsScope;
use crate::validation::{IssueCategory, ValidationIssue, ValidationResult};

/// Validation outcome for one scope file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    pub scope: SettingsScope,
    pub path: PathBuf,
    pub exists: bool,
    pub passed: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggestions: Vec<ValidationIssue>,
    /// Records the file would gain when next written
    pub pending_migrations: usize,
}

impl ScopeReport {
    pub(crate) fn missing(scope: SettingsScope, path: PathBuf) -> Self {
        Self {
            scope,
            path,
            exists: false,
            passed: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            pending_migrations: 0,
        }
    }

    pub(crate) fn from_validation(
        scope: SettingsScope,
        path: PathBuf,
        validation: ValidationResult,
        pending_migrations: usize,
    ) -> Self {
        Self {
            scope,
            path,
            exists: true,
            passed: validation.valid,
            errors: validation.errors,
            warnings: validation.warnings,
            suggestions: validation.suggestions,
            pending_migrations,
        }
    }

    /// The file could not be read, parsed or migrated
    pub(crate) fn failed(scope: SettingsScope, path: PathBuf, message: String) -> Self {
        Self {
            errors: vec![ValidationIssue {
                path: "$".to_string(),
                message,
                category: IssueCategory::Structure,
            }],
            passed: false,
            exists: true,
            ..Self::missing(scope, path)
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

/// Validation outcome for every scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub scopes: Vec<ScopeReport>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.scopes.iter().all(|scope| scope.passed)
    }

    pub fn error_count(&self) -> usize {
        self.scopes.iter().map(ScopeReport::error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.scopes.iter().map(ScopeReport::warning_count).sum()
    }

    /// `0` when every scope passed, `1` otherwise
    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_follows_scope_results() {
        let mut report = ValidationReport {
            scopes: vec![
                ScopeReport::missing(SettingsScope::Global, PathBuf::from("/g")),
                ScopeReport::from_validation(
                    SettingsScope::Project,
                    PathBuf::from("/p"),
                    ValidationResult {
                        valid: true,
                        ..Default::default()
                    },
                    0,
                ),
            ],
        };
        assert_eq!(report.exit_code(), 0);

        report.scopes.push(ScopeReport::failed(
            SettingsScope::Local,
            PathBuf::from("/l"),
            "Malformed JSON".to_string(),
        ));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.error_count(), 1);
        assert!(report.scopes[2].exists);
    }
}
