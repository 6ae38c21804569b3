//! Engine configuration
//!
//! Per-invocation switches for the settings manager. Defaults can be
//! overridden from the environment:
//! - `HOOKSMITH_BACKUP`: `none`, `sibling` or `timestamped`
//! - `HOOKSMITH_STRICT`: treat dangerous commands as validation errors
//! - `HOOKSMITH_OPTIMISTIC_LOCK`: re-check the file before every write

use crate::store::BackupPolicy;
use crate::validation::ValidatorOptions;

/// Settings manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Backup kept when a settings file is replaced
    pub backup: BackupPolicy,

    /// Promote security warnings to errors
    pub strict_security: bool,

    /// Refuse to save when the file changed since it was loaded
    pub optimistic_lock: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backup: BackupPolicy::Sibling,
            strict_security: false,
            optimistic_lock: true,
        }
    }
}

impl EngineConfig {
    /// Apply `HOOKSMITH_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // HOOKSMITH_BACKUP
        if let Some(policy) = lookup("HOOKSMITH_BACKUP") {
            match policy.parse() {
                Ok(policy) => self.backup = policy,
                Err(err) => tracing::warn!("Ignoring HOOKSMITH_BACKUP: {}", err),
            }
        }

        // HOOKSMITH_STRICT
        if let Some(value) = lookup("HOOKSMITH_STRICT") {
            self.strict_security = parse_flag(&value);
        }

        // HOOKSMITH_OPTIMISTIC_LOCK
        if let Some(value) = lookup("HOOKSMITH_OPTIMISTIC_LOCK") {
            self.optimistic_lock = parse_flag(&value);
        }
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            strict: self.strict_security,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = EngineConfig::default();
        config.apply_overrides_from(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.backup, BackupPolicy::Sibling);
        assert!(!config.strict_security);
        assert!(config.optimistic_lock);
        assert_eq!(apply(&[]), config);
    }

    #[test]
    fn test_env_overrides() {
        let config = apply(&[
            ("HOOKSMITH_BACKUP", "timestamped"),
            ("HOOKSMITH_STRICT", "1"),
            ("HOOKSMITH_OPTIMISTIC_LOCK", "off"),
        ]);
        assert_eq!(config.backup, BackupPolicy::Timestamped);
        assert!(config.strict_security);
        assert!(!config.optimistic_lock);
        assert!(config.validator_options().strict);
    }

    #[test]
    fn test_invalid_backup_policy_is_ignored() {
        let config = apply(&[("HOOKSMITH_BACKUP", "hourly")]);
        assert_eq!(config.backup, BackupPolicy::Sibling);
    }
}
