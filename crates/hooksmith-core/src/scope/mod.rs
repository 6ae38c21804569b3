//! Scope resolution
//!
//! Hooks are additive across scopes: for every event the effective list is
//! the global configurations, then project, then local, each in file order.
//! A hook defined in more than one scope runs once per scope.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::hooks::HookEvent;
use crate::settings::types::{HookConfiguration, SettingsScope, VersionedSettings};

/// A configuration together with the scope it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopedHookConfiguration {
    pub scope: SettingsScope,
    #[serde(flatten)]
    pub configuration: HookConfiguration,
}

/// Merged, read-only view over all scopes for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    hooks: BTreeMap<HookEvent, Vec<ScopedHookConfiguration>>,
}

impl EffectiveSettings {
    /// Configurations for an event in execution order
    pub fn hooks_for(&self, event: HookEvent) -> &[ScopedHookConfiguration] {
        self.hooks.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Configurations for an event whose matcher accepts `tool_name`
    pub fn matching(&self, event: HookEvent, tool_name: &str) -> Vec<&ScopedHookConfiguration> {
        self.hooks_for(event)
            .iter()
            .filter(|scoped| scoped.configuration.applies_to(tool_name))
            .collect()
    }

    /// Events with at least one configuration
    pub fn events(&self) -> impl Iterator<Item = HookEvent> + '_ {
        self.hooks.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.hooks
            .values()
            .flatten()
            .map(|scoped| scoped.configuration.hooks.len())
            .sum()
    }
}

/// Merges the three scope documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    /// Concatenate global ++ project ++ local per event; absent scopes contribute nothing
    pub fn resolve(
        global: Option<&VersionedSettings>,
        project: Option<&VersionedSettings>,
        local: Option<&VersionedSettings>,
    ) -> EffectiveSettings {
        let mut hooks: BTreeMap<HookEvent, Vec<ScopedHookConfiguration>> = BTreeMap::new();

        let layers = [
            (SettingsScope::Global, global),
            (SettingsScope::Project, project),
            (SettingsScope::Local, local),
        ];
        for (scope, settings) in layers {
            let Some(settings) = settings else {
                continue;
            };
            for (event, configurations) in &settings.hooks {
                hooks
                    .entry(*event)
                    .or_default()
                    .extend(configurations.iter().map(|configuration| {
                        ScopedHookConfiguration {
                            scope,
                            configuration: configuration.clone(),
                        }
                    }));
            }
        }

        hooks.retain(|_, configurations| !configurations.is_empty());
        EffectiveSettings { hooks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::HookCommand;
    use chrono::Utc;

    fn settings_with(scope: SettingsScope, matcher: Option<&str>, command: &str) -> VersionedSettings {
        let mut settings = VersionedSettings::new(scope, Utc::now());
        settings.add_hook(
            HookEvent::PostToolUse,
            HookConfiguration::new(matcher.map(str::to_string), vec![HookCommand::new(command)]),
        );
        settings
    }

    fn commands(effective: &EffectiveSettings, event: HookEvent) -> Vec<&str> {
        effective
            .hooks_for(event)
            .iter()
            .flat_map(|scoped| scoped.configuration.hooks.iter())
            .map(|hook| hook.command.as_str())
            .collect()
    }

    #[test]
    fn test_scopes_concatenate_in_order() {
        let global = settings_with(SettingsScope::Global, None, "A");
        let project = settings_with(SettingsScope::Project, None, "B");
        let local = settings_with(SettingsScope::Local, None, "C");

        let effective = ScopeResolver::resolve(Some(&global), Some(&project), Some(&local));
        assert_eq!(commands(&effective, HookEvent::PostToolUse), vec!["A", "B", "C"]);

        let scopes: Vec<_> = effective
            .hooks_for(HookEvent::PostToolUse)
            .iter()
            .map(|scoped| scoped.scope)
            .collect();
        assert_eq!(
            scopes,
            vec![SettingsScope::Global, SettingsScope::Project, SettingsScope::Local]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let global = settings_with(SettingsScope::Global, None, "fmt");
        let project = settings_with(SettingsScope::Project, None, "fmt");

        let effective = ScopeResolver::resolve(Some(&global), Some(&project), None);
        assert_eq!(commands(&effective, HookEvent::PostToolUse), vec!["fmt", "fmt"]);
        assert_eq!(effective.command_count(), 2);
    }

    #[test]
    fn test_missing_scopes() {
        let effective = ScopeResolver::resolve(None, None, None);
        assert!(effective.is_empty());
        assert!(effective.hooks_for(HookEvent::Stop).is_empty());

        let local = settings_with(SettingsScope::Local, None, "C");
        let effective = ScopeResolver::resolve(None, None, Some(&local));
        assert_eq!(effective.events().collect::<Vec<_>>(), vec![HookEvent::PostToolUse]);
    }

    #[test]
    fn test_matching_filters_by_tool() {
        let global = settings_with(SettingsScope::Global, Some("Edit|Write"), "fmt");
        let project = settings_with(SettingsScope::Project, Some(""), "log");
        let local = settings_with(SettingsScope::Local, Some("Bash"), "audit");

        let effective = ScopeResolver::resolve(Some(&global), Some(&project), Some(&local));
        let matched: Vec<_> = effective
            .matching(HookEvent::PostToolUse, "Write")
            .into_iter()
            .map(|scoped| scoped.configuration.hooks[0].command.as_str())
            .collect();
        assert_eq!(matched, vec!["fmt", "log"]);
    }
}
