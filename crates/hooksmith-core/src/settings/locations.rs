//! Settings file location discovery
//!
//! Each scope owns exactly one file:
//! - Global: ~/.claude/settings.json
//! - Project: <project-root>/.claude/settings.json
//! - Local: <project-root>/.claude/settings.local.json

use std::path::{Path, PathBuf};

use super::types::SettingsScope;

/// Directory holding settings files under the home and project roots
pub const SETTINGS_DIR: &str = ".claude";

const SETTINGS_FILE: &str = "settings.json";
const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

/// Resolved settings file locations for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeLocations {
    /// Home directory root
    pub home: PathBuf,

    /// Project root directory
    pub project_root: PathBuf,
}

impl ScopeLocations {
    /// Build locations from explicit roots
    pub fn new(home: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            project_root: project_root.into(),
        }
    }

    /// Discover locations from the current directory
    pub fn discover() -> Self {
        Self::discover_from(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Discover locations from a specific directory
    ///
    /// The project root is the nearest ancestor containing `.claude` or `.git`;
    /// without either, the start directory itself is used. The home
    /// directory's `.claude` holds global settings and never marks a project.
    pub fn discover_from(start_dir: impl AsRef<Path>) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::discover_with_home(home, start_dir)
    }

    /// Discover the project root from `start_dir` with an explicit home
    pub fn discover_with_home(home: impl Into<PathBuf>, start_dir: impl AsRef<Path>) -> Self {
        let home = home.into();
        let start = start_dir.as_ref().to_path_buf();
        let project_root = Self::find_project_root(&start, &home).unwrap_or(start);
        Self { home, project_root }
    }

    /// Whether the project settings file is the global one
    ///
    /// Happens when discovery starts in the home directory outside any
    /// repository.
    pub fn project_is_global(&self) -> bool {
        same_dir(
            &self.project_root.join(SETTINGS_DIR),
            &self.home.join(SETTINGS_DIR),
        )
    }

    /// Path of the settings file owned by a scope
    pub fn path_for(&self, scope: SettingsScope) -> PathBuf {
        match scope {
            SettingsScope::Global => self.home.join(SETTINGS_DIR).join(SETTINGS_FILE),
            SettingsScope::Project => self.project_root.join(SETTINGS_DIR).join(SETTINGS_FILE),
            SettingsScope::Local => self
                .project_root
                .join(SETTINGS_DIR)
                .join(LOCAL_SETTINGS_FILE),
        }
    }

    /// Find the project root by looking for .claude directory or .git
    fn find_project_root(start_dir: &Path, home: &Path) -> Option<PathBuf> {
        let mut current = if start_dir.is_absolute() {
            start_dir.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(start_dir)
        };
        let global_dir = home.join(SETTINGS_DIR);

        loop {
            let settings_dir = current.join(SETTINGS_DIR);
            if settings_dir.is_dir() && !same_dir(&settings_dir, &global_dir) {
                return Some(current);
            }

            if current.join(".git").exists() {
                return Some(current);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_paths_per_scope() {
        let locations = ScopeLocations::new("/home/dev", "/work/repo");
        assert_eq!(
            locations.path_for(SettingsScope::Global),
            PathBuf::from("/home/dev/.claude/settings.json")
        );
        assert_eq!(
            locations.path_for(SettingsScope::Project),
            PathBuf::from("/work/repo/.claude/settings.json")
        );
        assert_eq!(
            locations.path_for(SettingsScope::Local),
            PathBuf::from("/work/repo/.claude/settings.local.json")
        );
    }

    #[test]
    fn test_discover_with_claude_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(".claude")).unwrap();
        let nested = temp_dir.path().join("src").join("bin");
        fs::create_dir_all(&nested).unwrap();

        let locations = ScopeLocations::discover_from(&nested);
        assert_eq!(locations.project_root, temp_dir.path().to_path_buf());
    }

    #[test]
    fn test_discover_with_git_fallback() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();

        let locations = ScopeLocations::discover_from(temp_dir.path());
        assert_eq!(locations.project_root, temp_dir.path().to_path_buf());
    }

    #[test]
    fn test_home_settings_dir_is_not_a_project() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        fs::create_dir_all(home.join(".claude")).unwrap();
        let notes = home.join("notes");
        fs::create_dir_all(&notes).unwrap();

        let locations = ScopeLocations::discover_with_home(&home, &notes);
        assert_eq!(locations.project_root, notes);
        assert_ne!(
            locations.path_for(SettingsScope::Global),
            locations.path_for(SettingsScope::Project)
        );

        assert!(!locations.project_is_global());

        let from_home = ScopeLocations::discover_with_home(&home, &home);
        assert_eq!(from_home.project_root, home);
        assert!(from_home.project_is_global());
    }

    #[test]
    fn test_git_repo_under_home_is_found() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        let repo = home.join("code").join("repo");
        fs::create_dir_all(home.join(".claude")).unwrap();
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(repo.join("src")).unwrap();

        let locations = ScopeLocations::discover_with_home(&home, repo.join("src"));
        assert_eq!(locations.project_root, repo);
    }
}
