//! Schema version tracking
//!
//! Parses and orders semantic versions, classifies a document's version
//! against the running schema, and detects the version of raw documents.

use semver::{Prerelease, Version};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{SettingsError, SettingsResult};
use crate::settings::types::LEGACY_VERSION;

/// A parsed `major.minor.patch[-prerelease][+build]` version
///
/// Equality, hashing and ordering follow precedence, so build metadata is
/// carried for display only.
#[derive(Debug, Clone)]
pub struct SemVer(Version);

impl SemVer {
    /// Parse a version string
    pub fn parse(input: &str) -> SettingsResult<Self> {
        Version::parse(input.trim())
            .map(SemVer)
            .map_err(|e| SettingsError::invalid_version(input, e.to_string()))
    }

    /// The schema version this build writes
    pub fn current() -> Self {
        SemVer(Version::new(1, 0, 0))
    }

    /// The legacy version assigned to unversioned documents
    pub fn legacy() -> Self {
        SemVer(Version::new(0, 0, 0))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn prerelease(&self) -> &str {
        self.0.pre.as_str()
    }

    /// Precedence ordering; build metadata does not participate
    pub fn precedence(&self, other: &SemVer) -> Ordering {
        self.0
            .major
            .cmp(&other.0.major)
            .then(self.0.minor.cmp(&other.0.minor))
            .then(self.0.patch.cmp(&other.0.patch))
            .then_with(|| compare_prerelease(&self.0.pre, &other.0.pre))
    }
}

impl PartialEq for SemVer {
    fn eq(&self, other: &Self) -> bool {
        self.precedence(other) == Ordering::Equal
    }
}

impl Eq for SemVer {}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence(other)
    }
}

impl Hash for SemVer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.as_str().hash(state);
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SemVer {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemVer::parse(s)
    }
}

/// A release outranks its own prereleases. Identifiers compare pairwise,
/// numerically when both are numeric, lexically otherwise; a shorter list
/// that is a prefix of the other sorts first.
fn compare_prerelease(a: &Prerelease, b: &Prerelease) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut left = a.as_str().split('.');
    let mut right = b.as_str().split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Compare two version strings
///
/// Returns `-1`, `0` or `1`.
pub fn compare(a: &str, b: &str) -> SettingsResult<i32> {
    let ordering = SemVer::parse(a)?.precedence(&SemVer::parse(b)?);
    Ok(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

/// Classification of a document version against the running schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionStatus {
    /// Exactly the running schema version
    Current,
    /// Still read without warnings, migrated on write
    Supported,
    /// Still readable, scheduled for removal
    Deprecated,
    /// Unknown or legacy; must be migrated before use
    Unsupported,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Current => "current",
            VersionStatus::Supported => "supported",
            VersionStatus::Deprecated => "deprecated",
            VersionStatus::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a detected version came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// The document declared a parseable version
    Declared,
    /// No `version` field
    Missing,
    /// A `version` field that is not a valid version string
    Malformed(String),
}

/// Result of inspecting a raw document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedVersion {
    pub version: SemVer,
    pub source: VersionSource,
}

impl DetectedVersion {
    /// Legacy documents are those without a usable version field
    pub fn is_legacy(&self) -> bool {
        self.source != VersionSource::Declared
    }
}

/// Determine the schema version of a raw document
///
/// Missing or malformed versions are reported as `0.0.0`.
pub fn detect_version(document: &Value) -> DetectedVersion {
    match document.get("version") {
        None | Some(Value::Null) => DetectedVersion {
            version: SemVer::legacy(),
            source: VersionSource::Missing,
        },
        Some(Value::String(raw)) => match SemVer::parse(raw) {
            Ok(version) => DetectedVersion {
                version,
                source: VersionSource::Declared,
            },
            Err(_) => {
                tracing::warn!("Settings version '{}' is malformed, treating as legacy", raw);
                DetectedVersion {
                    version: SemVer::legacy(),
                    source: VersionSource::Malformed(raw.clone()),
                }
            }
        },
        Some(other) => {
            tracing::warn!("Settings version {} is not a string, treating as legacy", other);
            DetectedVersion {
                version: SemVer::legacy(),
                source: VersionSource::Malformed(other.to_string()),
            }
        }
    }
}

/// Version classification against a compatibility table
#[derive(Debug, Clone)]
pub struct VersionTracker {
    current: SemVer,
    compatibility: Vec<(SemVer, VersionStatus)>,
}

impl VersionTracker {
    /// Tracker for the schema version this build writes
    pub fn new() -> Self {
        Self {
            current: SemVer::current(),
            compatibility: Vec::new(),
        }
    }

    /// Tracker for an arbitrary current version
    pub fn with_current(current: &str) -> SettingsResult<Self> {
        Ok(Self {
            current: SemVer::parse(current)?,
            compatibility: Vec::new(),
        })
    }

    /// Add a maintained compatibility table entry
    ///
    /// Only `Supported` and `Deprecated` are meaningful here; the legacy
    /// version can never be listed.
    pub fn with_compatibility(mut self, version: &str, status: VersionStatus) -> SettingsResult<Self> {
        let version = SemVer::parse(version)?;
        if version == SemVer::legacy() {
            return Err(SettingsError::invalid_version(
                LEGACY_VERSION,
                "the legacy version is always unsupported",
            ));
        }
        self.compatibility.retain(|(v, _)| v != &version);
        self.compatibility.push((version, status));
        Ok(self)
    }

    /// The running schema version
    pub fn current(&self) -> &SemVer {
        &self.current
    }

    /// Classify a parsed version
    pub fn classify(&self, version: &SemVer) -> VersionStatus {
        if version == &self.current {
            return VersionStatus::Current;
        }
        if version == &SemVer::legacy() {
            return VersionStatus::Unsupported;
        }
        self.compatibility
            .iter()
            .find(|(v, _)| v == version)
            .map(|(_, status)| *status)
            .unwrap_or(VersionStatus::Unsupported)
    }

    /// Classify a raw document, treating missing versions as legacy
    pub fn classify_document(&self, document: &Value) -> (DetectedVersion, VersionStatus) {
        let detected = detect_version(document);
        let status = if detected.is_legacy() {
            VersionStatus::Unsupported
        } else {
            self.classify(&detected.version)
        };
        (detected, status)
    }

    /// Same major version; for `0.x` the minor must match too
    pub fn is_compatible(&self, a: &SemVer, b: &SemVer) -> bool {
        if a.major() == 0 || b.major() == 0 {
            a.major() == b.major() && a.minor() == b.minor()
        } else {
            a.major() == b.major()
        }
    }
}

impl Default for VersionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::CURRENT_SCHEMA_VERSION;
    use serde_json::json;

    #[test]
    fn test_current_matches_schema_constant() {
        assert_eq!(SemVer::current().to_string(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_compare_ordering() {
        assert_eq!(compare("1.2.3", "1.2.4").unwrap(), -1);
        assert_eq!(compare("1.0.0-alpha", "1.0.0").unwrap(), -1);
        assert_eq!(compare("2.0.0", "1.9.9").unwrap(), 1);
        assert_eq!(compare("1.0.0", "1.0.0").unwrap(), 0);
    }

    #[test]
    fn test_compare_prerelease_identifiers() {
        assert_eq!(compare("1.0.0-alpha.2", "1.0.0-alpha.10").unwrap(), -1);
        assert_eq!(compare("1.0.0-alpha", "1.0.0-beta").unwrap(), -1);
        assert_eq!(compare("1.0.0-alpha", "1.0.0-alpha.1").unwrap(), -1);
        assert_eq!(compare("1.0.0-rc.1", "1.0.0-beta.11").unwrap(), 1);
    }

    #[test]
    fn test_compare_ignores_build_metadata() {
        assert_eq!(compare("1.0.0+build.5", "1.0.0+build.7").unwrap(), 0);

        let tagged = SemVer::parse("1.0.0+sha.abc").unwrap();
        assert_eq!(tagged, SemVer::current());
        assert_eq!(tagged.to_string(), "1.0.0+sha.abc");
        assert_eq!(VersionTracker::new().classify(&tagged), VersionStatus::Current);
        assert!(SemVer::parse("1.0.0-rc.1").unwrap() < SemVer::current());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["1.0", "v1.0.0", "1.0.0.0", "", "a.b.c", "1.0.0-"] {
            let err = SemVer::parse(input).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_VERSION", "input {input:?}");
        }
    }

    #[test]
    fn test_parse_accessors() {
        let version = SemVer::parse("3.4.5-rc.1+sha.abc").unwrap();
        assert_eq!(
            (version.major(), version.minor(), version.patch()),
            (3, 4, 5)
        );
        assert_eq!(version.prerelease(), "rc.1");
    }

    #[test]
    fn test_classify() {
        let tracker = VersionTracker::new()
            .with_compatibility("0.9.0", VersionStatus::Supported)
            .unwrap()
            .with_compatibility("0.5.0", VersionStatus::Deprecated)
            .unwrap();

        assert_eq!(
            tracker.classify(&SemVer::parse("1.0.0").unwrap()),
            VersionStatus::Current
        );
        assert_eq!(
            tracker.classify(&SemVer::parse("0.9.0").unwrap()),
            VersionStatus::Supported
        );
        assert_eq!(
            tracker.classify(&SemVer::parse("0.5.0").unwrap()),
            VersionStatus::Deprecated
        );
        assert_eq!(
            tracker.classify(&SemVer::parse("2.0.0").unwrap()),
            VersionStatus::Unsupported
        );
        assert_eq!(
            tracker.classify(&SemVer::legacy()),
            VersionStatus::Unsupported
        );
    }

    #[test]
    fn test_legacy_cannot_be_listed() {
        assert!(
            VersionTracker::new()
                .with_compatibility("0.0.0", VersionStatus::Supported)
                .is_err()
        );
    }

    #[test]
    fn test_detect_version() {
        let detected = detect_version(&json!({}));
        assert_eq!(detected.version, SemVer::legacy());
        assert_eq!(detected.source, VersionSource::Missing);

        let detected = detect_version(&json!({"version": "banana"}));
        assert!(detected.is_legacy());
        assert_eq!(
            detected.source,
            VersionSource::Malformed("banana".to_string())
        );

        let detected = detect_version(&json!({"version": 2}));
        assert!(detected.is_legacy());

        let detected = detect_version(&json!({"version": "1.0.0"}));
        assert!(!detected.is_legacy());
        assert_eq!(detected.version.to_string(), "1.0.0");
    }

    #[test]
    fn test_classify_document_legacy_is_unsupported() {
        let tracker = VersionTracker::new();
        let (_, status) = tracker.classify_document(&json!({"hooks": {}}));
        assert_eq!(status, VersionStatus::Unsupported);

        let (_, status) = tracker.classify_document(&json!({"version": "1.0.0"}));
        assert_eq!(status, VersionStatus::Current);
    }

    #[test]
    fn test_is_compatible() {
        let tracker = VersionTracker::new();
        let v = |s: &str| SemVer::parse(s).unwrap();
        assert!(tracker.is_compatible(&v("1.0.0"), &v("1.4.2")));
        assert!(!tracker.is_compatible(&v("1.0.0"), &v("2.0.0")));
        assert!(tracker.is_compatible(&v("0.3.1"), &v("0.3.9")));
        assert!(!tracker.is_compatible(&v("0.3.1"), &v("0.4.0")));
    }
}
