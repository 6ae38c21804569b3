//! Pattern matching for hook configurations
//!
//! A configuration's `matcher` selects which tool names it applies to.
//! Empty, absent and `*` match everything; anything else is treated as a
//! regular expression that must match the whole tool name.

use regex::Regex;

/// Whether a matcher value means "always apply"
pub fn is_wildcard(pattern: Option<&str>) -> bool {
    matches!(pattern.map(str::trim), None | Some("") | Some("*"))
}

/// Compile a matcher into an anchored regex
///
/// Returns `Ok(None)` for wildcard matchers.
pub fn compile(pattern: Option<&str>) -> Result<Option<Regex>, regex::Error> {
    if is_wildcard(pattern) {
        return Ok(None);
    }
    let pattern = pattern.unwrap_or_default().trim();
    Regex::new(&format!("^(?:{pattern})$")).map(Some)
}

/// Match a tool name against a matcher
///
/// An invalid regex never matches. The validator reports those separately.
///
/// ```
/// use hooksmith_core::hooks::matcher::matches;
///
/// assert!(matches(None, "Bash"));
/// assert!(matches(Some(""), "Bash"));
/// assert!(matches(Some("Bash"), "Bash"));
/// assert!(matches(Some("Edit|Write"), "Write"));
/// assert!(!matches(Some("Edit|Write"), "MultiEdit"));
/// assert!(matches(Some("mcp__.*"), "mcp__github__search"));
/// assert!(!matches(Some("[invalid"), "[invalid"));
/// ```
pub fn matches(pattern: Option<&str>, tool_name: &str) -> bool {
    match compile(pattern) {
        Ok(None) => true,
        Ok(Some(re)) => re.is_match(tool_name),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards() {
        assert!(is_wildcard(None));
        assert!(is_wildcard(Some("")));
        assert!(is_wildcard(Some("  ")));
        assert!(is_wildcard(Some("*")));
        assert!(!is_wildcard(Some("Bash")));
    }

    #[test]
    fn test_exact_match_is_anchored() {
        assert!(matches(Some("Bash"), "Bash"));
        assert!(!matches(Some("Bash"), "BashOutput"));
        assert!(!matches(Some("bash"), "Bash"));
    }

    #[test]
    fn test_alternatives() {
        let pattern = Some("Edit|MultiEdit|Write");
        assert!(matches(pattern, "Edit"));
        assert!(matches(pattern, "MultiEdit"));
        assert!(matches(pattern, "Write"));
        assert!(!matches(pattern, "Read"));
    }

    #[test]
    fn test_regex_patterns() {
        assert!(matches(Some("Notebook.*"), "NotebookEdit"));
        assert!(matches(Some("(?i)bash"), "BASH"));
        assert!(!matches(Some("Notebook.*"), "Edit"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(compile(Some("(unclosed")).is_err());
        assert!(!matches(Some("(unclosed"), "anything"));
    }
}
