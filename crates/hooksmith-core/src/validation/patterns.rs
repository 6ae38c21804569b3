//! Dangerous command detection
//!
//! Hook commands run unattended on every matching event, so commands that can
//! destroy data are flagged when the settings are validated:
//! - Recursive force delete
//! - Redirects onto raw block devices
//! - Disk formatting and partitioning tools
//! - Raw `dd` writes to devices
//! - Fork bombs

use regex::Regex;
use std::sync::LazyLock;

/// Pattern for recursive force delete (`rm -rf`, `rm -fr`, `rm -r -f`, long flags)
static RECURSIVE_DELETE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\brm\s+(?:-\w*[rR]\w*f\w*|-\w*f\w*[rR]\w*|-[rR]\s+-f|-f\s+-[rR]|--recursive\s+--force|--force\s+--recursive)\b",
    )
    .expect("recursive delete pattern is valid")
});

/// Pattern for redirects onto a whole block device
static DEVICE_WRITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">\s*/dev/(?:sd[a-z]|hd[a-z]|vd[a-z]|xvd[a-z]|nvme\d+n\d+|mmcblk\d+|disk\d+)")
        .expect("device write pattern is valid")
});

/// Pattern for filesystem creation and partitioning tools
static DISK_FORMAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:mkfs(?:\.\w+)?|fdisk|sfdisk|parted|wipefs)\b")
        .expect("disk format pattern is valid")
});

/// Pattern for dd writing to a device node
static RAW_DD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdd\b[^|;&]*\bof=/dev/").expect("raw dd pattern is valid")
});

/// Pattern for the classic shell fork bomb
static FORK_BOMB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:").expect("fork bomb pattern is valid")
});

/// A dangerous pattern found in a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DangerousMatch {
    /// Short name of the rule
    pub rule: &'static str,
    /// Why the command is dangerous
    pub reason: &'static str,
}

fn rules() -> [(&'static LazyLock<Regex>, DangerousMatch); 5] {
    [
        (
            &RECURSIVE_DELETE_PATTERN,
            DangerousMatch {
                rule: "recursive-delete",
                reason: "recursive force delete",
            },
        ),
        (
            &DEVICE_WRITE_PATTERN,
            DangerousMatch {
                rule: "device-write",
                reason: "writes directly to a block device",
            },
        ),
        (
            &DISK_FORMAT_PATTERN,
            DangerousMatch {
                rule: "disk-format",
                reason: "formats or repartitions a disk",
            },
        ),
        (
            &RAW_DD_PATTERN,
            DangerousMatch {
                rule: "raw-dd",
                reason: "raw dd write to a device",
            },
        ),
        (
            &FORK_BOMB_PATTERN,
            DangerousMatch {
                rule: "fork-bomb",
                reason: "fork bomb",
            },
        ),
    ]
}

/// Every dangerous pattern the command matches, in rule order
pub fn check_dangerous_patterns(command: &str) -> Vec<DangerousMatch> {
    rules()
        .into_iter()
        .filter(|(pattern, _)| pattern.is_match(command))
        .map(|(_, found)| found)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_for(command: &str) -> Vec<&'static str> {
        check_dangerous_patterns(command)
            .into_iter()
            .map(|m| m.rule)
            .collect()
    }

    #[test]
    fn test_recursive_delete_variants() {
        assert_eq!(rules_for("rm -rf /"), vec!["recursive-delete"]);
        assert_eq!(rules_for("rm -fr build"), vec!["recursive-delete"]);
        assert_eq!(rules_for("rm -Rf ~/tmp"), vec!["recursive-delete"]);
        assert_eq!(rules_for("rm -r -f out"), vec!["recursive-delete"]);
        assert_eq!(rules_for("rm --recursive --force out"), vec!["recursive-delete"]);
    }

    #[test]
    fn test_plain_delete_is_allowed() {
        assert!(rules_for("rm -f stale.lock").is_empty());
        assert!(rules_for("rm -r empty_dir").is_empty());
        assert!(rules_for("cargo fmt --all").is_empty());
    }

    #[test]
    fn test_device_writes() {
        assert_eq!(rules_for("echo x > /dev/sda"), vec!["device-write"]);
        assert_eq!(rules_for("cat img >/dev/nvme0n1"), vec!["device-write"]);
        assert!(rules_for("echo x > /dev/null").is_empty());
    }

    #[test]
    fn test_disk_tools() {
        assert_eq!(rules_for("mkfs.ext4 /dev/sdb1"), vec!["disk-format"]);
        assert_eq!(rules_for("wipefs -a /dev/sdb"), vec!["disk-format"]);
        assert_eq!(rules_for("parted /dev/sdb mklabel gpt"), vec!["disk-format"]);
    }

    #[test]
    fn test_raw_dd() {
        assert_eq!(
            rules_for("dd if=/dev/zero of=/dev/sda bs=1M"),
            vec!["raw-dd"]
        );
        assert!(rules_for("dd if=/dev/zero of=./disk.img bs=1M").is_empty());
    }

    #[test]
    fn test_fork_bomb() {
        assert_eq!(rules_for(":(){ :|:& };:"), vec!["fork-bomb"]);
    }
}
