use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::config::CherryPickConfig;

static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9]+)*$").expect("version token pattern is valid")
});

/// A release branch a merged PR should be backported to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackportTarget {
    pub branch: String,
    pub version: String,
}

impl fmt::Display for BackportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.branch, self.version)
    }
}

/// Maps label text to backport targets.
///
/// A backport label is one of the configured prefixes followed by a dotted
/// numeric version, e.g. `release-5.0` or `needs-cherry-pick-4.0.1`. The
/// target branch is always `<branch_prefix><version>`, so several label
/// spellings can resolve to the same branch.
#[derive(Debug, Clone)]
pub struct LabelParser {
    label_prefixes: Vec<String>,
    status_prefixes: Vec<String>,
    branch_prefix: String,
}

impl LabelParser {
    pub fn new(config: &CherryPickConfig) -> Self {
        Self {
            label_prefixes: config.label_prefixes.clone(),
            status_prefixes: config.status_prefixes.clone(),
            branch_prefix: config.branch_prefix.clone(),
        }
    }

    /// Review/approval labels such as `LGTM` or `status/can-merge`
    pub fn is_status_label(&self, label: &str) -> bool {
        self.status_prefixes
            .iter()
            .any(|prefix| label.starts_with(prefix.as_str()))
    }

    pub fn parse(&self, label: &str) -> Option<BackportTarget> {
        if self.is_status_label(label) {
            return None;
        }

        self.label_prefixes.iter().find_map(|prefix| {
            let version = label.strip_prefix(prefix.as_str())?;
            VERSION_TOKEN.is_match(version).then(|| BackportTarget {
                branch: format!("{}{}", self.branch_prefix, version),
                version: version.to_string(),
            })
        })
    }
}

impl Default for LabelParser {
    fn default() -> Self {
        Self::new(&CherryPickConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn target(branch: &str, version: &str) -> Option<BackportTarget> {
        Some(BackportTarget {
            branch: branch.to_string(),
            version: version.to_string(),
        })
    }

    #[test]
    fn test_release_labels_map_to_release_branches() {
        let parser = LabelParser::default();
        assert_eq!(parser.parse("release-5.0"), target("release-5.0", "5.0"));
        assert_eq!(parser.parse("release-4.0.12"), target("release-4.0.12", "4.0.12"));
        assert_eq!(parser.parse("needs-cherry-pick-3.1"), target("release-3.1", "3.1"));
    }

    #[test]
    fn test_non_backport_labels_are_rejected() {
        let parser = LabelParser::default();
        for label in [
            "LGTM",
            "LGT2",
            "release-",
            "release-5.x",
            "release-5.0-beta",
            "Release-5.0",
            "type/bug",
            "",
            "release-.5",
        ] {
            assert_eq!(parser.parse(label), None, "label {label:?} should not parse");
        }
    }

    #[test]
    fn test_status_prefix_wins_over_backport_prefix() {
        let config = CherryPickConfig {
            status_prefixes: vec!["release-blocker".to_string()],
            ..CherryPickConfig::default()
        };
        let parser = LabelParser::new(&config);
        assert!(parser.is_status_label("release-blocker"));
        assert_eq!(parser.parse("release-blocker"), None);
        assert_eq!(parser.parse("release-6.1"), target("release-6.1", "6.1"));
    }

    #[test]
    fn test_custom_branch_prefix() {
        let config = CherryPickConfig {
            label_prefixes: vec!["backport/".to_string()],
            branch_prefix: "stable/v".to_string(),
            ..CherryPickConfig::default()
        };
        let parser = LabelParser::new(&config);
        assert_eq!(parser.parse("backport/2.3"), target("stable/v2.3", "2.3"));
        assert_eq!(parser.parse("release-2.3"), None);
    }

    proptest! {
        #[test]
        fn prop_backport_labels_parse_deterministically(
            parts in prop::collection::vec(0u32..1000, 1..4)
        ) {
            let version = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
            let label = format!("release-{version}");
            let parser = LabelParser::default();

            let first = parser.parse(&label);
            prop_assert_eq!(first.clone(), target(&label, &version));
            prop_assert_eq!(parser.parse(&label), first);
        }

        #[test]
        fn prop_status_labels_never_parse(suffix in ".*") {
            let parser = LabelParser::default();
            let label = format!("LGT{suffix}");
            prop_assert!(parser.is_status_label(&label));
            prop_assert_eq!(parser.parse(&label), None);
        }
    }
}
