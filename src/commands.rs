use std::fmt;

pub const CHERRY_PICK_TRIGGER: &str = "/run-cherry-picker";
pub const CHERRY_PICK_INVITE: &str = "/cherry-pick-invite";
pub const AUTO_MERGE: &str = "/run-auto-merge";
pub const AUTO_MERGE_ALIAS: &str = "/merge";

/// Comment commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CherryPickTrigger,
    CherryPickInvite,
    AutoMerge,
    AutoMergeAlias,
    None,
}

impl Command {
    /// Recognize the command carried by a comment body.
    ///
    /// Only the first non-blank line counts, compared after trimming and
    /// matched exactly. Anything after that line is free text.
    pub fn recognize(body: &str) -> Self {
        let Some(candidate) = body.lines().map(str::trim).find(|line| !line.is_empty()) else {
            return Command::None;
        };

        match candidate {
            CHERRY_PICK_TRIGGER => Command::CherryPickTrigger,
            CHERRY_PICK_INVITE => Command::CherryPickInvite,
            AUTO_MERGE => Command::AutoMerge,
            AUTO_MERGE_ALIAS => Command::AutoMergeAlias,
            _ => Command::None,
        }
    }

    pub fn is_auto_merge(self) -> bool {
        matches!(self, Command::AutoMerge | Command::AutoMergeAlias)
    }

    pub fn token(self) -> Option<&'static str> {
        match self {
            Command::CherryPickTrigger => Some(CHERRY_PICK_TRIGGER),
            Command::CherryPickInvite => Some(CHERRY_PICK_INVITE),
            Command::AutoMerge => Some(AUTO_MERGE),
            Command::AutoMergeAlias => Some(AUTO_MERGE_ALIAS),
            Command::None => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token().unwrap_or("none"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_recognize_exact_tokens() {
        assert_eq!(Command::recognize("/run-cherry-picker"), Command::CherryPickTrigger);
        assert_eq!(Command::recognize("/cherry-pick-invite"), Command::CherryPickInvite);
        assert_eq!(Command::recognize("/run-auto-merge"), Command::AutoMerge);
        assert_eq!(Command::recognize("/merge"), Command::AutoMergeAlias);
    }

    #[test]
    fn test_leading_blank_lines_and_trailing_text_are_ignored() {
        assert_eq!(
            Command::recognize("\n  /run-cherry-picker\nplease"),
            Command::CherryPickTrigger
        );
        assert_eq!(Command::recognize("\r\n\t/merge \r\nthanks!"), Command::AutoMergeAlias);
    }

    #[test]
    fn test_only_first_non_blank_line_counts() {
        assert_eq!(Command::recognize("please\n/run-cherry-picker"), Command::None);
    }

    #[test]
    fn test_no_partial_or_case_insensitive_match() {
        for body in [
            "/run-cherry-picker now",
            "/RUN-CHERRY-PICKER",
            "/merge-it",
            "run-auto-merge",
            "",
            "   \n\n ",
        ] {
            assert_eq!(Command::recognize(body), Command::None, "body {body:?}");
        }
    }

    #[test]
    fn test_auto_merge_family() {
        assert!(Command::AutoMerge.is_auto_merge());
        assert!(Command::AutoMergeAlias.is_auto_merge());
        assert!(!Command::CherryPickTrigger.is_auto_merge());
        assert_eq!(Command::None.to_string(), "none");
    }

    proptest! {
        #[test]
        fn prop_trailing_content_does_not_change_result(
            blank in "[ \t\n]{0,6}",
            tail in "(\n[^\n]*){0,3}",
        ) {
            let body = format!("{blank}/run-auto-merge{tail}");
            prop_assert_eq!(Command::recognize(&body), Command::AutoMerge);
        }
    }
}
