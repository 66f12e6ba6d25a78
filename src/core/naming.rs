//! core::naming
//!
//! Branch names derived from commit messages.
//!
//! The derivation is lossy but deterministic, and must stay stable: branches
//! created by earlier versions are looked up by the same rule.

/// Longest name [`slugify`] produces.
pub const MAX_SLUG_LEN: usize = 50;

/// Derive a branch name from a commit message.
///
/// - Lower-case the message
/// - Collapse every run of characters outside `[a-z0-9]` into one `-`
/// - Trim leading and trailing hyphens
/// - Truncate to [`MAX_SLUG_LEN`] characters, then drop a trailing hyphen
///
/// The result may be empty when the message has no ASCII alphanumerics.
///
/// # Example
///
/// ```
/// use gtstack::core::naming::slugify;
///
/// assert_eq!(slugify("Fix bug in parser"), "fix-bug-in-parser");
/// assert_eq!(slugify("Fix: issue #123"), "fix-issue-123");
/// assert_eq!(slugify("feature/test-branch"), "feature-test-branch");
/// ```
pub fn slugify(message: &str) -> String {
    let lowered = message.to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut in_gap = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if in_gap && !slug.is_empty() {
                slug.push('-');
            }
            in_gap = false;
            slug.push(c);
        } else {
            in_gap = true;
        }
    }

    // Only ASCII survives the loop, so byte truncation is char truncation.
    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_table() {
        let cases = [
            ("Fix bug in parser", "fix-bug-in-parser"),
            ("Add new feature!", "add-new-feature"),
            ("Update README.md file", "update-readme-md-file"),
            ("feature/test-branch", "feature-test-branch"),
            ("Fix: issue #123", "fix-issue-123"),
            ("UPPERCASE MESSAGE", "uppercase-message"),
            ("Multiple   spaces   between", "multiple-spaces-between"),
            ("---leading-and-trailing---", "leading-and-trailing"),
        ];
        for (input, expected) in cases {
            assert_eq!(slugify(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn slugify_truncates_to_fifty() {
        let long = "This is a very long branch name that exceeds the maximum length allowed for branch names";
        let slug = slugify(long);
        assert_eq!(slug, "this-is-a-very-long-branch-name-that-exceeds-the-m");
        assert_eq!(slug.len(), MAX_SLUG_LEN);
    }

    #[test]
    fn slugify_drops_hyphen_left_by_truncation() {
        // Character 50 lands on a separator.
        let message = format!("{} tail", "a".repeat(49));
        let slug = slugify(&message);
        assert_eq!(slug, "a".repeat(49));
    }

    #[test]
    fn slugify_handles_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!! ???"), "");
    }

    #[test]
    fn slugify_replaces_non_ascii_letters() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
    }

    #[test]
    fn slugify_joins_lines() {
        assert_eq!(slugify("First line\nSecond line"), "first-line-second-line");
    }
}
