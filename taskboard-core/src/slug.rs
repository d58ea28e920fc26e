//! Column slug rule.
//!
//! A column's local id is derived from its title: lowercase, every run of
//! whitespace collapsed to a single `_`, then everything outside
//! `[a-z0-9_]` dropped. Accented letters are dropped, not transliterated.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

/// Suffix appended to a column title when the column is duplicated.
pub const COPY_SUFFIX: &str = " - Cópia";

pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let underscored = WHITESPACE_RE.replace_all(&lower, "_");
    DISALLOWED_RE.replace_all(&underscored, "").into_owned()
}

/// Title given to the copy of a column.
pub fn copy_title(title: &str) -> String {
    format!("{}{}", title, COPY_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("My  Board!", "my_board")]
    #[case("To Do", "to_do")]
    #[case("In\tProgress\n", "in_progress_")]
    #[case("Sprint 42", "sprint_42")]
    #[case("Concluído", "concludo")]
    #[case("already_slugged", "already_slugged")]
    #[case("", "")]
    fn test_slugify(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }

    #[test]
    fn test_slugify_deterministic() {
        let title = "Release — Week 3 (QA)";
        assert_eq!(slugify(title), slugify(title));
    }

    #[test]
    fn test_copy_title_slug() {
        let title = copy_title("My Board");
        assert_eq!(title, "My Board - Cópia");
        assert_eq!(slugify(&title), "my_board__cpia");
    }
}
