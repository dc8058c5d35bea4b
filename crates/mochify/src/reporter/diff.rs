//! Line diff for assertion failures.

use super::{Color, Palette};
use similar::{ChangeTag, TextDiff};

/// `+ expected - actual` block listing every line of both values
#[must_use]
pub fn unified_diff(actual: &str, expected: &str, colors: bool) -> String {
    const INDENT: &str = "      ";
    let palette = Palette::new(colors);
    // Terminate both sides so the last lines compare equal when unchanged
    let old = format!("{actual}\n");
    let new = format!("{expected}\n");
    let diff = TextDiff::from_lines(&old, &new);
    let body: Vec<String> = diff
        .iter_all_changes()
        .map(|change| {
            let line = change.value().trim_end_matches('\n');
            match change.tag() {
                ChangeTag::Equal => format!("{INDENT} {line}"),
                ChangeTag::Delete => {
                    format!("{INDENT}{}", palette.paint(Color::DiffRemoved, &format!("-{line}")))
                }
                ChangeTag::Insert => {
                    format!("{INDENT}{}", palette.paint(Color::DiffAdded, &format!("+{line}")))
                }
            }
        })
        .collect();
    format!(
        "\n{INDENT}{} {}\n\n{}",
        palette.paint(Color::DiffAdded, "+ expected"),
        palette.paint(Color::DiffRemoved, "- actual"),
        body.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_change() {
        assert_eq!(
            unified_diff("1", "2", false),
            "\n      + expected - actual\n\n      -1\n      +2"
        );
    }

    #[test]
    fn test_context_lines_are_kept() {
        let diff = unified_diff("{\n  a: 1,\n  b: 2\n}", "{\n  a: 1,\n  b: 3\n}", false);
        let lines: Vec<&str> = diff.lines().skip(3).collect();
        assert_eq!(
            lines,
            vec!["       {", "         a: 1,", "      -  b: 2", "      +  b: 3", "       }"]
        );
    }

    #[test]
    fn test_appended_line_keeps_shared_prefix() {
        let diff = unified_diff("[\n  1\n]", "[\n  1,\n  2\n]", false);
        let lines: Vec<&str> = diff.lines().skip(3).collect();
        assert_eq!(lines[0], "       [");
        assert!(lines.contains(&"      -  1"));
        assert!(lines.contains(&"      +  1,"));
        assert!(lines.contains(&"      +  2"));
        assert_eq!(lines.last(), Some(&"       ]"));
    }

    #[test]
    fn test_identical_values() {
        let diff = unified_diff("same", "same", false);
        assert!(diff.ends_with("       same"));
    }
}
