//! Helpers for tests that analyze inline configuration sources

use crate::document::{Document, Pos, SourceRange};

/// Parse `(file name, source)` pairs, panicking on invalid input
pub fn document(sources: &[(&str, &str)]) -> Document {
    Document::parse(sources.iter().copied())
        .unwrap_or_else(|e| panic!("test source does not parse: {e}"))
}

/// Range from `(line, column)` to `(line, column)`, 1-based, end exclusive
pub fn range(file: &str, start: (usize, usize), end: (usize, usize)) -> SourceRange {
    SourceRange::new(file, Pos::new(start.0, start.1), Pos::new(end.0, end.1))
}

/// Compare issues as ordered `(rule, message, range)` triples
#[macro_export]
macro_rules! assert_issues {
    ($issues:expr, [$(($rule:expr, $message:expr, $range:expr)),* $(,)?]) => {{
        let actual: Vec<(String, String, $crate::document::SourceRange)> = $issues
            .iter()
            .map(|issue: &$crate::issue::Issue| {
                (issue.rule.clone(), issue.message.clone(), issue.range.clone())
            })
            .collect();
        let expected: Vec<(String, String, $crate::document::SourceRange)> =
            vec![$(($rule.to_string(), $message.to_string(), $range)),*];
        assert_eq!(actual, expected);
    }};
}
