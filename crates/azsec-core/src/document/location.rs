//! Source location tracking
//!
//! Every node of the document model carries the exact span it occupied in its
//! source file. Spans come out of the parser as byte offsets; this module turns
//! them into the 1-based line/column ranges that issues are reported on.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A position inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    /// Line number (1-based)
    pub line: usize,
    /// Column number in characters (1-based)
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A span inside a named source file. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub file: Arc<str>,
    pub start: Pos,
    pub end: Pos,
}

impl SourceRange {
    pub fn new(file: impl Into<Arc<str>>, start: Pos, end: Pos) -> Self {
        Self { file: file.into(), start, end }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.file, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Maps source spans (byte offsets) to line/column positions
pub struct SourceMapper<'a> {
    source: &'a str,
    file: Arc<str>,
    line_starts: Vec<usize>,
}

impl<'a> SourceMapper<'a> {
    /// Create a new source mapper for the given source text
    pub fn new(source: &'a str, file: impl Into<Arc<str>>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, file: file.into(), line_starts }
    }

    /// Convert a byte offset to a position. Offsets past the end clamp to the end of input.
    pub fn position(&self, offset: usize) -> Pos {
        let offset = offset.min(self.source.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let line_start = self.line_starts[line_index];
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Pos::new(line_index + 1, column + 1)
    }

    /// Convert a span (byte range) to a source range
    pub fn span_to_range(&self, span: &Range<usize>) -> SourceRange {
        SourceRange::new(self.file.clone(), self.position(span.start), self.position(span.end))
    }

    /// Convert an optional span, falling back to an empty range at the start of the file
    pub fn optional_span_to_range(&self, span: Option<&Range<usize>>) -> SourceRange {
        match span {
            Some(span) => self.span_to_range(span),
            None => {
                let start = Pos::new(1, 1);
                SourceRange::new(self.file.clone(), start, start)
            }
        }
    }
}
