//! Source text and line/column lookup.

use memchr::memchr2_iter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 1-based line/column pair, as reported in GraphQL error `locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A named GraphQL source with a precomputed line index.
///
/// Line terminators are `\n`, `\r\n` and a lone `\r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    body: String,
    line_starts: Vec<u32>,
}

impl Source {
    /// Default name given to anonymous sources.
    pub const DEFAULT_NAME: &'static str = "GraphQL request";

    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_name(body, Self::DEFAULT_NAME)
    }

    #[must_use]
    pub fn with_name(body: impl Into<String>, name: impl Into<String>) -> Self {
        let body = body.into();
        let bytes = body.as_bytes();
        let mut line_starts = vec![0];
        for pos in memchr2_iter(b'\n', b'\r', bytes) {
            if bytes[pos] == b'\r' && bytes.get(pos + 1) == Some(&b'\n') {
                continue;
            }
            line_starts.push(u32::try_from(pos + 1).unwrap_or(u32::MAX));
        }
        Self {
            name: name.into(),
            body,
            line_starts,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Converts a byte offset to a line/column pair.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to
    /// the last position.
    #[must_use]
    pub fn location(&self, offset: u32) -> SourceLocation {
        let offset = offset.min(u32::try_from(self.body.len()).unwrap_or(u32::MAX));
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line] as usize;
        let end = (offset as usize).max(start);
        let column = self
            .body
            .get(start..end)
            .map_or(end - start, |text| text.chars().count());
        SourceLocation {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: u32::try_from(column + 1).unwrap_or(u32::MAX),
        }
    }
}
