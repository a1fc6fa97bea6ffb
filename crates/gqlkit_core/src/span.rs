//! Byte-offset spans into a GraphQL source.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end` into a [`Source`](crate::Source).
///
/// The default span is `0..0`; built-in definitions that never came from
/// source text carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lets syntax errors label their span in a `miette` report.
impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}
