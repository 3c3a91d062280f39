use serde::{Serialize, Deserialize};

/// Byte-offset span in source text, tagged with the line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32) -> Self {
        Self { start, end, line }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 0 }
    }

    /// Span covering `self` through `other`. Keeps the starting line.
    pub fn to(self, other: Span) -> Self {
        Self { start: self.start, end: other.end.max(self.end), line: self.line }
    }
}

/// A value annotated with its source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self { node, span: Span::dummy() }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }
}
