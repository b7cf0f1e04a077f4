//! Metadata headers and the merge algorithm.
//!
//! Every parsed value is paired with metadata whose outermost part is a
//! [`Header`]: how many errors were found beneath this node, the first of
//! them, and the source span the node covered. Parents build their header by
//! [merging](Header::merge) the headers of their children.

use std::fmt;

use thiserror::Error;

/// Byte range in the input, `start..end`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `pos`.
    #[inline]
    pub const fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length in bytes; inverted spans clamp to 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both.
    #[inline]
    pub fn join(&self, other: &Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parse diagnostic recorded in a header.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrMsg {
    #[error("expected literal {0:?}")]
    ExpectedLiteral(String),

    #[error("input does not match /{0}/")]
    RegexNoMatch(String),

    #[error("expected integer")]
    ExpectedInt,

    #[error("expected character")]
    ExpectedChar,

    #[error("expected digit")]
    ExpectedDigit,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected end of input")]
    ExpectedEof,

    #[error("expected end of record")]
    ExpectedEor,

    #[error("input ended before terminator")]
    MissingTerminator,

    #[error("element parser made no progress")]
    NoProgress,

    #[error("fixed-width field needs {expected} bytes, found {found}")]
    ShortField { expected: usize, found: usize },

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("no case matches {0}")]
    NoMatchingCase(String),

    #[error("{0} bytes of input left unparsed")]
    ExtraInput(usize),
}

/// A diagnostic with the span it was raised at.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub msg: ErrMsg,
    pub span: Option<Span>,
}

impl Diagnostic {
    #[inline]
    pub fn new(msg: ErrMsg, span: Option<Span>) -> Self {
        Self { msg, span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{} at {}", self.msg, span),
            None => write!(f, "{}", self.msg),
        }
    }
}

/// The universal part of metadata.
///
/// `nerr` counts every error at or beneath this node; `err` is the first of
/// them in parse order. A header is successful exactly when `nerr == 0`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub nerr: usize,
    pub err: Option<Diagnostic>,
    pub span: Option<Span>,
}

impl Header {
    /// Successful header covering `span`.
    #[inline]
    pub fn clean(span: Option<Span>) -> Self {
        Self {
            nerr: 0,
            err: None,
            span,
        }
    }

    /// Header holding a single error raised at `span`.
    #[inline]
    pub fn error(msg: ErrMsg, span: Option<Span>) -> Self {
        Self {
            nerr: 1,
            err: Some(Diagnostic::new(msg, span)),
            span,
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.nerr == 0
    }

    /// Record one more error. The first recorded diagnostic is kept.
    pub fn add_error(&mut self, msg: ErrMsg, span: Option<Span>) {
        self.nerr += 1;
        if self.err.is_none() {
            self.err = Some(Diagnostic::new(msg, span));
        }
    }

    /// Combine child headers into a parent header.
    ///
    /// Success is the conjunction of the children, the span covers the
    /// smallest start to the largest end, error counts add up, and the first
    /// failing child's diagnostic (left to right) becomes the parent's. A
    /// single child is passed through unchanged; no children give a clean
    /// header without a span.
    pub fn merge<'a, I>(children: I) -> Self
    where
        I: IntoIterator<Item = &'a Header>,
    {
        let mut iter = children.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let mut merged = first.clone();
        for child in iter {
            merged.nerr += child.nerr;
            if merged.err.is_none() && !child.is_ok() {
                merged.err = child.err.clone();
            }
            merged.span = match (merged.span, child.span) {
                (Some(a), Some(b)) => Some(a.join(&b)),
                (a, b) => a.or(b),
            };
        }
        merged
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.err, self.nerr) {
            (_, 0) => write!(f, "ok"),
            (Some(err), n) => write!(f, "{} error(s), first: {}", n, err),
            (None, n) => write!(f, "{} error(s)", n),
        }
    }
}

/// Metadata whose outermost part is a header.
///
/// Implemented by a bare [`Header`] (leaf metadata) and by `(Header, I)`
/// (metadata with an inner part mirroring the value's shape).
pub trait Meta {
    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;
}

impl Meta for Header {
    #[inline]
    fn header(&self) -> &Header {
        self
    }

    #[inline]
    fn header_mut(&mut self) -> &mut Header {
        self
    }
}

impl<I> Meta for (Header, I) {
    #[inline]
    fn header(&self) -> &Header {
        &self.0
    }

    #[inline]
    fn header_mut(&mut self) -> &mut Header {
        &mut self.0
    }
}

/// The result of running a parser: something that exposes its header.
///
/// The combinators only ever inspect and amend headers, so dynamically typed
/// callers implement this for their own value type.
pub trait Parsed {
    fn header(&self) -> Header;

    fn set_header(&mut self, header: Header);

    #[inline]
    fn is_ok(&self) -> bool {
        self.header().is_ok()
    }
}

impl<R, M: Meta> Parsed for (R, M) {
    #[inline]
    fn header(&self) -> Header {
        self.1.header().clone()
    }

    #[inline]
    fn set_header(&mut self, header: Header) {
        *self.1.header_mut() = header;
    }
}
