use std::sync::Arc;

use regex::Regex;

use crate::config::{ParseConfig, RecursionGuard};
use crate::header::{ErrMsg, Header, Span};
use crate::Error;

/// How the input is segmented into records.
///
/// Disciplines only move record boundaries; they never change what a
/// parser consumes inside a record. A partition pushes a discipline for the
/// duration of one inner parse.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discipline {
    /// The whole input is one record.
    #[default]
    Whole,
    /// Records end at `\n`.
    Newline,
    /// Records end at `\r\n`.
    CrLf,
    /// Records are `n` bytes, counted from where the partition began. A
    /// boundary that falls inside a character moves past it.
    FixedWidth(usize),
}

impl Discipline {
    /// The text that closes a record, if the discipline has one.
    pub fn terminator(&self) -> Option<&'static str> {
        match self {
            Discipline::Newline => Some("\n"),
            Discipline::CrLf => Some("\r\n"),
            Discipline::Whole | Discipline::FixedWidth(_) => None,
        }
    }
}

/// Mutable position over one input buffer.
///
/// The cursor is the single piece of state a generated parser threads: a
/// byte offset, the stack of active disciplines, and the recursion guard for
/// named parsers. Cloning is cheap (the source is shared).
#[derive(Debug, Clone)]
pub struct Cursor {
    source: Arc<str>,
    pos: usize,
    disciplines: Vec<(Discipline, usize)>,
    guard: RecursionGuard,
    config: ParseConfig,
}

impl Cursor {
    pub fn new(source: &str) -> Self {
        Self {
            source: Arc::from(source),
            pos: 0,
            disciplines: Vec::new(),
            guard: RecursionGuard::new(),
            config: ParseConfig::DEFAULT,
        }
    }

    pub fn with_config(source: &str, config: ParseConfig) -> Result<Self, Error> {
        config.check_input_len(source.len())?;
        Ok(Self {
            config,
            ..Self::new(source)
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves back (or forward) to a previously observed position.
    #[inline]
    pub fn rewind(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    /// Everything not yet consumed, ignoring record boundaries.
    pub fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Span from `start` to the current position.
    #[inline]
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.pos)
    }

    pub fn discipline(&self) -> Discipline {
        self.disciplines
            .last()
            .map(|(d, _)| *d)
            .unwrap_or_default()
    }

    pub fn push_discipline(&mut self, discipline: Discipline) {
        self.disciplines.push((discipline, self.pos));
    }

    pub fn pop_discipline(&mut self) {
        self.disciplines.pop();
    }

    /// Offset where the current record ends (exclusive of its terminator).
    pub fn record_end(&self) -> usize {
        let len = self.source.len();
        let Some((discipline, base)) = self.disciplines.last().copied() else {
            return len;
        };
        match discipline {
            Discipline::Whole => len,
            Discipline::Newline | Discipline::CrLf => {
                let term = discipline.terminator().unwrap_or("\n");
                self.rest().find(term).map_or(len, |i| self.pos + i)
            }
            Discipline::FixedWidth(0) => len,
            Discipline::FixedWidth(width) => {
                let offset = self.pos.saturating_sub(base);
                let mut end = base
                    .saturating_add((offset / width + 1).saturating_mul(width))
                    .min(len);
                while !self.source.is_char_boundary(end) {
                    end += 1;
                }
                end
            }
        }
    }

    /// The unconsumed part of the current record.
    pub fn record_rest(&self) -> &str {
        &self.source[self.pos..self.record_end()]
    }

    /// True when nothing of the current record is left.
    pub fn at_eor(&self) -> bool {
        self.pos >= self.record_end()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.record_rest().chars().next()
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advances by `n` bytes, clamped to the input.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.source.len());
    }

    /// Matches `lit` exactly; consumes nothing on failure.
    pub fn literal(&mut self, lit: &str) -> Header {
        let start = self.pos;
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            Header::clean(Some(self.span_from(start)))
        } else {
            Header::error(
                ErrMsg::ExpectedLiteral(lit.to_owned()),
                Some(Span::point(start)),
            )
        }
    }

    /// Matches `re` anchored at the cursor within the current record;
    /// consumes nothing on failure.
    pub fn regex(&mut self, re: &Regex) -> (Option<String>, Header) {
        let start = self.pos;
        let matched = re
            .find(self.record_rest())
            .filter(|m| m.start() == 0)
            .map(|m| m.as_str().to_owned());
        match matched {
            Some(text) => {
                self.pos += text.len();
                let header = Header::clean(Some(self.span_from(start)));
                (Some(text), header)
            }
            None => (
                None,
                Header::error(
                    ErrMsg::RegexNoMatch(re.as_str().to_owned()),
                    Some(Span::point(start)),
                ),
            ),
        }
    }

    /// Consumes the end of the current record.
    pub fn take_eor(&mut self) -> Header {
        let start = self.pos;
        if !self.at_eor() {
            return Header::error(ErrMsg::ExpectedEor, Some(Span::point(start)));
        }
        if let Some(term) = self.discipline().terminator() {
            if self.rest().starts_with(term) {
                self.pos += term.len();
            } else if !self.is_eof() {
                return Header::error(ErrMsg::ExpectedEor, Some(Span::point(start)));
            }
        }
        Header::clean(Some(self.span_from(start)))
    }

    /// Enter a named parser, enforcing `max_recursion_depth`.
    pub fn enter(&mut self) -> Result<(), Error> {
        self.guard.enter(self.config.max_recursion_depth)
    }

    pub fn exit(&mut self) {
        self.guard.exit();
    }

    pub fn depth(&self) -> usize {
        self.guard.depth()
    }
}
