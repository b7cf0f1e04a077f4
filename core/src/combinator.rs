//! Control combinators shared by every generated parser.
//!
//! Each combinator runs immediately against a [`Cursor`] and takes its
//! sub-parsers as closures. They are generic over the caller's error type:
//! closures may fail with a fault (which aborts the parse), but parse
//! failures are always reported through headers.

use crate::cursor::{Cursor, Discipline};
use crate::header::{ErrMsg, Header, Parsed, Span};
use crate::Error;

/// One alternative of an ordered choice.
pub struct Alt<'a, T, E> {
    /// Restore the cursor and try the next alternative even when this one
    /// failed after consuming input.
    pub retry: bool,
    pub parser: Box<dyn FnMut(&mut Cursor) -> Result<T, E> + 'a>,
}

impl<'a, T, E> Alt<'a, T, E> {
    pub fn new(retry: bool, parser: impl FnMut(&mut Cursor) -> Result<T, E> + 'a) -> Self {
        Self {
            retry,
            parser: Box::new(parser),
        }
    }
}

/// Ordered choice.
///
/// Alternatives run strictly in order and the first successful one wins. A
/// failed alternative hands over to the next only if it consumed nothing or
/// is marked `retry`; otherwise its failure is final. When every alternative
/// falls through, the first one's failed result is returned with the cursor
/// back at the starting position. Returns `None` for an empty choice.
pub fn choice<T: Parsed, E>(
    cursor: &mut Cursor,
    alts: Vec<Alt<'_, T, E>>,
) -> Result<Option<T>, E> {
    let start = cursor.pos();
    let mut first_failure = None;
    for (idx, mut alt) in alts.into_iter().enumerate() {
        let result = (alt.parser)(cursor)?;
        if result.is_ok() {
            return Ok(Some(result));
        }
        let consumed = cursor.pos() != start;
        if consumed && !alt.retry {
            tracing::trace!(alt = idx, "choice committed to failed alternative");
            return Ok(Some(result));
        }
        tracing::trace!(alt = idx, consumed, "choice backtracking");
        cursor.rewind(start);
        first_failure.get_or_insert(result);
    }
    Ok(first_failure)
}

/// Runs `p` and restores the cursor afterwards.
pub fn lookahead<T, E>(
    cursor: &mut Cursor,
    p: impl FnOnce(&mut Cursor) -> Result<T, E>,
) -> Result<T, E> {
    let start = cursor.pos();
    let result = p(cursor)?;
    cursor.rewind(start);
    Ok(result)
}

/// Records a constraint violation on `value` when `holds` is false.
///
/// The value itself is kept: a refinement never discards what was parsed.
pub fn check<T: Parsed>(mut value: T, holds: bool, what: &str) -> T {
    if !holds {
        let mut header = value.header();
        let span = header.span;
        header.add_error(ErrMsg::ConstraintViolation(what.to_owned()), span);
        value.set_header(header);
    }
    value
}

/// Runs `p` under `discipline`.
pub fn partition<T, E>(
    cursor: &mut Cursor,
    discipline: Discipline,
    p: impl FnOnce(&mut Cursor) -> Result<T, E>,
) -> Result<T, E> {
    cursor.push_discipline(discipline);
    let result = p(cursor);
    cursor.pop_discipline();
    result
}

/// Runs a named parser one recursion level deeper.
pub fn nested<T, E: From<Error>>(
    cursor: &mut Cursor,
    p: impl FnOnce(&mut Cursor) -> Result<T, E>,
) -> Result<T, E> {
    if let Err(err) = cursor.enter() {
        cursor.exit();
        return Err(err.into());
    }
    let result = p(cursor);
    cursor.exit();
    result
}

/// Header for a value produced without consuming input.
pub fn at_value(cursor: &Cursor) -> Header {
    Header::clean(Some(Span::point(cursor.pos())))
}

/// Header for a failure raised without consuming input.
pub fn at_failure(cursor: &Cursor, msg: ErrMsg) -> Header {
    Header::error(msg, Some(Span::point(cursor.pos())))
}

/// Runs `p` over a whole buffer, flagging input it left behind.
pub fn parse_all<T: Parsed, E: From<Error>>(
    source: &str,
    config: crate::ParseConfig,
    p: impl FnOnce(&mut Cursor) -> Result<T, E>,
) -> Result<T, E> {
    let mut cursor = Cursor::with_config(source, config)?;
    let mut result = p(&mut cursor)?;
    if !cursor.is_eof() {
        let mut header = result.header();
        let rest = Span::new(cursor.pos(), source.len());
        header.add_error(ErrMsg::ExtraInput(rest.len()), Some(rest));
        result.set_header(header);
    }
    Ok(result)
}
