//! The six list regimes.
//!
//! A list type is parsed by one of six loops chosen from whether it declares
//! a separator and how (or whether) it terminates:
//!
//! | separator | termination | regime |
//! |-----------|-------------|--------|
//! | no  | none      | [`many`] |
//! | yes | none      | [`many_sep`] |
//! | no  | length N  | [`exactly`] |
//! | yes | length N  | [`exactly_sep`] |
//! | no  | until T   | [`until`] |
//! | yes | until T   | [`until_sep`] |
//!
//! Every regime returns a [`Seq`]: the parsed elements in order plus a header
//! merged from the elements, separators and terminator, spanning everything
//! the list consumed.

use crate::cursor::Cursor;
use crate::header::{ErrMsg, Header, Parsed, Span};

/// Elements parsed by a list regime.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Seq<T> {
    pub header: Header,
    pub items: Vec<T>,
}

impl<T> Seq<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<R, M> Seq<(R, M)> {
    /// Splits into element representations and the list metadata.
    pub fn unzip(self) -> (Vec<R>, (Header, Vec<M>)) {
        let (reps, mds) = self.items.into_iter().unzip();
        (reps, (self.header, mds))
    }
}

impl<T> IntoIterator for Seq<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Seq<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> std::ops::Deref for Seq<T> {
    type Target = Vec<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// Accumulates elements and the headers of everything between them.
struct Builder<T> {
    start: usize,
    items: Vec<T>,
    extra: Vec<Header>,
}

impl<T: Parsed> Builder<T> {
    fn new(cursor: &Cursor) -> Self {
        Self {
            start: cursor.pos(),
            items: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Reserves for `n` elements, but never more than the input could hold.
    fn with_capacity(cursor: &Cursor, n: usize) -> Self {
        Self {
            items: Vec::with_capacity(n.min(cursor.rest().len() + 1)),
            ..Self::new(cursor)
        }
    }

    fn fail(&mut self, cursor: &Cursor, msg: ErrMsg) {
        self.extra
            .push(Header::error(msg, Some(Span::point(cursor.pos()))));
    }

    fn finish(self, cursor: &Cursor) -> Seq<T> {
        let headers: Vec<Header> = self
            .items
            .iter()
            .map(Parsed::header)
            .chain(self.extra)
            .collect();
        let mut header = Header::merge(&headers);
        header.span = Some(cursor.span_from(self.start));
        Seq {
            header,
            items: self.items,
        }
    }
}

/// No separator, no terminator: elements until one fails.
///
/// The failing element is discarded and its input given back.
pub fn many<T: Parsed, E>(
    cursor: &mut Cursor,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::new(cursor);
    while !cursor.is_eof() {
        let before = cursor.pos();
        let item = elem(cursor)?;
        if !item.is_ok() {
            cursor.rewind(before);
            break;
        }
        let progressed = cursor.pos() != before;
        list.items.push(item);
        if !progressed {
            break;
        }
    }
    Ok(list.finish(cursor))
}

/// Separator, no terminator: one element, then separator and element pairs
/// until either fails.
pub fn many_sep<T: Parsed, S: Parsed, E>(
    cursor: &mut Cursor,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
    mut sep: impl FnMut(&mut Cursor) -> Result<S, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::new(cursor);
    let first = elem(cursor)?;
    if !first.is_ok() {
        cursor.rewind(list.start);
        return Ok(list.finish(cursor));
    }
    list.items.push(first);
    loop {
        let before = cursor.pos();
        let s = sep(cursor)?;
        if !s.is_ok() {
            cursor.rewind(before);
            break;
        }
        let item = elem(cursor)?;
        if !item.is_ok() {
            cursor.rewind(before);
            break;
        }
        list.extra.push(s.header());
        list.items.push(item);
        if cursor.pos() == before {
            break;
        }
    }
    Ok(list.finish(cursor))
}

/// No separator, fixed length: exactly `n` elements whether or not they
/// succeed.
///
/// `n` is not bounded here; callers taking it from input check it against
/// [`ParseConfig::max_list_len`](crate::ParseConfig) first.
pub fn exactly<T: Parsed, E>(
    cursor: &mut Cursor,
    n: usize,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::with_capacity(cursor, n);
    for _ in 0..n {
        list.items.push(elem(cursor)?);
    }
    Ok(list.finish(cursor))
}

/// Separator, fixed length: exactly `n` elements with a separator between
/// each pair. Separator failures are recorded, never fatal.
pub fn exactly_sep<T: Parsed, S: Parsed, E>(
    cursor: &mut Cursor,
    n: usize,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
    mut sep: impl FnMut(&mut Cursor) -> Result<S, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::with_capacity(cursor, n);
    for i in 0..n {
        if i > 0 {
            let s = sep(cursor)?;
            list.extra.push(s.header());
        }
        list.items.push(elem(cursor)?);
    }
    Ok(list.finish(cursor))
}

/// No separator, terminated: before each element try the terminator; stop
/// once it matches. The terminator is consumed but not kept.
pub fn until<T: Parsed, U: Parsed, E>(
    cursor: &mut Cursor,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
    mut term: impl FnMut(&mut Cursor) -> Result<U, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::new(cursor);
    loop {
        let before = cursor.pos();
        let t = term(cursor)?;
        if t.is_ok() {
            list.extra.push(t.header());
            break;
        }
        cursor.rewind(before);
        if cursor.is_eof() {
            list.fail(cursor, ErrMsg::MissingTerminator);
            break;
        }
        let item = elem(cursor)?;
        let progressed = cursor.pos() != before;
        list.items.push(item);
        if !progressed {
            list.fail(cursor, ErrMsg::NoProgress);
            break;
        }
    }
    Ok(list.finish(cursor))
}

/// Separator, terminated: as [`until`] with a separator required between
/// successive elements.
pub fn until_sep<T: Parsed, S: Parsed, U: Parsed, E>(
    cursor: &mut Cursor,
    mut elem: impl FnMut(&mut Cursor) -> Result<T, E>,
    mut sep: impl FnMut(&mut Cursor) -> Result<S, E>,
    mut term: impl FnMut(&mut Cursor) -> Result<U, E>,
) -> Result<Seq<T>, E> {
    let mut list = Builder::new(cursor);
    loop {
        let before = cursor.pos();
        let t = term(cursor)?;
        if t.is_ok() {
            list.extra.push(t.header());
            break;
        }
        cursor.rewind(before);
        if cursor.is_eof() {
            list.fail(cursor, ErrMsg::MissingTerminator);
            break;
        }
        if !list.items.is_empty() {
            let s = sep(cursor)?;
            list.extra.push(s.header());
        }
        let item = elem(cursor)?;
        let progressed = cursor.pos() != before;
        list.items.push(item);
        if !progressed {
            list.fail(cursor, ErrMsg::NoProgress);
            break;
        }
    }
    Ok(list.finish(cursor))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::base;

    type Int = (i64, Header);
    type Lit = ((), Header);

    fn int(c: &mut Cursor) -> Result<Int, Infallible> {
        Ok(base::int(c))
    }

    fn lit(s: &'static str) -> impl FnMut(&mut Cursor) -> Result<Lit, Infallible> {
        move |c| Ok(((), c.literal(s)))
    }

    fn reps(seq: Seq<Int>) -> Vec<i64> {
        seq.unzip().0
    }

    #[test]
    fn many_stops_at_first_failure() {
        let mut cur = Cursor::new("123x");
        let seq = many(&mut cur, |c| {
            Ok::<_, Infallible>(base::digit(c))
        })
        .unwrap();
        assert_eq!(seq.unzip().0, vec![1, 2, 3]);
        assert_eq!(cur.rest(), "x");
    }

    #[test]
    fn many_sep_gives_back_dangling_separator() {
        let mut cur = Cursor::new("1,2,");
        let seq = many_sep(&mut cur, int, lit(",")).unwrap();
        assert!(seq.header.is_ok());
        assert_eq!(reps(seq), vec![1, 2]);
        assert_eq!(cur.rest(), ",");
    }

    #[test]
    fn many_sep_of_nothing_is_empty() {
        let mut cur = Cursor::new("x");
        let seq = many_sep(&mut cur, int, lit(",")).unwrap();
        assert!(seq.is_empty());
        assert!(seq.header.is_ok());
        assert_eq!(cur.pos(), 0);
    }

    #[test_case::test_case("1 2 3", 3, 0; "all good")]
    #[test_case::test_case("1 x 3", 3, 1; "failures do not shorten")]
    #[test_case::test_case("", 2, 2; "eof still yields n")]
    fn exactly_sep_yields_n(input: &str, n: usize, errors: usize) {
        let mut cur = Cursor::new(input);
        let seq = exactly_sep(&mut cur, n, int, lit(" ")).unwrap();
        assert_eq!(seq.len(), n);
        assert!(seq.header.nerr >= errors);
        assert_eq!(seq.header.is_ok(), errors == 0);
    }

    #[test]
    fn exactly_without_separator() {
        let mut cur = Cursor::new("4567");
        let seq = exactly(&mut cur, 3, |c| Ok::<_, Infallible>(base::digit(c))).unwrap();
        assert_eq!(seq.unzip().0, vec![4, 5, 6]);
        assert_eq!(cur.rest(), "7");
    }

    #[test]
    fn exactly_reserves_no_more_than_the_input() {
        let cur = Cursor::new("12");
        let list = Builder::<Int>::with_capacity(&cur, usize::MAX);
        assert!(list.items.capacity() >= 3);
        assert!(list.items.capacity() < 1024);
    }

    #[test]
    fn until_sep_consumes_and_drops_terminator() {
        let mut cur = Cursor::new("1,2,3\nrest");
        let seq = until_sep(&mut cur, int, lit(","), lit("\n")).unwrap();
        assert!(seq.header.is_ok());
        assert_eq!(seq.header.span, Some(Span::new(0, 6)));
        assert_eq!(reps(seq), vec![1, 2, 3]);
        assert_eq!(cur.rest(), "rest");
    }

    #[test]
    fn until_reports_missing_terminator() {
        let mut cur = Cursor::new("12");
        let seq = until(&mut cur, |c| Ok::<_, Infallible>(base::digit(c)), lit(";")).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(
            seq.header.err.map(|d| d.msg),
            Some(ErrMsg::MissingTerminator)
        );
    }

    #[test]
    fn until_stops_without_progress() {
        let mut cur = Cursor::new("ab;");
        let seq = until(&mut cur, int, lit(";")).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.header.nerr, 2);
    }

    #[test]
    fn empty_until_list_still_takes_terminator() {
        let mut cur = Cursor::new("\n");
        let seq = until_sep(&mut cur, int, lit(","), lit("\n")).unwrap();
        assert!(seq.is_empty());
        assert!(seq.header.is_ok());
        assert!(cur.is_eof());
    }
}
