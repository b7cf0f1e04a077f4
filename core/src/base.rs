//! Base types: parsers, printers and defaults.
//!
//! | Type | Rep | Parses | Default |
//! |------|-----|--------|---------|
//! | `Int` | `i64` | optional `-` then ASCII digits | `0` |
//! | `Char` | `char` | one character of the record | `' '` |
//! | `Digit` | `i64` | one ASCII digit | `0` |
//! | `StringC(c)` | `String` | up to `c` or the end of the record | `""` |
//! | `StringFW(n)` | `String` | exactly `n` characters | `n` spaces |
//! | `StringME(re)` | `String` | the longest match of `re` here | `""` |
//! | `StringLn` | `String` | up to `\n` or the end of the record | `""` |
//! | `EOF` | `()` | end of input | `()` |
//! | `EOR` | `()` | end of the current record | `()` |
//!
//! Every parser returns its representation with a bare [`Header`] and
//! consumes nothing when it fails.

use regex::Regex;

use crate::cursor::Cursor;
use crate::header::{ErrMsg, Header, Span};
use crate::print::Output;

fn failed<T>(cursor: &Cursor, rep: T, msg: ErrMsg) -> (T, Header) {
    let msg = if cursor.is_eof() {
        ErrMsg::UnexpectedEof
    } else {
        msg
    };
    (rep, Header::error(msg, Some(Span::point(cursor.pos()))))
}

fn taken<T>(cursor: &Cursor, start: usize, rep: T) -> (T, Header) {
    (rep, Header::clean(Some(cursor.span_from(start))))
}

pub fn int(cursor: &mut Cursor) -> (i64, Header) {
    let start = cursor.pos();
    let text = cursor.record_rest();
    let sign = usize::from(text.starts_with('-'));
    let digits = text[sign..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return failed(cursor, 0, ErrMsg::ExpectedInt);
    }
    match text[..sign + digits].parse::<i64>() {
        Ok(n) => {
            cursor.advance(sign + digits);
            taken(cursor, start, n)
        }
        Err(_) => failed(cursor, 0, ErrMsg::ExpectedInt),
    }
}

pub fn char(cursor: &mut Cursor) -> (char, Header) {
    let start = cursor.pos();
    match cursor.next_char() {
        Some(c) => taken(cursor, start, c),
        None => failed(cursor, char_def(), ErrMsg::ExpectedChar),
    }
}

pub fn digit(cursor: &mut Cursor) -> (i64, Header) {
    let start = cursor.pos();
    match cursor.peek_char().and_then(|c| c.to_digit(10)) {
        Some(d) => {
            cursor.advance(1);
            taken(cursor, start, i64::from(d))
        }
        None => failed(cursor, 0, ErrMsg::ExpectedDigit),
    }
}

/// Characters up to (not including) `stop`.
pub fn string_c(cursor: &mut Cursor, stop: char) -> (String, Header) {
    let start = cursor.pos();
    let text = cursor.record_rest();
    let len = text.find(stop).unwrap_or(text.len());
    let s = text[..len].to_owned();
    cursor.advance(len);
    taken(cursor, start, s)
}

/// Exactly `width` characters. A short record yields what is there.
pub fn string_fw(cursor: &mut Cursor, width: usize) -> (String, Header) {
    let start = cursor.pos();
    let text = cursor.record_rest();
    let (found, len) = text
        .char_indices()
        .take(width)
        .fold((0, 0), |(n, _), (i, c)| (n + 1, i + c.len_utf8()));
    let s = text[..len].to_owned();
    cursor.advance(len);
    if found < width {
        let header = Header::error(
            ErrMsg::ShortField {
                expected: width,
                found,
            },
            Some(cursor.span_from(start)),
        );
        return (s, header);
    }
    taken(cursor, start, s)
}

/// The match of `re` anchored at the cursor.
pub fn string_me(cursor: &mut Cursor, re: &Regex) -> (String, Header) {
    let (text, header) = cursor.regex(re);
    (text.unwrap_or_default(), header)
}

/// The rest of the line, without the newline.
pub fn string_ln(cursor: &mut Cursor) -> (String, Header) {
    string_c(cursor, '\n')
}

pub fn eof(cursor: &mut Cursor) -> ((), Header) {
    if cursor.is_eof() {
        taken(cursor, cursor.pos(), ())
    } else {
        ((), Header::error(ErrMsg::ExpectedEof, Some(Span::point(cursor.pos()))))
    }
}

pub fn eor(cursor: &mut Cursor) -> ((), Header) {
    ((), cursor.take_eor())
}

pub fn print_int(n: i64) -> Output {
    Output::text(n.to_string())
}

pub fn print_char(c: char) -> Output {
    Output::text(c.to_string())
}

/// Prints the last decimal digit of `n`.
pub fn print_digit(n: i64) -> Output {
    Output::text(n.rem_euclid(10).to_string())
}

pub fn print_string(s: &str) -> Output {
    Output::text(s)
}

/// Pads with spaces or truncates to exactly `width` characters.
pub fn print_string_fw(width: usize, s: &str) -> Output {
    let mut out: String = s.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    Output::text(out)
}

pub fn print_eof() -> Output {
    Output::nil()
}

pub fn print_eor() -> Output {
    Output::text("\n")
}

#[inline]
pub const fn int_def() -> i64 {
    0
}

#[inline]
pub const fn char_def() -> char {
    ' '
}

#[inline]
pub const fn digit_def() -> i64 {
    0
}

#[inline]
pub fn string_def() -> String {
    String::new()
}

pub fn string_fw_def(width: usize) -> String {
    " ".repeat(width)
}
