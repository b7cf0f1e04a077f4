//! Runtime support for parsers and printers generated by `formkit-gen`.
//!
//! Generated parsers thread a single [`Cursor`] and pair every value with
//! metadata whose outermost part is a [`Header`]. Failures are recorded in
//! headers and merged upward; parsing itself only stops on a runtime
//! [`Error`] such as exceeding [`ParseConfig::max_recursion_depth`].
#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod base;
pub mod combinator;
pub mod config;
mod cursor;
mod error;
mod header;
pub mod list;
mod print;

pub use combinator::{Alt, at_failure, at_value, check, choice, lookahead, nested, parse_all, partition};
pub use config::{ParseConfig, RecursionGuard};
pub use cursor::{Cursor, Discipline};
pub use error::Error;
pub use header::{Diagnostic, ErrMsg, Header, Meta, Parsed, Span};
pub use list::Seq;
pub use print::{Chunks, Output, print_list};

pub use regex::Regex;
