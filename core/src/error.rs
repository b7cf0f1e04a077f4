//! Core error types for formkit.
//!
//! Parse failures against real input are never errors in this sense: they are
//! recorded as [`ErrMsg`](crate::ErrMsg) diagnostics inside metadata headers
//! and parsing carries on. [`Error`] is reserved for faults that stop a parse
//! outright, such as exhausting the configured resource limits.
//!
//! Callers that run combinators with their own error type implement
//! `From<formkit_core::Error>` so runtime faults propagate with `?`.
//!
//! # Example
//!
//! ```ignore
//! use thiserror::Error;
//!
//! #[derive(Error, Debug)]
//! pub enum EvalError {
//!     #[error("unbound variable `{0}`")]
//!     Unbound(String),
//!
//!     #[error(transparent)]
//!     Runtime(#[from] formkit_core::Error),
//! }
//! ```

use core::fmt;

/// Core formkit runtime fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Recursion limit exceeded while entering a named parser.
    ///
    /// Recursive declarations (lists defined by cons cells, nested records)
    /// re-enter their own parser for every level of nesting. The depth is
    /// bounded by [`ParseConfig::max_recursion_depth`](crate::ParseConfig).
    RecursionLimitExceeded {
        /// Current recursion depth when limit was exceeded.
        depth: usize,
        /// Maximum allowed recursion depth.
        limit: usize,
    },

    /// Input longer than [`ParseConfig::max_input_len`](crate::ParseConfig).
    InputTooLong {
        /// Length of the rejected input in bytes.
        len: usize,
        /// Maximum allowed input length.
        limit: usize,
    },

    /// Fixed list length above [`ParseConfig::max_list_len`](crate::ParseConfig).
    ///
    /// Lengths can come from the input itself, and a fixed-length list
    /// always yields that many elements.
    ListTooLong {
        /// Requested element count.
        len: usize,
        /// Maximum allowed element count.
        limit: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RecursionLimitExceeded { depth, limit } => {
                write!(
                    f,
                    "recursion limit exceeded: depth {} > limit {}",
                    depth, limit
                )
            }
            Error::InputTooLong { len, limit } => {
                write!(f, "input too long: {} bytes > limit {}", len, limit)
            }
            Error::ListTooLong { len, limit } => {
                write!(f, "list too long: {} elements > limit {}", len, limit)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
