//! Generation-time errors.
//!
//! A [`GenError`] rejects one declaration: nothing is emitted for it, and
//! the rest of the schema is still compiled unless
//! [`GenConfig::fail_fast`](crate::GenConfig) is set.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("transform functions must be a (forward, inverse) pair, found {found}")]
    MalformedTransform { found: String },

    #[error(
        "`{name}` expects {expected} type argument(s) (value argument: {expects_value}), \
         found {found} (value argument: {has_value})"
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        expects_value: bool,
        has_value: bool,
    },

    #[error("type application head must be a named type")]
    NonConstructorHead,

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("unbound type variable `{0}`")]
    UnboundTyVar(String),

    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("refers to rejected declaration `{0}`")]
    RejectedDependency(String),

    #[error("`{0}` is declared more than once")]
    DuplicateName(String),

    #[error("union `{0}` has no branches")]
    EmptyUnion(String),

    #[error("metadata of `{src}` does not fit metadata of `{dst}`")]
    ShapeMismatch { src: String, dst: String },
}

/// A rejected declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("in declaration `{decl}`: {error}")]
pub struct DeclError {
    pub decl: String,
    #[source]
    pub error: GenError,
}

impl DeclError {
    pub fn new(decl: impl Into<String>, error: GenError) -> Self {
        Self {
            decl: decl.into(),
            error,
        }
    }
}
