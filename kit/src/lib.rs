//! Round-tripping parsers, printers and defaults for ad-hoc data formats.
//!
//! The runtime (`formkit-core`) is re-exported at the root; the schema
//! compiler and its backends live under [`compiler`].
#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
pub use formkit_core::*;
pub use formkit_gen as compiler;
