//! Consumers of a compiled [`Module`](crate::Module).
//!
//! [`rust`] renders the generated types as Rust items. [`eval`] runs the
//! generated functions against `formkit-core` with dynamic values.

pub mod eval;
pub mod rust;
