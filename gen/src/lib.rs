//! Schema compiler for ad-hoc data formats.
//!
//! A [`Schema`] of declarations is compiled into a [`Module`]: for every
//! declaration a representation type, a metadata type, a parser, a
//! whole-input parser, a printer and a default constructor, all expressed in
//! the closed target [IR](ir). Backends turn a module into something
//! runnable: [`backend::rust`] renders the generated types as Rust items and
//! [`backend::eval`] executes the generated functions directly against
//! `formkit-core`.
//!
//! ```ignore
//! use formkit_gen::{Branch, Decl, Expr, Field, GenConfig, Schema, Type, compile};
//! use formkit_gen::backend::eval::Interp;
//!
//! let point = Decl::wrapper(
//!     "Point",
//!     Branch::record(
//!         "Point",
//!         vec![
//!             Field::labeled("x", Type::con("Int")),
//!             Field::anon(Type::lit(Expr::char(','))),
//!             Field::labeled("y", Type::con("Int")),
//!         ],
//!     ),
//! );
//! let module = compile(&Schema::new(vec![point]), &GenConfig::DEFAULT).into_result()?;
//! let interp = Interp::new(&module)?;
//! let (rep, md) = interp.parse_str("Point", &[], "3,4")?;
//! assert_eq!(interp.print("Point", &[], &rep, Some(&md))?, "3,4");
//! ```
#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod ast;
pub mod backend;
pub mod capability;
pub mod config;
pub mod emit;
pub mod env;
mod error;
pub mod gensym;
pub mod ir;
pub mod naming;
pub mod pretty;
pub mod shape;
pub mod synth;

pub use ast::{Branch, Decl, Field, Schema, Strictness, Termination, Type, UnionBody};
pub use capability::Capabilities;
pub use config::GenConfig;
pub use emit::{Artifacts, Compiled, Module, compile};
pub use env::{BaseType, TypeEnv};
pub use error::{DeclError, GenError};
pub use ir::{Expr, FnDef, Literal, Pat};
pub use shape::{DeclShapes, Shape, TypeDecl};
