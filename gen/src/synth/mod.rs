//! Type-directed synthesis of parsers, printers and defaults.
//!
//! The three synthesizers recurse independently over the same schema type
//! and share one [`Cx`] per declaration: the type environment, the type
//! parameters in scope and the fresh-name supply.
//!
//! Generated code refers to runtime primitives through [`Expr::prim`]; the
//! vocabulary is fixed:
//!
//! | Group | Primitives |
//! |-------|------------|
//! | parsing | `pure`, `bind`, `discard_bind`, `choice`, `list_plain`, `list_sep`, `list_len`, `list_sep_len`, `list_term`, `list_sep_term`, `lit_parse`, `constrain`, `transform`, `partition`, `try_parse`, `at_value`, `at_failure`, `nested`, `parse_string` |
//! | metadata | `merge`, `header`, `check`, `md_parts` |
//! | printing | `nil`, `cat`, `print_lit`, `print_list` |

mod default;
mod parse;
mod print;

use crate::env::TypeEnv;
use crate::error::GenError;
use crate::gensym::Gensym;
use crate::ir::{Expr, Name, Pat};
use crate::naming;
use crate::pretty::Pretty;

/// Per-declaration synthesis context.
#[derive(Debug)]
pub struct Cx<'a> {
    pub env: &'a TypeEnv,
    pub tyvars: &'a [Name],
    pub gensym: Gensym,
}

impl<'a> Cx<'a> {
    pub fn new(env: &'a TypeEnv, tyvars: &'a [Name]) -> Self {
        Self {
            env,
            tyvars,
            gensym: Gensym::new(),
        }
    }

    fn fresh(&mut self, base: &str) -> String {
        self.gensym.fresh(base)
    }

    fn check_var(&self, var: &str) -> Result<(), GenError> {
        if self.tyvars.iter().any(|v| v == var) {
            Ok(())
        } else {
            Err(GenError::UnboundTyVar(var.to_owned()))
        }
    }
}

/// Splits a transform's `(forward, inverse)` pair.
pub fn transform_pair(fns: &Expr) -> Result<(&Expr, &Expr), GenError> {
    fns.as_pair().ok_or_else(|| GenError::MalformedTransform {
        found: fns.to_flat_string(),
    })
}

/// The header of a merged parent: `merge([header(m1), ..])`.
fn merged(mds: &[Expr]) -> Expr {
    let headers = mds
        .iter()
        .map(|m| Expr::prim_call("header", vec![m.clone()]))
        .collect();
    Expr::prim_call("merge", vec![Expr::List(headers)])
}

/// `(rep, md)` result of a parser.
fn pair(rep: Expr, md: Expr) -> Expr {
    Expr::Tuple(vec![rep, md])
}

/// Metadata binder matching a constraint's value pattern.
fn md_binder(pat: &Pat) -> Pat {
    match pat {
        Pat::Var(x) => Pat::var(naming::label_md(x)),
        _ => Pat::Wild,
    }
}

fn cat(outputs: Vec<Expr>) -> Expr {
    match outputs.len() {
        0 => nil(),
        1 => outputs.into_iter().next().unwrap_or_else(nil),
        _ => Expr::prim_call("cat", vec![Expr::List(outputs)]),
    }
}

fn nil() -> Expr {
    Expr::prim_call("nil", Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_pairs_are_reported() {
        let err = transform_pair(&Expr::var("f")).unwrap_err();
        assert_eq!(
            err,
            GenError::MalformedTransform { found: "f".into() }
        );
        let three = Expr::Tuple(vec![Expr::var("f"), Expr::var("g"), Expr::var("h")]);
        assert!(transform_pair(&three).is_err());
    }

    #[test]
    fn unbound_variables() {
        let env = TypeEnv::new();
        let vars = vec!["a".to_owned()];
        let cx = Cx::new(&env, &vars);
        assert!(cx.check_var("a").is_ok());
        assert_eq!(cx.check_var("b"), Err(GenError::UnboundTyVar("b".into())));
    }

    #[test]
    fn cat_collapses_small_sequences() {
        assert_eq!(cat(vec![]), nil());
        assert_eq!(cat(vec![Expr::var("o")]), Expr::var("o"));
    }
}
