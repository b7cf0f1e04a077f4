//! Pretty printing of the target IR.
//!
//! [`Printer`] is a small indentation-aware text builder and [`Pretty`] is
//! implemented by every IR node. `Display` for IR types goes through
//! [`IrPrinter`]; [`Pretty::to_flat_string`] renders on a single line, which
//! is how constraint descriptions are produced.

use std::fmt;

use crate::ir::{Expr, FnDef, Literal, Pat};

pub trait Printer: Sized {
    fn buf_mut(&mut self) -> &mut String;
    fn indent_level(&self) -> usize;
    fn set_indent(&mut self, level: usize);
    fn into_string(self) -> String;

    /// When set, line breaks print as single spaces.
    fn flat(&self) -> bool {
        false
    }

    fn indent_width(&self) -> usize {
        2
    }

    fn word(&mut self, s: &str) {
        self.buf_mut().push_str(s);
    }

    fn space(&mut self) {
        self.word(" ");
    }

    fn newline(&mut self) {
        if self.flat() {
            self.space();
            return;
        }
        let width = self.indent_level() * self.indent_width();
        let buf = self.buf_mut();
        buf.push('\n');
        buf.extend(std::iter::repeat_n(' ', width));
    }

    fn indent(&mut self) {
        self.set_indent(self.indent_level() + 1);
    }

    /// Saturates at 0.
    fn dedent(&mut self) {
        let level = self.indent_level();
        if level > 0 {
            self.set_indent(level - 1);
        }
    }

    fn write<T: Pretty>(&mut self, value: &T) {
        value.pretty(self);
    }

    /// Items separated by `sep` followed by a space.
    fn write_separated<T: Pretty>(&mut self, items: &[T], sep: &str) {
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.word(sep);
                self.space();
            }
            self.write(item);
        }
    }
}

pub trait Pretty {
    fn pretty<P: Printer>(&self, p: &mut P);

    fn to_pretty_string(&self) -> String {
        let mut p = IrPrinter::default();
        self.pretty(&mut p);
        p.into_string()
    }

    fn to_flat_string(&self) -> String {
        let mut p = IrPrinter::flat();
        self.pretty(&mut p);
        p.into_string()
    }
}

#[derive(Debug, Default)]
pub struct IrPrinter {
    buf: String,
    indent: usize,
    flat: bool,
}

impl IrPrinter {
    pub fn flat() -> Self {
        Self {
            flat: true,
            ..Self::default()
        }
    }
}

impl Printer for IrPrinter {
    fn buf_mut(&mut self) -> &mut String {
        &mut self.buf
    }

    fn indent_level(&self) -> usize {
        self.indent
    }

    fn set_indent(&mut self, level: usize) {
        self.indent = level;
    }

    fn into_string(self) -> String {
        self.buf
    }

    fn flat(&self) -> bool {
        self.flat
    }
}

impl Pretty for Literal {
    fn pretty<P: Printer>(&self, p: &mut P) {
        match self {
            Literal::Unit => p.word("()"),
            Literal::Bool(b) => p.word(if *b { "true" } else { "false" }),
            Literal::Int(n) => p.word(&n.to_string()),
            Literal::Char(c) => p.word(&format!("{c:?}")),
            Literal::Str(s) => p.word(&format!("{s:?}")),
            Literal::Regex(re) => {
                p.word("/");
                p.word(re);
                p.word("/");
            }
        }
    }
}

impl Pretty for Pat {
    fn pretty<P: Printer>(&self, p: &mut P) {
        match self {
            Pat::Wild => p.word("_"),
            Pat::Var(v) => p.word(v),
            Pat::Lit(l) => p.write(l),
            Pat::Tuple(ps) => {
                p.word("(");
                p.write_separated(ps, ",");
                p.word(")");
            }
            Pat::Con(c, ps) => {
                p.word(c);
                if !ps.is_empty() {
                    p.word("(");
                    p.write_separated(ps, ",");
                    p.word(")");
                }
            }
        }
    }
}

impl Pretty for Expr {
    fn pretty<P: Printer>(&self, p: &mut P) {
        match self {
            Expr::Var(v) => p.word(v),
            Expr::Lit(l) => p.write(l),
            Expr::App(f, args) => {
                if matches!(**f, Expr::Var(_)) {
                    p.write(&**f);
                } else {
                    p.word("(");
                    p.write(&**f);
                    p.word(")");
                }
                p.word("(");
                p.write_separated(args, ",");
                p.word(")");
            }
            Expr::Tuple(es) => {
                p.word("(");
                p.write_separated(es, ",");
                p.word(")");
            }
            Expr::List(es) => {
                p.word("[");
                p.write_separated(es, ",");
                p.word("]");
            }
            Expr::Con(c, es) => {
                p.word(c);
                if !es.is_empty() {
                    p.word("(");
                    p.write_separated(es, ",");
                    p.word(")");
                }
            }
            Expr::Case(scrutinee, arms) => {
                p.word("case ");
                p.write(&**scrutinee);
                p.word(" of {");
                p.indent();
                for (pat, body) in arms {
                    p.newline();
                    p.write(pat);
                    p.word(" -> ");
                    p.write(body);
                    p.word(";");
                }
                p.dedent();
                p.newline();
                p.word("}");
            }
            Expr::Lam(params, body) => {
                p.word("\\(");
                p.write_separated(params, ",");
                p.word(") -> ");
                p.write(&**body);
            }
            Expr::Let(pat, rhs, body) => {
                p.word("let ");
                p.write(pat);
                p.word(" = ");
                p.write(&**rhs);
                p.word(" in");
                p.newline();
                p.write(&**body);
            }
        }
    }
}

impl Pretty for FnDef {
    fn pretty<P: Printer>(&self, p: &mut P) {
        p.word(&self.name);
        p.word("(");
        p.write_separated(&self.params, ",");
        p.word(") =");
        p.indent();
        p.newline();
        p.write(&self.body);
        p.dedent();
    }
}

macro_rules! display_via_pretty {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_pretty_string())
            }
        }
    )*};
}

display_via_pretty!(Literal, Pat, Expr, FnDef);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applications_and_literals() {
        let e = Expr::call("lt", vec![Expr::var("x"), Expr::int(10)]);
        assert_eq!(e.to_string(), "lt(x, 10)");
        assert_eq!(Expr::str("a\n").to_string(), "\"a\\n\"");
        assert_eq!(Expr::regex("[0-9]+").to_string(), "/[0-9]+/");
    }

    #[test]
    fn case_breaks_lines_unless_flat() {
        let e = Expr::case(
            Expr::var("t"),
            vec![
                (Pat::Lit(Literal::Int(1)), Expr::bool(true)),
                (Pat::Wild, Expr::bool(false)),
            ],
        );
        assert_eq!(
            e.to_string(),
            "case t of {\n  1 -> true;\n  _ -> false;\n}"
        );
        assert_eq!(
            e.to_flat_string(),
            "case t of { 1 -> true; _ -> false; }"
        );
    }

    #[test]
    fn fn_defs_indent_bodies() {
        let f = FnDef::new(
            "point_def",
            vec![],
            Expr::let_in(
                Pat::var("x"),
                Expr::int(0),
                Expr::con("Point", vec![Expr::var("x")]),
            ),
        );
        assert_eq!(f.to_string(), "point_def() =\n  let x = 0 in\n  Point(x)");
    }

    #[test]
    fn lambdas() {
        let e = Expr::lam(
            vec![Pat::Tuple(vec![Pat::var("r"), Pat::Wild])],
            Expr::var("r"),
        );
        assert_eq!(e.to_string(), "\\((r, _)) -> r");
    }
}
