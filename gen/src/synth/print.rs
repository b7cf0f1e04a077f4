//! Printer synthesis.
//!
//! A printer consumes a representation and an optional metadata value and
//! produces output. Slots without real data print a synthesized default;
//! predicates are ignored.

use super::{Cx, cat, nil, transform_pair};
use crate::ast::{Branch, Termination, Type};
use crate::error::GenError;
use crate::ir::{Expr, Pat};
use crate::naming;
use crate::shape::{self, has_representation};

impl Cx<'_> {
    /// Output of printing `rep` with metadata `md` (an option) as `ty`.
    pub fn printer(&mut self, ty: &Type, rep: Expr, md: Expr) -> Result<Expr, GenError> {
        let out = match ty {
            Type::Con { .. } | Type::App { .. } => {
                let app = shape::application(ty)?;
                shape::resolve(self.env, &app)?;
                let mut args = Vec::with_capacity(app.args.len() * 2 + 3);
                for a in &app.args {
                    args.push(self.printer_fn(a)?);
                }
                for a in &app.args {
                    args.push(self.default(a)?);
                }
                args.extend(app.value.cloned());
                args.extend([rep, md]);
                Expr::call(naming::printer(app.name), args)
            }
            Type::Var(v) => {
                self.check_var(v)?;
                Expr::call(naming::var_printer(v), vec![rep, md])
            }
            Type::Tuple(items) => self.tuple_printer(items, rep, md)?,
            Type::List { elem, sep, term } => {
                let elem = self.printer_fn(elem)?;
                let sep = match sep {
                    Some(s) => self.default_output(s)?,
                    None => nil(),
                };
                let term = match term {
                    Some(Termination::Until(t)) => self.default_output(t)?,
                    Some(Termination::Length(_)) | None => nil(),
                };
                Expr::prim_call("print_list", vec![elem, sep, term, rep, md])
            }
            Type::Constrain { base, .. } => self.printer(base, rep, md)?,
            Type::Transform { src, fns, .. } => {
                let (_, inv) = transform_pair(fns)?;
                let r = self.fresh("r");
                let body = self.printer(src, Expr::var(&r), md)?;
                Expr::let_in(Pat::var(r), Expr::app(inv.clone(), vec![rep]), body)
            }
            Type::Partition { elem, .. } => self.printer(elem, rep, md)?,
            Type::Value { .. } | Type::Try(_) => nil(),
            Type::Literal(lit) => Expr::prim_call("print_lit", vec![lit.clone()]),
        };
        Ok(out)
    }

    /// A printer as a function value `\(rep, md) -> output`.
    fn printer_fn(&mut self, ty: &Type) -> Result<Expr, GenError> {
        if let Type::Var(v) = ty {
            self.check_var(v)?;
            return Ok(Expr::var(naming::var_printer(v)));
        }
        let (r, m) = (self.fresh("r"), self.fresh("m"));
        let body = self.printer(ty, Expr::var(&r), Expr::var(&m))?;
        Ok(Expr::lam(vec![Pat::var(r), Pat::var(m)], body))
    }

    /// Output of the default value of `ty`, without metadata.
    fn default_output(&mut self, ty: &Type) -> Result<Expr, GenError> {
        let value = self.default(ty)?;
        self.printer(ty, value, Expr::none())
    }

    /// Splits metadata into `n` per-slot options bound to fresh names.
    fn split_md(&mut self, md: Expr, n: usize) -> (Vec<String>, Option<(Pat, Expr)>) {
        let names: Vec<String> = (0..n).map(|_| self.fresh("m")).collect();
        if n == 0 {
            return (names, None);
        }
        let pat = Pat::tuple(names.iter().map(Pat::var).collect());
        let parts = Expr::prim_call("md_parts", vec![md, Expr::int(n as i64)]);
        (names, Some((pat, parts)))
    }

    fn tuple_printer(&mut self, items: &[Type], rep: Expr, md: Expr) -> Result<Expr, GenError> {
        if items.is_empty() {
            return Ok(nil());
        }
        let (mds, split) = self.split_md(md, items.len());
        let mut reps = Vec::new();
        let mut outputs = Vec::with_capacity(items.len());
        for (item, m) in items.iter().zip(&mds) {
            let value = if has_representation(item) {
                let r = self.fresh("r");
                reps.push(r.clone());
                Expr::var(r)
            } else {
                Expr::unit()
            };
            outputs.push(self.printer(item, value, Expr::var(m))?);
        }
        let mut body = cat(outputs);
        if let Some((pat, parts)) = split {
            body = Expr::let_in(pat, parts, body);
        }
        if !reps.is_empty() {
            body = Expr::let_in(Pat::tuple(reps.into_iter().map(Pat::var).collect()), rep, body);
        }
        Ok(body)
    }

    /// Pattern matching a branch's representation, binding labels and
    /// positional arguments.
    fn branch_pattern(&mut self, branch: &Branch) -> (Pat, Vec<Option<String>>) {
        let mut pats = Vec::new();
        let mut bound = Vec::new();
        for slot in branch.slots() {
            let name = match slot.label {
                Some(label) if has_representation(slot.ty) => Some(label.to_owned()),
                None if slot.positional && has_representation(slot.ty) => Some(self.fresh("r")),
                _ => None,
            };
            if let Some(n) = &name {
                pats.push(Pat::var(n));
            }
            bound.push(name);
        }
        (Pat::con(branch.ctor(), pats), bound)
    }

    /// Output of one branch; `rep` must be built with this branch's
    /// constructor.
    pub fn branch_printer(&mut self, branch: &Branch, rep: Expr, md: Expr) -> Result<Expr, GenError> {
        let slots = branch.slots();
        let (pattern, bound) = self.branch_pattern(branch);
        let (mds, split) = self.split_md(md, slots.len());

        let mut outputs = Vec::with_capacity(slots.len());
        let mut values = Vec::new();
        for ((slot, name), m) in slots.iter().zip(&bound).zip(&mds) {
            let out = match (name, slot.ty) {
                (Some(n), ty) => self.printer(ty, Expr::var(n), Expr::var(m))?,
                (None, Type::Value { expr, .. }) => {
                    if let Some(label) = slot.label {
                        values.push((label, expr.clone()));
                    }
                    nil()
                }
                (None, ty) if has_representation(ty) => self.default_output(ty)?,
                (None, ty) => self.printer(ty, Expr::unit(), Expr::var(m))?,
            };
            outputs.push(out);
        }

        let mut body = cat(outputs);
        if let Some((pat, parts)) = split {
            body = Expr::let_in(pat, parts, body);
        }
        for (label, expr) in values.into_iter().rev() {
            body = Expr::let_in(Pat::var(label), expr, body);
        }
        Ok(Expr::case(rep, vec![(pattern, body)]))
    }

    /// Output of a union or wrapper.
    ///
    /// With more than one branch, each branch becomes a let-bound helper;
    /// one arm per branch matches the representation together with that
    /// branch's metadata, and a final wildcard arm dispatches on the
    /// representation alone with no metadata.
    pub fn union_printer(&mut self, branches: &[&Branch], rep: Expr, md: Expr) -> Result<Expr, GenError> {
        if let [only] = branches {
            return self.branch_printer(only, rep, md);
        }

        let mut helpers = Vec::with_capacity(branches.len());
        let mut arms = Vec::with_capacity(branches.len() + 1);
        let mut fallback = Vec::with_capacity(branches.len());
        for branch in branches {
            let helper = self.fresh("print");
            let (r, m) = (self.fresh("r"), self.fresh("m"));
            let body = self.branch_printer(branch, Expr::var(&r), Expr::var(&m))?;
            helpers.push((helper.clone(), Expr::lam(vec![Pat::var(r), Pat::var(m)], body)));

            let rep_fields = branch
                .slots()
                .iter()
                .filter(|s| has_representation(s.ty) && (s.positional || s.label.is_some()))
                .map(|_| Pat::Wild)
                .collect::<Vec<_>>();
            let rep_pat = Pat::con(branch.ctor(), rep_fields.clone());
            let md_pat = Pat::con(
                "Some",
                vec![Pat::Tuple(vec![
                    Pat::Wild,
                    Pat::con(
                        naming::branch_md(branch.ctor()),
                        vec![Pat::Wild; branch.slots().len()],
                    ),
                ])],
            );
            arms.push((
                Pat::Tuple(vec![rep_pat.clone(), md_pat]),
                Expr::call(&helper, vec![rep.clone(), md.clone()]),
            ));
            fallback.push((
                rep_pat,
                Expr::call(&helper, vec![rep.clone(), Expr::none()]),
            ));
        }
        arms.push((
            Pat::Tuple(vec![Pat::Wild, Pat::Wild]),
            Expr::case(rep.clone(), fallback),
        ));

        let mut body = Expr::case(Expr::Tuple(vec![rep, md]), arms);
        for (helper, lam) in helpers.into_iter().rev() {
            body = Expr::let_in(Pat::var(helper), lam, body);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Field;
    use crate::env::TypeEnv;

    fn int() -> Type {
        Type::con("Int")
    }

    #[test]
    fn literals_print_themselves() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let out = cx
            .printer(&Type::lit(Expr::str("ab")), Expr::unit(), Expr::none())
            .unwrap();
        assert_eq!(out.to_string(), "rt::print_lit(\"ab\")");
    }

    #[test]
    fn values_and_lookahead_print_nothing() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let v = Type::value(Expr::int(3), int());
        assert_eq!(cx.printer(&v, Expr::unit(), Expr::none()).unwrap(), nil());
        let t = Type::try_(int());
        assert_eq!(cx.printer(&t, Expr::var("r"), Expr::none()).unwrap(), nil());
    }

    #[test]
    fn transform_prints_through_inverse() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::transform(
            Type::con("Char"),
            int(),
            Expr::Tuple(vec![Expr::var("ord"), Expr::var("chr")]),
        );
        let out = cx.printer(&t, Expr::var("v"), Expr::var("m")).unwrap();
        assert_eq!(
            out.to_string(),
            "let r#0 = chr(v) in\nchar_printFL(r#0, m)"
        );
    }

    #[test]
    fn list_prints_default_separator_and_terminator() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::list(int())
            .sep_by(Type::lit(Expr::char(',')))
            .terminated(Termination::Until(Box::new(Type::lit(Expr::str("\n")))));
        let out = cx.printer(&t, Expr::var("v"), Expr::var("m")).unwrap().to_string();
        assert!(out.starts_with("rt::print_list(\\(r#0, m#1) -> int_printFL(r#0, m#1)"));
        assert!(out.contains("rt::print_lit(',')"));
        assert!(out.contains("rt::print_lit(\"\\n\")"));
    }

    #[test]
    fn length_bounded_lists_print_no_terminator() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::list(int()).terminated(Termination::Length(Expr::int(2)));
        let Expr::App(_, args) = cx.printer(&t, Expr::var("v"), Expr::var("m")).unwrap() else {
            panic!("not an application");
        };
        assert_eq!(args[1], nil());
        assert_eq!(args[2], nil());
    }

    #[test]
    fn dropped_fields_print_defaults() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let b = Branch::record(
            "R",
            vec![Field::labeled("x", int()), Field::anon(int())],
        );
        let out = cx
            .branch_printer(&b, Expr::var("v"), Expr::var("m"))
            .unwrap()
            .to_string();
        assert!(out.contains("R(x) -> "));
        assert!(out.contains("int_printFL(int_def(), None)"));
    }

    #[test]
    fn unions_get_one_arm_per_branch_and_a_fallback() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let a = Branch::constructor("A", vec![int()]);
        let b = Branch::constructor("B", vec![Type::con("Char")]);
        let mut e = cx
            .union_printer(&[&a, &b], Expr::var("v"), Expr::var("m"))
            .unwrap();
        while let Expr::Let(_, _, body) = e {
            e = *body;
        }
        let Expr::Case(_, arms) = e else {
            panic!("union printer is not a case");
        };
        assert_eq!(arms.len(), 3);
        assert_eq!(arms[2].0, Pat::Tuple(vec![Pat::Wild, Pat::Wild]));
    }

    #[test]
    fn single_branch_needs_no_fallback() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let a = Branch::constructor("A", vec![int()]);
        let Expr::Case(_, arms) = cx.union_printer(&[&a], Expr::var("v"), Expr::var("m")).unwrap()
        else {
            panic!("not a case");
        };
        assert_eq!(arms.len(), 1);
    }
}
