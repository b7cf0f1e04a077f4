//! Default-value synthesis.

use super::{Cx, merged, pair, transform_pair};
use crate::ast::{Branch, Decl, Type};
use crate::error::GenError;
use crate::ir::{Expr, Name, Pat};
use crate::naming;
use crate::shape::{self, has_representation};

impl Cx<'_> {
    /// The canonical representation of `ty`, computed without input.
    pub fn default(&mut self, ty: &Type) -> Result<Expr, GenError> {
        let value = match ty {
            Type::Con { .. } | Type::App { .. } => {
                let app = shape::application(ty)?;
                shape::resolve(self.env, &app)?;
                let mut args = app
                    .args
                    .iter()
                    .map(|a| self.default(a))
                    .collect::<Result<Vec<_>, _>>()?;
                args.extend(app.value.cloned());
                Expr::call(naming::default(app.name), args)
            }
            Type::Var(v) => {
                self.check_var(v)?;
                Expr::var(naming::var_default(v))
            }
            Type::Tuple(items) => {
                let defaults = items
                    .iter()
                    .filter(|t| has_representation(t))
                    .map(|t| self.default(t))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::tuple(defaults)
            }
            Type::List { .. } => Expr::List(Vec::new()),
            Type::Constrain { base, .. } => self.default(base)?,
            Type::Partition { elem, .. } => self.default(elem)?,
            Type::Value { ty, .. } => self.default(ty)?,
            Type::Try(inner) => self.default(inner)?,
            Type::Transform { src, fns, .. } => {
                let (fwd, _) = transform_pair(fns)?;
                let src = self.default(src)?;
                Expr::app(fwd.clone(), vec![src])
            }
            Type::Literal(_) => Expr::unit(),
        };
        Ok(value)
    }

    /// Default of one branch. Labeled slots are let-bound in order so later
    /// defaults may refer to earlier ones.
    pub fn branch_default(&mut self, branch: &Branch) -> Result<Expr, GenError> {
        let mut lets = Vec::new();
        let mut args = Vec::new();
        for slot in branch.slots() {
            let value = self.default(slot.ty)?;
            let has_rep = has_representation(slot.ty);
            match slot.label {
                Some(label) => {
                    if has_rep {
                        args.push(Expr::var(label));
                    }
                    lets.push((label, value));
                }
                None if slot.positional && has_rep => args.push(value),
                None => {}
            }
        }
        let mut body = Expr::con(branch.ctor(), args);
        for (label, value) in lets.into_iter().rev() {
            body = Expr::let_in(Pat::var(label), value, body);
        }
        Ok(body)
    }

    /// Metadata of the same shape as [`Cx::default`] of `ty`, with a clean
    /// header in every slot.
    ///
    /// Declared types are expanded through their first branch. A type met
    /// again during the expansion, a type variable, or an applied type gets
    /// a bare header.
    pub fn default_md(&mut self, ty: &Type) -> Result<Expr, GenError> {
        self.default_md_in(ty, &mut Vec::new())
    }

    /// `Md_Ctor(..)` of a branch default: one clean slot per field.
    pub fn branch_default_md(&mut self, branch: &Branch) -> Result<Expr, GenError> {
        self.branch_md_in(branch, &mut Vec::new())
    }

    fn default_md_in(&mut self, ty: &Type, seen: &mut Vec<Name>) -> Result<Expr, GenError> {
        let md = match ty {
            Type::Con { .. } | Type::App { .. } => {
                let app = shape::application(ty)?;
                shape::resolve(self.env, &app)?;
                let env = self.env;
                match env.decl(app.name) {
                    Some(decl) if app.args.is_empty() && !seen.iter().any(|n| n == app.name) => {
                        seen.push(app.name.to_owned());
                        let md = self.decl_md_in(decl, seen);
                        seen.pop();
                        md?
                    }
                    _ => merged(&[]),
                }
            }
            Type::Var(v) => {
                if seen.is_empty() {
                    self.check_var(v)?;
                }
                merged(&[])
            }
            Type::Tuple(items) => {
                let mut mds = items
                    .iter()
                    .map(|t| self.default_md_in(t, seen))
                    .collect::<Result<Vec<_>, _>>()?;
                match mds.len() {
                    0 => merged(&[]),
                    1 => pair(merged(&[]), mds.remove(0)),
                    _ => pair(merged(&[]), Expr::Tuple(mds)),
                }
            }
            Type::List { .. } => pair(merged(&[]), Expr::List(Vec::new())),
            Type::Constrain { base, .. } => self.default_md_in(base, seen)?,
            Type::Partition { elem, .. } => self.default_md_in(elem, seen)?,
            Type::Try(inner) => self.default_md_in(inner, seen)?,
            Type::Transform { src, .. } => self.default_md_in(src, seen)?,
            Type::Value { .. } | Type::Literal(_) => merged(&[]),
        };
        Ok(md)
    }

    fn decl_md_in(&mut self, decl: &Decl, seen: &mut Vec<Name>) -> Result<Expr, GenError> {
        match decl {
            Decl::TypeAlias { ty, .. } => self.default_md_in(ty, seen),
            Decl::Obtain { base, .. } => self.default_md_in(base, seen),
            Decl::Union { .. } | Decl::Wrapper { .. } => match decl.branches().first() {
                Some(first) => Ok(pair(merged(&[]), self.branch_md_in(first, seen)?)),
                None => Err(GenError::EmptyUnion(decl.name().to_owned())),
            },
        }
    }

    fn branch_md_in(&mut self, branch: &Branch, seen: &mut Vec<Name>) -> Result<Expr, GenError> {
        let slots = branch
            .slots()
            .iter()
            .map(|slot| self.default_md_in(slot.ty, seen))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::con(naming::branch_md(branch.ctor()), slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Field;
    use crate::env::TypeEnv;

    #[test]
    fn base_and_structural_defaults() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::Tuple(vec![
            Type::con("Int"),
            Type::lit(Expr::char(',')),
            Type::list(Type::con("Char")),
        ]);
        assert_eq!(cx.default(&t).unwrap().to_string(), "(int_def(), [])");
        let fw = Type::with_value(Type::con("StringFW"), Expr::int(4));
        assert_eq!(cx.default(&fw).unwrap().to_string(), "stringFW_def(4)");
    }

    #[test]
    fn transform_default_goes_forward() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::transform(
            Type::con("Char"),
            Type::con("Int"),
            Expr::Tuple(vec![Expr::var("ord"), Expr::var("chr")]),
        );
        assert_eq!(cx.default(&t).unwrap().to_string(), "ord(char_def())");
    }

    #[test]
    fn default_metadata_mirrors_the_default() {
        let mut env = TypeEnv::new();
        let pt = crate::ast::Decl::wrapper(
            "Pt",
            Branch::record(
                "Pt",
                vec![
                    Field::labeled("x", Type::con("Int")),
                    Field::anon(Type::lit(Expr::char(','))),
                ],
            ),
        );
        env.declare(&pt).unwrap();
        let mut cx = Cx::new(&env, &[]);
        let t = Type::Tuple(vec![Type::con("Pt"), Type::list(Type::con("Int"))]);
        assert_eq!(
            cx.default_md(&t).unwrap().to_string(),
            "(rt::merge([]), ((rt::merge([]), Md_Pt(rt::merge([]), rt::merge([]))), (rt::merge([]), [])))"
        );
    }

    #[test]
    fn default_metadata_stops_at_recursion() {
        let mut env = TypeEnv::new();
        let nat = crate::ast::Decl::union(
            "N",
            vec![Branch::constructor("S", vec![Type::con("N")])],
        );
        env.declare(&nat).unwrap();
        let mut cx = Cx::new(&env, &[]);
        assert_eq!(
            cx.default_md(&Type::con("N")).unwrap().to_string(),
            "(rt::merge([]), Md_S(rt::merge([])))"
        );
    }

    #[test]
    fn record_defaults_chain_labels() {
        let env = TypeEnv::new();
        let mut cx = Cx::new(&env, &[]);
        let b = Branch::record(
            "Sized",
            vec![
                Field::labeled("n", Type::con("Int")),
                Field::anon(Type::lit(Expr::char(':'))),
                Field::labeled(
                    "body",
                    Type::with_value(Type::con("StringFW"), Expr::var("n")),
                ),
            ],
        );
        assert_eq!(
            cx.branch_default(&b).unwrap().to_string(),
            "let n = int_def() in\nlet body = stringFW_def(n) in\nSized(n, body)"
        );
    }
}
