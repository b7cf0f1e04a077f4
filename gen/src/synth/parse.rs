//! Parser synthesis.
//!
//! Every parser expression evaluates to a parser yielding a `(rep, md)`
//! pair. Failures never abort: they land in the metadata header and are
//! merged upward.

use super::{Cx, md_binder, merged, pair, transform_pair};
use crate::ast::{Branch, Termination, Type, UnionBody};
use crate::error::GenError;
use crate::ir::{Expr, Pat};
use crate::naming;
use crate::pretty::Pretty;
use crate::shape::{self, has_representation};

/// How a sequenced step binds its result.
enum Binding {
    /// `bind(p, \(rep, md) -> ..)`
    Pair(Pat, String),
    /// `discard_bind(p, \md -> ..)`
    MdOnly(String),
}

struct Step {
    parser: Expr,
    binding: Binding,
    /// A field predicate, checked against `(rep, md)` right after the step.
    check: Option<(Expr, String)>,
}

/// Nests `steps` around `body`, first step outermost.
fn sequence(steps: Vec<Step>, mut body: Expr) -> Expr {
    for step in steps.into_iter().rev() {
        if let Some((pred, desc)) = step.check {
            let (rep_pat, rep, md) = match &step.binding {
                Binding::Pair(p, m) => (p.clone(), pat_expr(p), m.clone()),
                Binding::MdOnly(m) => (Pat::Wild, Expr::unit(), m.clone()),
            };
            let checked = Expr::prim_call(
                "check",
                vec![pair(rep, Expr::var(&md)), pred, Expr::str(desc)],
            );
            body = Expr::let_in(Pat::Tuple(vec![rep_pat, Pat::var(md)]), checked, body);
        }
        body = match step.binding {
            Binding::Pair(rep, md) => Expr::prim_call(
                "bind",
                vec![
                    step.parser,
                    Expr::lam(vec![Pat::Tuple(vec![rep, Pat::var(md)])], body),
                ],
            ),
            Binding::MdOnly(md) => Expr::prim_call(
                "discard_bind",
                vec![step.parser, Expr::lam(vec![Pat::var(md)], body)],
            ),
        };
    }
    body
}

/// The expression rebuilding what a binder pattern bound.
fn pat_expr(pat: &Pat) -> Expr {
    match pat {
        Pat::Var(v) => Expr::var(v),
        _ => Expr::unit(),
    }
}

impl Cx<'_> {
    pub fn parser(&mut self, ty: &Type) -> Result<Expr, GenError> {
        let p = match ty {
            Type::Con { .. } | Type::App { .. } => {
                let app = shape::application(ty)?;
                shape::resolve(self.env, &app)?;
                let mut args = app
                    .args
                    .iter()
                    .map(|a| self.parser(a))
                    .collect::<Result<Vec<_>, _>>()?;
                args.extend(app.value.cloned());
                Expr::call(naming::parser(app.name), args)
            }
            Type::Var(v) => {
                self.check_var(v)?;
                Expr::var(naming::var_parser(v))
            }
            Type::Tuple(items) => self.tuple_parser(items)?,
            Type::List { elem, sep, term } => {
                let elem = self.parser(elem)?;
                let sep = sep.as_deref().map(|s| self.parser(s)).transpose()?;
                match (sep, term) {
                    (None, None) => Expr::prim_call("list_plain", vec![elem]),
                    (Some(s), None) => Expr::prim_call("list_sep", vec![elem, s]),
                    (None, Some(Termination::Length(n))) => {
                        Expr::prim_call("list_len", vec![elem, n.clone()])
                    }
                    (Some(s), Some(Termination::Length(n))) => {
                        Expr::prim_call("list_sep_len", vec![elem, s, n.clone()])
                    }
                    (None, Some(Termination::Until(t))) => {
                        let t = self.parser(t)?;
                        Expr::prim_call("list_term", vec![elem, t])
                    }
                    (Some(s), Some(Termination::Until(t))) => {
                        let t = self.parser(t)?;
                        Expr::prim_call("list_sep_term", vec![elem, s, t])
                    }
                }
            }
            Type::Constrain { pat, base, pred } => {
                let p = self.parser(base)?;
                let holds = Expr::lam(vec![pat.clone(), md_binder(pat)], pred.clone());
                Expr::prim_call(
                    "constrain",
                    vec![p, holds, Expr::str(pred.to_flat_string())],
                )
            }
            Type::Transform { src, dst, fns } => {
                let (fwd, _) = transform_pair(fns)?;
                shape::check_transform(self.env, src, dst)?;
                shape::rep_of(self.env, dst)?;
                let p = self.parser(src)?;
                Expr::prim_call("transform", vec![p, fwd.clone()])
            }
            Type::Partition { elem, discipline } => {
                let p = self.parser(elem)?;
                Expr::prim_call("partition", vec![p, discipline.clone()])
            }
            Type::Value { expr, ty } => {
                shape::rep_of(self.env, ty)?;
                Expr::prim_call("at_value", vec![expr.clone()])
            }
            Type::Literal(lit) => Expr::prim_call("lit_parse", vec![lit.clone()]),
            Type::Try(inner) => {
                let p = self.parser(inner)?;
                Expr::prim_call("try_parse", vec![p])
            }
        };
        Ok(p)
    }

    /// Sequences the members left to right, then rebuilds the tuple through
    /// a let-bound aggregator.
    fn tuple_parser(&mut self, items: &[Type]) -> Result<Expr, GenError> {
        let agg = self.fresh("agg");
        let mut steps = Vec::with_capacity(items.len());
        let mut params = Vec::new();
        let mut reps = Vec::new();
        let mut mds = Vec::new();
        for item in items {
            let parser = self.parser(item)?;
            let m = self.fresh("m");
            let binding = if has_representation(item) {
                let r = self.fresh("r");
                params.push(Pat::var(&r));
                reps.push(Expr::var(&r));
                Binding::Pair(Pat::var(r), m.clone())
            } else {
                Binding::MdOnly(m.clone())
            };
            mds.push(Expr::var(m));
            steps.push(Step {
                parser,
                binding,
                check: None,
            });
        }
        params.extend(mds.iter().map(|m| match m {
            Expr::Var(v) => Pat::var(v),
            _ => Pat::Wild,
        }));

        let md = match mds.len() {
            0 => merged(&[]),
            1 => pair(merged(&mds), mds[0].clone()),
            _ => pair(merged(&mds), Expr::Tuple(mds.clone())),
        };
        let aggregator = Expr::lam(params, pair(Expr::tuple(reps.clone()), md));
        let args = reps.into_iter().chain(mds).collect();
        let body = sequence(
            steps,
            Expr::prim_call("pure", vec![Expr::call(&agg, args)]),
        );
        Ok(Expr::let_in(Pat::var(agg), aggregator, body))
    }

    /// Parses one record or constructor branch into
    /// `(Ctor(reps..), (header, Md_Ctor(mds..)))`.
    pub fn branch_parser(&mut self, branch: &Branch) -> Result<Expr, GenError> {
        let mut steps = Vec::new();
        let mut reps = Vec::new();
        let mut mds = Vec::new();
        for slot in branch.slots() {
            let parser = self.parser(slot.ty)?;
            let has_rep = has_representation(slot.ty);
            let binding = match slot.label {
                Some(label) => {
                    if has_rep {
                        reps.push(Expr::var(label));
                    }
                    Binding::Pair(Pat::var(label), naming::label_md(label))
                }
                None if slot.positional && has_rep => {
                    let r = self.fresh("r");
                    reps.push(Expr::var(&r));
                    Binding::Pair(Pat::var(r), self.fresh("m"))
                }
                None => Binding::MdOnly(self.fresh("m")),
            };
            let md = match &binding {
                Binding::Pair(_, m) | Binding::MdOnly(m) => m.clone(),
            };
            mds.push(Expr::var(md));
            let check = slot.pred.map(|p| (p.clone(), p.to_flat_string()));
            steps.push(Step {
                parser,
                binding,
                check,
            });
        }

        let ctor = branch.ctor();
        let mut result = pair(
            Expr::con(ctor, reps),
            pair(merged(&mds), Expr::con(naming::branch_md(ctor), mds)),
        );
        if let Some(pred) = branch.pred() {
            result = Expr::prim_call(
                "check",
                vec![result, pred.clone(), Expr::str(pred.to_flat_string())],
            );
        }
        Ok(sequence(steps, Expr::prim_call("pure", vec![result])))
    }

    /// Ordered choice over the branches, or a pure dispatch for a switch.
    pub fn union_parser(&mut self, name: &str, body: &UnionBody) -> Result<Expr, GenError> {
        match body {
            UnionBody::Choice(branches) => {
                if branches.is_empty() {
                    return Err(GenError::EmptyUnion(name.to_owned()));
                }
                let alts = branches
                    .iter()
                    .map(|b| {
                        let p = self.branch_parser(b)?;
                        Ok(Expr::Tuple(vec![Expr::bool(b.is_retry()), p]))
                    })
                    .collect::<Result<_, GenError>>()?;
                Ok(Expr::prim_call("choice", vec![Expr::List(alts)]))
            }
            UnionBody::Switch { scrutinee, arms } => {
                let Some((_, first)) = arms.first() else {
                    return Err(GenError::EmptyUnion(name.to_owned()));
                };
                let failed = Expr::prim_call(
                    "at_failure",
                    vec![
                        self.branch_default(first)?,
                        Expr::str(scrutinee.to_flat_string()),
                    ],
                );
                let (r, h) = (self.fresh("r"), self.fresh("h"));
                let md = pair(Expr::var(&h), self.branch_default_md(first)?);
                let fallback = Expr::prim_call(
                    "bind",
                    vec![
                        failed,
                        Expr::lam(
                            vec![Pat::Tuple(vec![Pat::var(&r), Pat::var(h)])],
                            Expr::prim_call("pure", vec![pair(Expr::var(r), md)]),
                        ),
                    ],
                );
                let mut cases = arms
                    .iter()
                    .map(|(pat, b)| Ok((pat.clone(), self.branch_parser(b)?)))
                    .collect::<Result<Vec<_>, GenError>>()?;
                cases.push((Pat::Wild, fallback));
                Ok(Expr::case(scrutinee.clone(), cases))
            }
        }
    }
}
