//! Declaration emitter.
//!
//! Compiles a [`Schema`] in two passes: first every declaration is
//! registered in the [`TypeEnv`], then each one is compiled on its own into
//! [`Artifacts`]. A declaration that fails either pass is reported once and
//! contributes nothing to the [`Module`]; neither does any declaration that
//! refers to it, directly or through others.

use std::collections::HashSet;
use std::fmt;

use crate::ast::{Decl, Schema, Termination, Type, UnionBody};
use crate::config::GenConfig;
use crate::env::TypeEnv;
use crate::error::{DeclError, GenError};
use crate::ir::{Expr, FnDef, Pat};
use crate::naming;
use crate::pretty::Pretty;
use crate::shape::{self, DeclShapes, TypeDecl};
use crate::synth::{Cx, transform_pair};

/// Everything generated for one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub name: String,
    pub shapes: DeclShapes,
    pub parser: FnDef,
    pub parse_str: FnDef,
    pub printer: FnDef,
    pub default: FnDef,
}

impl Artifacts {
    pub fn fns(&self) -> [&FnDef; 4] {
        [&self.parser, &self.parse_str, &self.printer, &self.default]
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        [&self.shapes.rep, &self.shapes.md]
            .into_iter()
            .chain(self.shapes.imd.as_ref())
    }
}

/// The compiled declarations, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub decls: Vec<Artifacts>,
}

impl Module {
    pub fn get(&self, name: &str) -> Option<&Artifacts> {
        self.decls.iter().find(|a| a.name == name)
    }

    pub fn fns(&self) -> impl Iterator<Item = &FnDef> {
        self.decls.iter().flat_map(Artifacts::fns)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter().flat_map(Artifacts::types)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.fns().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            f.write_str(&def.to_pretty_string())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compiled {
    pub module: Module,
    pub errors: Vec<DeclError>,
}

impl Compiled {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Module, Vec<DeclError>> {
        if self.errors.is_empty() {
            Ok(self.module)
        } else {
            Err(self.errors)
        }
    }
}

/// Compiles every declaration of `schema`.
pub fn compile(schema: &Schema, config: &GenConfig) -> Compiled {
    let mut env = TypeEnv::new();
    let mut out = Compiled::default();
    let mut declared = Vec::with_capacity(schema.decls.len());

    for decl in &schema.decls {
        match env.declare(decl) {
            Ok(()) => declared.push(decl),
            Err(error) => {
                reject(&mut out, decl, error);
                if config.fail_fast {
                    return out;
                }
            }
        }
    }

    let mut rejected = HashSet::new();
    loop {
        let mut emitted = Vec::with_capacity(declared.len());
        let mut failed = Vec::new();
        for decl in declared {
            match compile_decl(&env, decl, config) {
                Ok(artifacts) => emitted.push((decl, artifacts)),
                Err(error) => {
                    reject(&mut out, decl, dependency_error(error, &rejected));
                    if config.fail_fast {
                        return out;
                    }
                    failed.push(decl.name());
                }
            }
        }
        if failed.is_empty() {
            for (_, artifacts) in emitted {
                tracing::debug!(decl = %artifacts.name, "emitted declaration");
                out.module.decls.push(artifacts);
            }
            return out;
        }
        // Survivors are recompiled without the rejected names.
        for name in failed {
            env.remove(name);
            rejected.insert(name.to_owned());
        }
        declared = emitted.into_iter().map(|(decl, _)| decl).collect();
    }
}

/// Names a reference to a rejected declaration as such.
fn dependency_error(error: GenError, rejected: &HashSet<String>) -> GenError {
    match error {
        GenError::UnknownType(name) if rejected.contains(&name) => {
            GenError::RejectedDependency(name)
        }
        other => other,
    }
}

fn reject(out: &mut Compiled, decl: &Decl, error: GenError) {
    tracing::warn!(decl = %decl.name(), %error, "rejected declaration");
    out.errors.push(DeclError::new(decl.name(), error));
}

/// Compiles one declaration against an environment it is registered in.
pub fn compile_decl(env: &TypeEnv, decl: &Decl, config: &GenConfig) -> Result<Artifacts, GenError> {
    validate(decl)?;
    let name = decl.name();
    let params = decl.params();
    let shapes = shape::decl_shapes(env, decl, config.default_caps)?;
    let mut cx = Cx::new(env, params);

    let value_param: Vec<Pat> = decl.pat().cloned().into_iter().collect();
    let parser_params: Vec<Pat> = params
        .iter()
        .map(|p| Pat::var(naming::var_parser(p)))
        .chain(value_param.iter().cloned())
        .collect();
    let default_params: Vec<Pat> = params
        .iter()
        .map(|p| Pat::var(naming::var_default(p)))
        .chain(value_param.iter().cloned())
        .collect();
    let rep = cx.gensym.fresh("rep");
    let md = cx.gensym.fresh("md");
    let printer_params: Vec<Pat> = params
        .iter()
        .map(|p| Pat::var(naming::var_printer(p)))
        .chain(params.iter().map(|p| Pat::var(naming::var_default(p))))
        .chain(value_param.iter().cloned())
        .chain([Pat::var(&rep), Pat::var(&md)])
        .collect();

    let (rep_e, md_e) = (Expr::var(&rep), Expr::var(&md));
    let (parse_body, print_body, default_body) = match decl {
        Decl::TypeAlias { ty, .. } => (
            cx.parser(ty)?,
            cx.printer(ty, rep_e, md_e)?,
            cx.default(ty)?,
        ),
        Decl::Union { body, .. } => {
            let branches = body.branches();
            let first = branches
                .first()
                .ok_or_else(|| GenError::EmptyUnion(name.to_owned()))?;
            (
                cx.union_parser(name, body)?,
                cx.union_printer(&branches, rep_e, md_e)?,
                cx.branch_default(first)?,
            )
        }
        Decl::Wrapper { branch, .. } => (
            cx.branch_parser(branch)?,
            cx.union_printer(&[branch], rep_e, md_e)?,
            cx.branch_default(branch)?,
        ),
        Decl::Obtain { base, fns, .. } => {
            let (fwd, inv) = transform_pair(fns)?;
            let base_parser = cx.parser(base)?;
            let r = cx.gensym.fresh("r");
            let print = Expr::let_in(
                Pat::var(&r),
                Expr::app(inv.clone(), vec![rep_e]),
                cx.printer(base, Expr::var(&r), md_e)?,
            );
            (
                Expr::prim_call("transform", vec![base_parser, fwd.clone()]),
                print,
                Expr::app(fwd.clone(), vec![cx.default(base)?]),
            )
        }
    };

    let parser = FnDef::new(
        naming::parser(name),
        parser_params,
        Expr::prim_call("nested", vec![Expr::lam(Vec::new(), parse_body)]),
    );

    let input = cx.gensym.fresh("input");
    let value_arg = decl.pat().map(|_| cx.gensym.fresh("arg"));
    let forwarded: Vec<Expr> = params
        .iter()
        .map(|p| Expr::var(naming::var_parser(p)))
        .chain(value_arg.iter().map(Expr::var))
        .collect();
    let parse_str = FnDef::new(
        naming::parse_str(name),
        params
            .iter()
            .map(|p| Pat::var(naming::var_parser(p)))
            .chain(value_arg.iter().map(Pat::var))
            .chain([Pat::var(&input)])
            .collect(),
        Expr::prim_call(
            "parse_string",
            vec![Expr::call(naming::parser(name), forwarded), Expr::var(input)],
        ),
    );

    Ok(Artifacts {
        name: name.to_owned(),
        shapes,
        parser,
        parse_str,
        printer: FnDef::new(naming::printer(name), printer_params, print_body),
        default: FnDef::new(naming::default(name), default_params, default_body),
    })
}

/// Checks the names a declaration introduces.
fn validate(decl: &Decl) -> Result<(), GenError> {
    let mut seen = HashSet::new();
    for p in decl.params() {
        naming::check_binder(p)?;
        if !seen.insert(p.as_str()) {
            return Err(GenError::DuplicateName(p.clone()));
        }
    }
    if let Some(pat) = decl.pat() {
        check_pat(pat)?;
    }
    match decl {
        Decl::TypeAlias { ty, .. } => check_type(ty),
        Decl::Obtain { base, .. } => check_type(base),
        Decl::Union { body: UnionBody::Switch { arms, .. }, .. } => {
            for (pat, _) in arms {
                check_pat(pat)?;
            }
            check_branches(decl)
        }
        Decl::Union { .. } | Decl::Wrapper { .. } => check_branches(decl),
    }
}

fn check_branches(decl: &Decl) -> Result<(), GenError> {
    for branch in decl.branches() {
        let mut labels = HashSet::new();
        for slot in branch.slots() {
            if let Some(label) = slot.label {
                naming::check_binder(label)?;
                if !labels.insert(label) {
                    return Err(GenError::DuplicateName(label.to_owned()));
                }
            }
            check_type(slot.ty)?;
        }
    }
    Ok(())
}

fn check_pat(pat: &Pat) -> Result<(), GenError> {
    let mut seen = HashSet::new();
    for binder in pat.binders() {
        naming::check_binder(binder)?;
        if !seen.insert(binder) {
            return Err(GenError::DuplicateName(binder.to_owned()));
        }
    }
    Ok(())
}

fn check_type(ty: &Type) -> Result<(), GenError> {
    match ty {
        Type::Con { args, .. } => args.iter().try_for_each(check_type),
        Type::App { head, args, .. } => {
            check_type(head)?;
            args.iter().try_for_each(check_type)
        }
        Type::Var(v) => naming::check_binder(v),
        Type::Tuple(items) => items.iter().try_for_each(check_type),
        Type::List { elem, sep, term } => {
            check_type(elem)?;
            if let Some(s) = sep {
                check_type(s)?;
            }
            match term {
                Some(Termination::Until(t)) => check_type(t),
                Some(Termination::Length(_)) | None => Ok(()),
            }
        }
        Type::Constrain { pat, base, .. } => {
            check_pat(pat)?;
            check_type(base)
        }
        Type::Transform { src, dst, .. } => {
            check_type(src)?;
            check_type(dst)
        }
        Type::Partition { elem, .. } => check_type(elem),
        Type::Value { ty, .. } => check_type(ty),
        Type::Try(inner) => check_type(inner),
        Type::Literal(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Branch, Field};

    fn point() -> Decl {
        Decl::wrapper(
            "Point",
            Branch::record(
                "Point",
                vec![
                    Field::labeled("x", Type::con("Int")),
                    Field::anon(Type::lit(Expr::char(','))),
                    Field::labeled("y", Type::con("Int")),
                ],
            ),
        )
    }

    #[test]
    fn emits_four_functions_named_by_convention() {
        let compiled = compile(&Schema::new(vec![point()]), &GenConfig::DEFAULT);
        assert!(compiled.is_ok());
        let a = compiled.module.get("Point").unwrap();
        let names: Vec<_> = a.fns().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["point_parseM", "point_parseS", "point_printFL", "point_def"]
        );
        assert_eq!(a.shapes.md.name, "Point_md");
        assert_eq!(a.shapes.imd.as_ref().map(|d| d.name.as_str()), Some("Point_imd"));
    }

    #[test]
    fn parsers_are_nested_thunks() {
        let compiled = compile(&Schema::new(vec![point()]), &GenConfig::DEFAULT);
        let a = compiled.module.get("Point").unwrap();
        assert!(a.parser.body.to_string().starts_with("rt::nested(\\() -> "));
        assert_eq!(a.parse_str.params.len(), 1);
    }

    #[test]
    fn bad_declarations_are_skipped_not_fatal() {
        let bad = Decl::alias("Broken", Type::con("Missing"));
        let compiled = compile(&Schema::new(vec![bad, point()]), &GenConfig::DEFAULT);
        assert_eq!(compiled.errors.len(), 1);
        assert_eq!(compiled.errors[0].decl, "Broken");
        assert_eq!(
            compiled.errors[0].error,
            GenError::UnknownType("Missing".into())
        );
        assert!(compiled.module.get("Point").is_some());
        assert!(compiled.module.get("Broken").is_none());
    }

    #[test]
    fn dependents_of_rejected_declarations_are_rejected() {
        let bad = Decl::alias(
            "A",
            Type::transform(Type::con("Char"), Type::con("Int"), Expr::var("ord")),
        );
        let b = Decl::alias("B", Type::con("A"));
        let c = Decl::alias("C", Type::list(Type::con("B")));
        let compiled = compile(&Schema::new(vec![c, bad, b, point()]), &GenConfig::DEFAULT);
        let rejected: Vec<_> = compiled
            .errors
            .iter()
            .map(|e| (e.decl.as_str(), e.error.clone()))
            .collect();
        assert!(matches!(rejected[0], ("A", GenError::MalformedTransform { .. })));
        assert_eq!(rejected[1], ("B", GenError::RejectedDependency("A".into())));
        assert_eq!(rejected[2], ("C", GenError::RejectedDependency("B".into())));
        let emitted: Vec<_> = compiled.module.decls.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(emitted, ["Point"]);
    }

    #[test]
    fn fail_fast_stops_at_first_rejection() {
        let bad = Decl::alias("Broken", Type::con("Missing"));
        let compiled = compile(
            &Schema::new(vec![bad, point()]),
            &GenConfig::new().with_fail_fast(true),
        );
        assert_eq!(compiled.errors.len(), 1);
        assert!(compiled.module.decls.is_empty());
    }

    #[test]
    fn parameters_are_threaded() {
        let pair = Decl::alias("Pair", Type::Tuple(vec![Type::var("a"), Type::var("a")]))
            .with_params(&["a"]);
        let compiled = compile(&Schema::new(vec![pair]), &GenConfig::DEFAULT);
        let a = compiled.module.get("Pair").unwrap();
        assert_eq!(a.parser.params, vec![Pat::var("a_parseM_arg")]);
        assert_eq!(
            a.printer.params[..2],
            [Pat::var("a_printFL_arg"), Pat::var("a_def_arg")]
        );
        assert_eq!(a.default.params, vec![Pat::var("a_def_arg")]);
    }

    #[test]
    fn value_parameters_are_threaded() {
        let row = Decl::alias(
            "Cell",
            Type::with_value(Type::con("StringFW"), Expr::var("width")),
        )
        .with_pat(Pat::var("width"));
        let compiled = compile(&Schema::new(vec![row]), &GenConfig::DEFAULT);
        let a = compiled.module.get("Cell").unwrap();
        assert_eq!(a.parser.params, vec![Pat::var("width")]);
        assert_eq!(a.parse_str.params.len(), 2);
        assert_eq!(a.default.params, vec![Pat::var("width")]);
    }

    #[test]
    fn reserved_labels_are_rejected() {
        let d = Decl::wrapper(
            "R",
            Branch::record("R", vec![Field::labeled("x_md", Type::con("Int"))]),
        );
        let compiled = compile(&Schema::new(vec![d]), &GenConfig::DEFAULT);
        assert!(matches!(
            compiled.errors[0].error,
            GenError::InvalidName { .. }
        ));
    }

    #[test]
    fn display_lists_every_function() {
        let compiled = compile(&Schema::new(vec![point()]), &GenConfig::DEFAULT);
        let text = compiled.module.to_string();
        assert!(text.contains("point_parseM() ="));
        assert!(text.contains("point_def() ="));
    }
}
