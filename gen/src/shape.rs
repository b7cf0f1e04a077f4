//! Representation and metadata shapes.
//!
//! For every schema type the deriver computes the in-memory representation
//! shape and the parallel metadata shape. Shapes are pure functions of the
//! node and are recomputed wherever they are needed.
//!
//! | Node | Representation | Metadata |
//! |------|----------------|----------|
//! | named / applied | named rep over argument reps | named md over argument mds |
//! | type variable | `a` | `a_md` |
//! | tuple | reps of rep-bearing members | `(Header, mds of all members)` |
//! | list | `[elem rep]` | `(Header, [elem md])` |
//! | constrain, partition, try | underlying | underlying |
//! | transform | destination | destination |
//! | value | none | `Header` |
//! | literal | none | `Header` |

use std::fmt;

use crate::ast::{Branch, Decl, Type};
use crate::capability::Capabilities;
use crate::env::{TypeEnv, TypeInfo, TypeKind};
use crate::error::GenError;
use crate::ir::{Expr, Name};
use crate::naming;

/// Host primitive representations of base types.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    I64,
    Char,
    String,
    Unit,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Unit,
    Header,
    Prim(Prim),
    Named(Name, Vec<Shape>),
    Var(Name),
    Tuple(Vec<Shape>),
    List(Box<Shape>),
}

impl Shape {
    /// Whether `name` occurs outside any list.
    pub fn mentions_directly(&self, name: &str) -> bool {
        match self {
            Shape::Named(n, args) => n == name || args.iter().any(|a| a.mentions_directly(name)),
            Shape::Tuple(items) => items.iter().any(|s| s.mentions_directly(name)),
            Shape::Unit | Shape::Header | Shape::Prim(_) | Shape::Var(_) | Shape::List(_) => false,
        }
    }

    /// Every named type occurring outside any list.
    pub fn direct_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Shape::Named(n, args) => {
                out.push(n);
                args.iter().for_each(|a| a.direct_names(out));
            }
            Shape::Tuple(items) => items.iter().for_each(|s| s.direct_names(out)),
            Shape::Unit | Shape::Header | Shape::Prim(_) | Shape::Var(_) | Shape::List(_) => {}
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Shape]) -> fmt::Result {
            for (i, s) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{s}")?;
            }
            Ok(())
        }
        match self {
            Shape::Unit | Shape::Prim(Prim::Unit) => f.write_str("()"),
            Shape::Header => f.write_str("Header"),
            Shape::Prim(Prim::I64) => f.write_str("i64"),
            Shape::Prim(Prim::Char) => f.write_str("char"),
            Shape::Prim(Prim::String) => f.write_str("String"),
            Shape::Named(n, args) if args.is_empty() => f.write_str(n),
            Shape::Named(n, args) => {
                write!(f, "{n}<")?;
                list(f, args)?;
                f.write_str(">")
            }
            Shape::Var(v) => f.write_str(v),
            Shape::Tuple(items) => {
                f.write_str("(")?;
                list(f, items)?;
                f.write_str(")")
            }
            Shape::List(elem) => write!(f, "[{elem}]"),
        }
    }
}

/// False exactly for literals and computed values.
pub fn has_representation(ty: &Type) -> bool {
    !matches!(ty, Type::Literal(_) | Type::Value { .. })
}

/// A named type with all its arguments collected.
#[derive(Debug, Clone)]
pub struct Application<'a> {
    pub name: &'a str,
    pub args: Vec<&'a Type>,
    pub value: Option<&'a Expr>,
}

/// Flattens a named type or (curried) application.
pub fn application(ty: &Type) -> Result<Application<'_>, GenError> {
    match ty {
        Type::Con { name, args } => Ok(Application {
            name,
            args: args.iter().collect(),
            value: None,
        }),
        Type::App { head, args, value } => {
            let mut app = application(head).map_err(|_| GenError::NonConstructorHead)?;
            if app.value.is_some() && (value.is_some() || !args.is_empty()) {
                return Err(GenError::NonConstructorHead);
            }
            app.args.extend(args.iter());
            app.value = value.as_ref();
            Ok(app)
        }
        _ => Err(GenError::NonConstructorHead),
    }
}

/// Resolves an application against the environment, checking its arity.
pub fn resolve<'e>(env: &'e TypeEnv, app: &Application<'_>) -> Result<&'e TypeInfo, GenError> {
    let info = env.lookup(app.name)?;
    if info.params != app.args.len() || info.value_param != app.value.is_some() {
        return Err(GenError::ArityMismatch {
            name: app.name.to_owned(),
            expected: info.params,
            found: app.args.len(),
            expects_value: info.value_param,
            has_value: app.value.is_some(),
        });
    }
    Ok(info)
}

/// Representation of `ty`, or `None` when it has none.
pub fn rep_of(env: &TypeEnv, ty: &Type) -> Result<Option<Shape>, GenError> {
    let shape = match ty {
        Type::Literal(_) | Type::Value { .. } => return Ok(None),
        Type::Con { .. } | Type::App { .. } => {
            let app = application(ty)?;
            let info = resolve(env, &app)?;
            match info.kind {
                TypeKind::Base(b) => Shape::Prim(b.rep()),
                TypeKind::Declared | TypeKind::Host => {
                    let args = app
                        .args
                        .iter()
                        .map(|a| rep_or_unit(env, a))
                        .collect::<Result<_, _>>()?;
                    Shape::Named(app.name.to_owned(), args)
                }
            }
        }
        Type::Var(v) => Shape::Var(v.clone()),
        Type::Tuple(items) => {
            let mut reps = Vec::new();
            for item in items {
                if let Some(rep) = rep_of(env, item)? {
                    reps.push(rep);
                }
            }
            match reps.len() {
                0 => Shape::Unit,
                1 => reps.remove(0),
                _ => Shape::Tuple(reps),
            }
        }
        Type::List { elem, .. } => Shape::List(Box::new(rep_or_unit(env, elem)?)),
        Type::Constrain { base, .. } => return rep_of(env, base),
        Type::Partition { elem, .. } => return rep_of(env, elem),
        Type::Try(inner) => return rep_of(env, inner),
        Type::Transform { dst, .. } => return rep_of(env, dst),
    };
    Ok(Some(shape))
}

/// Representation of `ty`, with unit standing in for "none".
///
/// A rep-less type argument is still parsed; its parser yields unit.
pub fn rep_or_unit(env: &TypeEnv, ty: &Type) -> Result<Shape, GenError> {
    Ok(rep_of(env, ty)?.unwrap_or(Shape::Unit))
}

pub fn md_of(env: &TypeEnv, ty: &Type) -> Result<Shape, GenError> {
    let shape = match ty {
        Type::Literal(_) | Type::Value { .. } => Shape::Header,
        Type::Con { .. } | Type::App { .. } => {
            let app = application(ty)?;
            let info = resolve(env, &app)?;
            match info.kind {
                TypeKind::Base(_) => Shape::Header,
                TypeKind::Declared | TypeKind::Host => {
                    let args = app
                        .args
                        .iter()
                        .map(|a| md_of(env, a))
                        .collect::<Result<_, _>>()?;
                    Shape::Named(naming::md_type(app.name), args)
                }
            }
        }
        Type::Var(v) => Shape::Var(naming::var_md(v)),
        Type::Tuple(items) => {
            let mut mds = items
                .iter()
                .map(|t| md_of(env, t))
                .collect::<Result<Vec<_>, _>>()?;
            match mds.len() {
                0 => Shape::Header,
                1 => Shape::Tuple(vec![Shape::Header, mds.remove(0)]),
                _ => Shape::Tuple(vec![Shape::Header, Shape::Tuple(mds)]),
            }
        }
        Type::List { elem, .. } => {
            Shape::Tuple(vec![Shape::Header, Shape::List(Box::new(md_of(env, elem)?))])
        }
        Type::Constrain { base, .. } => md_of(env, base)?,
        Type::Partition { elem, .. } => md_of(env, elem)?,
        Type::Try(inner) => md_of(env, inner)?,
        Type::Transform { dst, .. } => md_of(env, dst)?,
    };
    Ok(shape)
}

/// A transform passes the source metadata through as the destination's, so
/// the two must agree.
pub fn check_transform(env: &TypeEnv, src: &Type, dst: &Type) -> Result<(), GenError> {
    let (src_md, dst_md) = (md_of(env, src)?, md_of(env, dst)?);
    if src_md == dst_md {
        Ok(())
    } else {
        Err(GenError::ShapeMismatch {
            src: src_md.to_string(),
            dst: dst_md.to_string(),
        })
    }
}

/// A generated type declaration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: Name,
    pub params: Vec<Name>,
    pub body: TypeBody,
    /// `None` for aliases, which carry no capabilities of their own.
    pub caps: Option<Capabilities>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Alias(Shape),
    Data(Vec<Variant>),
    /// Supplied by the host program.
    Host,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub ctor: Name,
    pub fields: Vec<VariantField>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariantField {
    pub label: Option<Name>,
    pub shape: Shape,
    pub lazy: bool,
}

/// The representation, metadata and (for unions and wrappers) internal
/// metadata types of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclShapes {
    pub rep: TypeDecl,
    pub md: TypeDecl,
    pub imd: Option<TypeDecl>,
}

fn rep_variant(env: &TypeEnv, branch: &Branch) -> Result<Variant, GenError> {
    let mut fields = Vec::new();
    for slot in branch.slots() {
        if !has_representation(slot.ty) || !(slot.positional || slot.label.is_some()) {
            continue;
        }
        fields.push(VariantField {
            label: slot.label.map(str::to_owned),
            shape: rep_or_unit(env, slot.ty)?,
            lazy: slot.strictness == crate::ast::Strictness::Lazy,
        });
    }
    Ok(Variant {
        ctor: branch.ctor().to_owned(),
        fields,
    })
}

fn md_variant(env: &TypeEnv, branch: &Branch) -> Result<Variant, GenError> {
    let fields = branch
        .slots()
        .iter()
        .map(|slot| {
            Ok(VariantField {
                label: None,
                shape: md_of(env, slot.ty)?,
                lazy: false,
            })
        })
        .collect::<Result<_, GenError>>()?;
    Ok(Variant {
        ctor: naming::branch_md(branch.ctor()),
        fields,
    })
}

/// Derives the generated types of `decl`.
pub fn decl_shapes(
    env: &TypeEnv,
    decl: &Decl,
    default_caps: Capabilities,
) -> Result<DeclShapes, GenError> {
    let name = decl.name();
    let params = decl.params().to_vec();
    let md_params: Vec<Name> = params.iter().map(|p| naming::var_md(p)).collect();
    let md_args = md_params.iter().cloned().map(Shape::Var).collect::<Vec<_>>();

    let alias = |n: String, ps: Vec<Name>, shape: Shape| TypeDecl {
        name: n,
        params: ps,
        body: TypeBody::Alias(shape),
        caps: None,
    };

    let shapes = match decl {
        Decl::TypeAlias { ty, .. } => DeclShapes {
            rep: alias(name.to_owned(), params, rep_or_unit(env, ty)?),
            md: alias(naming::md_type(name), md_params, md_of(env, ty)?),
            imd: None,
        },
        Decl::Obtain { base, .. } => DeclShapes {
            rep: TypeDecl {
                name: name.to_owned(),
                params,
                body: TypeBody::Host,
                caps: None,
            },
            md: alias(naming::md_type(name), md_params, md_of(env, base)?),
            imd: None,
        },
        Decl::Union { .. } | Decl::Wrapper { .. } => {
            let caps = decl.caps().unwrap_or(default_caps);
            let branches = decl.branches();
            let rep_variants = branches
                .iter()
                .map(|b| rep_variant(env, b))
                .collect::<Result<_, _>>()?;
            let md_variants = branches
                .iter()
                .map(|b| md_variant(env, b))
                .collect::<Result<_, _>>()?;
            let imd_name = naming::imd_type(name);
            DeclShapes {
                rep: TypeDecl {
                    name: name.to_owned(),
                    params,
                    body: TypeBody::Data(rep_variants),
                    caps: Some(caps),
                },
                md: alias(
                    naming::md_type(name),
                    md_params.clone(),
                    Shape::Tuple(vec![Shape::Header, Shape::Named(imd_name.clone(), md_args)]),
                ),
                imd: Some(TypeDecl {
                    name: imd_name,
                    params: md_params,
                    body: TypeBody::Data(md_variants),
                    caps: Some(caps),
                }),
            }
        }
    };
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Field, Termination};

    fn int() -> Type {
        Type::con("Int")
    }

    fn comma() -> Type {
        Type::lit(Expr::char(','))
    }

    #[test]
    fn literal_and_value_have_no_rep() {
        let env = TypeEnv::new();
        assert!(!has_representation(&comma()));
        assert!(!has_representation(&Type::value(Expr::int(1), int())));
        assert_eq!(rep_of(&env, &comma()).unwrap(), None);
        assert_eq!(md_of(&env, &comma()).unwrap(), Shape::Header);
    }

    #[test]
    fn tuple_rep_skips_literals_md_keeps_them() {
        let env = TypeEnv::new();
        let t = Type::Tuple(vec![int(), comma(), int()]);
        assert_eq!(
            rep_of(&env, &t).unwrap(),
            Some(Shape::Tuple(vec![Shape::Prim(Prim::I64); 2]))
        );
        assert_eq!(
            md_of(&env, &t).unwrap(),
            Shape::Tuple(vec![Shape::Header, Shape::Tuple(vec![Shape::Header; 3])])
        );
    }

    #[test]
    fn repless_type_arguments_stay_as_unit() {
        let mut env = TypeEnv::new();
        let boxed = crate::ast::Decl::alias("Boxed", Type::var("a")).with_params(&["a"]);
        env.declare(&boxed).unwrap();
        let t = Type::con_args("Boxed", vec![comma()]);
        assert_eq!(
            rep_of(&env, &t).unwrap(),
            Some(Shape::Named("Boxed".into(), vec![Shape::Unit]))
        );
    }

    #[test]
    fn singleton_tuple_unwraps_rep_but_not_md() {
        let env = TypeEnv::new();
        let t = Type::Tuple(vec![comma(), int()]);
        assert_eq!(rep_of(&env, &t).unwrap(), Some(Shape::Prim(Prim::I64)));
        let t = Type::Tuple(vec![int()]);
        assert_eq!(
            md_of(&env, &t).unwrap(),
            Shape::Tuple(vec![Shape::Header, Shape::Header])
        );
        assert_eq!(md_of(&env, &Type::Tuple(vec![])).unwrap(), Shape::Header);
    }

    #[test]
    fn list_md_has_one_slot_per_element() {
        let env = TypeEnv::new();
        let t = Type::list(int()).terminated(Termination::Length(Expr::int(3)));
        assert_eq!(
            md_of(&env, &t).unwrap(),
            Shape::Tuple(vec![Shape::Header, Shape::List(Box::new(Shape::Header))])
        );
    }

    #[test]
    fn type_variables_pair_with_md_variables() {
        let env = TypeEnv::new();
        assert_eq!(md_of(&env, &Type::var("a")).unwrap(), Shape::Var("a_md".into()));
    }

    #[test]
    fn arity_is_checked() {
        let env = TypeEnv::new();
        let err = rep_of(&env, &Type::con("StringC")).unwrap_err();
        assert!(matches!(err, GenError::ArityMismatch { expects_value: true, .. }));
        let ok = Type::with_value(Type::con("StringC"), Expr::char('|'));
        assert_eq!(
            rep_of(&env, &ok).unwrap(),
            Some(Shape::Prim(Prim::String))
        );
    }

    #[test]
    fn application_head_must_be_named() {
        let t = Type::App {
            head: Box::new(Type::Tuple(vec![])),
            args: vec![],
            value: None,
        };
        assert_eq!(application(&t).unwrap_err(), GenError::NonConstructorHead);
    }

    #[test]
    fn transform_metadata_must_agree() {
        let env = TypeEnv::new();
        assert!(check_transform(&env, &Type::con("Char"), &int()).is_ok());
        let err = check_transform(&env, &Type::Tuple(vec![int(), int()]), &int()).unwrap_err();
        assert!(matches!(err, GenError::ShapeMismatch { .. }));
    }

    #[test]
    fn record_metadata_has_a_slot_per_field() {
        let mut env = TypeEnv::new();
        let decl = Decl::wrapper(
            "Point",
            Branch::record(
                "Point",
                vec![
                    Field::labeled("x", int()),
                    Field::anon(comma()),
                    Field::labeled("y", int()),
                    Field::anon(int()),
                ],
            ),
        );
        env.declare(&decl).unwrap();
        let shapes = decl_shapes(&env, &decl, Capabilities::DEFAULT).unwrap();

        let TypeBody::Data(reps) = &shapes.rep.body else {
            panic!("rep is not data");
        };
        assert_eq!(reps[0].fields.len(), 2);

        let imd = shapes.imd.unwrap();
        let TypeBody::Data(mds) = &imd.body else {
            panic!("imd is not data");
        };
        assert_eq!(mds[0].ctor, "Md_Point");
        assert_eq!(mds[0].fields.len(), 4);
    }

    #[test]
    fn display_is_readable() {
        let s = Shape::Tuple(vec![
            Shape::Header,
            Shape::Named("Foo_md".into(), vec![Shape::Var("a_md".into())]),
        ]);
        assert_eq!(s.to_string(), "(Header, Foo_md<a_md>)");
    }
}
