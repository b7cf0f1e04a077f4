//! Schema AST.
//!
//! The closed grammar a front end hands to the compiler. Nodes are plain data;
//! everything the compiler knows about them lives in [`shape`](crate::shape)
//! and the synthesizers.

use crate::capability::Capabilities;
use crate::ir::{Expr, Name, Pat};

/// When a list stops.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Exactly this many elements.
    Length(Expr),
    /// Up to (and consuming) an occurrence of this type.
    Until(Box<Type>),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A named type applied to type arguments.
    Con { name: Name, args: Vec<Type> },
    /// A type parameter of the enclosing declaration.
    Var(Name),
    Tuple(Vec<Type>),
    List {
        elem: Box<Type>,
        sep: Option<Box<Type>>,
        term: Option<Termination>,
    },
    /// Refinement: `pat` binds the parsed value inside `pred`.
    Constrain {
        pat: Pat,
        base: Box<Type>,
        pred: Expr,
    },
    /// `fns` is a `(forward, inverse)` pair.
    Transform {
        src: Box<Type>,
        dst: Box<Type>,
        fns: Expr,
    },
    /// Parse `elem` with input segmented by `discipline`.
    Partition { elem: Box<Type>, discipline: Expr },
    /// Computed, not parsed.
    Value { expr: Expr, ty: Box<Type> },
    /// Application of `head` to further type arguments and a value argument.
    App {
        head: Box<Type>,
        args: Vec<Type>,
        value: Option<Expr>,
    },
    /// A literal string, character, integer or regex matched in place.
    Literal(Expr),
    /// Lookahead: parse and give the input back.
    Try(Box<Type>),
}

impl Type {
    pub fn con(name: impl Into<Name>) -> Self {
        Type::Con {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn con_args(name: impl Into<Name>, args: Vec<Type>) -> Self {
        Type::Con {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<Name>) -> Self {
        Type::Var(name.into())
    }

    /// `head` applied to a value argument only.
    pub fn with_value(head: Type, value: Expr) -> Self {
        Type::App {
            head: Box::new(head),
            args: Vec::new(),
            value: Some(value),
        }
    }

    pub fn lit(e: Expr) -> Self {
        Type::Literal(e)
    }

    pub fn list(elem: Type) -> Self {
        Type::List {
            elem: Box::new(elem),
            sep: None,
            term: None,
        }
    }

    pub fn sep_by(self, sep: Type) -> Self {
        match self {
            Type::List { elem, term, .. } => Type::List {
                elem,
                sep: Some(Box::new(sep)),
                term,
            },
            other => other,
        }
    }

    pub fn terminated(self, termination: Termination) -> Self {
        match self {
            Type::List { elem, sep, .. } => Type::List {
                elem,
                sep,
                term: Some(termination),
            },
            other => other,
        }
    }

    pub fn constrain(pat: Pat, base: Type, pred: Expr) -> Self {
        Type::Constrain {
            pat,
            base: Box::new(base),
            pred,
        }
    }

    pub fn transform(src: Type, dst: Type, fns: Expr) -> Self {
        Type::Transform {
            src: Box::new(src),
            dst: Box::new(dst),
            fns,
        }
    }

    pub fn partition(elem: Type, discipline: Expr) -> Self {
        Type::Partition {
            elem: Box::new(elem),
            discipline,
        }
    }

    pub fn value(expr: Expr, ty: Type) -> Self {
        Type::Value {
            expr,
            ty: Box::new(ty),
        }
    }

    pub fn try_(inner: Type) -> Self {
        Type::Try(Box::new(inner))
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Strict,
    /// Stored behind an indirection by backends that care.
    Lazy,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: Option<Name>,
    pub strictness: Strictness,
    pub ty: Type,
    /// Checked right after this field parses.
    pub pred: Option<Expr>,
}

impl Field {
    pub fn labeled(label: impl Into<Name>, ty: Type) -> Self {
        Self {
            label: Some(label.into()),
            strictness: Strictness::Strict,
            ty,
            pred: None,
        }
    }

    pub fn anon(ty: Type) -> Self {
        Self {
            label: None,
            strictness: Strictness::Strict,
            ty,
            pred: None,
        }
    }

    pub fn with_pred(mut self, pred: Expr) -> Self {
        self.pred = Some(pred);
        self
    }
}

/// One alternative of a union or wrapper.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    Record {
        ctor: Name,
        fields: Vec<Field>,
        pred: Option<Expr>,
        retry: bool,
    },
    Constructor {
        ctor: Name,
        args: Vec<(Strictness, Type)>,
        pred: Option<Expr>,
        retry: bool,
    },
}

impl Branch {
    pub fn record(ctor: impl Into<Name>, fields: Vec<Field>) -> Self {
        Branch::Record {
            ctor: ctor.into(),
            fields,
            pred: None,
            retry: false,
        }
    }

    pub fn constructor(ctor: impl Into<Name>, args: Vec<Type>) -> Self {
        Branch::Constructor {
            ctor: ctor.into(),
            args: args.into_iter().map(|t| (Strictness::Strict, t)).collect(),
            pred: None,
            retry: false,
        }
    }

    /// Let a failed attempt at this branch fall through to the next one even
    /// after it consumed input.
    pub fn retry(mut self) -> Self {
        match &mut self {
            Branch::Record { retry, .. } | Branch::Constructor { retry, .. } => *retry = true,
        }
        self
    }

    pub fn with_pred(mut self, predicate: Expr) -> Self {
        match &mut self {
            Branch::Record { pred, .. } | Branch::Constructor { pred, .. } => {
                *pred = Some(predicate)
            }
        }
        self
    }

    pub fn ctor(&self) -> &str {
        match self {
            Branch::Record { ctor, .. } | Branch::Constructor { ctor, .. } => ctor,
        }
    }

    pub fn pred(&self) -> Option<&Expr> {
        match self {
            Branch::Record { pred, .. } | Branch::Constructor { pred, .. } => pred.as_ref(),
        }
    }

    pub fn is_retry(&self) -> bool {
        match self {
            Branch::Record { retry, .. } | Branch::Constructor { retry, .. } => *retry,
        }
    }

    /// The branch as a uniform list of slots.
    pub fn slots(&self) -> Vec<Slot<'_>> {
        match self {
            Branch::Record { fields, .. } => fields
                .iter()
                .map(|f| Slot {
                    label: f.label.as_deref(),
                    strictness: f.strictness,
                    ty: &f.ty,
                    pred: f.pred.as_ref(),
                    positional: false,
                })
                .collect(),
            Branch::Constructor { args, .. } => args
                .iter()
                .map(|(strictness, ty)| Slot {
                    label: None,
                    strictness: *strictness,
                    ty,
                    pred: None,
                    positional: true,
                })
                .collect(),
        }
    }
}

/// A record field or constructor argument.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub label: Option<&'a str>,
    pub strictness: Strictness,
    pub ty: &'a Type,
    pub pred: Option<&'a Expr>,
    /// Constructor arguments keep their representation without a label.
    pub positional: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum UnionBody {
    /// Ordered choice over the branches.
    Choice(Vec<Branch>),
    /// Dispatch on an already-known value.
    Switch {
        scrutinee: Expr,
        arms: Vec<(Pat, Branch)>,
    },
}

impl UnionBody {
    pub fn branches(&self) -> Vec<&Branch> {
        match self {
            UnionBody::Choice(bs) => bs.iter().collect(),
            UnionBody::Switch { arms, .. } => arms.iter().map(|(_, b)| b).collect(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    TypeAlias {
        name: Name,
        params: Vec<Name>,
        pat: Option<Pat>,
        ty: Type,
    },
    Union {
        name: Name,
        params: Vec<Name>,
        pat: Option<Pat>,
        body: UnionBody,
        caps: Option<Capabilities>,
    },
    Wrapper {
        name: Name,
        params: Vec<Name>,
        pat: Option<Pat>,
        branch: Branch,
        caps: Option<Capabilities>,
    },
    /// A host type obtained from `base` through a `(forward, inverse)` pair.
    Obtain {
        name: Name,
        params: Vec<Name>,
        base: Type,
        fns: Expr,
    },
}

impl Decl {
    pub fn alias(name: impl Into<Name>, ty: Type) -> Self {
        Decl::TypeAlias {
            name: name.into(),
            params: Vec::new(),
            pat: None,
            ty,
        }
    }

    pub fn union(name: impl Into<Name>, branches: Vec<Branch>) -> Self {
        Decl::Union {
            name: name.into(),
            params: Vec::new(),
            pat: None,
            body: UnionBody::Choice(branches),
            caps: None,
        }
    }

    pub fn switch(name: impl Into<Name>, pat: Pat, scrutinee: Expr, arms: Vec<(Pat, Branch)>) -> Self {
        Decl::Union {
            name: name.into(),
            params: Vec::new(),
            pat: Some(pat),
            body: UnionBody::Switch { scrutinee, arms },
            caps: None,
        }
    }

    pub fn wrapper(name: impl Into<Name>, branch: Branch) -> Self {
        Decl::Wrapper {
            name: name.into(),
            params: Vec::new(),
            pat: None,
            branch,
            caps: None,
        }
    }

    pub fn obtain(name: impl Into<Name>, base: Type, fns: Expr) -> Self {
        Decl::Obtain {
            name: name.into(),
            params: Vec::new(),
            base,
            fns,
        }
    }

    pub fn with_params(mut self, names: &[&str]) -> Self {
        let names = names.iter().map(|s| (*s).to_owned()).collect();
        match &mut self {
            Decl::TypeAlias { params, .. }
            | Decl::Union { params, .. }
            | Decl::Wrapper { params, .. }
            | Decl::Obtain { params, .. } => *params = names,
        }
        self
    }

    /// Adds a value parameter. Obtain declarations take none.
    pub fn with_pat(mut self, p: Pat) -> Self {
        match &mut self {
            Decl::TypeAlias { pat, .. } | Decl::Union { pat, .. } | Decl::Wrapper { pat, .. } => {
                *pat = Some(p)
            }
            Decl::Obtain { .. } => {}
        }
        self
    }

    pub fn with_caps(mut self, c: Capabilities) -> Self {
        match &mut self {
            Decl::Union { caps, .. } | Decl::Wrapper { caps, .. } => *caps = Some(c),
            Decl::TypeAlias { .. } | Decl::Obtain { .. } => {}
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::TypeAlias { name, .. }
            | Decl::Union { name, .. }
            | Decl::Wrapper { name, .. }
            | Decl::Obtain { name, .. } => name,
        }
    }

    pub fn params(&self) -> &[Name] {
        match self {
            Decl::TypeAlias { params, .. }
            | Decl::Union { params, .. }
            | Decl::Wrapper { params, .. }
            | Decl::Obtain { params, .. } => params,
        }
    }

    pub fn pat(&self) -> Option<&Pat> {
        match self {
            Decl::TypeAlias { pat, .. } | Decl::Union { pat, .. } | Decl::Wrapper { pat, .. } => {
                pat.as_ref()
            }
            Decl::Obtain { .. } => None,
        }
    }

    pub fn caps(&self) -> Option<Capabilities> {
        match self {
            Decl::Union { caps, .. } | Decl::Wrapper { caps, .. } => *caps,
            Decl::TypeAlias { .. } | Decl::Obtain { .. } => None,
        }
    }

    /// Branches of a union or wrapper, in declaration order.
    pub fn branches(&self) -> Vec<&Branch> {
        match self {
            Decl::Union { body, .. } => body.branches(),
            Decl::Wrapper { branch, .. } => vec![branch],
            Decl::TypeAlias { .. } | Decl::Obtain { .. } => Vec::new(),
        }
    }
}

/// A whole schema: declarations in source order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub decls: Vec<Decl>,
}

impl Schema {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { decls }
    }
}

impl FromIterator<Decl> for Schema {
    fn from_iter<I: IntoIterator<Item = Decl>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
