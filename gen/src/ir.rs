//! Target expression IR.
//!
//! Generated parsers, printers and defaults are [`FnDef`]s over this closed
//! expression language. Schema-level expressions (predicates, transform
//! pairs, list lengths, disciplines, value arguments) use the same IR.
//!
//! Tuples of one element are the element itself and the empty tuple is unit;
//! [`Expr::tuple`] and [`Pat::tuple`] normalize accordingly.

pub type Name = String;

/// Prefix of runtime primitive names. `:` never occurs in schema
/// identifiers, so generated bindings cannot capture a primitive.
pub const PRIM_PREFIX: &str = "rt::";

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Unit,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(String),
    Regex(String),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    Wild,
    Var(Name),
    Lit(Literal),
    Tuple(Vec<Pat>),
    Con(Name, Vec<Pat>),
}

impl Pat {
    pub fn var(name: impl Into<Name>) -> Self {
        Pat::Var(name.into())
    }

    pub fn tuple(mut pats: Vec<Pat>) -> Self {
        match pats.len() {
            0 => Pat::Lit(Literal::Unit),
            1 => pats.remove(0),
            _ => Pat::Tuple(pats),
        }
    }

    pub fn con(ctor: impl Into<Name>, args: Vec<Pat>) -> Self {
        Pat::Con(ctor.into(), args)
    }

    /// Names bound by this pattern, left to right.
    pub fn binders(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_binders(&mut out);
        out
    }

    fn collect_binders<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pat::Var(v) => out.push(v),
            Pat::Tuple(ps) | Pat::Con(_, ps) => {
                for p in ps {
                    p.collect_binders(out);
                }
            }
            Pat::Wild | Pat::Lit(_) => {}
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(Name),
    Lit(Literal),
    /// Exact-arity application.
    App(Box<Expr>, Vec<Expr>),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Con(Name, Vec<Expr>),
    Case(Box<Expr>, Vec<(Pat, Expr)>),
    Lam(Vec<Pat>, Box<Expr>),
    /// Non-recursive binding.
    Let(Pat, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<Name>) -> Self {
        Expr::Var(name.into())
    }

    /// Reference to a runtime primitive.
    pub fn prim(name: &str) -> Self {
        Expr::Var(format!("{PRIM_PREFIX}{name}"))
    }

    pub fn app(f: Expr, args: Vec<Expr>) -> Self {
        Expr::App(Box::new(f), args)
    }

    /// Applies a named function.
    pub fn call(name: impl Into<Name>, args: Vec<Expr>) -> Self {
        Expr::app(Expr::var(name), args)
    }

    /// Applies a runtime primitive.
    pub fn prim_call(name: &str, args: Vec<Expr>) -> Self {
        Expr::app(Expr::prim(name), args)
    }

    pub fn lam(params: Vec<Pat>, body: Expr) -> Self {
        Expr::Lam(params, Box::new(body))
    }

    pub fn let_in(pat: Pat, rhs: Expr, body: Expr) -> Self {
        Expr::Let(pat, Box::new(rhs), Box::new(body))
    }

    pub fn case(scrutinee: Expr, arms: Vec<(Pat, Expr)>) -> Self {
        Expr::Case(Box::new(scrutinee), arms)
    }

    pub fn tuple(mut elems: Vec<Expr>) -> Self {
        match elems.len() {
            0 => Expr::unit(),
            1 => elems.remove(0),
            _ => Expr::Tuple(elems),
        }
    }

    pub fn con(ctor: impl Into<Name>, args: Vec<Expr>) -> Self {
        Expr::Con(ctor.into(), args)
    }

    #[inline]
    pub fn unit() -> Self {
        Expr::Lit(Literal::Unit)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Lit(Literal::Bool(b))
    }

    pub fn int(n: i64) -> Self {
        Expr::Lit(Literal::Int(n))
    }

    pub fn char(c: char) -> Self {
        Expr::Lit(Literal::Char(c))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Lit(Literal::Str(s.into()))
    }

    pub fn regex(re: impl Into<String>) -> Self {
        Expr::Lit(Literal::Regex(re.into()))
    }

    pub fn some(e: Expr) -> Self {
        Expr::con("Some", vec![e])
    }

    pub fn none() -> Self {
        Expr::con("None", Vec::new())
    }

    /// Splits a forward/inverse pair, if this is one.
    pub fn as_pair(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Tuple(es) if es.len() == 2 => Some((&es[0], &es[1])),
            _ => None,
        }
    }
}

/// One generated top-level function.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub name: Name,
    pub params: Vec<Pat>,
    pub body: Expr,
}

impl FnDef {
    pub fn new(name: impl Into<Name>, params: Vec<Pat>, body: Expr) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
