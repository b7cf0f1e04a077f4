//! IR evaluator backend.
//!
//! Executes a compiled [`Module`] against `formkit-core` with dynamic
//! [`Value`]s. Every generated function becomes a global closure; runtime
//! primitives, base type artifacts and the builtin functions available to
//! schema expressions are registered beside them (see [`prims`]).
//!
//! Parsers are values: a call such as `point_parseM()` returns a [`Parser`]
//! that runs later against a cursor. Entering a named parser goes through
//! `rt::nested`, so recursion depth is bounded by
//! [`ParseConfig::max_recursion_depth`]; calls to generated functions
//! outside a parse (printing, defaults) are bounded by the same limit.

mod prims;
mod value;

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use formkit_core::{ParseConfig, RecursionGuard};
use regex::Regex;
use thiserror::Error;

use crate::emit::Module;
use crate::ir::{Expr, FnDef, Literal, Pat};
use crate::naming;

pub use value::{Closure, Env, Func, NativeFn, ParseFn, Parser, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unbound variable `{0}`")]
    Unbound(String),

    #[error("`{name}` expects {expected} argument(s), found {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("no pattern matches {0}")]
    NoMatch(String),

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid regex: {0}")]
    BadRegex(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown declaration `{0}`")]
    UnknownDecl(String),

    #[error(transparent)]
    Runtime(#[from] formkit_core::Error),
}

/// IR lowered for evaluation: literals are converted up front and lambda
/// bodies are shared.
pub(crate) enum Node {
    Var(String),
    Lit(Value),
    App(Box<Node>, Vec<Node>),
    Tuple(Vec<Node>),
    List(Vec<Node>),
    Con(String, Vec<Node>),
    Case(Box<Node>, Vec<(Pat, Node)>),
    Lam(Vec<Pat>, Rc<Node>),
    Let(Pat, Box<Node>, Box<Node>),
}

fn literal(lit: &Literal) -> Result<Value, EvalError> {
    Ok(match lit {
        Literal::Unit => Value::Unit,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Char(c) => Value::Char(*c),
        Literal::Str(s) => Value::str(s.as_str()),
        Literal::Regex(re) => Value::Regex(Rc::new(
            Regex::new(re).map_err(|e| EvalError::BadRegex(e.to_string()))?,
        )),
    })
}

fn lower(expr: &Expr) -> Result<Node, EvalError> {
    let all = |es: &[Expr]| es.iter().map(lower).collect::<Result<Vec<_>, _>>();
    Ok(match expr {
        Expr::Var(v) => Node::Var(v.clone()),
        Expr::Lit(l) => Node::Lit(literal(l)?),
        Expr::App(f, args) => Node::App(Box::new(lower(f)?), all(args)?),
        Expr::Tuple(es) => Node::Tuple(all(es)?),
        Expr::List(es) => Node::List(all(es)?),
        Expr::Con(c, es) => Node::Con(c.clone(), all(es)?),
        Expr::Case(s, arms) => Node::Case(
            Box::new(lower(s)?),
            arms.iter()
                .map(|(p, e)| Ok((p.clone(), lower(e)?)))
                .collect::<Result<_, EvalError>>()?,
        ),
        Expr::Lam(params, body) => Node::Lam(params.clone(), Rc::new(lower(body)?)),
        Expr::Let(p, rhs, body) => {
            Node::Let(p.clone(), Box::new(lower(rhs)?), Box::new(lower(body)?))
        }
    })
}

fn literal_matches(lit: &Literal, value: &Value) -> bool {
    match (lit, value) {
        (Literal::Unit, Value::Unit) => true,
        (Literal::Bool(a), Value::Bool(b)) => a == b,
        (Literal::Int(a), Value::Int(b)) => a == b,
        (Literal::Char(a), Value::Char(b)) => a == b,
        (Literal::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

/// Binds `pat` against `value`, or `None` when it does not match.
fn bind_pat(pat: &Pat, value: &Value, env: Env) -> Option<Env> {
    match (pat, value) {
        (Pat::Wild, _) => Some(env),
        (Pat::Var(x), v) => Some(env.bind(x, v.clone())),
        (Pat::Lit(l), v) => literal_matches(l, v).then_some(env),
        (Pat::Tuple(ps), Value::Tuple(vs)) if ps.len() == vs.len() => {
            ps.iter().zip(vs).try_fold(env, |env, (p, v)| bind_pat(p, v, env))
        }
        (Pat::Con(c, ps), Value::Con(d, vs)) if c == d && ps.len() == vs.len() => {
            ps.iter().zip(vs).try_fold(env, |env, (p, v)| bind_pat(p, v, env))
        }
        _ => None,
    }
}

/// Globals plus the limits every evaluation shares.
pub struct Runtime {
    globals: HashMap<String, Value>,
    config: ParseConfig,
    depth: Cell<RecursionGuard>,
}

impl Runtime {
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    fn eval(&self, node: &Node, env: &Env) -> Result<Value, EvalError> {
        let all = |ns: &[Node]| {
            ns.iter()
                .map(|n| self.eval(n, env))
                .collect::<Result<Vec<_>, _>>()
        };
        match node {
            Node::Var(v) => env
                .lookup(v)
                .or_else(|| self.globals.get(v))
                .cloned()
                .ok_or_else(|| EvalError::Unbound(v.clone())),
            Node::Lit(v) => Ok(v.clone()),
            Node::App(f, args) => {
                let f = self.eval(f, env)?;
                let args = all(args)?;
                self.apply(&f, args)
            }
            Node::Tuple(ns) => Ok(Value::Tuple(all(ns)?)),
            Node::List(ns) => Ok(Value::List(all(ns)?)),
            Node::Con(c, ns) => Ok(Value::Con(c.clone(), all(ns)?)),
            Node::Case(scrutinee, arms) => {
                let value = self.eval(scrutinee, env)?;
                for (pat, arm) in arms {
                    if let Some(env) = bind_pat(pat, &value, env.clone()) {
                        return self.eval(arm, &env);
                    }
                }
                Err(EvalError::NoMatch(value.to_string()))
            }
            Node::Lam(params, body) => Ok(Value::Func(Func::Closure(Rc::new(Closure {
                name: None,
                params: params.clone(),
                body: Rc::clone(body),
                env: env.clone(),
            })))),
            Node::Let(pat, rhs, body) => {
                let value = self.eval(rhs, env)?;
                let env = bind_pat(pat, &value, env.clone())
                    .ok_or_else(|| EvalError::NoMatch(value.to_string()))?;
                self.eval(body, &env)
            }
        }
    }

    /// Applies a function value to exactly its number of parameters.
    pub fn apply(&self, f: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        let Value::Func(func) = f else {
            return Err(f.mismatch("function"));
        };
        match func {
            Func::Native { name, arity, f } => {
                check_arity(name, *arity, args.len())?;
                f(self, args)
            }
            Func::Closure(c) => {
                check_arity(func.name(), c.params.len(), args.len())?;
                let mut env = c.env.clone();
                for (pat, arg) in c.params.iter().zip(&args) {
                    env = bind_pat(pat, arg, env)
                        .ok_or_else(|| EvalError::NoMatch(arg.to_string()))?;
                }
                if c.name.is_none() {
                    return self.eval(&c.body, &env);
                }
                self.enter()?;
                let result = self.eval(&c.body, &env);
                self.exit();
                result
            }
        }
    }

    fn enter(&self) -> Result<(), EvalError> {
        let mut guard = self.depth.get();
        let entered = guard.enter(self.config.max_recursion_depth);
        if entered.is_err() {
            guard.exit();
        }
        self.depth.set(guard);
        entered.map_err(EvalError::from)
    }

    fn exit(&self) {
        let mut guard = self.depth.get();
        guard.exit();
        self.depth.set(guard);
    }
}

fn check_arity(name: &str, expected: usize, found: usize) -> Result<(), EvalError> {
    if expected == found {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name: name.to_owned(),
            expected,
            found,
        })
    }
}

/// Runs the functions of a compiled module.
pub struct Interp {
    rt: Runtime,
}

impl Interp {
    pub fn new(module: &Module) -> Result<Self, EvalError> {
        Self::with_config(module, ParseConfig::DEFAULT)
    }

    pub fn with_config(module: &Module, config: ParseConfig) -> Result<Self, EvalError> {
        let mut globals = HashMap::new();
        prims::install(&mut globals);
        for def in module.fns() {
            globals.insert(def.name.clone(), closure(def)?);
        }
        Ok(Self {
            rt: Runtime {
                globals,
                config,
                depth: Cell::new(RecursionGuard::new()),
            },
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    /// A global by name: a generated function, a base artifact or a builtin.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.rt.global(name)
    }

    /// Calls a global function.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let f = self
            .rt
            .global(name)
            .ok_or_else(|| EvalError::Unbound(name.to_owned()))?;
        self.rt.apply(f, args)
    }

    fn call_decl(&self, name: String, decl: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let f = self
            .rt
            .global(&name)
            .ok_or_else(|| EvalError::UnknownDecl(decl.to_owned()))?;
        self.rt.apply(f, args)
    }

    /// The parser of `decl` applied to its type and value arguments.
    pub fn parser(&self, decl: &str, args: &[Value]) -> Result<Parser, EvalError> {
        let p = self.call_decl(naming::parser(decl), decl, args.to_vec())?;
        Ok(p.as_parser()?.clone())
    }

    /// Parses a whole input as `decl`, returning `(rep, md)`.
    ///
    /// `args` are the parsers of the declaration's type arguments followed
    /// by its value argument, if any.
    pub fn parse_str(&self, decl: &str, args: &[Value], input: &str) -> Result<(Value, Value), EvalError> {
        let mut args = args.to_vec();
        args.push(Value::str(input));
        self.call_decl(naming::parse_str(decl), decl, args)?
            .into_pair()
    }

    /// Prints `rep` as `decl`.
    ///
    /// `args` are the printer functions of the type arguments, then their
    /// defaults, then the value argument, if any.
    pub fn print(&self, decl: &str, args: &[Value], rep: &Value, md: Option<&Value>) -> Result<String, EvalError> {
        let mut args = args.to_vec();
        args.push(rep.clone());
        args.push(md.cloned().map_or_else(Value::none, Value::some));
        let out = self.call_decl(naming::printer(decl), decl, args)?;
        Ok(out.into_output()?.into_string())
    }

    /// The default representation of `decl`.
    pub fn default(&self, decl: &str, args: &[Value]) -> Result<Value, EvalError> {
        self.call_decl(naming::default(decl), decl, args.to_vec())
    }
}

fn closure(def: &FnDef) -> Result<Value, EvalError> {
    Ok(Value::Func(Func::Closure(Rc::new(Closure {
        name: Some(def.name.clone()),
        params: def.params.clone(),
        body: Rc::new(lower(&def.body)?),
        env: Env::default(),
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Branch, Decl, Field, Schema, Type};
    use crate::config::GenConfig;
    use crate::emit::compile;

    fn module(decls: Vec<Decl>) -> Module {
        compile(&Schema::new(decls), &GenConfig::DEFAULT)
            .into_result()
            .unwrap()
    }

    #[test]
    fn closures_capture_their_environment() {
        let interp = Interp::new(&Module::default()).unwrap();
        let rt = interp.runtime();
        let adder = lower(&Expr::let_in(
            Pat::var("n"),
            Expr::int(2),
            Expr::lam(
                vec![Pat::var("x")],
                Expr::call("add", vec![Expr::var("x"), Expr::var("n")]),
            ),
        ))
        .unwrap();
        let f = rt.eval(&adder, &Env::default()).unwrap();
        assert_eq!(rt.apply(&f, vec![Value::Int(40)]).unwrap(), Value::Int(42));
    }

    #[test]
    fn case_falls_through_to_later_arms() {
        let interp = Interp::new(&Module::default()).unwrap();
        let e = Expr::case(
            Expr::Tuple(vec![Expr::int(1), Expr::char('x')]),
            vec![
                (Pat::Tuple(vec![Pat::Lit(Literal::Int(2)), Pat::Wild]), Expr::int(0)),
                (Pat::Tuple(vec![Pat::Wild, Pat::var("c")]), Expr::var("c")),
            ],
        );
        let v = interp.rt.eval(&lower(&e).unwrap(), &Env::default()).unwrap();
        assert_eq!(v, Value::Char('x'));
    }

    #[test]
    fn unmatched_case_is_an_error() {
        let interp = Interp::new(&Module::default()).unwrap();
        let e = Expr::case(Expr::int(1), vec![(Pat::Lit(Literal::Int(2)), Expr::unit())]);
        assert_eq!(
            interp.rt.eval(&lower(&e).unwrap(), &Env::default()),
            Err(EvalError::NoMatch("1".into()))
        );
    }

    #[test]
    fn bad_regex_is_reported_when_loading() {
        let d = Decl::alias("Word", Type::lit(Expr::regex("(")));
        assert!(matches!(
            Interp::new(&module(vec![d])),
            Err(EvalError::BadRegex(_))
        ));
    }

    #[test]
    fn arity_is_exact() {
        let interp = Interp::new(&Module::default()).unwrap();
        assert!(matches!(
            interp.call("add", vec![Value::Int(1)]),
            Err(EvalError::Arity { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn unknown_declarations() {
        let interp = Interp::new(&Module::default()).unwrap();
        assert_eq!(
            interp.default("Nope", &[]),
            Err(EvalError::UnknownDecl("Nope".into()))
        );
    }

    #[test]
    fn runaway_defaults_hit_the_depth_limit() {
        let d = Decl::wrapper(
            "Loop",
            Branch::record("Loop", vec![Field::labeled("next", Type::con("Loop"))]),
        );
        let config = ParseConfig::new().with_max_recursion_depth(16);
        let interp = Interp::with_config(&module(vec![d]), config).unwrap();
        assert!(matches!(
            interp.default("Loop", &[]),
            Err(EvalError::Runtime(formkit_core::Error::RecursionLimitExceeded { limit: 16, .. }))
        ));
    }
}
