//! Dynamic values of the evaluator.

use std::fmt;
use std::rc::Rc;

use formkit_core::{Cursor, Header, Output, Parsed};
use regex::Regex;

use super::{EvalError, Runtime};
use crate::ir::Pat;

pub type NativeFn = dyn Fn(&Runtime, Vec<Value>) -> Result<Value, EvalError>;
pub type ParseFn = dyn Fn(&Runtime, &mut Cursor) -> Result<Value, EvalError>;

/// A runtime value.
///
/// Parser results are `Tuple([rep, md])`; optional metadata is
/// `Con("Some", [md])` or `Con("None", [])`.
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(String),
    Regex(Rc<Regex>),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Con(String, Vec<Value>),
    Header(Header),
    Output(Output),
    Func(Func),
    Parser(Parser),
}

#[derive(Clone)]
pub enum Func {
    Closure(Rc<Closure>),
    Native {
        name: String,
        arity: usize,
        f: Rc<NativeFn>,
    },
}

impl Func {
    pub fn native(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(&Runtime, Vec<Value>) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Func::Native {
            name: name.into(),
            arity,
            f: Rc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Func::Closure(c) => c.name.as_deref().unwrap_or("<lambda>"),
            Func::Native { name, .. } => name,
        }
    }
}

/// A lambda or a generated top-level function with its environment.
pub struct Closure {
    /// Set for top-level functions, which count toward the call depth.
    pub(super) name: Option<String>,
    pub(super) params: Vec<Pat>,
    pub(super) body: Rc<super::Node>,
    pub(super) env: Env,
}

/// A parser that has not run yet.
#[derive(Clone)]
pub struct Parser(pub Rc<ParseFn>);

impl Parser {
    pub fn new(f: impl Fn(&Runtime, &mut Cursor) -> Result<Value, EvalError> + 'static) -> Self {
        Parser(Rc::new(f))
    }

    #[inline]
    pub fn run(&self, rt: &Runtime, cursor: &mut Cursor) -> Result<Value, EvalError> {
        (self.0)(rt, cursor)
    }
}

/// Persistent local environment: a linked list of frames.
#[derive(Clone, Default)]
pub struct Env(Option<Rc<Frame>>);

struct Frame {
    name: String,
    value: Value,
    next: Env,
}

impl Env {
    pub fn bind(&self, name: &str, value: Value) -> Env {
        Env(Some(Rc::new(Frame {
            name: name.to_owned(),
            value,
            next: self.clone(),
        })))
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut frame = self.0.as_deref();
        while let Some(f) = frame {
            if f.name == name {
                return Some(&f.value);
            }
            frame = f.next.0.as_deref();
        }
        None
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn con(ctor: impl Into<String>, args: Vec<Value>) -> Self {
        Value::Con(ctor.into(), args)
    }

    pub fn pair(rep: Value, md: Value) -> Self {
        Value::Tuple(vec![rep, md])
    }

    pub fn some(v: Value) -> Self {
        Value::con("Some", vec![v])
    }

    pub fn none() -> Self {
        Value::con("None", Vec::new())
    }

    /// Reads an optional value.
    pub fn as_option(&self) -> Option<&Value> {
        match self {
            Value::Con(c, args) if c == "Some" && args.len() == 1 => args.first(),
            _ => None,
        }
    }

    /// Splits a parser result into representation and metadata.
    pub fn into_pair(self) -> Result<(Value, Value), EvalError> {
        match self {
            Value::Tuple(mut xs) if xs.len() == 2 => {
                let md = xs.pop().unwrap_or(Value::Unit);
                let rep = xs.pop().unwrap_or(Value::Unit);
                Ok((rep, md))
            }
            other => Err(other.mismatch("(rep, md) pair")),
        }
    }

    pub fn mismatch(&self, expected: &'static str) -> EvalError {
        EvalError::TypeMismatch {
            expected,
            found: self.to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(other.mismatch("int")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_char(&self) -> Result<char, EvalError> {
        match self {
            Value::Char(c) => Ok(*c),
            other => Err(other.mismatch("char")),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], EvalError> {
        match self {
            Value::List(xs) => Ok(xs),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_parser(&self) -> Result<&Parser, EvalError> {
        match self {
            Value::Parser(p) => Ok(p),
            other => Err(other.mismatch("parser")),
        }
    }

    pub fn into_output(self) -> Result<Output, EvalError> {
        match self {
            Value::Output(o) => Ok(o),
            other => Err(other.mismatch("output")),
        }
    }

    /// A count or width; negative values clamp to zero.
    pub fn as_usize(&self) -> Result<usize, EvalError> {
        Ok(usize::try_from(self.as_int()?).unwrap_or(0))
    }

    /// The header of a metadata value: the value itself or its first part.
    pub fn md_header(&self) -> Header {
        match self {
            Value::Header(h) => h.clone(),
            Value::Tuple(xs) => xs.first().map(Value::md_header).unwrap_or_default(),
            _ => Header::default(),
        }
    }

    fn set_md_header(&mut self, header: Header) {
        if let Value::Tuple(xs) = self {
            if let Some(first) = xs.first_mut() {
                first.set_md_header(header);
                return;
            }
        }
        *self = Value::Header(header);
    }
}

impl Parsed for Value {
    fn header(&self) -> Header {
        match self {
            Value::Tuple(xs) if xs.len() == 2 => xs[1].md_header(),
            _ => Header::default(),
        }
    }

    fn set_header(&mut self, header: Header) {
        if let Value::Tuple(xs) = self {
            if let Some(md) = xs.get_mut(1) {
                md.set_md_header(header);
            }
        }
    }
}

/// Structural equality. Functions and parsers are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a == b,
            (Value::Con(c, a), Value::Con(d, b)) => c == d && a == b,
            (Value::Header(a), Value::Header(b)) => a == b,
            (Value::Output(a), Value::Output(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Unit
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq(f: &mut fmt::Formatter<'_>, open: &str, xs: &[Value], close: &str) -> fmt::Result {
            f.write_str(open)?;
            for (i, x) in xs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{x}")?;
            }
            f.write_str(close)
        }
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Regex(re) => write!(f, "/{}/", re.as_str()),
            Value::Tuple(xs) => seq(f, "(", xs, ")"),
            Value::List(xs) => seq(f, "[", xs, "]"),
            Value::Con(c, xs) if xs.is_empty() => f.write_str(c),
            Value::Con(c, xs) => {
                f.write_str(c)?;
                seq(f, "(", xs, ")")
            }
            Value::Header(h) => write!(f, "<{h}>"),
            Value::Output(o) => write!(f, "<output {:?}>", o.to_string()),
            Value::Func(func) => write!(f, "<fn {}>", func.name()),
            Value::Parser(_) => f.write_str("<parser>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use formkit_core::{ErrMsg, Span};

    use super::*;

    #[test]
    fn display_is_structural() {
        let v = Value::con(
            "Point",
            vec![Value::Int(3), Value::List(vec![Value::Char('a'), Value::str("b")])],
        );
        assert_eq!(v.to_string(), "Point(3, ['a', \"b\"])");
        assert_eq!(Value::none().to_string(), "None");
    }

    #[test]
    fn parsed_reaches_nested_headers() {
        let md = Value::pair(
            Value::Header(Header::clean(Some(Span::new(0, 3)))),
            Value::con("Md_P", vec![]),
        );
        let mut result = Value::pair(Value::Unit, md);
        assert!(result.is_ok());
        result.set_header(Header::error(ErrMsg::ExpectedInt, None));
        assert!(!result.is_ok());
        let (_, md) = result.into_pair().unwrap();
        assert!(matches!(md, Value::Tuple(ref xs) if matches!(xs[1], Value::Con(..))));
    }

    #[test]
    fn environments_shadow() {
        let env = Env::default().bind("x", Value::Int(1)).bind("x", Value::Int(2));
        assert_eq!(env.lookup("x"), Some(&Value::Int(2)));
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn functions_are_never_equal() {
        let f = Value::Func(Func::native("id", 1, |_, mut args| Ok(args.remove(0))));
        assert_ne!(f, f.clone());
    }
}
