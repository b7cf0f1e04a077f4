//! Runtime primitives, base type artifacts and builtins.
//!
//! Primitives are the `rt::` functions generated code calls; each one that
//! builds a parser returns a [`Parser`] value wrapping the matching
//! `formkit-core` combinator. Base types get the same four artifacts a
//! declaration gets. Builtins are the plain functions schema expressions
//! may use in predicates, transforms and value arguments.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use formkit_core::base;
use formkit_core::list;
use formkit_core::{
    Alt, Cursor, Discipline, ErrMsg, Header, Output, Regex, at_failure, at_value, choice,
    lookahead, nested, parse_all, print_list,
};

use super::{EvalError, Func, Parser, Runtime, Value};
use crate::env::BaseType;
use crate::ir::PRIM_PREFIX;
use crate::naming;

type Globals = HashMap<String, Value>;

pub(super) fn install(globals: &mut Globals) {
    parsing(globals);
    metadata(globals);
    printing(globals);
    for b in BaseType::ALL {
        base_artifacts(globals, b);
    }
    builtins(globals);
}

fn insert(
    globals: &mut Globals,
    name: String,
    arity: usize,
    f: impl Fn(&Runtime, Vec<Value>) -> Result<Value, EvalError> + 'static,
) {
    globals.insert(name.clone(), Value::Func(Func::native(name, arity, f)));
}

/// Registers a function of fixed arity `N`.
fn native<const N: usize>(
    globals: &mut Globals,
    name: String,
    f: impl Fn(&Runtime, [Value; N]) -> Result<Value, EvalError> + 'static,
) {
    let label = name.clone();
    insert(globals, name, N, move |rt, args| {
        let found = args.len();
        let args: [Value; N] = args.try_into().map_err(|_| EvalError::Arity {
            name: label.clone(),
            expected: N,
            found,
        })?;
        f(rt, args)
    });
}

fn prim(name: &str) -> String {
    format!("{PRIM_PREFIX}{name}")
}

fn parser(f: impl Fn(&Runtime, &mut Cursor) -> Result<Value, EvalError> + 'static) -> Value {
    Value::Parser(Parser::new(f))
}

fn leaf<T: Into<Value>>((rep, header): (T, Header)) -> Value {
    Value::pair(rep.into(), Value::Header(header))
}

/// Splits a finished list into `(reps, (header, mds))`.
fn seq_value(seq: list::Seq<Value>) -> Result<Value, EvalError> {
    let mut reps = Vec::with_capacity(seq.len());
    let mut mds = Vec::with_capacity(seq.len());
    for item in seq.items {
        let (rep, md) = item.into_pair()?;
        reps.push(rep);
        mds.push(md);
    }
    Ok(Value::pair(
        Value::List(reps),
        Value::pair(Value::Header(seq.header), Value::List(mds)),
    ))
}

fn discipline(value: &Value) -> Result<Discipline, EvalError> {
    if let Value::Con(ctor, args) = value {
        match (ctor.as_str(), args.as_slice()) {
            ("Whole", []) => return Ok(Discipline::Whole),
            ("Newline", []) => return Ok(Discipline::Newline),
            ("CrLf", []) => return Ok(Discipline::CrLf),
            ("FixedWidth", [n]) => return Ok(Discipline::FixedWidth(n.as_usize()?)),
            _ => {}
        }
    }
    Err(value.mismatch("record discipline"))
}

enum Matcher {
    Text(String),
    Pattern(Rc<Regex>),
}

fn parsing(g: &mut Globals) {
    native::<1>(g, prim("pure"), |_, [x]| Ok(parser(move |_, _| Ok(x.clone()))));

    native::<2>(g, prim("bind"), |_, [p, k]| {
        let p = p.as_parser()?.clone();
        Ok(parser(move |rt, cursor| {
            let result = p.run(rt, cursor)?;
            let next = rt.apply(&k, vec![result])?;
            next.as_parser()?.run(rt, cursor)
        }))
    });

    native::<2>(g, prim("discard_bind"), |_, [p, k]| {
        let p = p.as_parser()?.clone();
        Ok(parser(move |rt, cursor| {
            let (_, md) = p.run(rt, cursor)?.into_pair()?;
            let next = rt.apply(&k, vec![md])?;
            next.as_parser()?.run(rt, cursor)
        }))
    });

    native::<1>(g, prim("choice"), |_, [alts]| {
        let alts = alts
            .as_list()?
            .iter()
            .map(|alt| match alt {
                Value::Tuple(xs) if xs.len() == 2 => Ok((xs[0].as_bool()?, xs[1].as_parser()?.clone())),
                other => Err(other.mismatch("(retry, parser) alternative")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parser(move |rt, cursor| {
            let branches = alts
                .iter()
                .map(|(retry, p)| Alt::new(*retry, move |c: &mut Cursor| p.run(rt, c)))
                .collect();
            match choice(cursor, branches)? {
                Some(result) => Ok(result),
                None => {
                    let msg = ErrMsg::NoMatchingCase("an empty choice".to_owned());
                    Ok(Value::pair(Value::Unit, Value::Header(at_failure(cursor, msg))))
                }
            }
        }))
    });

    native::<1>(g, prim("list_plain"), |_, [elem]| {
        let elem = elem.as_parser()?.clone();
        Ok(parser(move |rt, cursor| {
            seq_value(list::many(cursor, |c| elem.run(rt, c))?)
        }))
    });

    native::<2>(g, prim("list_sep"), |_, [elem, sep]| {
        let (elem, sep) = (elem.as_parser()?.clone(), sep.as_parser()?.clone());
        Ok(parser(move |rt, cursor| {
            seq_value(list::many_sep(cursor, |c| elem.run(rt, c), |c| sep.run(rt, c))?)
        }))
    });

    native::<2>(g, prim("list_len"), |_, [elem, n]| {
        let (elem, n) = (elem.as_parser()?.clone(), n.as_usize()?);
        Ok(parser(move |rt, cursor| {
            rt.config().check_list_len(n)?;
            seq_value(list::exactly(cursor, n, |c| elem.run(rt, c))?)
        }))
    });

    native::<3>(g, prim("list_sep_len"), |_, [elem, sep, n]| {
        let (elem, sep) = (elem.as_parser()?.clone(), sep.as_parser()?.clone());
        let n = n.as_usize()?;
        Ok(parser(move |rt, cursor| {
            rt.config().check_list_len(n)?;
            seq_value(list::exactly_sep(cursor, n, |c| elem.run(rt, c), |c| sep.run(rt, c))?)
        }))
    });

    native::<2>(g, prim("list_term"), |_, [elem, term]| {
        let (elem, term) = (elem.as_parser()?.clone(), term.as_parser()?.clone());
        Ok(parser(move |rt, cursor| {
            seq_value(list::until(cursor, |c| elem.run(rt, c), |c| term.run(rt, c))?)
        }))
    });

    native::<3>(g, prim("list_sep_term"), |_, [elem, sep, term]| {
        let elem = elem.as_parser()?.clone();
        let (sep, term) = (sep.as_parser()?.clone(), term.as_parser()?.clone());
        Ok(parser(move |rt, cursor| {
            seq_value(list::until_sep(
                cursor,
                |c| elem.run(rt, c),
                |c| sep.run(rt, c),
                |c| term.run(rt, c),
            )?)
        }))
    });

    native::<1>(g, prim("lit_parse"), |_, [lit]| {
        let matcher = match lit {
            Value::Char(c) => Matcher::Text(c.to_string()),
            Value::Str(s) => Matcher::Text(s),
            Value::Int(n) => Matcher::Text(n.to_string()),
            Value::Regex(re) => Matcher::Pattern(re),
            Value::Unit => Matcher::Text(String::new()),
            other => return Err(other.mismatch("literal")),
        };
        Ok(parser(move |_, cursor| {
            let header = match &matcher {
                Matcher::Text(text) => cursor.literal(text),
                Matcher::Pattern(re) => cursor.regex(re).1,
            };
            Ok(Value::pair(Value::Unit, Value::Header(header)))
        }))
    });

    native::<3>(g, prim("constrain"), |_, [p, holds, desc]| {
        let p = p.as_parser()?.clone();
        let desc = desc.as_str()?.to_owned();
        Ok(parser(move |rt, cursor| {
            let (rep, md) = p.run(rt, cursor)?.into_pair()?;
            let ok = rt.apply(&holds, vec![rep.clone(), md.clone()])?.as_bool()?;
            Ok(formkit_core::check(Value::pair(rep, md), ok, &desc))
        }))
    });

    native::<2>(g, prim("transform"), |_, [p, fwd]| {
        let p = p.as_parser()?.clone();
        Ok(parser(move |rt, cursor| {
            let (rep, md) = p.run(rt, cursor)?.into_pair()?;
            Ok(Value::pair(rt.apply(&fwd, vec![rep])?, md))
        }))
    });

    native::<2>(g, prim("partition"), |_, [p, d]| {
        let (p, d) = (p.as_parser()?.clone(), discipline(&d)?);
        Ok(parser(move |rt, cursor| {
            formkit_core::partition(cursor, d, |c| p.run(rt, c))
        }))
    });

    native::<1>(g, prim("try_parse"), |_, [p]| {
        let p = p.as_parser()?.clone();
        Ok(parser(move |rt, cursor| lookahead(cursor, |c| p.run(rt, c))))
    });

    native::<1>(g, prim("at_value"), |_, [x]| {
        Ok(parser(move |_, cursor| {
            Ok(Value::pair(x.clone(), Value::Header(at_value(cursor))))
        }))
    });

    native::<2>(g, prim("at_failure"), |_, [x, desc]| {
        let desc = desc.as_str()?.to_owned();
        Ok(parser(move |_, cursor| {
            let header = at_failure(cursor, ErrMsg::NoMatchingCase(desc.clone()));
            Ok(Value::pair(x.clone(), Value::Header(header)))
        }))
    });

    native::<1>(g, prim("nested"), |_, [thunk]| {
        Ok(parser(move |rt, cursor| {
            nested(cursor, |c| {
                tracing::trace!(depth = c.depth(), "entering named parser");
                let p = rt.apply(&thunk, Vec::new())?;
                p.as_parser()?.run(rt, c)
            })
        }))
    });

    native::<2>(g, prim("parse_string"), |rt, [p, input]| {
        let p = p.as_parser()?;
        parse_all(input.as_str()?, *rt.config(), |c| p.run(rt, c))
    });
}

fn metadata(g: &mut Globals) {
    native::<1>(g, prim("merge"), |_, [headers]| {
        let headers: Vec<Header> = headers.as_list()?.iter().map(Value::md_header).collect();
        Ok(Value::Header(Header::merge(&headers)))
    });

    native::<1>(g, prim("header"), |_, [md]| Ok(Value::Header(md.md_header())));

    native::<3>(g, prim("check"), |_, [pair, holds, desc]| {
        Ok(formkit_core::check(pair, holds.as_bool()?, desc.as_str()?))
    });

    native::<2>(g, prim("md_parts"), |_, [md, n]| {
        let n = n.as_usize()?;
        Ok(md_parts(&md, n))
    });
}

/// Splits optional metadata `Some((header, inner))` into `n` optional
/// parts. Anything else yields `n` absent parts.
fn md_parts(md: &Value, n: usize) -> Value {
    let inner = match md.as_option() {
        Some(Value::Tuple(xs)) if xs.len() == 2 => Some(&xs[1]),
        _ => None,
    };
    let parts: Vec<Value> = match inner {
        Some(Value::Con(_, args)) if args.len() == n => args.iter().cloned().map(Value::some).collect(),
        Some(inner) if n == 1 => vec![Value::some(inner.clone())],
        Some(Value::Tuple(xs)) if xs.len() == n => xs.iter().cloned().map(Value::some).collect(),
        _ => (0..n).map(|_| Value::none()).collect(),
    };
    match n {
        0 => Value::Unit,
        1 => parts.into_iter().next().unwrap_or_else(Value::none),
        _ => Value::Tuple(parts),
    }
}

fn printing(g: &mut Globals) {
    native::<0>(g, prim("nil"), |_, []| Ok(Value::Output(Output::nil())));

    native::<1>(g, prim("cat"), |_, [outputs]| {
        let Value::List(outputs) = outputs else {
            return Err(outputs.mismatch("list of outputs"));
        };
        let out = outputs
            .into_iter()
            .map(Value::into_output)
            .collect::<Result<Output, _>>()?;
        Ok(Value::Output(out))
    });

    native::<1>(g, prim("print_lit"), |_, [lit]| {
        let out = match lit {
            Value::Char(c) => base::print_char(c),
            Value::Str(s) => Output::text(s),
            Value::Int(n) => base::print_int(n),
            Value::Regex(_) | Value::Unit => Output::nil(),
            other => return Err(other.mismatch("literal")),
        };
        Ok(Value::Output(out))
    });

    native::<5>(g, prim("print_list"), |rt, [elem, sep, term, rep, md]| {
        let mds = match md.as_option() {
            Some(Value::Tuple(xs)) if xs.len() == 2 => xs[1].as_list().ok(),
            _ => None,
        };
        let items: Vec<(Value, Value)> = rep
            .as_list()?
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let m = mds.and_then(|ms| ms.get(i)).cloned();
                (r.clone(), m.map_or_else(Value::none, Value::some))
            })
            .collect();
        let (sep, term) = (sep.into_output()?, term.into_output()?);
        let out = print_list(
            &items,
            |(r, m)| rt.apply(&elem, vec![r.clone(), m.clone()])?.into_output(),
            &sep,
            &term,
        )?;
        Ok(Value::Output(out))
    });
}

/// A regex value argument, given compiled or as source text.
fn regex_arg(value: &Value) -> Result<Rc<Regex>, EvalError> {
    match value {
        Value::Regex(re) => Ok(Rc::clone(re)),
        Value::Str(s) => Regex::new(s)
            .map(Rc::new)
            .map_err(|e| EvalError::BadRegex(e.to_string())),
        other => Err(other.mismatch("regex")),
    }
}

/// The value argument of `b`, which the caller's arity check guarantees.
fn value_arg(b: BaseType, arg: Option<&Value>) -> Result<&Value, EvalError> {
    arg.ok_or_else(|| EvalError::Arity {
        name: naming::parser(b.name()),
        expected: 1,
        found: 0,
    })
}

fn base_parser(b: BaseType, arg: Option<&Value>) -> Result<Parser, EvalError> {
    Ok(match b {
        BaseType::Int => Parser::new(|_, c| Ok(leaf(base::int(c)))),
        BaseType::Char => Parser::new(|_, c| Ok(leaf(base::char(c)))),
        BaseType::Digit => Parser::new(|_, c| Ok(leaf(base::digit(c)))),
        BaseType::StringC => {
            let stop = value_arg(b, arg)?.as_char()?;
            Parser::new(move |_, c| Ok(leaf(base::string_c(c, stop))))
        }
        BaseType::StringFW => {
            let width = value_arg(b, arg)?.as_usize()?;
            Parser::new(move |_, c| Ok(leaf(base::string_fw(c, width))))
        }
        BaseType::StringME => {
            let re = regex_arg(value_arg(b, arg)?)?;
            Parser::new(move |_, c| Ok(leaf(base::string_me(c, &re))))
        }
        BaseType::StringLn => Parser::new(|_, c| Ok(leaf(base::string_ln(c)))),
        BaseType::Eof => Parser::new(|_, c| Ok(leaf(base::eof(c)))),
        BaseType::Eor => Parser::new(|_, c| Ok(leaf(base::eor(c)))),
    })
}

fn base_printer(b: BaseType, arg: Option<&Value>, rep: &Value) -> Result<Output, EvalError> {
    Ok(match b {
        BaseType::Int => base::print_int(rep.as_int()?),
        BaseType::Char => base::print_char(rep.as_char()?),
        BaseType::Digit => base::print_digit(rep.as_int()?),
        BaseType::StringC | BaseType::StringME | BaseType::StringLn => {
            base::print_string(rep.as_str()?)
        }
        BaseType::StringFW => {
            base::print_string_fw(value_arg(b, arg)?.as_usize()?, rep.as_str()?)
        }
        BaseType::Eof => base::print_eof(),
        BaseType::Eor => base::print_eor(),
    })
}

fn base_default(b: BaseType, arg: Option<&Value>) -> Result<Value, EvalError> {
    Ok(match b {
        BaseType::Int => Value::Int(base::int_def()),
        BaseType::Char => Value::Char(base::char_def()),
        BaseType::Digit => Value::Int(base::digit_def()),
        BaseType::StringC | BaseType::StringME | BaseType::StringLn => {
            Value::Str(base::string_def())
        }
        BaseType::StringFW => Value::Str(base::string_fw_def(value_arg(b, arg)?.as_usize()?)),
        BaseType::Eof | BaseType::Eor => Value::Unit,
    })
}

/// Registers the parser, whole-input parser, printer and default of `b`.
fn base_artifacts(g: &mut Globals, b: BaseType) {
    let arity = usize::from(b.takes_value());
    let name = b.name();

    insert(g, naming::parser(name), arity, move |_, args| {
        Ok(Value::Parser(base_parser(b, args.first())?))
    });

    insert(g, naming::parse_str(name), arity + 1, move |rt, args| {
        let (input, arg) = match args.split_last() {
            Some((input, rest)) => (input.as_str()?, rest.first()),
            None => return Err(Value::Unit.mismatch("input string")),
        };
        let p = base_parser(b, arg)?;
        parse_all(input, *rt.config(), |c| p.run(rt, c))
    });

    insert(g, naming::printer(name), arity + 2, move |_, args| {
        let Some(rep) = args.get(arity) else {
            return Err(Value::Unit.mismatch("representation"));
        };
        let arg = args.first().filter(|_| arity == 1);
        Ok(Value::Output(base_printer(b, arg, rep)?))
    });

    insert(g, naming::default(name), arity, move |_, args| {
        base_default(b, args.first())
    });
}

fn ordering(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Char(x), Value::Char(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(Value::Tuple(vec![a.clone(), b.clone()]).mismatch("comparable values")),
    }
}

fn compare(g: &mut Globals, name: &str, holds: fn(Ordering) -> bool) {
    native::<2>(g, name.to_owned(), move |_, [a, b]| {
        Ok(Value::Bool(holds(ordering(&a, &b)?)))
    });
}

fn arith(g: &mut Globals, name: &str, op: fn(i64, i64) -> Result<i64, EvalError>) {
    native::<2>(g, name.to_owned(), move |_, [a, b]| {
        Ok(Value::Int(op(a.as_int()?, b.as_int()?)?))
    });
}

fn builtins(g: &mut Globals) {
    native::<2>(g, "eq".to_owned(), |_, [a, b]| Ok(Value::Bool(a == b)));
    native::<2>(g, "ne".to_owned(), |_, [a, b]| Ok(Value::Bool(a != b)));
    compare(g, "lt", Ordering::is_lt);
    compare(g, "le", Ordering::is_le);
    compare(g, "gt", Ordering::is_gt);
    compare(g, "ge", Ordering::is_ge);

    arith(g, "add", |a, b| Ok(a.wrapping_add(b)));
    arith(g, "sub", |a, b| Ok(a.wrapping_sub(b)));
    arith(g, "mul", |a, b| Ok(a.wrapping_mul(b)));
    arith(g, "div", |a, b| {
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(a.wrapping_div(b))
    });
    arith(g, "mod", |a, b| {
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(a.wrapping_rem_euclid(b))
    });
    native::<1>(g, "neg".to_owned(), |_, [a]| Ok(Value::Int(a.as_int()?.wrapping_neg())));

    native::<1>(g, "not".to_owned(), |_, [a]| Ok(Value::Bool(!a.as_bool()?)));
    native::<2>(g, "and".to_owned(), |_, [a, b]| Ok(Value::Bool(a.as_bool()? && b.as_bool()?)));
    native::<2>(g, "or".to_owned(), |_, [a, b]| Ok(Value::Bool(a.as_bool()? || b.as_bool()?)));

    native::<1>(g, "length".to_owned(), |_, [x]| {
        let len = match &x {
            Value::Str(s) => s.chars().count(),
            Value::List(xs) => xs.len(),
            other => return Err(other.mismatch("string or list")),
        };
        Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
    });
    native::<1>(g, "ord".to_owned(), |_, [c]| Ok(Value::Int(i64::from(u32::from(c.as_char()?)))));
    native::<1>(g, "chr".to_owned(), |_, [n]| {
        u32::try_from(n.as_int()?)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| n.mismatch("code point"))
    });
    native::<1>(g, "show".to_owned(), |_, [x]| {
        Ok(Value::Str(match x {
            Value::Str(s) => s,
            Value::Char(c) => c.to_string(),
            other => other.to_string(),
        }))
    });
    native::<1>(g, "id".to_owned(), |_, [x]| Ok(x));
    native::<2>(g, "concat".to_owned(), |_, [a, b]| match (a, b) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (a, _) => Err(a.mismatch("two strings or two lists")),
    });
}
