#![no_main]

use arbitrary::Arbitrary;
use formkit::compiler::backend::eval::{Interp, Value};
use formkit::compiler::{Decl, Expr, GenConfig, Schema, Termination, Type, compile};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    values: Vec<i32>,
    sep: u8,
}

fuzz_target!(|input: Input| {
    let sep = char::from(b'!' + input.sep % 10);
    let ints = Decl::alias(
        "Ints",
        Type::list(Type::con("Int"))
            .sep_by(Type::lit(Expr::char(sep)))
            .terminated(Termination::Until(Box::new(Type::con("EOF")))),
    );
    let Ok(module) = compile(&Schema::new(vec![ints]), &GenConfig::DEFAULT).into_result() else {
        return;
    };
    let Ok(interp) = Interp::new(&module) else {
        return;
    };
    let rep = Value::List(input.values.into_iter().map(|v| Value::Int(v.into())).collect());
    let text = interp.print("Ints", &[], &rep, None).unwrap();
    let (parsed, md) = interp.parse_str("Ints", &[], &text).unwrap();
    assert!(md.md_header().is_ok(), "{text:?}");
    assert_eq!(parsed, rep);
});
