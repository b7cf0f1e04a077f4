#![no_main]

use formkit::compiler::backend::eval::Interp;
use formkit::compiler::{
    Branch, Decl, Expr, Field, GenConfig, Module, Schema, Termination, Type, compile,
};
use formkit::ParseConfig;
use libfuzzer_sys::fuzz_target;

fn module() -> Module {
    let row = Decl::alias(
        "Row",
        Type::list(Type::con("Int"))
            .sep_by(Type::lit(Expr::char(',')))
            .terminated(Termination::Until(Box::new(Type::con("EOR")))),
    );
    let entry = Decl::union(
        "Entry",
        vec![
            Branch::record(
                "Pair",
                vec![
                    Field::labeled("key", Type::with_value(Type::con("StringC"), Expr::char('='))),
                    Field::anon(Type::lit(Expr::char('='))),
                    Field::labeled("val", Type::con("Row")),
                ],
            )
            .retry(),
            Branch::constructor("Nest", vec![
                Type::lit(Expr::char('[')),
                Type::con("Entry"),
                Type::lit(Expr::char(']')),
            ]),
            Branch::constructor("Bare", vec![Type::con("StringLn")]),
        ],
    );
    let file = Decl::alias(
        "File",
        Type::partition(Type::list(Type::con("Entry")), Expr::con("Newline", Vec::new())),
    );
    compile(&Schema::new(vec![row, entry, file]), &GenConfig::DEFAULT)
        .into_result()
        .unwrap_or_default()
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let config = ParseConfig::DEFAULT.with_max_recursion_depth(64);
    let Ok(interp) = Interp::with_config(&module(), config) else {
        return;
    };
    // Parsing never panics; faults are only the recursion limit.
    let Ok((rep, md)) = interp.parse_str("File", &[], input) else {
        return;
    };
    // Whatever was parsed prints, with or without its metadata.
    let with_md = interp.print("File", &[], &rep, Some(&md));
    let without = interp.print("File", &[], &rep, None);
    assert_eq!(with_md.is_ok(), without.is_ok());
});
