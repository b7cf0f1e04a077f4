//! Generated Rust declarations are valid items.
use formkit::compiler::backend::rust::{render_module, to_source};
use formkit::compiler::{
    Branch, Capabilities, Decl, Expr, Field, GenConfig, Schema, Termination, Type, compile,
};

fn schema() -> Schema {
    Schema::new(vec![
        Decl::wrapper(
            "Banner",
            Branch::record(
                "Banner",
                vec![
                    Field::labeled("version", Type::con("Int")),
                    Field::anon(Type::lit(Expr::char(' '))),
                    Field::labeled("name", Type::con("StringLn")),
                ],
            ),
        )
        .with_caps(Capabilities::ALL),
        Decl::alias(
            "Row",
            Type::list(Type::con("Int"))
                .sep_by(Type::lit(Expr::char(',')))
                .terminated(Termination::Until(Box::new(Type::con("EOR")))),
        ),
        Decl::union(
            "Tree",
            vec![
                Branch::constructor("Leaf", vec![Type::con("Int")]),
                Branch::constructor(
                    "Node",
                    vec![
                        Type::lit(Expr::char('(')),
                        Type::con("Tree"),
                        Type::con("Tree"),
                        Type::lit(Expr::char(')')),
                    ],
                ),
            ],
        ),
    ])
}

#[test]
fn test_module_renders_as_rust_items() {
    let module = compile(&schema(), &GenConfig::DEFAULT).into_result().unwrap();
    let file: syn::File = syn::parse2(render_module(&module)).unwrap();
    let enums = file
        .items
        .iter()
        .filter(|i| matches!(i, syn::Item::Enum(_)))
        .count();
    let aliases = file
        .items
        .iter()
        .filter(|i| matches!(i, syn::Item::Type(_)))
        .count();
    assert_eq!(enums, 4, "Banner, Banner_imd, Tree, Tree_imd");
    assert_eq!(aliases, 4, "three metadata aliases and Row");
}

#[test]
fn test_recursive_branches_are_boxed() {
    let module = compile(&schema(), &GenConfig::DEFAULT).into_result().unwrap();
    let src = to_source(&module);
    assert!(src.contains("Node (Box < Tree > , Box < Tree >)"), "{src}");
}
