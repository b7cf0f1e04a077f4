//! Round-trip and naming properties.
use formkit::compiler::backend::eval::{Interp, Value};
use formkit::compiler::{
    Branch, Decl, Expr, Field, GenConfig, Schema, Termination, Type, compile, naming,
};
use proptest::prelude::*;

fn interp() -> Interp {
    let ints = Decl::alias(
        "Ints",
        Type::list(Type::con("Int"))
            .sep_by(Type::lit(Expr::char(',')))
            .terminated(Termination::Until(Box::new(Type::lit(Expr::char(';'))))),
    );
    let entry = Decl::wrapper(
        "Entry",
        Branch::record(
            "Entry",
            vec![
                Field::labeled(
                    "key",
                    Type::with_value(Type::con("StringME"), Expr::regex("[a-z]+")),
                ),
                Field::anon(Type::lit(Expr::char('='))),
                Field::labeled("val", Type::con("Int")),
            ],
        ),
    );
    let module = compile(&Schema::new(vec![ints, entry]), &GenConfig::DEFAULT)
        .into_result()
        .unwrap();
    Interp::new(&module).unwrap()
}

fn type_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,8}"
}

proptest! {
    #[test]
    fn test_int_lists_round_trip(xs in prop::collection::vec(-1_000_000i64..1_000_000, 0..12)) {
        let interp = interp();
        let rep = Value::List(xs.into_iter().map(Value::Int).collect());
        let text = interp.print("Ints", &[], &rep, None).unwrap();
        let (parsed, md) = interp.parse_str("Ints", &[], &text).unwrap();
        prop_assert!(md.md_header().is_ok(), "{text:?}");
        prop_assert_eq!(parsed, rep);
    }

    #[test]
    fn test_records_round_trip(key in "[a-z]{1,10}", val in any::<i32>()) {
        let interp = interp();
        let input = format!("{key}={val}");
        let (rep, md) = interp.parse_str("Entry", &[], &input).unwrap();
        prop_assert!(md.md_header().is_ok());
        prop_assert_eq!(
            &rep,
            &Value::con("Entry", vec![Value::str(key), Value::Int(i64::from(val))])
        );
        prop_assert_eq!(interp.print("Entry", &[], &rep, Some(&md)).unwrap(), input);
    }

    #[test]
    fn test_artifact_names_are_injective(a in type_name(), b in type_name()) {
        let kinds: [fn(&str) -> String; 6] = [
            naming::parser,
            naming::parse_str,
            naming::printer,
            naming::default,
            naming::md_type,
            naming::imd_type,
        ];
        for (i, f) in kinds.iter().enumerate() {
            for (j, g) in kinds.iter().enumerate() {
                if i != j || a != b {
                    prop_assert_ne!(f(&a), g(&b));
                }
            }
        }
    }

    #[test]
    fn test_derived_names_are_rejected_as_declarations(a in type_name()) {
        prop_assert!(naming::check_type_name(&a).is_ok());
        prop_assert!(naming::check_type_name(&naming::md_type(&a)).is_err());
        prop_assert!(naming::check_type_name(&naming::imd_type(&a)).is_err());
    }
}

#[test]
fn test_default_is_a_fixed_point() {
    let interp = interp();
    for name in ["Ints", "Entry"] {
        let def = interp.default(name, &[]).unwrap();
        let text = interp.print(name, &[], &def, None).unwrap();
        let (rep, _) = interp.parse_str(name, &[], &text).unwrap();
        let again = interp.print(name, &[], &rep, None).unwrap();
        assert_eq!(text, again, "{name}");
    }
}
