//! Artifact naming.
//!
//! Every artifact name is the declared name, case folded where the artifact
//! is callable, plus one fixed affix per artifact kind. Declared type and
//! constructor names are `[A-Z][A-Za-z0-9]*` and every affix contains `_`,
//! so folding plus affixing is injective: a derived name determines both
//! its kind and the declared name it came from.

use crate::error::GenError;

pub const MD: &str = "_md";
pub const IMD: &str = "_imd";
pub const PARSE_M: &str = "_parseM";
pub const PARSE_S: &str = "_parseS";
pub const PRINT_FL: &str = "_printFL";
pub const DEF: &str = "_def";
pub const BRANCH_MD: &str = "Md_";
/// Suffix of functions bound for a type parameter inside a declaration.
pub const ARG: &str = "_arg";

const RESERVED_SUFFIXES: [&str; 7] = [MD, IMD, PARSE_M, PARSE_S, PRINT_FL, DEF, ARG];

/// Lowercases the first character.
pub fn fold(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn md_type(name: &str) -> String {
    format!("{name}{MD}")
}

pub fn imd_type(name: &str) -> String {
    format!("{name}{IMD}")
}

pub fn branch_md(ctor: &str) -> String {
    format!("{BRANCH_MD}{ctor}")
}

pub fn parser(name: &str) -> String {
    format!("{}{PARSE_M}", fold(name))
}

pub fn parse_str(name: &str) -> String {
    format!("{}{PARSE_S}", fold(name))
}

pub fn printer(name: &str) -> String {
    format!("{}{PRINT_FL}", fold(name))
}

pub fn default(name: &str) -> String {
    format!("{}{DEF}", fold(name))
}

/// Metadata type variable paired with type parameter `var`.
pub fn var_md(var: &str) -> String {
    format!("{var}{MD}")
}

pub fn var_parser(var: &str) -> String {
    format!("{var}{PARSE_M}{ARG}")
}

pub fn var_printer(var: &str) -> String {
    format!("{var}{PRINT_FL}{ARG}")
}

pub fn var_default(var: &str) -> String {
    format!("{var}{DEF}{ARG}")
}

/// Metadata binder of a record label.
pub fn label_md(label: &str) -> String {
    format!("{label}{MD}")
}

fn invalid(name: &str, reason: &'static str) -> GenError {
    GenError::InvalidName {
        name: name.to_owned(),
        reason,
    }
}

/// Checks a declared type or constructor name.
pub fn check_type_name(name: &str) -> Result<(), GenError> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return Err(invalid(name, "must start with an uppercase ASCII letter")),
    }
    if chars.all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(invalid(name, "may only contain ASCII letters and digits"))
    }
}

/// Checks a type parameter, record label or pattern binder.
pub fn check_binder(name: &str) -> Result<(), GenError> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return Err(invalid(name, "must start with a lowercase ASCII letter")),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(name, "may only contain ASCII letters, digits and `_`"));
    }
    if RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(invalid(name, "ends in a reserved suffix"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn artifact_names() {
        assert_eq!(parser("Point"), "point_parseM");
        assert_eq!(parse_str("Point"), "point_parseS");
        assert_eq!(printer("Point"), "point_printFL");
        assert_eq!(default("Point"), "point_def");
        assert_eq!(md_type("Point"), "Point_md");
        assert_eq!(imd_type("Point"), "Point_imd");
        assert_eq!(branch_md("Pt"), "Md_Pt");
        assert_eq!(var_md("a"), "a_md");
        assert_eq!(var_parser("a"), "a_parseM_arg");
    }

    #[test]
    fn fold_only_touches_first_char() {
        assert_eq!(fold("EOF"), "eOF");
        assert_eq!(fold("FooBar"), "fooBar");
        assert_eq!(fold(""), "");
    }

    #[test_case("Point", true; "plain")]
    #[test_case("P2", true; "digits")]
    #[test_case("point", false; "lowercase")]
    #[test_case("My_Type", false; "underscore")]
    #[test_case("", false; "empty")]
    fn type_names(name: &str, ok: bool) {
        assert_eq!(check_type_name(name).is_ok(), ok);
    }

    #[test_case("x", true; "plain")]
    #[test_case("first_name", true; "underscore")]
    #[test_case("x_md", false; "md suffix")]
    #[test_case("p_parseM", false; "parser suffix")]
    #[test_case("t_arg", false; "arg suffix")]
    #[test_case("X", false; "uppercase")]
    #[test_case("a#1", false; "gensym")]
    fn binders(name: &str, ok: bool) {
        assert_eq!(check_binder(name).is_ok(), ok);
    }

    #[test]
    fn var_functions_never_meet_globals() {
        assert_ne!(var_parser("point"), parser("Point"));
        assert_ne!(var_default("point"), default("Point"));
    }
}
