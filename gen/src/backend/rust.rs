//! Rust declaration backend.
//!
//! Renders the representation, metadata and internal metadata types of a
//! module as Rust items. Aliases become `type` items and data types become
//! enums with one variant per branch. Fields that lead back to the enum
//! they belong to, directly or through other generated types, are boxed, as
//! are lazy fields. Host types from `obtain` declarations are left to the
//! caller.

use std::collections::{HashMap, HashSet};

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use crate::capability::Capabilities;
use crate::emit::Module;
use crate::shape::{Prim, Shape, TypeBody, TypeDecl, Variant, VariantField};

/// Direct references between generated types. Lists and lazy fields are
/// indirections and add no edge.
struct RefGraph<'m> {
    edges: HashMap<&'m str, Vec<&'m str>>,
}

impl<'m> RefGraph<'m> {
    fn new(module: &'m Module) -> Self {
        let edges = module
            .types()
            .map(|d| {
                let mut out = Vec::new();
                match &d.body {
                    TypeBody::Alias(shape) => shape.direct_names(&mut out),
                    TypeBody::Data(variants) => variants
                        .iter()
                        .flat_map(|v| &v.fields)
                        .filter(|f| !f.lazy)
                        .for_each(|f| f.shape.direct_names(&mut out)),
                    TypeBody::Host => {}
                }
                (d.name.as_str(), out)
            })
            .collect();
        Self { edges }
    }

    fn reaches(&self, from: &'m str, to: &str) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if seen.insert(n) {
                if let Some(next) = self.edges.get(n) {
                    stack.extend(next.iter().copied());
                }
            }
        }
        false
    }

    /// The types whose direct use inside `decl` would make it infinitely
    /// sized.
    fn cycle_through(&self, decl: &str) -> HashSet<&'m str> {
        self.edges
            .keys()
            .copied()
            .filter(|&n| self.reaches(n, decl))
            .collect()
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type", "unsafe", "use",
    "where", "while", "yield",
];

fn ident(name: &str) -> Ident {
    if KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        format_ident!("{}", name)
    }
}

/// Renders every generated type of `module`.
pub fn render_module(module: &Module) -> TokenStream {
    let graph = RefGraph::new(module);
    let items = module.types().map(|decl| {
        let cyclic = graph.cycle_through(&decl.name);
        render_decl(decl, &cyclic)
    });
    quote! {
        #(#items)*
    }
}

/// Renders `module` as source text.
pub fn to_source(module: &Module) -> String {
    render_module(module).to_string()
}

/// Renders one type. Fields mentioning any name in `boxed` are boxed.
pub fn render_decl(decl: &TypeDecl, boxed: &HashSet<&str>) -> TokenStream {
    let name = ident(&decl.name);
    let params = generics(&decl.params);
    match &decl.body {
        TypeBody::Host => {
            tracing::debug!(ty = %decl.name, "host type left to the caller");
            TokenStream::new()
        }
        TypeBody::Alias(shape) => {
            let ty = render_shape(shape);
            quote! {
                #[allow(non_camel_case_types)]
                pub type #name #params = #ty;
            }
        }
        TypeBody::Data(variants) => {
            let derives = derives(decl.caps.unwrap_or(Capabilities::NONE));
            let variants = variants.iter().map(|v| render_variant(v, boxed));
            quote! {
                #[allow(non_camel_case_types)]
                #derives
                pub enum #name #params {
                    #(#variants),*
                }
            }
        }
    }
}

fn generics(params: &[String]) -> TokenStream {
    if params.is_empty() {
        return TokenStream::new();
    }
    let params = params.iter().map(|p| ident(p));
    quote! { <#(#params),*> }
}

fn derives(caps: Capabilities) -> TokenStream {
    let paths = caps.derives().into_iter().map(|d| {
        let segments = d.split("::").map(ident);
        quote! { #(#segments)::* }
    });
    quote! { #[derive(#(#paths),*)] }
}

fn render_variant(variant: &Variant, boxed: &HashSet<&str>) -> TokenStream {
    let ctor = ident(&variant.ctor);
    if variant.fields.is_empty() {
        return quote! { #ctor };
    }
    let labeled = variant.fields.iter().all(|f| f.label.is_some());
    let fields = variant.fields.iter().map(|f| {
        let ty = field_type(f, boxed);
        match (&f.label, labeled) {
            (Some(label), true) => {
                let label = ident(label);
                quote! { #label: #ty }
            }
            _ => ty,
        }
    });
    if labeled {
        quote! { #ctor { #(#fields),* } }
    } else {
        quote! { #ctor(#(#fields),*) }
    }
}

fn field_type(field: &VariantField, boxed: &HashSet<&str>) -> TokenStream {
    let ty = render_shape(&field.shape);
    if field.lazy || boxed.iter().any(|n| field.shape.mentions_directly(n)) {
        quote! { Box<#ty> }
    } else {
        ty
    }
}

pub fn render_shape(shape: &Shape) -> TokenStream {
    match shape {
        Shape::Unit | Shape::Prim(Prim::Unit) => quote! { () },
        Shape::Header => quote! { formkit::Header },
        Shape::Prim(Prim::I64) => quote! { i64 },
        Shape::Prim(Prim::Char) => quote! { char },
        Shape::Prim(Prim::String) => quote! { String },
        Shape::Named(name, args) => {
            let name = ident(name);
            if args.is_empty() {
                quote! { #name }
            } else {
                let args = args.iter().map(render_shape);
                quote! { #name<#(#args),*> }
            }
        }
        Shape::Var(v) => {
            let v = ident(v);
            quote! { #v }
        }
        Shape::Tuple(items) => {
            let items = items.iter().map(render_shape);
            quote! { (#(#items),*) }
        }
        Shape::List(elem) => {
            let elem = render_shape(elem);
            quote! { Vec<#elem> }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Branch, Decl, Field, Schema, Type};
    use crate::config::GenConfig;
    use crate::emit::compile;
    use crate::ir::Expr;

    fn parse(module: &Module) -> syn::File {
        syn::parse2(render_module(module)).unwrap()
    }

    fn point() -> Decl {
        Decl::wrapper(
            "Point",
            Branch::record(
                "Point",
                vec![
                    Field::labeled("x", Type::con("Int")),
                    Field::anon(Type::lit(Expr::char(','))),
                    Field::labeled("y", Type::con("Int")),
                ],
            ),
        )
    }

    #[test]
    fn records_render_as_struct_variants() {
        let module = compile(&Schema::new(vec![point()]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        let file = parse(&module);
        assert_eq!(file.items.len(), 3);
        let src = to_source(&module);
        assert!(src.contains("Point { x : i64 , y : i64 }"));
        assert!(src.contains("pub type Point_md = (formkit :: Header , Point_imd)"));
        assert!(src.contains("Md_Point (formkit :: Header , formkit :: Header , formkit :: Header)"));
    }

    #[test]
    fn recursive_fields_are_boxed() {
        let nat = Decl::union(
            "Nat",
            vec![
                Branch::constructor("Zero", vec![Type::lit(Expr::char('z'))]),
                Branch::constructor("Succ", vec![Type::lit(Expr::char('s')), Type::con("Nat")]),
            ],
        );
        let module = compile(&Schema::new(vec![nat]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        parse(&module);
        let src = to_source(&module);
        assert!(src.contains("Succ (Box < Nat >)"));
        assert!(src.contains("Box < Nat_md >"));
        assert!(src.contains("Zero ,") || src.contains("Zero }"));
    }

    #[test]
    fn mutually_recursive_fields_are_boxed() {
        let expr = Decl::union(
            "Expr",
            vec![
                Branch::constructor("Lit", vec![Type::con("Int")]),
                Branch::constructor("Group", vec![Type::lit(Expr::char('(')), Type::con("Sum")]),
            ],
        );
        let sum = Decl::wrapper(
            "Sum",
            Branch::constructor(
                "Plus",
                vec![Type::con("Expr"), Type::lit(Expr::char('+')), Type::con("Expr")],
            ),
        );
        let module = compile(&Schema::new(vec![expr, sum]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        parse(&module);
        let src = to_source(&module);
        assert!(src.contains("Group (Box < Sum >)"));
        assert!(src.contains("Plus (Box < Expr > , Box < Expr >)"));
        assert!(src.contains("Lit (i64)"));
    }

    #[test]
    fn capabilities_map_to_derives() {
        let d = point().with_caps(Capabilities::ALL);
        let module = compile(&Schema::new(vec![d]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        parse(&module);
        let src = to_source(&module);
        assert!(src.contains(
            "derive (Clone , Debug , PartialEq , Eq , PartialOrd , Ord , serde :: Serialize , serde :: Deserialize)"
        ));
    }

    #[test]
    fn parameters_become_generics() {
        let pair = Decl::alias("Pair", Type::Tuple(vec![Type::var("a"), Type::var("a")]))
            .with_params(&["a"]);
        let list = Decl::alias("Ints", Type::list(Type::con("Int")));
        let module = compile(&Schema::new(vec![pair, list]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        parse(&module);
        let src = to_source(&module);
        assert!(src.contains("pub type Pair < a > = (a , a)"));
        assert!(src.contains("pub type Ints = Vec < i64 >"));
        assert!(src.contains("pub type Ints_md = (formkit :: Header , Vec < formkit :: Header >)"));
    }

    #[test]
    fn host_types_are_skipped() {
        let code = Decl::obtain(
            "Code",
            Type::con("Char"),
            Expr::Tuple(vec![Expr::var("ord"), Expr::var("chr")]),
        );
        let module = compile(&Schema::new(vec![code]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        let file = parse(&module);
        assert_eq!(file.items.len(), 1);
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        let d = Decl::wrapper(
            "Kw",
            Branch::record("Kw", vec![Field::labeled("type", Type::con("Int"))]),
        );
        let module = compile(&Schema::new(vec![d]), &GenConfig::DEFAULT)
            .into_result()
            .unwrap();
        parse(&module);
        assert!(to_source(&module).contains("r#type : i64"));
    }
}
