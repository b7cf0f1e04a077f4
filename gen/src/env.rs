//! The type environment: base types plus every declared type.

use std::collections::HashMap;

use crate::ast::Decl;
use crate::error::GenError;
use crate::ir::Name;
use crate::naming;
use crate::shape::Prim;

/// Types every schema can use without declaring them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Char,
    Digit,
    /// String up to a stop character.
    StringC,
    /// Fixed-width string.
    StringFW,
    /// String matching a regex.
    StringME,
    /// Rest of the line.
    StringLn,
    Eof,
    Eor,
}

impl BaseType {
    pub const ALL: [BaseType; 9] = [
        BaseType::Int,
        BaseType::Char,
        BaseType::Digit,
        BaseType::StringC,
        BaseType::StringFW,
        BaseType::StringME,
        BaseType::StringLn,
        BaseType::Eof,
        BaseType::Eor,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BaseType::Int => "Int",
            BaseType::Char => "Char",
            BaseType::Digit => "Digit",
            BaseType::StringC => "StringC",
            BaseType::StringFW => "StringFW",
            BaseType::StringME => "StringME",
            BaseType::StringLn => "StringLn",
            BaseType::Eof => "EOF",
            BaseType::Eor => "EOR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Whether the type is applied to a value argument (stop char, width,
    /// regex).
    pub const fn takes_value(self) -> bool {
        matches!(
            self,
            BaseType::StringC | BaseType::StringFW | BaseType::StringME
        )
    }

    pub const fn rep(self) -> Prim {
        match self {
            BaseType::Int | BaseType::Digit => Prim::I64,
            BaseType::Char => Prim::Char,
            BaseType::StringC | BaseType::StringFW | BaseType::StringME | BaseType::StringLn => {
                Prim::String
            }
            BaseType::Eof | BaseType::Eor => Prim::Unit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Base(BaseType),
    Declared,
    /// Declared by `obtain`: the representation is a host type.
    Host,
}

/// What synthesis needs to know about a type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub params: usize,
    pub value_param: bool,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub struct TypeEnv {
    types: HashMap<Name, TypeInfo>,
    ctors: HashMap<Name, Name>,
    decls: HashMap<Name, Decl>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    /// An environment holding the base types only.
    pub fn new() -> Self {
        let types = BaseType::ALL
            .into_iter()
            .map(|b| {
                let info = TypeInfo {
                    params: 0,
                    value_param: b.takes_value(),
                    kind: TypeKind::Base(b),
                };
                (b.name().to_owned(), info)
            })
            .collect();
        Self {
            types,
            ctors: HashMap::new(),
            decls: HashMap::new(),
        }
    }

    /// Registers a declaration's name, arity and constructors.
    pub fn declare(&mut self, decl: &Decl) -> Result<(), GenError> {
        let name = decl.name();
        naming::check_type_name(name)?;
        if self.types.contains_key(name) {
            return Err(GenError::DuplicateName(name.to_owned()));
        }
        for branch in decl.branches() {
            let ctor = branch.ctor();
            naming::check_type_name(ctor)?;
            if self.ctors.contains_key(ctor) {
                return Err(GenError::DuplicateName(ctor.to_owned()));
            }
        }
        for branch in decl.branches() {
            self.ctors.insert(branch.ctor().to_owned(), name.to_owned());
        }
        let kind = match decl {
            Decl::Obtain { .. } => TypeKind::Host,
            _ => TypeKind::Declared,
        };
        self.types.insert(
            name.to_owned(),
            TypeInfo {
                params: decl.params().len(),
                value_param: decl.pat().is_some(),
                kind,
            },
        );
        self.decls.insert(name.to_owned(), decl.clone());
        Ok(())
    }

    /// Forgets a declaration, as if it had never been declared.
    pub fn remove(&mut self, name: &str) {
        self.types.remove(name);
        self.decls.remove(name);
        self.ctors.retain(|_, owner| owner != name);
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&TypeInfo, GenError> {
        self.get(name)
            .ok_or_else(|| GenError::UnknownType(name.to_owned()))
    }

    /// The declaration registered under `name`; base types have none.
    pub fn decl(&self, name: &str) -> Option<&Decl> {
        self.decls.get(name)
    }

    /// The declaration owning constructor `ctor`.
    pub fn owner(&self, ctor: &str) -> Option<&str> {
        self.ctors.get(ctor).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Branch, Type};

    #[test]
    fn base_types_are_present() {
        let env = TypeEnv::new();
        let info = env.get("StringC").unwrap();
        assert!(info.value_param);
        assert_eq!(info.kind, TypeKind::Base(BaseType::StringC));
        assert_eq!(BaseType::from_name("EOF"), Some(BaseType::Eof));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut env = TypeEnv::new();
        env.declare(&Decl::alias("Row", Type::con("Int"))).unwrap();
        assert_eq!(
            env.declare(&Decl::alias("Row", Type::con("Char"))),
            Err(GenError::DuplicateName("Row".into()))
        );
        assert_eq!(
            env.declare(&Decl::alias("Int", Type::con("Char"))),
            Err(GenError::DuplicateName("Int".into()))
        );
    }

    #[test]
    fn constructors_are_global() {
        let mut env = TypeEnv::new();
        env.declare(&Decl::union("A", vec![Branch::constructor("X", vec![])]))
            .unwrap();
        let err = env.declare(&Decl::union("B", vec![Branch::constructor("X", vec![])]));
        assert_eq!(err, Err(GenError::DuplicateName("X".into())));
        assert_eq!(env.owner("X"), Some("A"));
    }
}
