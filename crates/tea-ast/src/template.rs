// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Template root node and variable storage.

use crate::stmt::Block;
use crate::types::Type;
use crate::SourceInfo;

/// Index of a variable record in a [`VarArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// A named, typed declaration site.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub info: SourceInfo,
    /// Must live in persistent storage, e.g. captured by a substitution block.
    pub is_field: bool,
    pub is_static: bool,
    /// Declared with an explicit type rather than inferred.
    pub is_statically_typed: bool,
    pub is_transient: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, info: SourceInfo) -> Self {
        Self {
            name: name.into(),
            ty,
            info,
            is_field: false,
            is_static: false,
            is_statically_typed: false,
            is_transient: false,
        }
    }

    pub fn statically_typed(mut self) -> Self {
        self.is_statically_typed = true;
        self
    }
}

/// Owns every variable declared while checking one template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarArena {
    vars: Vec<Variable>,
}

impl VarArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, var: Variable) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    pub fn get(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: VarId) -> Option<&mut Variable> {
        self.vars.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars.iter().enumerate().map(|(i, v)| (VarId(i as u32), v))
    }
}

/// A type as written in source: dotted name plus array dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub dims: u32,
    pub info: SourceInfo,
}

impl TypeName {
    pub fn new(name: impl Into<String>, dims: u32, info: SourceInfo) -> Self {
        Self { name: name.into(), dims, info }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// `import name` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    pub info: SourceInfo,
}

/// A formal template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_name: TypeName,
    pub info: SourceInfo,
    pub var: Option<VarId>,
}

/// Root compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub info: SourceInfo,
    pub imports: Vec<Import>,
    pub params: Vec<Param>,
    /// Declares `{...}`: callers must pass a substitution block.
    pub subst_param: bool,
    pub body: Block,
    /// Inferred from the `return` statements; `void` when there are none.
    pub return_type: Option<Type>,
    pub vars: VarArena,
}

impl Template {
    pub fn new(name: impl Into<String>, info: SourceInfo) -> Self {
        Self {
            name: name.into(),
            info,
            imports: Vec::new(),
            params: Vec::new(),
            subst_param: false,
            body: Block::default(),
            return_type: None,
            vars: VarArena::new(),
        }
    }

    pub fn var(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_are_stable() {
        let mut arena = VarArena::new();
        let a = arena.alloc(Variable::new("a", Type::INT, SourceInfo::default()));
        let b = arena.alloc(Variable::new("a", Type::LONG, SourceInfo::default()));
        assert_ne!(a, b);
        assert_eq!(arena.get(a).map(|v| &v.ty), Some(&Type::INT));
        assert_eq!(arena.get(b).map(|v| &v.ty), Some(&Type::LONG));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn type_name_display_includes_dims() {
        let tn = TypeName::new("java.lang.String", 2, SourceInfo::default());
        assert_eq!(tn.to_string(), "java.lang.String[][]");
    }
}
