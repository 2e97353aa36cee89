// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexical scopes used while type checking.
//!
//! Scopes live in an arena owned by [`ScopeTree`]. A child holds its parent
//! by id; the parent lists its children. Variables are pooled across the
//! whole tree by `(name, type)`, so declaring an equal variable anywhere
//! yields the same `VarId`.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tea_ast::expr::VariableRef;
use tea_ast::{Type, VarArena, VarId, Variable};

use crate::class_table::ClassTable;

/// Index of a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

#[derive(Debug, Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    /// Variables declared directly in this scope, by name.
    locals: IndexMap<String, VarId>,
    /// Declared here for narrowing only; never merged or promoted.
    private: HashSet<VarId>,
    /// Variables bound by references in this scope.
    refs: Vec<VarId>,
    deleted: bool,
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
    pool: HashMap<(String, Type), VarId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only the root scope.
    pub fn new() -> Self {
        Self { scopes: vec![ScopeData::default()], pool: HashMap::new() }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    fn data(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    fn data_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0 as usize]
    }

    /// Open a new scope nested in `parent`.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData { parent: Some(parent), ..ScopeData::default() });
        self.data_mut(parent).children.push(id);
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.data(scope).parent
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.data(scope).children
    }

    pub fn is_deleted(&self, scope: ScopeId) -> bool {
        self.data(scope).deleted
    }

    /// Variables declared directly in `scope`, in declaration order.
    pub fn locals(&self, scope: ScopeId) -> impl Iterator<Item = (&str, VarId)> + '_ {
        self.data(scope).locals.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Variables referenced from `scope`, in binding order.
    pub fn refs(&self, scope: ScopeId) -> &[VarId] {
        &self.data(scope).refs
    }

    /// The pooled variable for `(name, ty)`, allocating it on first use.
    fn canonical(&mut self, var: Variable, vars: &mut VarArena) -> VarId {
        let key = (var.name.clone(), var.ty.clone());
        if let Some(&id) = self.pool.get(&key) {
            return id;
        }
        let id = vars.alloc(var);
        self.pool.insert(key, id);
        id
    }

    /// The canonical pooled variable equal to `var`, without declaring it.
    pub fn pooled(&mut self, var: Variable, vars: &mut VarArena) -> VarId {
        self.canonical(var, vars)
    }

    /// Declare `var` in `scope` and return the canonical pooled variable.
    ///
    /// A private declaration hides nothing from lookups in this scope but is
    /// excluded from [`intersect`](Self::intersect) and
    /// [`promote`](Self::promote).
    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        var: Variable,
        private: bool,
        vars: &mut VarArena,
    ) -> VarId {
        let name = var.name.clone();
        let id = self.canonical(var, vars);
        self.declare_existing(scope, &name, id, private);
        id
    }

    /// Make an already pooled variable visible in `scope` under `name`.
    pub fn declare_existing(&mut self, scope: ScopeId, name: &str, id: VarId, private: bool) {
        let data = self.data_mut(scope);
        data.locals.insert(name.to_string(), id);
        if private {
            data.private.insert(id);
        } else {
            data.private.remove(&id);
        }
    }

    /// Find the variable `name` visible from `scope`.
    ///
    /// With `public_only`, private declarations are skipped and the search
    /// continues in the enclosing scopes.
    pub fn get_declared_variable(&self, scope: ScopeId, name: &str, public_only: bool) -> Option<VarId> {
        self.find_declaration(scope, name, public_only).map(|(_, id)| id)
    }

    /// The scope declaring the variable `name` visible from `scope`.
    pub fn declaring_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.find_declaration(scope, name, false).map(|(s, _)| s)
    }

    fn find_declaration(&self, scope: ScopeId, name: &str, public_only: bool) -> Option<(ScopeId, VarId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.data(id);
            if let Some(&var) = data.locals.get(name) {
                if !(public_only && data.private.contains(&var)) {
                    return Some((id, var));
                }
            }
            current = data.parent;
        }
        None
    }

    /// Bind a reference to the variable its name resolves to.
    ///
    /// Returns false when the name is undeclared; the reference is left
    /// unbound.
    pub fn bind(&mut self, scope: ScopeId, var_ref: &mut VariableRef) -> bool {
        match self.get_declared_variable(scope, &var_ref.name, false) {
            Some(id) => {
                var_ref.var = Some(id);
                self.data_mut(scope).refs.push(id);
                true
            }
            None => {
                var_ref.var = None;
                false
            }
        }
    }

    /// Whether `scope` is `ancestor` or nested inside it.
    pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Unify the public local variables of two sibling scopes.
    ///
    /// Every local in either scope with a visible counterpart in the other
    /// yields one variable of their common type. The side already holding
    /// that type is reused; otherwise a pooled variable is declared.
    pub fn intersect(
        &mut self,
        a: ScopeId,
        b: ScopeId,
        vars: &mut VarArena,
        classes: &ClassTable,
    ) -> Vec<VarId> {
        let mut matched = HashSet::new();
        let mut out = Vec::new();
        self.merge_into(a, b, &mut matched, &mut out, vars, classes);
        self.merge_into(b, a, &mut matched, &mut out, vars, classes);
        out
    }

    /// Unify the public locals of `scope` with the variables visible from its
    /// parent.
    pub fn promote(&mut self, scope: ScopeId, vars: &mut VarArena, classes: &ClassTable) -> Vec<VarId> {
        let Some(parent) = self.parent(scope) else { return Vec::new() };
        let mut matched = HashSet::new();
        let mut out = Vec::new();
        self.merge_into(scope, parent, &mut matched, &mut out, vars, classes);
        out
    }

    fn merge_into(
        &mut self,
        from: ScopeId,
        other: ScopeId,
        matched: &mut HashSet<String>,
        out: &mut Vec<VarId>,
        vars: &mut VarArena,
        classes: &ClassTable,
    ) {
        let data = self.data(from);
        let candidates: Vec<(String, VarId)> = data
            .locals
            .iter()
            .filter(|(_, id)| !data.private.contains(id))
            .map(|(name, &id)| (name.clone(), id))
            .collect();

        for (name, mine) in candidates {
            if matched.contains(&name) {
                continue;
            }
            let Some(theirs) = self.get_declared_variable(other, &name, true) else { continue };
            let (Some(my_var), Some(their_var)) = (vars.get(mine), vars.get(theirs)) else { continue };
            let Some(common) = classes.compatible_type(&my_var.ty, &their_var.ty) else { continue };
            matched.insert(name);

            let merged = if my_var.ty == common {
                mine
            } else if their_var.ty == common {
                theirs
            } else {
                let mut var = Variable::new(my_var.name.clone(), common, my_var.info);
                var.is_field = my_var.is_field || their_var.is_field;
                self.canonical(var, vars)
            };
            out.push(merged);
        }
    }

    /// Detach `scope` from its parent so it can be rebuilt.
    pub fn delete(&mut self, scope: ScopeId) {
        if let Some(parent) = self.parent(scope) {
            self.data_mut(parent).children.retain(|&c| c != scope);
        }
        let data = self.data_mut(scope);
        data.deleted = true;
        data.locals.clear();
        data.private.clear();
        data.refs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_ast::SourceInfo;

    fn var(name: &str, ty: Type) -> Variable {
        Variable::new(name, ty, SourceInfo::default())
    }

    #[test]
    fn equal_declarations_are_pooled() {
        let mut vars = VarArena::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let inner = tree.child(root);
        let a = tree.declare_variable(root, var("x", Type::INT), false, &mut vars);
        let b = tree.declare_variable(inner, var("x", Type::INT), false, &mut vars);
        let c = tree.declare_variable(inner, var("x", Type::LONG), false, &mut vars);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(vars.len(), 2);
        assert_eq!(tree.get_declared_variable(inner, "x", false), Some(c));
        assert_eq!(tree.get_declared_variable(root, "x", false), Some(a));
    }

    #[test]
    fn public_lookup_skips_private_declarations() {
        let mut vars = VarArena::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let inner = tree.child(root);
        let outer = tree.declare_variable(root, var("s", Type::STRING), false, &mut vars);
        let narrowed = tree.declare_variable(inner, var("s", Type::STRING.to_non_null()), true, &mut vars);
        assert_eq!(tree.get_declared_variable(inner, "s", false), Some(narrowed));
        assert_eq!(tree.get_declared_variable(inner, "s", true), Some(outer));
    }

    #[test]
    fn bind_records_reference() {
        let mut vars = VarArena::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let id = tree.declare_variable(root, var("x", Type::INT), false, &mut vars);
        let mut found = VariableRef::new("x", SourceInfo::default());
        let mut missing = VariableRef::new("y", SourceInfo::default());
        assert!(tree.bind(root, &mut found));
        assert!(!tree.bind(root, &mut missing));
        assert_eq!(found.var, Some(id));
        assert_eq!(tree.refs(root), &[id]);
    }

    #[test]
    fn intersect_widens_branch_types() {
        let mut vars = VarArena::new();
        let classes = ClassTable::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let before = tree.declare_variable(root, var("x", Type::INT), false, &mut vars);
        let then_scope = tree.child(root);
        let else_scope = tree.child(root);
        let long_x = tree.declare_variable(then_scope, var("x", Type::LONG), false, &mut vars);
        tree.declare_variable(else_scope, var("y", Type::STRING), false, &mut vars);

        let merged = tree.intersect(then_scope, else_scope, &mut vars, &classes);
        // `x` pairs with the outer int; `y` has no counterpart.
        assert_eq!(merged, vec![long_x]);
        assert_ne!(before, long_x);
    }

    #[test]
    fn intersect_synthesizes_common_variable() {
        let mut vars = VarArena::new();
        let classes = ClassTable::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let a = tree.child(root);
        let b = tree.child(root);
        tree.declare_variable(a, var("v", Type::STRING), false, &mut vars);
        tree.declare_variable(b, var("v", Type::object(tea_ast::ClassId::BOOLEAN)), false, &mut vars);
        let merged = tree.intersect(a, b, &mut vars, &classes);
        assert_eq!(merged.len(), 1);
        let ty = vars.get(merged[0]).map(|v| v.ty.clone());
        assert_eq!(ty, Some(Type::object(tea_ast::ClassId::COMPARABLE)));
    }

    #[test]
    fn promote_ignores_private_and_unmatched() {
        let mut vars = VarArena::new();
        let classes = ClassTable::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare_variable(root, var("total", Type::INT), false, &mut vars);
        let body = tree.child(root);
        tree.declare_variable(body, var("i", Type::INT), true, &mut vars);
        tree.declare_variable(body, var("tmp", Type::INT), false, &mut vars);
        let long_total = tree.declare_variable(body, var("total", Type::LONG), false, &mut vars);
        assert_eq!(tree.promote(body, &mut vars, &classes), vec![long_total]);
    }

    #[test]
    fn delete_detaches_from_parent() {
        let mut vars = VarArena::new();
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let body = tree.child(root);
        tree.declare_variable(body, var("x", Type::INT), false, &mut vars);
        tree.delete(body);
        assert!(tree.children(root).is_empty());
        assert!(tree.is_deleted(body));
        assert_eq!(tree.get_declared_variable(body, "x", false), None);
        let rebuilt = tree.child(root);
        assert_ne!(rebuilt, body);
        assert!(tree.is_within(rebuilt, root));
    }
}
