// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Re-checking bodies that may run zero or many times.
//!
//! A loop body or substitution block is checked in a child scope. Variables
//! it reassigns are promoted to their common type with the enclosing scope;
//! when that changes what the enclosing scope sees, the body is checked
//! again against the new declarations until nothing changes.

use indexmap::IndexMap;
use tea_ast::stmt::{Block, Stmt};
use tea_ast::{SourceInfo, VarId};

use super::{Check, TypeChecker};
use crate::scope::ScopeId;

/// Upper bound on re-checks of one body.
const MAX_ROUNDS: usize = 8;

/// Outcome of checking a repeated body.
pub(super) struct Promotion {
    /// Scope of the final check of the body.
    pub body_scope: ScopeId,
    /// Per promoted name, the variable the enclosing scope saw before.
    pub replaced: IndexMap<String, VarId>,
}

/// Conversions keeping promoted variables at one type across repetitions.
pub(super) struct Attachments {
    pub initializer: Vec<Stmt>,
    pub finalizer: Vec<Stmt>,
    /// The promoted variables as the enclosing scope now sees them.
    pub promoted: Vec<VarId>,
}

impl<'a> TypeChecker<'a> {
    /// Check `body` in a fresh child scope until promotion settles.
    ///
    /// `enter` runs at the start of every round to declare the body's own
    /// variables, such as a loop variable.
    pub(super) fn check_repeated(
        &mut self,
        body: &mut Block,
        mut enter: impl FnMut(&mut Self, ScopeId) -> Check,
    ) -> Check<Promotion> {
        let parent = self.scope;
        let mut replaced: IndexMap<String, VarId> = IndexMap::new();
        let mut round = 0;
        loop {
            round += 1;
            let body_scope = self.scopes.child(parent);
            enter(self, body_scope)?;
            self.in_scope(body_scope, |checker| checker.check_block(body))?;

            let mut changed = false;
            for id in self.scopes.promote(body_scope, &mut self.vars, self.classes) {
                let name = self.var(id)?.name.clone();
                let Some(outer) = self.scopes.get_declared_variable(parent, &name, true) else { continue };
                if outer == id {
                    continue;
                }
                replaced.entry(name.clone()).or_insert(outer);
                self.scopes.declare_existing(parent, &name, id, false);
                changed = true;
            }

            if !changed {
                return Ok(Promotion { body_scope, replaced });
            }
            if round == MAX_ROUNDS {
                tracing::warn!(round, "variable promotion did not settle");
                return Ok(Promotion { body_scope, replaced });
            }
            tracing::debug!(round, promoted = replaced.len(), "re-checking body after promotion");
            self.scopes.delete(body_scope);
        }
    }

    /// Build the entry and end-of-body conversions for a promotion.
    pub(super) fn promotion_attachments(
        &self,
        promotion: &Promotion,
        body_breaks: bool,
        info: SourceInfo,
    ) -> Check<Attachments> {
        let mut out = Attachments { initializer: Vec::new(), finalizer: Vec::new(), promoted: Vec::new() };
        for (name, &before) in &promotion.replaced {
            let Some(current) = self.scopes.get_declared_variable(self.scope, name, true) else { continue };
            out.promoted.push(current);
            if current != before {
                out.initializer.push(self.conversion_assign(current, before, info)?);
            }
            if body_breaks {
                continue;
            }
            if let Some(at_end) = self.scopes.get_declared_variable(promotion.body_scope, name, true) {
                out.finalizer.push(self.conversion_assign(current, at_end, info)?);
            }
        }
        Ok(out)
    }
}
