// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement type checking.

use tea_ast::expr::{Expr, VariableRef};
use tea_ast::stmt::{Assignment, Block, ExprStmt, Foreach, IfStmt, LoopKind, Stmt, StmtKind};
use tea_ast::{SourceInfo, Type, VarId, Variable};

use super::check_expr::string_of;
use super::errors::TypeError;
use super::narrowing::{self, Refinement};
use super::prepass::is_blank_text;
use super::{Check, TypeChecker};
use crate::scope::ScopeId;

impl<'a> TypeChecker<'a> {
    // ------------------------------------------------------------------------
    // Statement Checking
    // ------------------------------------------------------------------------

    pub(super) fn check_block(&mut self, block: &mut Block) -> Check {
        self.check_stmts(&mut block.stmts)
    }

    /// Check a statement sequence, reporting the first statement that
    /// control can never reach.
    fn check_stmts(&mut self, stmts: &mut [Stmt]) -> Check {
        let mut broken = false;
        let mut reported = false;
        for stmt in stmts.iter_mut() {
            if broken && !reported && !stmt.is_empty() && !is_blank_text(stmt) {
                self.error(TypeError::Unreachable { info: stmt.info });
                reported = true;
            }
            self.check_stmt(stmt)?;
            broken = broken || stmt.is_break();
        }
        Ok(())
    }

    pub(super) fn check_stmt(&mut self, stmt: &mut Stmt) -> Check {
        let info = stmt.info;
        match &mut stmt.kind {
            StmtKind::Empty => {}
            StmtKind::List(stmts) => self.check_stmts(stmts)?,
            StmtKind::Block(block) => self.check_block(block)?,
            StmtKind::Assign(assign) => self.check_assignment(assign)?,
            StmtKind::Break => self.check_loop_keyword("break", info),
            StmtKind::Continue => self.check_loop_keyword("continue", info),
            StmtKind::Return(value) => self.check_return(value.as_mut(), info)?,
            StmtKind::Substitution => {
                if !self.subst_param {
                    self.error(TypeError::NoSubstitutionParam { info });
                }
            }
            StmtKind::Expr(output) => self.check_output(output)?,
            StmtKind::If(if_stmt) => self.check_if(if_stmt)?,
            StmtKind::Foreach(foreach) => self.check_foreach(foreach)?,
            StmtKind::ExceptionGuard(guard) => {
                self.check_stmt(&mut guard.guarded)?;
                if let Some(replacement) = &mut guard.replacement {
                    self.check_stmt(replacement)?;
                }
            }
        }
        Ok(())
    }

    fn check_loop_keyword(&mut self, keyword: &'static str, info: SourceInfo) {
        if self.loop_depth == 0 {
            self.error(TypeError::OutsideLoop { keyword, info });
        }
    }

    // ------------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------------

    fn check_assignment(&mut self, assign: &mut Assignment) -> Check {
        self.check_expr(&mut assign.value)?;
        let name = assign.target.name.clone();
        let info = assign.target.info;

        if let Some(existing) = self.scopes.get_declared_variable(self.scope, &name, false) {
            if self.loop_vars.contains(&existing) {
                self.error(TypeError::LoopVariableAssigned { name: name.clone(), info });
            }
        }

        let value_ty = assign.value.ty().cloned();
        let declared = match &assign.declared {
            Some(type_name) => self.resolve_type_name(type_name),
            None => None,
        };
        let static_var = self
            .scopes
            .get_declared_variable(self.scope, &name, true)
            .map(|id| self.var(id).cloned())
            .transpose()?
            .filter(|var| var.is_statically_typed);

        let Some(value_ty) = value_ty else {
            // Keep the name declared so later uses do not cascade.
            let fallback = assign.forced.clone().or(declared).or(static_var.map(|v| v.ty));
            let statically = fallback.is_some();
            self.define_variable(&mut assign.target, fallback.unwrap_or(Type::OBJECT), statically);
            return Ok(());
        };
        if value_ty.is_void() {
            self.error(TypeError::NoValue { info: assign.value.info });
            self.define_variable(&mut assign.target, Type::OBJECT, false);
            return Ok(());
        }

        let (ty, cast, statically) = if let Some(forced) = &assign.forced {
            (forced.clone(), self.classes.is_narrowing(forced, &value_ty), false)
        } else if let Some(declared) = declared {
            if value_ty.is_null() && declared.is_primitive() {
                self.error(TypeError::NullToPrimitive { ty: self.describe(&declared), info: assign.value.info });
            } else if !self.classes.castable(&declared, &value_ty) {
                self.error(TypeError::IllegalCast {
                    from: self.describe(&value_ty),
                    to: self.describe(&declared),
                    info: assign.value.info,
                });
            }
            (declared, true, assign.is_define)
        } else if let Some(var) = static_var {
            if self.classes.convertable_from(&var.ty, &value_ty) < 0 {
                self.error(TypeError::Mismatch {
                    expected: self.describe(&var.ty),
                    found: self.describe(&value_ty),
                    info: assign.value.info,
                });
            }
            (var.ty, false, true)
        } else {
            (self.inferred_type(&value_ty), false, false)
        };

        let ty = if self.options.exception_guards && assign.value.may_throw() {
            // A guard recovers by assigning null.
            ty.to_nullable()
        } else {
            ty
        };
        let cast = cast && self.classes.is_narrowing(&ty, &value_ty);
        assign.value.convert_to(ty.clone(), cast);
        self.define_variable(&mut assign.target, ty, statically);
        Ok(())
    }

    /// The type a variable takes from a value when nothing is declared.
    fn inferred_type(&self, value: &Type) -> Type {
        if value.is_null() {
            Type::OBJECT
        } else if value.is_char() {
            string_of(Some(value))
        } else {
            value.clone()
        }
    }

    // ------------------------------------------------------------------------
    // Output and Return
    // ------------------------------------------------------------------------

    /// Bind an output statement to the context `print` overload for its value.
    fn check_output(&mut self, output: &mut ExprStmt) -> Check {
        output.receiver = None;
        let ty = if output.text {
            output.expr.set_type(Type::STRING.to_non_null());
            Type::STRING.to_non_null()
        } else {
            self.check_expr(&mut output.expr)?;
            match output.expr.ty() {
                Some(ty) if !ty.is_void() => ty.clone(),
                _ => return Ok(()),
            }
        };

        let ty = if ty.is_null() { Type::STRING } else { ty };
        let (param, member) = match self.classes.function(self.context, "print", &[ty.clone()], false) {
            Ok(print) => (print.params.into_iter().next(), Some(print.member)),
            Err(_) => {
                let string = string_of(Some(&ty));
                let print = self.classes.function(self.context, "print", &[string.clone()], false);
                let member = print.ok().map(|m| m.member);
                (Some(string), member)
            }
        };
        if let Some(param) = param {
            output.expr.convert_to(param, false);
        }
        output.receiver = member;
        Ok(())
    }

    fn check_return(&mut self, value: Option<&mut Expr>, info: SourceInfo) -> Check {
        let ty = match value {
            Some(expr) => {
                self.check_expr(expr)?;
                let Some(ty) = expr.ty().cloned() else { return Ok(()) };
                if ty.is_char() {
                    let string = string_of(Some(&ty));
                    expr.convert_to(string.clone(), false);
                    string
                } else {
                    ty
                }
            }
            None => Type::VOID,
        };
        self.return_type = match self.return_type.take() {
            None => Some((ty, info)),
            Some((current, first)) => match self.classes.compatible_type(&current, &ty) {
                Some(common) => Some((common, first)),
                None => {
                    self.error(TypeError::NoCommonReturnType {
                        first: self.describe(&current),
                        second: self.describe(&ty),
                        info,
                    });
                    Some((current, first))
                }
            },
        };
        Ok(())
    }

    /// Settle the template's return type and convert every returned value to it.
    pub(super) fn finish_return_type(&mut self, body: &mut Block) -> Check<Type> {
        let ty = match self.return_type.take() {
            Some((ty, _)) if ty.is_null() => Type::OBJECT,
            Some((ty, _)) => ty,
            None => Type::VOID,
        };
        if !ty.is_void() {
            convert_returns_to(&mut body.stmts, &ty);
        }
        Ok(ty)
    }

    // ------------------------------------------------------------------------
    // Conditionals
    // ------------------------------------------------------------------------

    fn check_if(&mut self, stmt: &mut IfStmt) -> Check {
        self.check_expr(&mut stmt.cond)?;
        self.require_boolean(&mut stmt.cond);
        let refinements = narrowing::detect(&stmt.cond);

        stmt.merged.clear();
        for block in stmt.then_branch.iter_mut().chain(stmt.else_branch.iter_mut()) {
            block.finalizer.clear();
        }

        let parent = self.scope;
        let then_scope = self.scopes.child(parent);
        self.apply_refinements(then_scope, &refinements.when_true)?;
        if let Some(block) = &mut stmt.then_branch {
            self.in_scope(then_scope, |checker| checker.check_block(block))?;
        }
        let else_scope = self.scopes.child(parent);
        self.apply_refinements(else_scope, &refinements.when_false)?;
        if let Some(block) = &mut stmt.else_branch {
            self.in_scope(else_scope, |checker| checker.check_block(block))?;
        }

        let mut merged = self.scopes.intersect(then_scope, else_scope, &mut self.vars, self.classes);
        if merged.is_empty() {
            return Ok(());
        }
        if self.options.exception_guards && stmt.cond.may_throw() {
            // A guard recovers by assigning null to each merged variable.
            for id in &mut merged {
                *id = self.nullable_variable(*id)?;
            }
        }
        tracing::debug!(count = merged.len(), line = stmt.cond.info.line, "merged branch variables");

        if stmt.else_branch.is_none() {
            stmt.else_branch = Some(Block::new(Vec::new(), stmt.cond.info));
        }
        let branches = [(stmt.then_branch.as_mut(), then_scope), (stmt.else_branch.as_mut(), else_scope)];
        for (block, scope) in branches {
            let Some(block) = block else { continue };
            if block.is_break() {
                continue;
            }
            for &id in &merged {
                let name = self.var(id)?.name.clone();
                let Some(at_end) = self.scopes.get_declared_variable(scope, &name, true) else { continue };
                if at_end != id {
                    block.finalizer.push(self.conversion_assign(id, at_end, block.info)?);
                }
            }
        }
        for &id in &merged {
            let name = self.var(id)?.name.clone();
            self.scopes.declare_existing(parent, &name, id, false);
        }
        stmt.merged = merged;
        Ok(())
    }

    /// The pooled peer of `id` whose type admits null.
    fn nullable_variable(&mut self, id: VarId) -> Check<VarId> {
        let var = self.var(id)?;
        if !var.ty.is_non_null() {
            return Ok(id);
        }
        let mut nullable = Variable::new(var.name.clone(), var.ty.to_nullable(), var.info);
        nullable.is_field = var.is_field;
        Ok(self.scopes.pooled(nullable, &mut self.vars))
    }

    /// Declare narrowed shadows of refined variables in a branch scope.
    fn apply_refinements(&mut self, scope: ScopeId, refinements: &[(String, Refinement)]) -> Check {
        for (name, refinement) in refinements {
            let Some(current) = self.scopes.get_declared_variable(scope, name, false) else { continue };
            let var = self.var(current)?;
            if var.ty.is_primitive() || var.ty.is_null() {
                continue;
            }
            let narrowed = match refinement {
                Refinement::NonNull => var.ty.to_non_null(),
                Refinement::Isa(target) if self.classes.is_reference_assignable(target, &var.ty) => {
                    var.ty.to_non_null()
                }
                Refinement::Isa(target) => target.to_non_null(),
            };
            if narrowed == var.ty {
                continue;
            }
            let shadow = Variable::new(name.clone(), narrowed, var.info);
            self.scopes.declare_variable(scope, shadow, true, &mut self.vars);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Loops
    // ------------------------------------------------------------------------

    fn check_foreach(&mut self, foreach: &mut Foreach) -> Check {
        foreach.initializer.clear();
        foreach.body.initializer.clear();
        foreach.body.finalizer.clear();

        self.check_expr(&mut foreach.range)?;
        let element = if foreach.end.is_some() {
            self.range_element(foreach)?
        } else {
            self.collection_element(foreach)
        };
        let element = element.unwrap_or(Type::OBJECT);

        let var_ref = &mut foreach.var;
        self.loop_depth += 1;
        let promotion = self.check_repeated(&mut foreach.body, |checker, scope| {
            checker.declare_loop_var(scope, var_ref, element.clone());
            Ok(())
        });
        self.loop_depth -= 1;
        if let Some(id) = foreach.var.var {
            self.loop_vars.retain(|&v| v != id);
        }
        let promotion = promotion?;

        if promotion.replaced.is_empty() {
            return Ok(());
        }
        let breaks = foreach.body.is_break();
        let attachments = self.promotion_attachments(&promotion, breaks, foreach.range.info)?;
        foreach.initializer = attachments.initializer;
        foreach.body.finalizer = attachments.finalizer;
        Ok(())
    }

    fn declare_loop_var(&mut self, scope: ScopeId, var_ref: &mut VariableRef, element: Type) {
        if let Some(previous) = var_ref.var {
            self.loop_vars.retain(|&v| v != previous);
        }
        let var = Variable::new(var_ref.name.clone(), element, var_ref.info);
        let id = self.scopes.declare_variable(scope, var, true, &mut self.vars);
        var_ref.var = Some(id);
        self.loop_vars.push(id);
    }

    /// Element type of `start .. end`: `long` if either bound is, else `int`.
    fn range_element(&mut self, foreach: &mut Foreach) -> Check<Option<Type>> {
        let Some(end) = foreach.end.as_mut() else { return Ok(None) };
        self.check_expr(end)?;
        foreach.kind = Some(LoopKind::Range);
        let start = &mut foreach.range;
        let (Some(a), Some(b)) = (start.ty().cloned(), end.ty().cloned()) else { return Ok(None) };
        let mut valid = true;
        for (bound, ty) in [(&*start, &a), (&*end, &b)] {
            if !ty.is_numeric() {
                self.error(TypeError::RangeBound { found: self.describe(ty), info: bound.info });
                valid = false;
            }
        }
        if !valid {
            return Ok(None);
        }
        let element = if a.numeric_rank() == Type::LONG.numeric_rank() || b.numeric_rank() == Type::LONG.numeric_rank() {
            Type::LONG
        } else {
            Type::INT
        };
        let narrowing_start = self.classes.is_narrowing(&element, &a);
        let narrowing_end = self.classes.is_narrowing(&element, &b);
        start.convert_to(element.clone(), narrowing_start);
        end.convert_to(element.clone(), narrowing_end);
        Ok(Some(element))
    }

    /// Element type of an array or iterable range, honoring `as T`.
    fn collection_element(&mut self, foreach: &mut Foreach) -> Option<Type> {
        let ty = foreach.range.ty().cloned()?;
        let natural = if let Some(elem) = ty.array_elem() {
            foreach.kind = Some(LoopKind::Array);
            elem.clone()
        } else if let Some(elem) = self.classes.iteration_element(&ty) {
            foreach.kind = Some(LoopKind::Iterable);
            elem
        } else {
            self.error(TypeError::NotIterable { ty: self.describe(&ty), info: foreach.range.info });
            return None;
        };
        if foreach.reverse && !self.classes.supports_reverse(&ty) {
            self.error(TypeError::ReverseUnsupported { ty: self.describe(&ty), info: foreach.range.info });
        }
        let Some(type_name) = &foreach.elem_type else { return Some(natural) };
        let Some(declared) = self.resolve_type_name(type_name) else { return Some(natural) };
        if !self.classes.castable(&declared, &natural) {
            self.error(TypeError::ElementMismatch {
                declared: self.describe(&declared),
                element: self.describe(&natural),
                info: type_name.info,
            });
        }
        Some(declared)
    }

    // ------------------------------------------------------------------------
    // Substitution Blocks
    // ------------------------------------------------------------------------

    /// Check a block passed to a call. It runs once per `...` in the callee,
    /// so it is checked like a loop body but `break` cannot leave it.
    pub(super) fn check_subst_block(&mut self, block: &mut Block) -> Check {
        block.initializer.clear();
        block.finalizer.clear();
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);
        let promotion = self.check_repeated(block, |checker, scope| {
            checker.subst_scopes.retain(|&s| !checker.scopes.is_deleted(s));
            checker.subst_scopes.push(scope);
            Ok(())
        });
        self.subst_scopes.pop();
        self.loop_depth = saved_depth;
        let promotion = promotion?;

        let info = block.info;
        let attachments = self.promotion_attachments(&promotion, block.is_break(), info)?;
        for id in attachments.promoted.iter().chain(promotion.replaced.values()) {
            self.var_mut(*id)?.is_field = true;
        }
        block.initializer = attachments.initializer;
        block.finalizer = attachments.finalizer;
        Ok(())
    }
}

fn convert_returns_to(stmts: &mut [Stmt], ty: &Type) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::Return(Some(expr)) => expr.convert_to(ty.clone(), false),
            StmtKind::List(inner) => convert_returns_to(inner, ty),
            StmtKind::Block(block) => convert_returns_to(&mut block.stmts, ty),
            StmtKind::If(s) => {
                for block in s.then_branch.iter_mut().chain(s.else_branch.iter_mut()) {
                    convert_returns_to(&mut block.stmts, ty);
                }
            }
            StmtKind::Foreach(f) => convert_returns_to(&mut f.body.stmts, ty),
            StmtKind::ExceptionGuard(guard) => convert_returns_to(std::slice::from_mut(&mut guard.guarded), ty),
            _ => {}
        }
    }
}

