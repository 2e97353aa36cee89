// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Constant folding and dead code elimination over checked templates.

use std::cmp::Ordering;

use tea_ast::expr::{Expr, ExprKind, RelOp};
use tea_ast::stmt::{Block, ExprStmt, Foreach, IfStmt, LoopKind, Stmt, StmtKind};
use tea_ast::{SourceInfo, Template, Type};

use crate::constant::{constant_of, Constant};

/// Folds constant expressions and drops statements that can never run.
///
/// Expects a template the type checker accepted: rewrites rely on every
/// expression carrying its type and conversion chain. Running the optimizer
/// on its own output changes nothing.
#[derive(Debug, Default)]
pub struct BasicOptimizer {
    rewrites: usize,
}

/// What to do with an expression after its operands are optimized.
enum Fold {
    Keep,
    /// Replace the expression's kind by this constant.
    Value(Constant),
    /// Replace the expression by this one, keeping the outer conversions.
    Replace(Expr),
}

impl BasicOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rewrites made so far.
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }

    pub fn optimize(&mut self, template: &mut Template) {
        let _span = tracing::info_span!("optimize", template = %template.name).entered();
        let before = self.rewrites;
        let body = std::mem::take(&mut template.body);
        template.body = self.block(body);
        tracing::debug!(rewrites = self.rewrites - before, "optimized template");
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self, block: Block) -> Block {
        Block {
            stmts: self.stmts(block.stmts),
            initializer: self.stmts(block.initializer),
            finalizer: self.stmts(block.finalizer),
            info: block.info,
        }
    }

    fn stmts(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            match self.stmt(stmt) {
                Some(Stmt { kind: StmtKind::List(inner), .. }) => out.extend(inner),
                Some(stmt) => out.push(stmt),
                None => {}
            }
        }
        out
    }

    /// Optimize one statement; `None` when it disappears.
    fn stmt(&mut self, stmt: Stmt) -> Option<Stmt> {
        let info = stmt.info;
        match stmt.kind {
            StmtKind::Empty => None,
            StmtKind::List(stmts) => collapse(self.stmts(stmts), info),
            StmtKind::Block(block) => {
                let block = self.block(block);
                block_stmt(block, info)
            }
            StmtKind::Assign(mut assign) => {
                self.expr(&mut assign.value);
                Some(Stmt::new(StmtKind::Assign(assign), info))
            }
            StmtKind::Foreach(foreach) => Some(self.foreach(*foreach, info)),
            StmtKind::If(if_stmt) => self.if_stmt(*if_stmt, info),
            StmtKind::Expr(output) => self.output(output, info),
            StmtKind::Return(mut value) => {
                if let Some(value) = value.as_mut() {
                    self.expr(value);
                }
                Some(Stmt::new(StmtKind::Return(value), info))
            }
            StmtKind::ExceptionGuard(mut guard) => {
                guard.guarded = self.stmt(guard.guarded)?;
                guard.replacement = guard.replacement.and_then(|r| self.stmt(r));
                Some(Stmt::new(StmtKind::ExceptionGuard(guard), info))
            }
            kind @ (StmtKind::Break | StmtKind::Continue | StmtKind::Substitution) => {
                Some(Stmt::new(kind, info))
            }
        }
    }

    fn foreach(&mut self, mut foreach: Foreach, info: SourceInfo) -> Stmt {
        self.expr(&mut foreach.range);
        if let Some(end) = foreach.end.as_mut() {
            self.expr(end);
        }
        foreach.initializer = self.stmts(std::mem::take(&mut foreach.initializer));

        if is_empty_range(&foreach) {
            // The loop variable still takes the start value.
            tracing::trace!(line = info.line, "dropping body of empty range");
            if !foreach.body.is_empty() {
                self.rewrites += 1;
            }
            foreach.body = Block::new(Vec::new(), foreach.body.info);
        } else {
            foreach.body = self.block(std::mem::take(&mut foreach.body));
        }
        Stmt::new(StmtKind::Foreach(Box::new(foreach)), info)
    }

    fn if_stmt(&mut self, mut if_stmt: IfStmt, info: SourceInfo) -> Option<Stmt> {
        self.expr(&mut if_stmt.cond);
        let then_branch = self.branch(if_stmt.then_branch.take());
        let else_branch = self.branch(if_stmt.else_branch.take());

        if let Some(taken) = constant_of(&if_stmt.cond).and_then(|c| c.as_bool()) {
            tracing::trace!(line = info.line, taken, "folding constant condition");
            self.rewrites += 1;
            let branch = if taken { then_branch } else { else_branch };
            return branch.and_then(|block| block_stmt(block, info));
        }

        match (then_branch, else_branch) {
            (None, None) if !if_stmt.cond.may_throw() => {
                self.rewrites += 1;
                return None;
            }
            (None, None) => {
                if_stmt.then_branch = Some(Block::new(Vec::new(), info));
            }
            (None, Some(else_branch)) => {
                self.rewrites += 1;
                let cond = std::mem::replace(&mut if_stmt.cond, Expr::no_op(info));
                if_stmt.cond = negated(cond);
                if_stmt.then_branch = Some(else_branch);
            }
            (then_branch, else_branch) => {
                if_stmt.then_branch = then_branch;
                if_stmt.else_branch = else_branch;
            }
        }
        Some(Stmt::new(StmtKind::If(Box::new(if_stmt)), info))
    }

    fn branch(&mut self, block: Option<Block>) -> Option<Block> {
        block.map(|b| self.block(b)).filter(|b| !b.is_empty())
    }

    fn output(&mut self, mut output: ExprStmt, info: SourceInfo) -> Option<Stmt> {
        if !output.text {
            self.expr(&mut output.expr);
            if matches!(constant_of(&output.expr), Some(Constant::String(ref s)) if s.is_empty()) {
                self.rewrites += 1;
                return None;
            }
        }
        Some(Stmt::new(StmtKind::Expr(output), info))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, expr: &mut Expr) {
        self.operands(expr);
        match self.fold(expr) {
            Fold::Keep => {}
            Fold::Value(value) => {
                expr.kind = ExprKind::Literal(value.to_literal());
                self.rewrites += 1;
            }
            Fold::Replace(inner) => {
                splice(expr, inner);
                self.rewrites += 1;
            }
        }
    }

    fn operands(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::NoOp => {}
            ExprKind::Lookup { expr, .. }
            | ExprKind::Spread { expr, .. }
            | ExprKind::Paren(expr)
            | ExprKind::Negate(expr)
            | ExprKind::Not(expr)
            | ExprKind::Isa { expr, .. } => self.expr(expr),
            ExprKind::ArrayLookup { expr, index, .. } => {
                self.expr(expr);
                self.expr(index);
            }
            ExprKind::Concat { left, right }
            | ExprKind::Arith { left, right, .. }
            | ExprKind::Relational { left, right, .. }
            | ExprKind::Compare { left, right }
            | ExprKind::And { left, right }
            | ExprKind::Or { left, right } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Ternary { cond, then_expr, else_expr } => {
                self.expr(cond);
                self.expr(then_expr);
                self.expr(else_expr);
            }
            ExprKind::NewArray { elems, .. } => {
                for elem in elems {
                    self.expr(elem);
                }
            }
            ExprKind::Call(call) | ExprKind::TemplateCall(call) => {
                if let Some(target) = call.target.as_deref_mut() {
                    self.expr(target);
                }
                for arg in &mut call.args {
                    self.expr(arg);
                }
                if let Some(subst) = call.subst.take() {
                    call.subst = Some(self.block(subst));
                }
            }
        }
    }

    fn fold(&mut self, expr: &mut Expr) -> Fold {
        let initial = expr.initial_type.clone();
        let fits = |candidate: &Expr| candidate.ty() == initial.as_ref();
        let fold = match &mut expr.kind {
            ExprKind::Paren(inner) if fits(&**inner) => Fold::Replace(take(inner)),

            ExprKind::Negate(inner) => match constant_of(inner) {
                Some(value) => value.negate().map_or(Fold::Keep, Fold::Value),
                None => match &mut inner.kind {
                    ExprKind::Negate(x) if fits(&**x) => Fold::Replace(take(x)),
                    _ => Fold::Keep,
                },
            },

            ExprKind::Not(inner) => match constant_of(inner).and_then(|c| c.as_bool()) {
                Some(b) => Fold::Value(Constant::Bool(!b)),
                None => match &mut inner.kind {
                    ExprKind::Not(x) if fits(&**x) => Fold::Replace(take(x)),
                    _ => Fold::Keep,
                },
            },

            ExprKind::Concat { left, right } => match (constant_of(left), constant_of(right)) {
                (Some(l), Some(r)) => Fold::Value(Constant::String(l.java_string() + &r.java_string())),
                (Some(Constant::String(l)), None) if l.is_empty() && fits(&**right) => Fold::Replace(take(right)),
                (None, Some(Constant::String(r))) if r.is_empty() && fits(&**left) => Fold::Replace(take(left)),
                _ => Fold::Keep,
            },

            ExprKind::Arith { op, left, right } => match (constant_of(left), constant_of(right)) {
                (Some(l), Some(r)) => l.arith(*op, &r).map_or(Fold::Keep, Fold::Value),
                _ => Fold::Keep,
            },

            ExprKind::Relational { op, left, right } => {
                fold_relational(*op, left, right, &fits)
            }

            ExprKind::Compare { left, right } => match (constant_of(left), constant_of(right)) {
                (Some(l), Some(r)) => l.compare(&r).map_or(Fold::Keep, |c| Fold::Value(Constant::Int(c))),
                _ => Fold::Keep,
            },

            ExprKind::And { left, right } => {
                match (constant_of(left).and_then(|c| c.as_bool()), constant_of(right).and_then(|c| c.as_bool())) {
                    (Some(false), _) => Fold::Value(Constant::Bool(false)),
                    (Some(true), _) if fits(&**right) => Fold::Replace(take(right)),
                    (None, Some(true)) if fits(&**left) => Fold::Replace(take(left)),
                    _ => Fold::Keep,
                }
            }

            ExprKind::Or { left, right } => {
                match (constant_of(left).and_then(|c| c.as_bool()), constant_of(right).and_then(|c| c.as_bool())) {
                    (Some(true), _) => Fold::Value(Constant::Bool(true)),
                    (Some(false), _) if fits(&**right) => Fold::Replace(take(right)),
                    (None, Some(false)) if fits(&**left) => Fold::Replace(take(left)),
                    _ => Fold::Keep,
                }
            }

            ExprKind::Ternary { cond, then_expr, else_expr } => {
                match constant_of(cond).and_then(|c| c.as_bool()) {
                    Some(true) if fits(&**then_expr) => Fold::Replace(take(then_expr)),
                    Some(false) if fits(&**else_expr) => Fold::Replace(take(else_expr)),
                    _ => Fold::Keep,
                }
            }

            _ => Fold::Keep,
        };

        // A folded constant must have the type the expression had.
        match fold {
            Fold::Value(value) if Some(&value.to_literal().ty()) != initial.as_ref() => Fold::Keep,
            fold => fold,
        }
    }
}

fn fold_relational(op: RelOp, left: &mut Box<Expr>, right: &mut Box<Expr>, fits: &dyn Fn(&Expr) -> bool) -> Fold {
    let (l, r) = (constant_of(left), constant_of(right));
    if let (Some(l), Some(r)) = (&l, &r) {
        let result = if op.is_equality() {
            l.equals(r).map(|eq| eq == (op == RelOp::Eq))
        } else {
            l.ordering(r).map(|order| match op {
                RelOp::Lt => order == Ordering::Less,
                RelOp::Le => order != Ordering::Greater,
                RelOp::Gt => order == Ordering::Greater,
                _ => order != Ordering::Less,
            })
        };
        return result.map_or(Fold::Keep, |b| Fold::Value(Constant::Bool(b)));
    }
    if !op.is_equality() {
        return Fold::Keep;
    }

    // One constant side against a non-constant one.
    let (constant, other) = match (l, r) {
        (Some(c), None) => (c, right),
        (None, Some(c)) => (c, left),
        _ => return Fold::Keep,
    };
    match constant {
        Constant::Bool(b) if other.ty().is_some_and(Type::is_boolean) && fits(&**other) => {
            let other = take(other);
            if b == (op == RelOp::Eq) {
                Fold::Replace(other)
            } else {
                Fold::Replace(negated(other))
            }
        }
        Constant::Null if matches!(other.kind, ExprKind::Var(_)) && other.ty().is_some_and(Type::is_non_null) => {
            Fold::Value(Constant::Bool(op == RelOp::Ne))
        }
        _ => Fold::Keep,
    }
}

/// Whether a range loop over two constant bounds runs zero times.
fn is_empty_range(foreach: &Foreach) -> bool {
    if foreach.kind != Some(LoopKind::Range) {
        return false;
    }
    let Some(end) = foreach.end.as_ref() else { return false };
    match (constant_of(&foreach.range), constant_of(end)) {
        (Some(start), Some(end)) => start.ordering(&end) == Some(Ordering::Greater),
        _ => false,
    }
}

/// A block as one statement. Blocks with attachments stay blocks.
fn block_stmt(block: Block, info: SourceInfo) -> Option<Stmt> {
    if block.has_attachments() {
        return Some(Stmt::new(StmtKind::Block(block), info));
    }
    collapse(block.stmts, info)
}

/// A statement sequence as one statement.
fn collapse(mut stmts: Vec<Stmt>, info: SourceInfo) -> Option<Stmt> {
    match stmts.len() {
        0 => None,
        1 => stmts.pop(),
        _ => Some(Stmt::list(stmts, info)),
    }
}

/// The boolean negation of `cond`, without stacking `not`s.
fn negated(mut cond: Expr) -> Expr {
    if let ExprKind::Not(inner) = &mut cond.kind {
        let inner = take(inner);
        if inner.ty() == cond.initial_type.as_ref() {
            splice(&mut cond, inner);
            return cond;
        }
        cond.kind = ExprKind::Not(Box::new(inner));
    }
    let ty = cond.ty().cloned().unwrap_or(Type::BOOLEAN);
    let info = cond.info;
    let mut not = Expr::new(ExprKind::Not(Box::new(cond)), info);
    not.set_type(ty);
    not
}

fn take(expr: &mut Box<Expr>) -> Expr {
    let info = expr.info;
    std::mem::replace(expr.as_mut(), Expr::no_op(info))
}

/// Put `inner` in place of `outer`, then apply the conversions `outer` had.
fn splice(outer: &mut Expr, mut inner: Expr) {
    for conv in std::mem::take(&mut outer.conversions) {
        inner.convert_to(conv.to, conv.cast_preferred);
    }
    *outer = inner;
}
