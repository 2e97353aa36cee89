// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Exception guard insertion.
//!
//! Runs after checking. Wraps every statement that can raise a host
//! exception so that execution resumes at the next statement; types
//! computed by the checker are left untouched.

use tea_ast::expr::{Expr, ExprKind, Literal, VariableRef};
use tea_ast::stmt::{Assignment, Block, ExceptionGuard, Stmt, StmtKind};
use tea_ast::{SourceInfo, VarArena, VarId};

pub(super) fn insert_guards(body: &mut Block, vars: &VarArena) {
    guard_all(&mut body.stmts, vars);
}

fn guard_all(stmts: &mut [Stmt], vars: &VarArena) {
    for stmt in stmts {
        guard(stmt, vars);
    }
}

fn guard(stmt: &mut Stmt, vars: &VarArena) {
    match &mut stmt.kind {
        StmtKind::List(stmts) => return guard_all(stmts, vars),
        StmtKind::Block(block) => return guard_all(&mut block.stmts, vars),
        StmtKind::ExceptionGuard(_) => return,
        StmtKind::If(s) => {
            for block in s.then_branch.iter_mut().chain(s.else_branch.iter_mut()) {
                guard_all(&mut block.stmts, vars);
            }
        }
        StmtKind::Foreach(f) => guard_all(&mut f.body.stmts, vars),
        _ => {}
    }

    let info = stmt.info;
    let replacement = match &stmt.kind {
        StmtKind::Assign(assign) if assign.value.may_throw() => {
            Some(assign.target.var.and_then(|id| assign_null(id, vars, info)))
        }
        StmtKind::If(s) if s.cond.may_throw() => {
            let resets: Vec<Stmt> = s.merged.iter().filter_map(|&id| assign_null(id, vars, info)).collect();
            Some((!resets.is_empty()).then(|| Stmt::list(resets, info)))
        }
        StmtKind::Foreach(f) if f.range.may_throw() || f.end.as_ref().is_some_and(Expr::may_throw) => Some(None),
        StmtKind::Expr(output) if !output.text && output.expr.may_throw() => Some(None),
        StmtKind::Substitution => Some(None),
        _ => None,
    };
    let Some(replacement) = replacement else { return };

    tracing::trace!(line = info.line, "guarding statement");
    let guarded = std::mem::replace(stmt, Stmt::empty(info));
    *stmt = Stmt::new(StmtKind::ExceptionGuard(Box::new(ExceptionGuard { guarded, replacement })), info);
}

/// `var = null`, when the variable's type admits null.
fn assign_null(id: VarId, vars: &VarArena, info: SourceInfo) -> Option<Stmt> {
    let var = vars.get(id)?;
    if var.ty.is_non_null() {
        return None;
    }
    let mut null = Expr::new(ExprKind::Literal(Literal::Null), info);
    null.set_type(tea_ast::Type::NULL);
    null.convert_to(var.ty.clone(), false);
    let mut assign = Assignment::new(VariableRef::bound(var.name.clone(), info, id), null);
    assign.forced = Some(var.ty.clone());
    Some(Stmt::new(StmtKind::Assign(assign), info))
}
