// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree rewrites that run once before the main check.

use tea_ast::expr::{Expr, ExprKind, Literal};
use tea_ast::stmt::{Block, ExprStmt, Stmt, StmtKind};

/// Turn the trailing code expression of a code-only template into a return.
///
/// A template that writes text never returns implicitly; its trailing
/// expressions are output like any other.
pub(super) fn convert_returns(body: &mut Block) {
    if writes_text(&body.stmts) {
        return;
    }
    convert_last(&mut body.stmts);
}

fn convert_last(stmts: &mut [Stmt]) {
    let Some(last) = stmts.iter_mut().rev().find(|s| !s.is_empty() && !is_blank_text(s)) else { return };
    let info = last.info;
    match &mut last.kind {
        StmtKind::Expr(es) if !es.text => {
            let expr = std::mem::replace(&mut es.expr, Expr::no_op(info));
            last.kind = StmtKind::Return(Some(expr));
        }
        StmtKind::List(inner) => convert_last(inner),
        StmtKind::Block(block) => convert_last(&mut block.stmts),
        StmtKind::If(stmt) => {
            for block in stmt.then_branch.iter_mut().chain(stmt.else_branch.iter_mut()) {
                convert_last(&mut block.stmts);
            }
        }
        _ => {}
    }
}

fn writes_text(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Expr(es) => es.text && !is_blank_text(stmt),
        StmtKind::List(inner) => writes_text(inner),
        StmtKind::Block(block) => writes_text(&block.stmts),
        StmtKind::If(s) => s.then_branch.iter().chain(s.else_branch.iter()).any(|b| writes_text(&b.stmts)),
        StmtKind::Foreach(f) => writes_text(&f.body.stmts),
        _ => false,
    })
}

/// Whitespace-only template text, such as the newline after a closing tag.
pub(super) fn is_blank_text(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Expr(ExprStmt { expr, text: true, .. }) => match &expr.kind {
            ExprKind::Literal(Literal::String(s)) => s.trim().is_empty(),
            _ => false,
        },
        _ => false,
    }
}

/// Split `a & b & c` output statements into one output per operand.
pub(super) fn split_concats(body: &mut Block) {
    split_in(&mut body.stmts);
}

fn split_in(stmts: &mut [Stmt]) {
    for stmt in stmts {
        let info = stmt.info;
        match &mut stmt.kind {
            StmtKind::Expr(es) if !es.text && matches!(es.expr.kind, ExprKind::Concat { .. }) => {
                let expr = std::mem::replace(&mut es.expr, Expr::no_op(info));
                let mut parts = Vec::new();
                flatten(expr, &mut parts);
                let outputs = parts
                    .into_iter()
                    .map(|part| {
                        let info = part.info;
                        Stmt::new(StmtKind::Expr(ExprStmt::new(part, false)), info)
                    })
                    .collect();
                stmt.kind = StmtKind::List(outputs);
            }
            StmtKind::List(inner) => split_in(inner),
            StmtKind::Block(block) => split_in(&mut block.stmts),
            StmtKind::If(s) => {
                for block in s.then_branch.iter_mut().chain(s.else_branch.iter_mut()) {
                    split_in(&mut block.stmts);
                }
            }
            StmtKind::Foreach(f) => split_in(&mut f.body.stmts),
            _ => {}
        }
    }
}

fn flatten(expr: Expr, out: &mut Vec<Expr>) {
    match expr.kind {
        ExprKind::Concat { left, right } => {
            flatten(*left, out);
            flatten(*right, out);
        }
        kind => out.push(Expr { kind, ..expr }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_ast::SourceInfo;

    fn text(s: &str) -> Stmt {
        let lit = Expr::literal(Literal::String(s.to_string()), SourceInfo::default());
        Stmt::new(StmtKind::Expr(ExprStmt::new(lit, true)), SourceInfo::default())
    }

    fn code(name: &str) -> Stmt {
        let var = Expr::new(ExprKind::Var(tea_ast::expr::VariableRef::new(name, SourceInfo::default())), SourceInfo::default());
        Stmt::new(StmtKind::Expr(ExprStmt::new(var, false)), SourceInfo::default())
    }

    fn concat(a: &str, b: &str, c: &str) -> Stmt {
        let var = |n: &str| {
            Box::new(Expr::new(ExprKind::Var(tea_ast::expr::VariableRef::new(n, SourceInfo::default())), SourceInfo::default()))
        };
        let inner = Expr::new(ExprKind::Concat { left: var(a), right: var(b) }, SourceInfo::default());
        let outer = Expr::new(ExprKind::Concat { left: Box::new(inner), right: var(c) }, SourceInfo::default());
        Stmt::new(StmtKind::Expr(ExprStmt::new(outer, false)), SourceInfo::default())
    }

    #[test]
    fn trailing_expression_becomes_return() {
        let mut body = Block::new(vec![code("a"), code("b")], SourceInfo::default());
        convert_returns(&mut body);
        assert!(matches!(body.stmts[0].kind, StmtKind::Expr(_)));
        assert!(matches!(body.stmts[1].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn text_templates_keep_their_output() {
        let mut body = Block::new(vec![text("Hello "), code("name")], SourceInfo::default());
        convert_returns(&mut body);
        assert!(matches!(body.stmts[1].kind, StmtKind::Expr(_)));

        let mut body = Block::new(vec![code("name"), text("\n")], SourceInfo::default());
        convert_returns(&mut body);
        assert!(matches!(body.stmts[0].kind, StmtKind::Return(_)));
    }

    #[test]
    fn concat_output_splits_into_operands() {
        let mut body = Block::new(vec![concat("a", "b", "c")], SourceInfo::default());
        split_concats(&mut body);
        let StmtKind::List(parts) = &body.stmts[0].kind else { panic!("expected list") };
        let names: Vec<_> = parts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(ExprStmt { expr, .. }) => match &expr.kind {
                    ExprKind::Var(r) => r.name.clone(),
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
