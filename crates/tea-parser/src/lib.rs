// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for Tea templates.
//!
//! Transforms the scanner's token stream into a `Template` tree.

mod error;
mod hints;
mod parser;

pub use error::ParseError;
pub use parser::Parser;

use tea_ast::Template;
use tea_diagnostics::Reporter;
use tea_lexer::{ScanMode, Scanner};

/// Scan and parse a complete template source.
pub fn parse_template(source: &str, reporter: &Reporter) -> Template {
    Parser::new(Scanner::new(source, reporter)).parse()
}

/// Parse a code-only snippet as the body of an anonymous template.
pub fn parse_snippet(source: &str, reporter: &Reporter) -> Template {
    let wrapped = format!("template snippet() {}", source);
    Parser::new(Scanner::new(&wrapped, reporter).with_mode(ScanMode::Code)).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tea_ast::expr::{ArithOp, Expr, ExprKind, Literal, RelOp};
    use tea_ast::stmt::{Stmt, StmtKind};
    use tea_ast::token::NumberLit;
    use tea_diagnostics::CollectingListener;

    fn parse_ok(src: &str) -> Template {
        let reporter = Reporter::new();
        let listener = Rc::new(CollectingListener::new());
        reporter.add_listener(listener.clone());
        let template = parse_template(src, &reporter);
        assert!(!reporter.has_errors(), "Parse errors: {:?}", listener.messages());
        template
    }

    fn parse_errs(src: &str) -> (Template, Vec<String>) {
        let reporter = Reporter::new();
        let listener = Rc::new(CollectingListener::new());
        reporter.add_listener(listener.clone());
        let template = parse_template(src, &reporter);
        (template, listener.messages())
    }

    fn code_stmts(src: &str) -> Vec<Stmt> {
        parse_ok(&format!("<% template t() {} %>", src)).body.stmts
    }

    fn first_expr(src: &str) -> Expr {
        match code_stmts(src).into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Expr(es)) => es.expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn int(e: &Expr) -> i32 {
        match e.kind {
            ExprKind::Literal(Literal::Number(NumberLit::Int(v))) => v,
            ref k => panic!("expected int literal, got {:?}", k),
        }
    }

    #[test]
    fn header_params_and_imports() {
        let t = parse_ok("<% import java.util.List\ntemplate page(String title, int[] counts) { ... } %>");
        assert_eq!(t.name, "page");
        assert_eq!(t.imports.len(), 1);
        assert_eq!(t.imports[0].name, "java.util.List");
        assert_eq!(t.params.len(), 2);
        assert_eq!(t.params[0].type_name.name, "String");
        assert_eq!(t.params[1].type_name.dims, 1);
        assert!(t.subst_param);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let e = first_expr("1 + 2 * 3");
        let ExprKind::Arith { op: ArithOp::Add, left, right } = e.kind else {
            panic!("expected addition at the root");
        };
        assert_eq!(int(&left), 1);
        let ExprKind::Arith { op: ArithOp::Mul, left: l2, right: r2 } = right.kind else {
            panic!("expected multiplication on the right");
        };
        assert_eq!((int(&l2), int(&r2)), (2, 3));
    }

    #[test]
    fn ladder_orders_logical_below_relational() {
        let e = first_expr("a < b and c == d or not e");
        let ExprKind::Or { left, right } = e.kind else { panic!("expected or") };
        assert!(matches!(right.kind, ExprKind::Not(_)));
        let ExprKind::And { left: l, right: r } = left.kind else { panic!("expected and") };
        assert!(matches!(l.kind, ExprKind::Relational { op: RelOp::Lt, .. }));
        assert!(matches!(r.kind, ExprKind::Relational { op: RelOp::Eq, .. }));
    }

    #[test]
    fn concat_sits_between_compare_and_additive() {
        let e = first_expr("a & b + 1 <=> c");
        let ExprKind::Compare { left, .. } = e.kind else { panic!("expected compare") };
        let ExprKind::Concat { right, .. } = left.kind else { panic!("expected concat") };
        assert!(matches!(right.kind, ExprKind::Arith { op: ArithOp::Add, .. }));
    }

    #[test]
    fn isa_is_relational() {
        let e = first_expr("x isa String and y");
        let ExprKind::And { left, .. } = e.kind else { panic!("expected and") };
        let ExprKind::Isa { type_name, .. } = left.kind else { panic!("expected isa") };
        assert_eq!(type_name.name, "String");
    }

    #[test]
    fn ternary_is_lowest() {
        let e = first_expr("a or b ? 1 : 2");
        let ExprKind::Ternary { cond, .. } = e.kind else { panic!("expected ternary") };
        assert!(matches!(cond.kind, ExprKind::Or { .. }));
    }

    #[test]
    fn identifier_then_paren_is_call() {
        assert!(matches!(first_expr("f(1, 2)").kind, ExprKind::Call(ref c) if c.args.len() == 2));
        assert!(matches!(first_expr("f").kind, ExprKind::Var(_)));
    }

    #[test]
    fn postfix_chain() {
        let e = first_expr("a.b?.c[0]?[1]*.d.size()");
        let ExprKind::Call(call) = e.kind else { panic!("expected method call") };
        assert_eq!(call.name, "size");
        let target = call.target.expect("method receiver");
        let ExprKind::Spread { expr, name, .. } = target.kind else { panic!("expected spread") };
        assert_eq!(name, "d");
        let ExprKind::ArrayLookup { null_safe: true, expr: inner, .. } = expr.kind else {
            panic!("expected null-safe index")
        };
        let ExprKind::ArrayLookup { null_safe: false, expr: inner, .. } = inner.kind else {
            panic!("expected index")
        };
        assert!(matches!(inner.kind, ExprKind::Lookup { null_safe: true, ref name, .. } if name == "c"));
    }

    #[test]
    fn call_with_substitution_block() {
        let stmts = code_stmts("call layout(\"x\") { \"body\" }");
        let StmtKind::Expr(es) = &stmts[0].kind else { panic!("expected expression statement") };
        let ExprKind::TemplateCall(call) = &es.expr.kind else { panic!("expected template call") };
        assert_eq!(call.name, "layout");
        assert_eq!(call.subst.as_ref().map(|b| b.stmts.len()), Some(1));
    }

    #[test]
    fn if_condition_call_does_not_take_block() {
        let stmts = code_stmts("if ready() { 1 } else { 2 }");
        let StmtKind::If(stmt) = &stmts[0].kind else { panic!("expected if") };
        assert!(matches!(&stmt.cond.kind, ExprKind::Call(c) if c.subst.is_none()));
        assert!(stmt.else_branch.is_some());
    }

    #[test]
    fn else_if_nests_in_else_block() {
        let stmts = code_stmts("if a { 1 } else if b { 2 } else { 3 }");
        let StmtKind::If(stmt) = &stmts[0].kind else { panic!("expected if") };
        let else_block = stmt.else_branch.as_ref().expect("else branch");
        assert!(matches!(else_block.stmts[0].kind, StmtKind::If(_)));
    }

    #[test]
    fn foreach_forms() {
        let stmts = code_stmts(
            "foreach (s in items) { s } foreach (o as String in items reverse) { o } foreach (i in 1..10 reverse) { i }",
        );
        let shapes: Vec<_> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Foreach(f) => (f.elem_type.is_some(), f.end.is_some(), f.reverse),
                _ => panic!("expected foreach"),
            })
            .collect();
        assert_eq!(shapes, vec![(false, false, false), (true, false, true), (false, true, true)]);
    }

    #[test]
    fn range_loop_rejects_as_clause() {
        let (_, errors) = parse_errs("<% template t() foreach (i as int in 1..3) { } %>");
        assert_eq!(errors, vec!["A range loop cannot declare its variable type with 'as'".to_string()]);
    }

    #[test]
    fn assignment_and_define_forms() {
        let stmts = code_stmts("x = 1 define y = 2 define long z = 3 w = 4 as Integer define v as Double = 5");
        let shapes: Vec<_> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Assign(a) => (
                    a.target.name.clone(),
                    a.is_define,
                    a.declared.as_ref().map(|t| t.name.clone()),
                ),
                other => panic!("expected assignment, got {:?}", other),
            })
            .collect();
        assert_eq!(
            shapes,
            vec![
                ("x".to_string(), false, None),
                ("y".to_string(), true, None),
                ("z".to_string(), true, Some("long".to_string())),
                ("w".to_string(), false, Some("Integer".to_string())),
                ("v".to_string(), true, Some("Double".to_string())),
            ]
        );
    }

    #[test]
    fn text_regions_become_text_statements() {
        let t = parse_ok("<% template t(String name) %>Hello <% name %>!\n");
        let shapes: Vec<_> = t
            .body
            .stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(es) => es.text,
                _ => panic!("expected expression statement"),
            })
            .collect();
        assert_eq!(shapes, vec![true, false, true]);
    }

    #[test]
    fn literals_and_arrays() {
        let e = first_expr("##(\"a\", 1, \"b\", 2)");
        assert!(matches!(e.kind, ExprKind::NewArray { associative: true, ref elems } if elems.len() == 4));
        let e = first_expr("#(1, 2.5, null, true)");
        assert!(matches!(e.kind, ExprKind::NewArray { associative: false, ref elems } if elems.len() == 4));
    }

    #[test]
    fn recovers_with_placeholder_expression() {
        let (t, errors) = parse_errs("<% template t() x = ; y = 2 %>");
        assert_eq!(errors, vec!["Expected expression, found ';'".to_string()]);
        // x = <no-op>, ';', y = 2
        assert_eq!(t.body.stmts.len(), 3);
        let StmtKind::Assign(a) = &t.body.stmts[0].kind else { panic!("expected assignment") };
        assert!(matches!(a.value.kind, ExprKind::NoOp));
    }

    #[test]
    fn truncated_input_reports_eof_once() {
        let (_, errors) = parse_errs("<% template t() if (a { foreach (x in ");
        let eof_errors = errors.iter().filter(|m| m.contains("end of file") || m.contains("Unclosed")).count();
        assert_eq!(eof_errors, 1, "errors: {:?}", errors);
    }

    #[test]
    fn missing_template_keyword() {
        let (t, errors) = parse_errs("<% x = 1 %>");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Expected 'template'"));
        assert_eq!(t.body.stmts.len(), 1);
    }

    #[test]
    fn unexpected_token_is_consumed() {
        let (t, errors) = parse_errs("<% template t() } 1 %>");
        assert_eq!(errors, vec!["Unexpected '}'".to_string()]);
        assert_eq!(t.body.stmts.len(), 2);
    }

    #[test]
    fn snippet_parses_as_code() {
        let reporter = Reporter::new();
        let t = parse_snippet("define x = 1 + 2", &reporter);
        assert!(!reporter.has_errors());
        assert_eq!(t.name, "snippet");
        assert_eq!(t.body.stmts.len(), 1);
    }
}
