// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end compilation of whole templates.

use std::rc::Rc;

use tea_ast::expr::{ExprKind, Literal};
use tea_ast::stmt::StmtKind;
use tea_ast::token::{NumberLit, TokenKind};
use tea_ast::Type;
use tea_compiler::{CompileOptions, CompiledTemplate, Compiler};
use tea_diagnostics::{CollectingListener, Reporter};

fn reporter() -> (Reporter, Rc<CollectingListener>) {
    let reporter = Reporter::new();
    let listener = Rc::new(CollectingListener::new());
    reporter.add_listener(listener.clone());
    (reporter, listener)
}

fn compile_with(compiler: &mut Compiler, name: &str, src: &str) -> (CompiledTemplate, Vec<String>) {
    let (reporter, listener) = reporter();
    let compiled = compiler.compile(name, src, &reporter).expect("no internal error");
    (compiled, listener.messages())
}

fn compile_ok(src: &str) -> CompiledTemplate {
    let mut compiler = Compiler::new(CompileOptions::default());
    let (compiled, errors) = compile_with(&mut compiler, "t", src);
    assert!(errors.is_empty(), "errors: {:?}", errors);
    compiled
}

#[test]
fn folded_define_has_int_type() {
    let compiled = compile_ok("<% template t() define x = 1 + 2 %>");
    let StmtKind::Assign(assign) = &compiled.template.body.stmts[0].kind else { panic!("expected assignment") };
    assert_eq!(assign.value.kind, ExprKind::Literal(Literal::Number(NumberLit::Int(3))));
    let x = assign.target.var.expect("bound");
    assert_eq!(compiled.template.var(x).map(|v| v.ty.clone()), Some(Type::INT));
    assert!(compiled.rewrites > 0);
}

#[test]
fn constant_branch_keeps_only_taken_output() {
    let compiled = compile_ok(r#"<% template t() %>x<% if (1 < 2) { "A" } else { "B" } %>"#);
    let stmts = &compiled.template.body.stmts;
    assert_eq!(stmts.len(), 2);
    let StmtKind::Expr(output) = &stmts[1].kind else { panic!("expected output") };
    assert_eq!(output.expr.constant(), Some(&Literal::String("A".to_string())));
}

#[test]
fn backwards_range_keeps_loop_without_body() {
    let compiled = compile_ok("<% template t() foreach (i in 5..1) { define y = i * 2 } %>");
    let StmtKind::Foreach(foreach) = &compiled.template.body.stmts[0].kind else { panic!("expected foreach") };
    assert!(foreach.body.stmts.is_empty());
    assert_eq!(foreach.range.constant(), Some(&Literal::Number(NumberLit::Int(5))));
}

#[test]
fn concat_with_variable_is_not_folded() {
    let compiled = compile_ok(r#"<% template t(String someVar) define s = "a" & someVar & "b" define u = "a" & "b" %>"#);
    let stmts = &compiled.template.body.stmts;
    let StmtKind::Assign(s) = &stmts[0].kind else { panic!("expected assignment") };
    assert!(matches!(s.value.kind, ExprKind::Concat { .. }));
    let StmtKind::Assign(u) = &stmts[1].kind else { panic!("expected assignment") };
    assert_eq!(u.value.constant(), Some(&Literal::String("ab".to_string())));
}

#[test]
fn errors_block_optimization() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let (compiled, errors) = compile_with(&mut compiler, "t", "<% template t() define x = 1 + 2 %>Hi <% y %>");
    assert_eq!(errors, vec!["undefined variable: y".to_string()]);
    assert!(!compiled.is_ok());
    assert_eq!(compiled.rewrites, 0);
    assert!(compiled.signature.is_none());
    assert!(compiler.repository().is_empty());
}

#[test]
fn optimizer_can_be_disabled() {
    let options = CompileOptions { optimize: false, ..CompileOptions::default() };
    let mut compiler = Compiler::new(options);
    let (compiled, errors) = compile_with(&mut compiler, "t", "<% template t() define x = 1 + 2 %>");
    assert!(errors.is_empty());
    let StmtKind::Assign(assign) = &compiled.template.body.stmts[0].kind else { panic!("expected assignment") };
    assert!(matches!(assign.value.kind, ExprKind::Arith { .. }));
}

#[test]
fn later_units_call_earlier_ones() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let (row, errors) = compile_with(&mut compiler, "row", "<% template row(int n) %><% n %>");
    assert!(errors.is_empty(), "errors: {:?}", errors);
    assert_eq!(row.signature.as_ref().map(|s| s.params.clone()), Some(vec![Type::INT]));

    let (_, errors) = compile_with(&mut compiler, "table", "<% template table() %><table><% call row(1) %></table>");
    assert!(errors.is_empty(), "errors: {:?}", errors);
    let (_, errors) = compile_with(&mut compiler, "bad", "<% template bad() %>x<% call row(1, 2) %>");
    assert_eq!(errors, vec!["template 'row' expects 1 arguments, found 2".to_string()]);
}

#[test]
fn unchanged_sources_hit_the_parse_cache() {
    let mut compiler = Compiler::new(CompileOptions::default());
    let src = "<% template t(String name) %>Hello <% name %>";
    compile_with(&mut compiler, "t", src);
    compile_with(&mut compiler, "t", src);
    assert_eq!(compiler.cache().hits(), 1);
    compile_with(&mut compiler, "t", "<% template t(String name) %>Bye <% name %>");
    assert_eq!(compiler.cache().misses(), 2);
}

#[test]
fn options_from_json_enable_guards() {
    let options = CompileOptions::from_json(r#"{ "exception_guards": true }"#).expect("valid options");
    let mut compiler = Compiler::new(options);
    let (compiled, errors) = compile_with(&mut compiler, "t", "<% template t(String s) define n = s.length() %>");
    assert!(errors.is_empty(), "errors: {:?}", errors);
    assert!(matches!(compiled.template.body.stmts[0].kind, StmtKind::ExceptionGuard(_)));
}

#[test]
fn token_dump_includes_comments_on_request() {
    let src = "a<% // note\n x %>";
    let (reporter, _) = reporter();
    let plain = Compiler::new(CompileOptions::default()).tokens(src, &reporter);
    assert!(!plain.iter().any(|t| matches!(t.kind, TokenKind::Comment(_))));

    let options = CompileOptions { emit_comments: true, ..CompileOptions::default() };
    let full = Compiler::new(options).tokens(src, &reporter);
    assert!(full.iter().any(|t| matches!(t.kind, TokenKind::Comment(_))));
    assert!(full.iter().any(|t| t.kind == TokenKind::EnterCode));
}

#[test]
fn rendered_diagnostics_name_the_unit() {
    let src = "<% template t() define x = 1 + 2 %>Hi <% y %>";
    let mut compiler = Compiler::new(CompileOptions::default());
    let (compiled, rendered) = compiler.compile_reporting("greeting", src).expect("no internal error");
    assert!(!compiled.is_ok());
    assert_eq!(rendered, vec!["greeting:1: undefined variable: y".to_string()]);

    let options = CompileOptions { pretty_diagnostics: true, ..CompileOptions::default() };
    let (_, rendered) = Compiler::new(options).compile_reporting("greeting", src).expect("no internal error");
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].contains("undefined variable: y"));
    assert!(rendered[0].contains("greeting:1:"));
    assert!(rendered[0].contains(src));
    assert!(rendered[0].contains('^'));
}
