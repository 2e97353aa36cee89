// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Recursive-descent parser with an explicit precedence ladder.
//!
//! The parser never fails: after a syntax error it reports once, substitutes
//! a placeholder node and keeps going, so later passes always get a
//! structurally valid tree.

use tea_ast::expr::{ArithOp, CallExpr, Expr, ExprKind, Literal, RelOp, VariableRef};
use tea_ast::stmt::{Assignment, Block, ExprStmt, Foreach, IfStmt, Stmt, StmtKind};
use tea_ast::template::{Import, Param, Template, TypeName};
use tea_ast::token::{Token, TokenKind};
use tea_ast::SourceInfo;
use tea_diagnostics::Reporter;
use tea_lexer::Scanner;

use crate::error::ParseError;

/// The parser for one template.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    reporter: &'a Reporter,
    /// End of the most recently consumed token.
    last: SourceInfo,
    /// Whether a call may take a trailing `{ ... }` substitution block.
    /// Off inside `if` conditions and `foreach` headers, where `{` opens the body.
    allow_subst_block: bool,
    eof_reported: bool,
    errors: usize,
}

impl<'a> Parser<'a> {
    pub fn new(scanner: Scanner<'a>) -> Self {
        let reporter = scanner.reporter();
        Self {
            scanner,
            reporter,
            last: SourceInfo::default(),
            allow_subst_block: true,
            eof_reported: false,
            errors: 0,
        }
    }

    /// Number of syntax errors reported, excluding lexical ones.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Lexical plus syntax errors.
    pub fn total_errors(&self) -> usize {
        self.errors + self.scanner.error_count()
    }

    fn error(&mut self, error: ParseError) {
        // A truncated file would otherwise fail at every enclosing level.
        if error.at_eof {
            if self.eof_reported {
                return;
            }
            self.eof_reported = true;
        }
        self.errors += 1;
        tracing::debug!(%error, line = error.info.line, "syntax error");
        self.reporter.report_error(&error);
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&mut self) -> &Token {
        self.scanner.peek_token()
    }

    fn current_kind(&mut self) -> &TokenKind {
        &self.scanner.peek_token().kind
    }

    fn current_info(&mut self) -> SourceInfo {
        self.scanner.peek_token().info
    }

    fn at_end(&mut self) -> bool {
        self.current().is_eof()
    }

    fn advance(&mut self) -> Token {
        let token = self.scanner.read_token();
        self.last = token.info;
        token
    }

    fn check(&mut self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report what was found instead. The offending token
    /// is left in place.
    fn expect(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_expected(kind.display_name());
            None
        }
    }

    fn error_expected(&mut self, expected: &str) {
        let token = self.current().clone();
        self.error(ParseError::expected(expected, &token.kind, token.info));
    }

    fn expect_ident(&mut self) -> Option<(String, SourceInfo)> {
        if let TokenKind::Ident(name) = self.current_kind() {
            let name = name.clone();
            let token = self.advance();
            return Some((name, token.info));
        }
        self.error_expected("a name");
        None
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: SourceInfo) -> SourceInfo {
        start.to(&self.last)
    }

    // =========================================================================
    // Template
    // =========================================================================

    /// Parse the whole unit.
    pub fn parse(&mut self) -> Template {
        let _span = tracing::info_span!("parse").entered();
        let start = self.current_info();

        let imports = self.parse_preamble();

        let mut template = match self.expect(&TokenKind::Template) {
            Some(_) => {
                let (name, _) = self
                    .expect_ident()
                    .unwrap_or_else(|| (String::new(), self.last));
                let mut template = Template::new(name, start);
                template.params = self.parse_params();
                template.subst_param = self.parse_subst_param();
                template
            }
            None => Template::new(String::new(), start),
        };
        template.imports = imports;

        let body_start = self.current_info();
        let mut stmts = Vec::new();
        while !self.at_end() {
            stmts.push(self.parse_stmt());
        }
        template.body = Block::new(stmts, self.span_from(body_start));
        template.info = self.span_from(start);
        tracing::debug!(name = %template.name, errors = self.errors, "parsed template");
        template
    }

    /// Import directives and blank text before the `template` keyword.
    fn parse_preamble(&mut self) -> Vec<Import> {
        let mut imports = Vec::new();
        loop {
            match self.current_kind().clone() {
                TokenKind::Text(text) => {
                    let token = self.advance();
                    if !text.trim().is_empty() {
                        self.error(ParseError::new("Text is not allowed before the template declaration", token.info));
                    }
                }
                TokenKind::Import => {
                    let start = self.advance().info;
                    if let Some(name) = self.parse_qualified_name() {
                        imports.push(Import { name, info: self.span_from(start) });
                    }
                }
                _ => return imports,
            }
        }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.expect(&TokenKind::LParen).is_none() {
            return params;
        }
        if self.match_token(&TokenKind::RParen) {
            return params;
        }
        loop {
            let start = self.current_info();
            let Some(type_name) = self.parse_type_name() else { break };
            let Some((name, _)) = self.expect_ident() else { break };
            params.push(Param { name, type_name, info: self.span_from(start), var: None });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.skip_to_close(&TokenKind::RParen);
        params
    }

    /// `{ ... }` after the parameter list.
    fn parse_subst_param(&mut self) -> bool {
        if !self.check(&TokenKind::LBrace) {
            return false;
        }
        let brace = self.advance();
        if self.check(&TokenKind::Ellipsis) {
            self.advance();
            self.expect(&TokenKind::RBrace);
            return true;
        }
        // Not a substitution parameter; treat the brace as the start of the body.
        self.scanner.unread_token(brace);
        false
    }

    /// Report a missing closer, then skip to it if it appears before the end
    /// of the code region.
    fn skip_to_close(&mut self, close: &TokenKind) {
        if self.match_token(close) {
            return;
        }
        self.error_expected(close.display_name());
        loop {
            match self.current_kind() {
                TokenKind::Eof | TokenKind::Text(_) | TokenKind::LBrace | TokenKind::RBrace => return,
                k if std::mem::discriminant(k) == std::mem::discriminant(close) => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_qualified_name(&mut self) -> Option<String> {
        let (mut name, _) = self.expect_ident()?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (part, _) = self.expect_ident()?;
            name.push('.');
            name.push_str(&part);
        }
        Some(name)
    }

    fn parse_type_name(&mut self) -> Option<TypeName> {
        let start = self.current_info();
        if !matches!(self.current_kind(), TokenKind::Ident(_)) {
            self.error_expected("type");
            return None;
        }
        let name = self.parse_qualified_name()?;
        let dims = self.parse_dims();
        Some(TypeName::new(name, dims, self.span_from(start)))
    }

    fn parse_dims(&mut self) -> u32 {
        let mut dims = 0;
        while self.check(&TokenKind::LBracket) {
            self.advance();
            self.expect(&TokenKind::RBracket);
            dims += 1;
        }
        dims
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Block {
        let start = self.current_info();
        if self.expect(&TokenKind::LBrace).is_none() {
            return Block::new(Vec::new(), start);
        }
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_stmt());
        }
        self.expect(&TokenKind::RBrace);
        Block::new(stmts, self.span_from(start))
    }

    /// Parse a statement. Always consumes at least one token unless at EOF.
    pub fn parse_stmt(&mut self) -> Stmt {
        let start = self.current_info();
        let kind = match self.current_kind().clone() {
            TokenKind::Text(text) => {
                self.advance();
                let expr = Expr::literal(Literal::String(text), start);
                StmtKind::Expr(ExprStmt::new(expr, true))
            }
            TokenKind::Semi => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()),
            TokenKind::If => return self.parse_if(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Define => self.parse_define(),
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = self.starts_expr().then(|| self.parse_expr());
                StmtKind::Return(value)
            }
            TokenKind::Ellipsis => {
                self.advance();
                StmtKind::Substitution
            }
            TokenKind::Ident(_) => {
                let ident = self.advance();
                if self.check(&TokenKind::Assign) {
                    self.parse_assignment(ident)
                } else {
                    self.scanner.unread_token(ident);
                    StmtKind::Expr(ExprStmt::new(self.parse_expr(), false))
                }
            }
            _ if self.starts_expr() => StmtKind::Expr(ExprStmt::new(self.parse_expr(), false)),
            TokenKind::Eof => StmtKind::Empty,
            other => {
                let token = self.advance();
                let message = match other {
                    TokenKind::Template => "Only one template may be declared per unit".to_string(),
                    TokenKind::Import => "Imports must precede the template declaration".to_string(),
                    _ => format!("Unexpected {}", other.display_name()),
                };
                self.error(ParseError::new(message, token.info).with_hint_for(&other));
                StmtKind::Empty
            }
        };
        Stmt::new(kind, self.span_from(start))
    }

    fn starts_expr(&mut self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Not
                | TokenKind::Minus
                | TokenKind::LParen
                | TokenKind::HashParen
                | TokenKind::HashHashParen
                | TokenKind::Call
        )
    }

    /// `name = value [as Type]`; the name token is already consumed.
    fn parse_assignment(&mut self, ident: Token) -> StmtKind {
        let TokenKind::Ident(name) = ident.kind else {
            return StmtKind::Empty;
        };
        self.advance(); // '='
        let value = self.parse_expr();
        let declared = if self.match_token(&TokenKind::As) { self.parse_type_name() } else { None };
        let mut assignment = Assignment::new(VariableRef::new(name, ident.info), value);
        assignment.declared = declared;
        StmtKind::Assign(assignment)
    }

    /// `define [Type] name [as Type] = value`
    fn parse_define(&mut self) -> StmtKind {
        self.advance();
        let first_start = self.current_info();
        let Some(first) = self.parse_qualified_name() else {
            return StmtKind::Empty;
        };
        let dims = self.parse_dims();

        let (mut declared, name, name_info) = match self.current_kind().clone() {
            TokenKind::Ident(var) => {
                let info = self.advance().info;
                (Some(TypeName::new(first, dims, self.span_from(first_start))), var, info)
            }
            _ => {
                let info = self.span_from(first_start);
                if dims > 0 || first.contains('.') {
                    self.error(ParseError::new(format!("Expected variable name after type {}", first), info));
                }
                (None, first, info)
            }
        };

        if self.match_token(&TokenKind::As) {
            let as_type = self.parse_type_name();
            if declared.is_some() {
                let info = self.last;
                self.error(ParseError::new("Variable type is declared twice", info));
            } else {
                declared = as_type;
            }
        }

        let value = if self.expect(&TokenKind::Assign).is_some() {
            self.parse_expr()
        } else {
            Expr::no_op(self.current_info())
        };

        let mut assignment = Assignment::new(VariableRef::new(name, name_info), value);
        assignment.declared = declared;
        assignment.is_define = true;
        StmtKind::Assign(assignment)
    }

    fn parse_if(&mut self) -> Stmt {
        let start = self.advance().info;
        let cond = self.without_subst_block(Self::parse_expr);
        let then_branch = self.parse_block();
        let else_branch = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                let nested = self.parse_if();
                let info = nested.info;
                Some(Block::new(vec![nested], info))
            } else {
                Some(self.parse_block())
            }
        } else {
            None
        };
        let stmt = IfStmt { cond, then_branch: Some(then_branch), else_branch, merged: Vec::new() };
        Stmt::new(StmtKind::If(Box::new(stmt)), self.span_from(start))
    }

    /// `foreach (x [as T] in range [.. end] [reverse]) body`
    fn parse_foreach(&mut self) -> StmtKind {
        self.advance();
        let open = self.expect(&TokenKind::LParen).is_some();

        let var = match self.expect_ident() {
            Some((name, info)) => VariableRef::new(name, info),
            None => VariableRef::new("", self.current_info()),
        };
        let elem_type = if self.match_token(&TokenKind::As) { self.parse_type_name() } else { None };

        self.expect(&TokenKind::In);
        let range = self.without_subst_block(Self::parse_expr);
        let end = if self.match_token(&TokenKind::DotDot) {
            if let Some(tn) = &elem_type {
                let info = tn.info;
                self.error(ParseError::new("A range loop cannot declare its variable type with 'as'", info));
            }
            Some(self.without_subst_block(Self::parse_expr))
        } else {
            None
        };
        let reverse = self.match_token(&TokenKind::Reverse);
        if open {
            self.skip_to_close(&TokenKind::RParen);
        }

        let body = self.parse_block();
        StmtKind::Foreach(Box::new(Foreach {
            var,
            elem_type,
            range,
            end,
            reverse,
            body,
            initializer: Vec::new(),
            kind: None,
        }))
    }

    fn without_subst_block(&mut self, f: impl FnOnce(&mut Self) -> Expr) -> Expr {
        let saved = std::mem::replace(&mut self.allow_subst_block, false);
        let expr = f(self);
        self.allow_subst_block = saved;
        expr
    }

    // =========================================================================
    // Expressions, lowest precedence first
    // =========================================================================

    pub fn parse_expr(&mut self) -> Expr {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Expr {
        let cond = self.parse_or();
        if !self.match_token(&TokenKind::Question) {
            return cond;
        }
        let then_expr = self.parse_expr();
        let else_expr = if self.expect(&TokenKind::Colon).is_some() {
            self.parse_expr()
        } else {
            Expr::no_op(self.current_info())
        };
        let info = cond.info.to(&else_expr.info);
        Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            info,
        )
    }

    fn parse_or(&mut self) -> Expr {
        let mut left = self.parse_and();
        while self.match_token(&TokenKind::Or) {
            let right = self.parse_and();
            left = binary(left, right, |l, r| ExprKind::Or { left: l, right: r });
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let mut left = self.parse_equality();
        while self.match_token(&TokenKind::And) {
            let right = self.parse_equality();
            left = binary(left, right, |l, r| ExprKind::And { left: l, right: r });
        }
        left
    }

    fn parse_equality(&mut self) -> Expr {
        let mut left = self.parse_relational();
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => RelOp::Eq,
                TokenKind::BangEq => RelOp::Ne,
                _ => return left,
            };
            self.advance();
            let right = self.parse_relational();
            left = binary(left, right, |l, r| ExprKind::Relational { op, left: l, right: r });
        }
    }

    fn parse_relational(&mut self) -> Expr {
        let mut left = self.parse_compare();
        loop {
            let op = match self.current_kind() {
                TokenKind::Lt => RelOp::Lt,
                TokenKind::LtEq => RelOp::Le,
                TokenKind::Gt => RelOp::Gt,
                TokenKind::GtEq => RelOp::Ge,
                TokenKind::Isa => {
                    self.advance();
                    let Some(type_name) = self.parse_type_name() else { return left };
                    let info = left.info.to(&type_name.info);
                    left = Expr::new(ExprKind::Isa { expr: Box::new(left), type_name, target: None }, info);
                    continue;
                }
                _ => return left,
            };
            self.advance();
            let right = self.parse_compare();
            left = binary(left, right, |l, r| ExprKind::Relational { op, left: l, right: r });
        }
    }

    fn parse_compare(&mut self) -> Expr {
        let mut left = self.parse_concat();
        while self.match_token(&TokenKind::Spaceship) {
            let right = self.parse_concat();
            left = binary(left, right, |l, r| ExprKind::Compare { left: l, right: r });
        }
        left
    }

    fn parse_concat(&mut self) -> Expr {
        let mut left = self.parse_additive();
        while self.match_token(&TokenKind::Amp) {
            let right = self.parse_additive();
            left = binary(left, right, |l, r| ExprKind::Concat { left: l, right: r });
        }
        left
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_multiplicative();
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => return left,
            };
            self.advance();
            let right = self.parse_multiplicative();
            left = binary(left, right, |l, r| ExprKind::Arith { op, left: l, right: r });
        }
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut left = self.parse_unary();
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                TokenKind::Percent => ArithOp::Rem,
                _ => return left,
            };
            self.advance();
            let right = self.parse_unary();
            left = binary(left, right, |l, r| ExprKind::Arith { op, left: l, right: r });
        }
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.current_info();
        match self.current_kind() {
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary();
                let info = start.to(&operand.info);
                Expr::new(ExprKind::Not(Box::new(operand)), info)
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary();
                let info = start.to(&operand.info);
                Expr::new(ExprKind::Negate(Box::new(operand)), info)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_factor();
        loop {
            match self.current_kind() {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let null_safe = matches!(self.advance().kind, TokenKind::QuestionDot);
                    let Some((name, name_info)) = self.expect_ident() else { return expr };
                    if !null_safe && self.check(&TokenKind::LParen) {
                        let args = self.parse_args();
                        let mut call = CallExpr::new(name, name_info, args);
                        let info = expr.info.to(&self.last);
                        call.target = Some(Box::new(expr));
                        call.subst = self.parse_subst_block();
                        expr = Expr::new(ExprKind::Call(Box::new(call)), self.span_from(info));
                    } else {
                        let info = expr.info.to(&name_info);
                        expr = Expr::new(
                            ExprKind::Lookup { expr: Box::new(expr), name, null_safe, member: None },
                            info,
                        );
                    }
                }
                TokenKind::LBracket | TokenKind::QuestionBracket => {
                    let null_safe = matches!(self.advance().kind, TokenKind::QuestionBracket);
                    let index = self.parse_expr();
                    self.expect(&TokenKind::RBracket);
                    let info = expr.info.to(&self.last);
                    expr = Expr::new(
                        ExprKind::ArrayLookup {
                            expr: Box::new(expr),
                            index: Box::new(index),
                            null_safe,
                            member: None,
                        },
                        info,
                    );
                }
                TokenKind::StarDot => {
                    self.advance();
                    let Some((name, name_info)) = self.expect_ident() else { return expr };
                    let info = expr.info.to(&name_info);
                    expr = Expr::new(ExprKind::Spread { expr: Box::new(expr), name, member: None }, info);
                }
                _ => return expr,
            }
        }
    }

    fn parse_factor(&mut self) -> Expr {
        let token = self.current().clone();
        let info = token.info;
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Expr::literal(Literal::Number(n), info)
            }
            TokenKind::String(s) => {
                self.advance();
                Expr::literal(Literal::String(s), info)
            }
            TokenKind::True => {
                self.advance();
                Expr::literal(Literal::Bool(true), info)
            }
            TokenKind::False => {
                self.advance();
                Expr::literal(Literal::Bool(false), info)
            }
            TokenKind::Null => {
                self.advance();
                Expr::literal(Literal::Null, info)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen);
                Expr::new(ExprKind::Paren(Box::new(inner)), self.span_from(info))
            }
            TokenKind::HashParen => self.parse_new_array(info, false),
            TokenKind::HashHashParen => self.parse_new_array(info, true),
            TokenKind::Call => {
                self.advance();
                let name_info = self.current_info();
                let name = self.parse_qualified_name().unwrap_or_default();
                let args = self.parse_args();
                let mut call = CallExpr::new(name, self.span_from(name_info), args);
                call.subst = self.parse_subst_block();
                Expr::new(ExprKind::TemplateCall(Box::new(call)), self.span_from(info))
            }
            TokenKind::Ident(name) => {
                let ident = self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args();
                    let mut call = CallExpr::new(name, ident.info, args);
                    call.subst = self.parse_subst_block();
                    Expr::new(ExprKind::Call(Box::new(call)), self.span_from(info))
                } else {
                    Expr::new(ExprKind::Var(VariableRef::new(name, info)), info)
                }
            }
            kind => {
                self.error(ParseError::expected("expression", &kind, info));
                // Closers and region ends belong to an enclosing construct.
                if !matches!(
                    kind,
                    TokenKind::Eof
                        | TokenKind::Text(_)
                        | TokenKind::RParen
                        | TokenKind::RBrace
                        | TokenKind::RBracket
                        | TokenKind::LBrace
                        | TokenKind::Semi
                        | TokenKind::Comma
                ) {
                    self.advance();
                }
                Expr::no_op(info)
            }
        }
    }

    /// `#( a, b )` or `##( key, value, ... )`
    fn parse_new_array(&mut self, start: SourceInfo, associative: bool) -> Expr {
        self.advance();
        let elems = self.parse_arg_list();
        let info = self.span_from(start);
        if associative && elems.len() % 2 != 0 {
            self.error(ParseError::new("Map literal needs key/value pairs", info));
        }
        Expr::new(ExprKind::NewArray { elems, associative }, info)
    }

    /// `( args )`
    fn parse_args(&mut self) -> Vec<Expr> {
        if self.expect(&TokenKind::LParen).is_none() {
            return Vec::new();
        }
        self.parse_arg_list()
    }

    /// Comma-separated expressions up to and including `)`.
    fn parse_arg_list(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.match_token(&TokenKind::RParen) {
            return args;
        }
        let saved = std::mem::replace(&mut self.allow_subst_block, true);
        loop {
            args.push(self.parse_expr());
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.allow_subst_block = saved;
        self.skip_to_close(&TokenKind::RParen);
        args
    }

    /// A `{ ... }` block directly after a call.
    fn parse_subst_block(&mut self) -> Option<Block> {
        if self.allow_subst_block && self.check(&TokenKind::LBrace) {
            Some(self.parse_block())
        } else {
            None
        }
    }
}

impl ParseError {
    fn with_hint_for(self, kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Else => self.with_hint("'else' must follow the closing '}' of an if block"),
            TokenKind::RBrace => self.with_hint("this '}' has no matching '{'"),
            TokenKind::As => self.with_hint("'as' goes after the value: x = value as Type"),
            _ => self,
        }
    }
}

fn binary(left: Expr, right: Expr, make: impl FnOnce(Box<Expr>, Box<Expr>) -> ExprKind) -> Expr {
    let info = left.info.to(&right.info);
    Expr::new(make(Box::new(left), Box::new(right)), info)
}
