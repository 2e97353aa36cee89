// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement AST nodes.

use crate::expr::{Expr, MemberRef, VariableRef};
use crate::template::{TypeName, VarId};
use crate::types::Type;
use crate::SourceInfo;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub info: SourceInfo,
}

impl Stmt {
    pub fn new(kind: StmtKind, info: SourceInfo) -> Self {
        Self { kind, info }
    }

    /// Placeholder used by the parser after a syntax error.
    pub fn empty(info: SourceInfo) -> Self {
        Self::new(StmtKind::Empty, info)
    }

    pub fn list(stmts: Vec<Stmt>, info: SourceInfo) -> Self {
        Self::new(StmtKind::List(stmts), info)
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            StmtKind::Empty => true,
            StmtKind::List(stmts) => stmts.iter().all(Stmt::is_empty),
            StmtKind::Block(block) => block.is_empty(),
            _ => false,
        }
    }

    /// Whether control can never reach the statement after this one.
    pub fn is_break(&self) -> bool {
        match &self.kind {
            StmtKind::Break | StmtKind::Continue | StmtKind::Return(_) => true,
            StmtKind::List(stmts) => stmts.last().map(Stmt::is_break).unwrap_or(false),
            StmtKind::Block(block) => {
                block.finalizer.is_empty() && block.stmts.last().map(Stmt::is_break).unwrap_or(false)
            }
            StmtKind::If(stmt) => {
                let then_breaks = stmt.then_branch.as_ref().map(Block::is_break).unwrap_or(false);
                let else_breaks = stmt.else_branch.as_ref().map(Block::is_break).unwrap_or(false);
                then_breaks && else_breaks
            }
            _ => false,
        }
    }
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Empty,
    List(Vec<Stmt>),
    Block(Block),
    Assign(Assignment),
    Break,
    Continue,
    Foreach(Box<Foreach>),
    If(Box<IfStmt>),
    Expr(ExprStmt),
    Return(Option<Expr>),
    /// `...`: invoke the substitution block passed to this template.
    Substitution,
    ExceptionGuard(Box<ExceptionGuard>),
}

/// A braced statement sequence.
///
/// `initializer` runs before the statements, `finalizer` after them. Both
/// are filled in by the type checker when variable types are merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub initializer: Vec<Stmt>,
    pub finalizer: Vec<Stmt>,
    pub info: SourceInfo,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, info: SourceInfo) -> Self {
        Self { stmts, initializer: Vec::new(), finalizer: Vec::new(), info }
    }

    pub fn is_empty(&self) -> bool {
        self.initializer.is_empty()
            && self.finalizer.is_empty()
            && self.stmts.iter().all(Stmt::is_empty)
    }

    pub fn has_attachments(&self) -> bool {
        !self.initializer.is_empty() || !self.finalizer.is_empty()
    }

    pub fn is_break(&self) -> bool {
        self.finalizer.is_empty() && self.stmts.last().map(Stmt::is_break).unwrap_or(false)
    }
}

/// `x = value`, `x = value as T`, or `define [T] x [as T] = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: VariableRef,
    pub value: Expr,
    pub declared: Option<TypeName>,
    /// Type imposed by the checker for synthetic merge assignments.
    pub forced: Option<Type>,
    pub is_define: bool,
}

impl Assignment {
    pub fn new(target: VariableRef, value: Expr) -> Self {
        Self { target, value, declared: None, forced: None, is_define: false }
    }
}

/// How a `foreach` loop walks its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Array,
    Iterable,
    Range,
}

/// `foreach (x [as T] in range [.. end] [reverse]) body`
#[derive(Debug, Clone, PartialEq)]
pub struct Foreach {
    pub var: VariableRef,
    pub elem_type: Option<TypeName>,
    pub range: Expr,
    pub end: Option<Expr>,
    pub reverse: bool,
    pub body: Block,
    /// Assignments run once before the first iteration.
    pub initializer: Vec<Stmt>,
    pub kind: Option<LoopKind>,
}

/// `if cond then [else else]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Option<Block>,
    pub else_branch: Option<Block>,
    /// Variables whose types were unified across the branches.
    pub merged: Vec<VarId>,
}

/// An expression evaluated for output.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    /// Raw template text rather than a code expression.
    pub text: bool,
    /// The context function that prints the value, once bound.
    pub receiver: Option<MemberRef>,
}

impl ExprStmt {
    pub fn new(expr: Expr, text: bool) -> Self {
        Self { expr, text, receiver: None }
    }
}

/// Wraps a statement that can raise a host exception.
///
/// When the guarded statement fails, `replacement` runs instead (if any) and
/// execution resumes at the next statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionGuard {
    pub guarded: Stmt,
    pub replacement: Option<Stmt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> SourceInfo {
        SourceInfo::default()
    }

    #[test]
    fn nested_empty_lists_are_empty() {
        let s = Stmt::list(vec![Stmt::empty(info()), Stmt::list(vec![], info())], info());
        assert!(s.is_empty());
    }

    #[test]
    fn block_with_finalizer_is_not_empty() {
        let mut block = Block::new(vec![], info());
        assert!(block.is_empty());
        block.finalizer.push(Stmt::new(StmtKind::Break, info()));
        assert!(!block.is_empty());
        assert!(block.has_attachments());
    }

    #[test]
    fn if_breaks_only_when_both_branches_break() {
        let brk = || Block::new(vec![Stmt::new(StmtKind::Continue, info())], info());
        let cond = crate::expr::Expr::no_op(info());
        let mut stmt = IfStmt { cond, then_branch: Some(brk()), else_branch: None, merged: vec![] };
        assert!(!Stmt::new(StmtKind::If(Box::new(stmt.clone())), info()).is_break());
        stmt.else_branch = Some(brk());
        assert!(Stmt::new(StmtKind::If(Box::new(stmt)), info()).is_break());
    }
}
