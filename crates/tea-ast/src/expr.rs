// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes.

use crate::stmt::Block;
use crate::template::{TypeName, VarId};
use crate::token::NumberLit;
use crate::types::{ClassId, Conversion, Type};
use crate::SourceInfo;

/// An expression in the AST.
///
/// `initial_type` is the type the expression evaluates to before any
/// conversions; `conversions` is the ordered chain of coercions applied to
/// that value. The effective type is the target of the last conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub info: SourceInfo,
    pub initial_type: Option<Type>,
    pub conversions: Vec<Conversion>,
}

impl Expr {
    pub fn new(kind: ExprKind, info: SourceInfo) -> Self {
        Self { kind, info, initial_type: None, conversions: Vec::new() }
    }

    /// Placeholder used by the parser after a syntax error.
    pub fn no_op(info: SourceInfo) -> Self {
        Self::new(ExprKind::NoOp, info)
    }

    pub fn literal(lit: Literal, info: SourceInfo) -> Self {
        Self::new(ExprKind::Literal(lit), info)
    }

    /// Effective type after all conversions, `None` until checked.
    pub fn ty(&self) -> Option<&Type> {
        match self.conversions.last() {
            Some(conv) => Some(&conv.to),
            None => self.initial_type.as_ref(),
        }
    }

    /// Set the evaluated type. Resets the conversion chain.
    pub fn set_type(&mut self, ty: Type) {
        self.initial_type = Some(ty);
        self.conversions.clear();
    }

    /// Forget the type and conversions so the expression is re-inferred.
    pub fn clear_type(&mut self) {
        self.initial_type = None;
        self.conversions.clear();
    }

    /// Append a conversion from the current effective type to `to`.
    ///
    /// Converting to the current type is a no-op. Converting back to the
    /// type before the last step cancels that step instead of growing the
    /// chain.
    pub fn convert_to(&mut self, to: Type, cast_preferred: bool) {
        let Some(from) = self.ty().cloned() else { return };
        if from == to {
            return;
        }
        if let Some(last) = self.conversions.last() {
            if last.from == to {
                self.conversions.pop();
                return;
            }
        }
        self.conversions.push(Conversion { from, to, cast_preferred });
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    /// The constant value, when known at compile time.
    pub fn constant(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Strip redundant parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    /// Whether evaluating this expression can raise a host exception.
    ///
    /// Member access, calls and integer division can; literals, variable
    /// reads and pure operators over non-throwing operands cannot.
    pub fn may_throw(&self) -> bool {
        let own = match &self.kind {
            ExprKind::Lookup { .. }
            | ExprKind::ArrayLookup { .. }
            | ExprKind::Call(_)
            | ExprKind::TemplateCall(_)
            | ExprKind::Spread { .. } => true,
            ExprKind::Arith { op: ArithOp::Div | ArithOp::Rem, .. } => self
                .ty()
                .map(|t| matches!(t.numeric_rank(), Some(1..=4)))
                .unwrap_or(true),
            _ => false,
        };
        // Unboxing a nullable value can fail.
        let unboxes = self
            .conversions
            .iter()
            .any(|c| !c.from.is_non_null() && c.to.is_primitive());
        own || unboxes || self.children().any(Expr::may_throw)
    }

    /// Direct sub-expressions in evaluation order.
    pub fn children(&self) -> impl Iterator<Item = &Expr> {
        let mut out: Vec<&Expr> = Vec::new();
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::NoOp => {}
            ExprKind::Lookup { expr, .. }
            | ExprKind::Spread { expr, .. }
            | ExprKind::Paren(expr)
            | ExprKind::Negate(expr)
            | ExprKind::Not(expr)
            | ExprKind::Isa { expr, .. } => out.push(expr),
            ExprKind::ArrayLookup { expr, index, .. } => {
                out.push(expr);
                out.push(index);
            }
            ExprKind::Concat { left, right }
            | ExprKind::Arith { left, right, .. }
            | ExprKind::Relational { left, right, .. }
            | ExprKind::Compare { left, right }
            | ExprKind::And { left, right }
            | ExprKind::Or { left, right } => {
                out.push(left);
                out.push(right);
            }
            ExprKind::Ternary { cond, then_expr, else_expr } => {
                out.push(cond);
                out.push(then_expr);
                out.push(else_expr);
            }
            ExprKind::NewArray { elems, .. } => out.extend(elems.iter()),
            ExprKind::Call(call) | ExprKind::TemplateCall(call) => {
                if let Some(target) = &call.target {
                    out.push(target);
                }
                out.extend(call.args.iter());
            }
        }
        out.into_iter()
    }
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    String(String),
    Number(NumberLit),
}

impl Literal {
    /// The static type of this literal.
    pub fn ty(&self) -> Type {
        match self {
            Literal::Null => Type::NULL,
            Literal::Bool(_) => Type::BOOLEAN,
            Literal::String(_) => Type::STRING.to_non_null(),
            Literal::Number(NumberLit::Int(_)) => Type::INT,
            Literal::Number(NumberLit::Long(_)) => Type::LONG,
            Literal::Number(NumberLit::Float(_)) => Type::FLOAT,
            Literal::Number(NumberLit::Double(_)) => Type::DOUBLE,
        }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Var(VariableRef),
    /// `expr.name`, or `expr?.name` when `null_safe`.
    Lookup {
        expr: Box<Expr>,
        name: String,
        null_safe: bool,
        member: Option<MemberRef>,
    },
    /// `expr[index]`, or `expr?[index]` when `null_safe`.
    ArrayLookup {
        expr: Box<Expr>,
        index: Box<Expr>,
        null_safe: bool,
        member: Option<MemberRef>,
    },
    Paren(Box<Expr>),
    Negate(Box<Expr>),
    Not(Box<Expr>),
    /// `left & right`
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Relational {
        op: RelOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `expr isa TypeName`
    Isa {
        expr: Box<Expr>,
        type_name: TypeName,
        target: Option<Type>,
    },
    /// `left <=> right`
    Compare {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `#(a, b)` array literal, or `##(k, v)` map literal when `associative`.
    NewArray {
        elems: Vec<Expr>,
        associative: bool,
    },
    /// Function call on the context, or a method call when `target` is set.
    Call(Box<CallExpr>),
    /// `call name(args)`
    TemplateCall(Box<CallExpr>),
    /// `expr*.name`
    Spread {
        expr: Box<Expr>,
        name: String,
        member: Option<MemberRef>,
    },
    /// Placeholder for an expression that failed to parse.
    NoOp,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// Relational and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Ne)
    }

    /// The operator testing the opposite condition.
    pub fn negate(self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Lt => RelOp::Ge,
            RelOp::Le => RelOp::Gt,
            RelOp::Gt => RelOp::Le,
            RelOp::Ge => RelOp::Lt,
        }
    }
}

/// A call with optional receiver and substitution block.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub target: Option<Box<Expr>>,
    pub name: String,
    pub name_info: SourceInfo,
    pub args: Vec<Expr>,
    pub subst: Option<Block>,
    pub member: Option<MemberRef>,
}

impl CallExpr {
    pub fn new(name: String, name_info: SourceInfo, args: Vec<Expr>) -> Self {
        Self { target: None, name, name_info, args, subst: None, member: None }
    }
}

/// A resolved host member.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRef {
    /// Bean property read.
    Property { class: ClassId, name: String },
    /// Method at `index` in the class's method list.
    Method { class: ClassId, index: usize },
    /// Function at `index` on the template context class.
    Context { index: usize },
    /// Another template, by qualified name.
    Template { name: String },
    /// `length` of an array.
    ArrayLength,
    /// Indexed read of an array element.
    ArrayElement,
}

/// A use of a variable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub name: String,
    pub info: SourceInfo,
    pub var: Option<VarId>,
}

impl VariableRef {
    pub fn new(name: impl Into<String>, info: SourceInfo) -> Self {
        Self { name: name.into(), info, var: None }
    }

    pub fn bound(name: impl Into<String>, info: SourceInfo, var: VarId) -> Self {
        Self { name: name.into(), info, var: Some(var) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i32) -> Expr {
        let mut e = Expr::literal(Literal::Number(NumberLit::Int(v)), SourceInfo::default());
        e.set_type(Type::INT);
        e
    }

    #[test]
    fn conversion_chain_appends_and_resets() {
        let mut e = int(1);
        e.convert_to(Type::LONG, false);
        e.convert_to(Type::LONG.to_object(), false);
        assert_eq!(e.conversions.len(), 2);
        assert_eq!(e.ty(), Some(&Type::LONG.to_object()));
        assert_eq!(e.initial_type, Some(Type::INT));

        e.set_type(Type::INT);
        assert!(e.conversions.is_empty());
        assert_eq!(e.ty(), Some(&Type::INT));
    }

    #[test]
    fn convert_to_same_type_is_noop() {
        let mut e = int(1);
        e.convert_to(Type::INT, false);
        assert!(e.conversions.is_empty());
    }

    #[test]
    fn converting_back_cancels_last_step() {
        let mut e = int(1);
        e.convert_to(Type::INT.to_object(), false);
        e.convert_to(Type::INT, false);
        assert!(e.conversions.is_empty());
    }

    #[test]
    fn untyped_expression_ignores_conversion() {
        let mut e = Expr::no_op(SourceInfo::default());
        e.convert_to(Type::STRING, false);
        assert!(e.ty().is_none());
    }

    #[test]
    fn integer_division_may_throw() {
        let mut div = Expr::new(
            ExprKind::Arith { op: ArithOp::Div, left: Box::new(int(4)), right: Box::new(int(2)) },
            SourceInfo::default(),
        );
        div.set_type(Type::INT);
        assert!(div.may_throw());
        div.set_type(Type::DOUBLE);
        assert!(!div.may_throw());
    }
}
