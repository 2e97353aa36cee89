// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Variable narrowing from `if` conditions.

use tea_ast::expr::{Expr, ExprKind, Literal, RelOp};
use tea_ast::Type;

/// What a condition proves about a variable.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Refinement {
    NonNull,
    Isa(Type),
}

/// Facts holding in the then and else branches of a conditional.
#[derive(Debug, Default)]
pub(super) struct Narrowing {
    pub when_true: Vec<(String, Refinement)>,
    pub when_false: Vec<(String, Refinement)>,
}

/// Collect the refinements a checked condition establishes.
pub(super) fn detect(cond: &Expr) -> Narrowing {
    let mut narrowing = Narrowing::default();
    collect(cond, true, &mut narrowing.when_true);
    collect(cond, false, &mut narrowing.when_false);
    narrowing
}

/// Facts that hold whenever `expr` evaluates to `outcome`.
fn collect(expr: &Expr, outcome: bool, out: &mut Vec<(String, Refinement)>) {
    match &expr.kind {
        ExprKind::Paren(inner) => collect(inner, outcome, out),
        ExprKind::Not(inner) => collect(inner, !outcome, out),
        ExprKind::And { left, right } if outcome => {
            collect(left, true, out);
            collect(right, true, out);
        }
        ExprKind::Or { left, right } if !outcome => {
            collect(left, false, out);
            collect(right, false, out);
        }
        ExprKind::Isa { expr: inner, target: Some(target), .. } if outcome => {
            if let Some(name) = var_name(inner) {
                out.push((name, Refinement::Isa(target.clone())));
            }
        }
        ExprKind::Relational { op: op @ (RelOp::Eq | RelOp::Ne), left, right } => {
            let name = match (var_name(left), var_name(right)) {
                (Some(name), None) if is_null(right) => name,
                (None, Some(name)) if is_null(left) => name,
                _ => return,
            };
            // `x != null` proves non-null when true, `x == null` when false.
            if (*op == RelOp::Ne) == outcome {
                out.push((name, Refinement::NonNull));
            }
        }
        _ => {}
    }
}

fn var_name(expr: &Expr) -> Option<String> {
    match &expr.unparen().kind {
        ExprKind::Var(r) => Some(r.name.clone()),
        _ => None,
    }
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr.unparen().kind, ExprKind::Literal(Literal::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_ast::expr::VariableRef;
    use tea_ast::{SourceInfo, TypeName};

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::new(ExprKind::Var(VariableRef::new(name, SourceInfo::default())), SourceInfo::default()))
    }

    fn null() -> Box<Expr> {
        Box::new(Expr::literal(Literal::Null, SourceInfo::default()))
    }

    fn rel(op: RelOp, left: Box<Expr>, right: Box<Expr>) -> Box<Expr> {
        Box::new(Expr::new(ExprKind::Relational { op, left, right }, SourceInfo::default()))
    }

    fn isa(name: &str, target: Type) -> Box<Expr> {
        let type_name = TypeName::new("String", 0, SourceInfo::default());
        Box::new(Expr::new(
            ExprKind::Isa { expr: var(name), type_name, target: Some(target) },
            SourceInfo::default(),
        ))
    }

    fn names(facts: &[(String, Refinement)]) -> Vec<&str> {
        facts.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn null_tests_narrow_one_branch() {
        let ne = detect(&rel(RelOp::Ne, var("x"), null()));
        assert_eq!(ne.when_true, vec![("x".to_string(), Refinement::NonNull)]);
        assert!(ne.when_false.is_empty());

        let eq = detect(&rel(RelOp::Eq, null(), var("x")));
        assert!(eq.when_true.is_empty());
        assert_eq!(names(&eq.when_false), vec!["x"]);
    }

    #[test]
    fn and_keeps_then_facts_or_keeps_else_facts() {
        let and = Expr::new(
            ExprKind::And { left: isa("a", Type::STRING), right: rel(RelOp::Ne, var("b"), null()) },
            SourceInfo::default(),
        );
        let n = detect(&and);
        assert_eq!(names(&n.when_true), vec!["a", "b"]);
        assert!(n.when_false.is_empty());

        let or = Expr::new(
            ExprKind::Or { left: rel(RelOp::Eq, var("a"), null()), right: isa("b", Type::STRING) },
            SourceInfo::default(),
        );
        let n = detect(&or);
        assert!(n.when_true.is_empty());
        assert_eq!(names(&n.when_false), vec!["a"]);
    }

    #[test]
    fn not_flips_branches() {
        let not = Expr::new(ExprKind::Not(isa("s", Type::STRING)), SourceInfo::default());
        let n = detect(&not);
        assert!(n.when_true.is_empty());
        assert_eq!(n.when_false, vec![("s".to_string(), Refinement::Isa(Type::STRING))]);
    }
}
