// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type checker error types.

use tea_ast::{ClassId, SourceInfo, VarId};
use tea_diagnostics::{Diagnostic, ToDiagnostic};

/// A semantic error in the template. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String, info: SourceInfo },
    #[error("undefined type: {name}")]
    UndefinedType { name: String, info: SourceInfo },
    #[error("type mismatch: cannot convert {found} to {expected}")]
    Mismatch { expected: String, found: String, info: SourceInfo },
    #[error("cannot assign null to primitive type {ty}")]
    NullToPrimitive { ty: String, info: SourceInfo },
    #[error("cannot cast {from} to {to}")]
    IllegalCast { from: String, to: String, info: SourceInfo },
    #[error("expected boolean, found {found}")]
    NotBoolean { found: String, info: SourceInfo },
    #[error("operator '{op}' requires numbers, found {found}")]
    NotNumeric { op: &'static str, found: String, info: SourceInfo },
    #[error("cannot compare {left} and {right} with '{op}'")]
    Incomparable { op: &'static str, left: String, right: String, info: SourceInfo },
    #[error("expression has no value")]
    NoValue { info: SourceInfo },
    #[error("no such property '{name}' on type {ty}")]
    NoSuchProperty { ty: String, name: String, info: SourceInfo },
    #[error("no such method '{name}({args})' on type {ty}")]
    NoSuchMethod { ty: String, name: String, args: String, info: SourceInfo },
    #[error("no such function '{name}({args})'")]
    NoSuchFunction { name: String, args: String, info: SourceInfo },
    #[error("ambiguous call to '{name}({args})': {count} candidates match")]
    AmbiguousCall { name: String, args: String, count: usize, info: SourceInfo },
    #[error("type {ty} cannot be indexed")]
    NotIndexable { ty: String, info: SourceInfo },
    #[error("cannot iterate over {ty}")]
    NotIterable { ty: String, info: SourceInfo },
    #[error("reverse iteration is not supported for {ty}")]
    ReverseUnsupported { ty: String, info: SourceInfo },
    #[error("loop variable type {declared} is incompatible with element type {element}")]
    ElementMismatch { declared: String, element: String, info: SourceInfo },
    #[error("range bounds must be numeric, found {found}")]
    RangeBound { found: String, info: SourceInfo },
    #[error("no common return type for {first} and {second}")]
    NoCommonReturnType { first: String, second: String, info: SourceInfo },
    #[error("undefined template: {name}")]
    UnknownTemplate { name: String, info: SourceInfo },
    #[error("template '{name}' expects {expected} arguments, found {found}")]
    TemplateArity { name: String, expected: usize, found: usize, info: SourceInfo },
    #[error("'{name}' requires a substitution block")]
    SubstitutionRequired { name: String, info: SourceInfo },
    #[error("'{name}' does not accept a substitution block")]
    SubstitutionNotAccepted { name: String, info: SourceInfo },
    #[error("'...' used in a template without a substitution parameter")]
    NoSubstitutionParam { info: SourceInfo },
    #[error("'{keyword}' outside of a loop")]
    OutsideLoop { keyword: &'static str, info: SourceInfo },
    #[error("unreachable statement")]
    Unreachable { info: SourceInfo },
    #[error("cannot assign to loop variable '{name}'")]
    LoopVariableAssigned { name: String, info: SourceInfo },
}

impl TypeError {
    pub fn info(&self) -> SourceInfo {
        match self {
            TypeError::UndefinedVariable { info, .. }
            | TypeError::UndefinedType { info, .. }
            | TypeError::Mismatch { info, .. }
            | TypeError::NullToPrimitive { info, .. }
            | TypeError::IllegalCast { info, .. }
            | TypeError::NotBoolean { info, .. }
            | TypeError::NotNumeric { info, .. }
            | TypeError::Incomparable { info, .. }
            | TypeError::NoValue { info }
            | TypeError::NoSuchProperty { info, .. }
            | TypeError::NoSuchMethod { info, .. }
            | TypeError::NoSuchFunction { info, .. }
            | TypeError::AmbiguousCall { info, .. }
            | TypeError::NotIndexable { info, .. }
            | TypeError::NotIterable { info, .. }
            | TypeError::ReverseUnsupported { info, .. }
            | TypeError::ElementMismatch { info, .. }
            | TypeError::RangeBound { info, .. }
            | TypeError::NoCommonReturnType { info, .. }
            | TypeError::UnknownTemplate { info, .. }
            | TypeError::TemplateArity { info, .. }
            | TypeError::SubstitutionRequired { info, .. }
            | TypeError::SubstitutionNotAccepted { info, .. }
            | TypeError::NoSubstitutionParam { info }
            | TypeError::OutsideLoop { info, .. }
            | TypeError::Unreachable { info }
            | TypeError::LoopVariableAssigned { info, .. } => *info,
        }
    }
}

impl ToDiagnostic for TypeError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).at(self.info());
        match self {
            TypeError::NullToPrimitive { .. } => {
                diag.with_help("declare the variable with an object type such as Integer")
            }
            TypeError::ReverseUnsupported { .. } => {
                diag.with_help("reverse works on arrays, lists, sets and maps")
            }
            TypeError::NoSubstitutionParam { .. } => {
                diag.with_help("declare the parameter with: template name(...) { ... }")
            }
            TypeError::Unreachable { .. } => {
                diag.with_note("control never reaches past a break, continue or return")
            }
            TypeError::AmbiguousCall { .. } => diag.with_help("convert an argument with 'as' to pick one"),
            _ => diag,
        }
    }
}

/// A failure inside the checker itself rather than in the template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("variable {0:?} is missing from the arena")]
    UnknownVariable(VarId),
    #[error("class {0:?} is not registered")]
    UnknownClass(ClassId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_positions() {
        let err = TypeError::Mismatch {
            expected: "int".to_string(),
            found: "String".to_string(),
            info: SourceInfo::new(4, 10, 15),
        };
        assert_eq!(err.to_string(), "type mismatch: cannot convert String to int");
        let diag = err.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.line(), 4);
    }

    #[test]
    fn outside_loop_names_keyword() {
        let err = TypeError::OutsideLoop { keyword: "break", info: SourceInfo::default() };
        assert_eq!(err.to_string(), "'break' outside of a loop");
    }
}
