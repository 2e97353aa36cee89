// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser error type.

use tea_ast::token::TokenKind;
use tea_ast::SourceInfo;
use tea_diagnostics::{Diagnostic, ToDiagnostic};

/// A syntax error with location and friendly message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub info: SourceInfo,
    pub message: String,
    pub hint: Option<String>,
    /// Display name of the token the parser stopped at.
    pub found: Option<String>,
    pub at_eof: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, info: SourceInfo) -> Self {
        Self { info, message: message.into(), hint: None, found: None, at_eof: false }
    }

    pub fn expected(expected: &str, found: &TokenKind, info: SourceInfo) -> Self {
        Self {
            info,
            message: format_expected_message(expected, found),
            hint: crate::hints::for_expected(expected, found).map(String::from),
            found: Some(found.display_name().to_string()),
            at_eof: matches!(found, TokenKind::Eof),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.message.clone()).at(self.info);
        if let Some(found) = &self.found {
            diag = diag.with_token(found.clone());
        }
        if let Some(hint) = &self.hint {
            diag = diag.with_help(hint.clone());
        }
        diag
    }
}

/// Format a user-friendly "expected X, found Y" message.
fn format_expected_message(expected: &str, found: &TokenKind) -> String {
    match expected {
        "'{'" => format!("Expected '{{' to start block, found {}", found.display_name()),
        "'}'" => format!("Expected '}}' to close block, found {}", found.display_name()),
        "')'" if matches!(found, TokenKind::Eof) => "Unclosed '(' - missing ')'".to_string(),
        "']'" if matches!(found, TokenKind::Eof) => "Unclosed '[' - missing ']'".to_string(),
        "a name" => format!("Expected name, found {}", found.display_name()),
        "expression" => format!("Expected expression, found {}", found.display_name()),
        "type" => format!("Expected type name, found {}", found.display_name()),
        _ => format!("Expected {}, found {}", expected, found.display_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_paren_at_eof() {
        let err = ParseError::expected("')'", &TokenKind::Eof, SourceInfo::default());
        assert_eq!(err.message, "Unclosed '(' - missing ')'");
        assert!(err.at_eof);
        assert_eq!(err.hint.as_deref(), Some("add ')' to close the parenthesis"));
    }

    #[test]
    fn reserved_word_as_name_gets_hint() {
        let err = ParseError::expected("a name", &TokenKind::Foreach, SourceInfo::default());
        assert_eq!(err.message, "Expected name, found 'foreach'");
        assert_eq!(err.hint.as_deref(), Some("reserved words can't be used as names"));
    }

    #[test]
    fn diagnostic_carries_token() {
        let err = ParseError::expected("'('", &TokenKind::Semi, SourceInfo::new(2, 5, 6));
        let diag = err.to_diagnostic();
        assert_eq!(diag.token.as_deref(), Some("';'"));
        assert_eq!(diag.line(), 2);
    }
}
