// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scanner error types.

use tea_ast::SourceInfo;
use tea_diagnostics::{Diagnostic, ToDiagnostic};

/// A lexical error. Scanning always continues past it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Illegal character: '{ch}'")]
    IllegalChar { ch: char, info: SourceInfo },
    #[error("Invalid number: {text}")]
    InvalidNumber { text: String, info: SourceInfo },
    #[error("Number out of range: {text}")]
    NumberOutOfRange { text: String, info: SourceInfo },
    #[error("Unterminated string literal")]
    UnterminatedString { info: SourceInfo },
    #[error("Line break in string literal")]
    NewlineInString { info: SourceInfo },
    #[error("Invalid escape sequence: \\{ch}")]
    InvalidEscape { ch: char, info: SourceInfo },
    #[error("Unterminated comment")]
    UnterminatedComment { info: SourceInfo },
}

impl LexError {
    pub fn info(&self) -> SourceInfo {
        match self {
            LexError::IllegalChar { info, .. }
            | LexError::InvalidNumber { info, .. }
            | LexError::NumberOutOfRange { info, .. }
            | LexError::UnterminatedString { info }
            | LexError::NewlineInString { info }
            | LexError::InvalidEscape { info, .. }
            | LexError::UnterminatedComment { info } => *info,
        }
    }
}

impl ToDiagnostic for LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).at(self.info());
        match self {
            LexError::InvalidEscape { .. } => {
                diag.with_help("valid escapes: \\0 \\b \\t \\n \\f \\r \\\\ \\' \\\"")
            }
            LexError::NewlineInString { .. } | LexError::UnterminatedString { .. } => {
                diag.with_help("close the string on the same line")
            }
            LexError::UnterminatedComment { .. } => diag.with_help("add a closing '*/'"),
            _ => diag,
        }
    }
}
