// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tea compiler diagnostics.
//!
//! Every phase reports problems as `Diagnostic` values through a shared
//! [`Reporter`]. Phase error types convert with [`ToDiagnostic`], so the
//! scanner, parser and checker never depend on how diagnostics are shown.

pub mod formatter;
pub mod listener;

pub use listener::{CollectingListener, DiagnosticListener, Reporter};

use serde::Serialize;
use tea_ast::SourceInfo;

/// A compiler diagnostic with enough context for `file:line: message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Source range of the culprit, when known.
    pub info: Option<SourceInfo>,
    /// Display name of the offending token, for syntax errors.
    pub token: Option<String>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source range within a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub info: SourceInfo,
    pub style: LabelStyle,
    pub message: Option<String>,
}

/// How a label should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            info: None,
            token: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message)
    }

    /// Attach the culprit position. Also labels it as the primary range.
    pub fn at(mut self, info: SourceInfo) -> Self {
        self.info = Some(info);
        self.labels.push(Label { info, style: LabelStyle::Primary, message: None });
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_label(mut self, info: SourceInfo, style: LabelStyle, msg: impl Into<String>) -> Self {
        self.labels.push(Label { info, style, message: Some(msg.into()) });
        self
    }

    pub fn with_secondary(self, info: SourceInfo, msg: impl Into<String>) -> Self {
        self.with_label(info, LabelStyle::Secondary, msg)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Line of the culprit, 0 when unknown.
    pub fn line(&self) -> u32 {
        self.info.map(|i| i.line).unwrap_or(0)
    }

    /// Machine-readable form for editor tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Convert a compiler error into a diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_culprit_and_primary_label() {
        let d = Diagnostic::error("Undefined variable: x").at(SourceInfo::new(4, 10, 11));
        assert!(d.is_error());
        assert_eq!(d.line(), 4);
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.labels[0].style, LabelStyle::Primary);
    }

    #[test]
    fn json_uses_lowercase_severity() {
        let json = Diagnostic::warning("unused").to_json().unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"message\":\"unused\""));
    }
}
