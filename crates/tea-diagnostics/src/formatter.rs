// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatting for diagnostics.
//!
//! Rich form, with the offending template line underlined:
//!
//! ```text
//! error: Undefined variable: nmae
//!   --> greeting.tea:3:4
//!    |
//!  3 | <% nmae %>
//!    |    ^^^^
//!    = help: declare it with `define` before use
//! ```
//!
//! One-line form, for logs and batch builds: `greeting.tea:3: Undefined variable: nmae`.

use colored::Colorize;

use tea_ast::LineMap;

use crate::{Diagnostic, Label, LabelStyle, Severity};

/// Formats diagnostics against one template source.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    lines: LineMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, file_name: None, lines: LineMap::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    fn file(&self) -> &str {
        self.file_name.unwrap_or("<template>")
    }

    /// `file:line: message`, uncolored.
    pub fn format_plain(&self, diagnostic: &Diagnostic) -> String {
        let prefix = match diagnostic.severity {
            Severity::Error => "",
            Severity::Warning => "warning: ",
        };
        match diagnostic.info {
            Some(info) => format!("{}:{}: {}{}", self.file(), info.line, prefix, diagnostic.message),
            None => format!("{}: {}{}", self.file(), prefix, diagnostic.message),
        }
    }

    /// Header, one quoted source line per label, then notes and help.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        let mut out = format!("{}: {}", severity, diagnostic.message.bold());
        if let Some(token) = &diagnostic.token {
            out.push_str(&format!(" (found {})", token));
        }
        out.push('\n');

        let width = diagnostic
            .labels
            .iter()
            .map(|label| self.lines.line_col(label.info.culprit()).0.to_string().len())
            .max()
            .unwrap_or(1)
            .max(2);
        let pad = " ".repeat(width + 1);

        if let Some(first) = diagnostic.labels.first() {
            let (line, col) = self.lines.line_col(first.info.culprit());
            out.push_str(&format!("{}{} {}:{}:{}\n", " ".repeat(width), "-->".blue(), self.file(), line, col));
            out.push_str(&format!("{}{}\n", pad, "|".blue()));
        }
        for label in &diagnostic.labels {
            self.quote(&mut out, label, width);
        }

        for note in &diagnostic.notes {
            out.push_str(&format!("{}{} {}: {}\n", pad, "=".cyan(), "note".cyan().bold(), note));
        }
        if let Some(help) = &diagnostic.help {
            out.push_str(&format!("{}{} {}: {}\n", pad, "=".cyan(), "help".cyan().bold(), help));
        }
        out
    }

    /// The label's line with its range underlined. Ranges spanning lines stop
    /// at the end of the first one.
    fn quote(&self, out: &mut String, label: &Label, width: usize) {
        let (line, col) = self.lines.line_col(label.info.culprit());
        let text = self.lines.line_text(self.source, line).unwrap_or("");
        let (end_line, end_col) = self.lines.line_col(label.info.end);
        let len = if end_line == line { end_col.saturating_sub(col) as usize } else { text.len() + 1 - col as usize };

        let mark = match label.style {
            LabelStyle::Primary => "^",
            LabelStyle::Secondary => "-",
        };
        let mut underline = mark.repeat(len.max(1));
        if let Some(message) = &label.message {
            underline.push(' ');
            underline.push_str(message);
        }
        let underline = match label.style {
            LabelStyle::Primary => underline.red().bold(),
            LabelStyle::Secondary => underline.blue(),
        };
        out.push_str(&format!("{:>w$} {} {}\n", line.to_string().blue().bold(), "|".blue(), text, w = width));
        out.push_str(&format!(
            "{} {} {}{}\n",
            " ".repeat(width),
            "|".blue(),
            " ".repeat(col.saturating_sub(1) as usize),
            underline,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_ast::SourceInfo;

    const SRC: &str = "<% template greet(String name) %>\nHello\n<% nmae %>";

    #[test]
    fn plain_form_is_file_line_message() {
        let d = Diagnostic::error("Undefined variable: nmae").at(SourceInfo::new(3, 43, 47));
        let f = DiagnosticFormatter::new(SRC).with_file_name("greet.tea");
        assert_eq!(f.format_plain(&d), "greet.tea:3: Undefined variable: nmae");
    }

    #[test]
    fn plain_form_marks_warnings() {
        let d = Diagnostic::warning("Statement is unreachable").at(SourceInfo::new(2, 34, 39));
        let f = DiagnosticFormatter::new(SRC);
        assert_eq!(f.format_plain(&d), "<template>:2: warning: Statement is unreachable");
    }

    #[test]
    fn rich_form_quotes_the_source_line() {
        colored::control::set_override(false);
        let d = Diagnostic::error("Undefined variable: nmae")
            .at(SourceInfo::new(3, 43, 47))
            .with_help("declare it with `define` before use");
        let out = DiagnosticFormatter::new(SRC).with_file_name("greet.tea").format(&d);
        assert!(out.starts_with("error: Undefined variable: nmae\n"));
        assert!(out.contains("--> greet.tea:3:4"));
        assert!(out.contains("<% nmae %>"));
        assert!(out.contains("^^^^"));
        assert!(out.contains("= help: declare it with `define` before use"));
    }

    #[test]
    fn secondary_labels_quote_their_own_line() {
        colored::control::set_override(false);
        let d = Diagnostic::error("Undefined variable: nmae")
            .at(SourceInfo::new(3, 43, 47))
            .with_secondary(SourceInfo::new(1, 25, 29), "did you mean this parameter?");
        let out = DiagnosticFormatter::new(SRC).format(&d);
        assert!(out.contains("--> <template>:3:4"));
        assert!(out.contains(" 1 | <% template greet(String name) %>"));
        assert!(out.contains("---- did you mean this parameter?"));
    }
}
