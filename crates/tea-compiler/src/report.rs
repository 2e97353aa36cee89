// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rendering diagnostics for people.

use std::cell::RefCell;

use tea_diagnostics::formatter::DiagnosticFormatter;
use tea_diagnostics::{Diagnostic, DiagnosticListener};

/// Renders each diagnostic of one unit against its source as it arrives.
pub struct RenderingListener {
    name: String,
    source: String,
    pretty: bool,
    rendered: RefCell<Vec<String>>,
}

impl RenderingListener {
    /// `pretty` quotes the source line; otherwise each diagnostic is one
    /// `file:line: message` line.
    pub fn new(name: &str, source: &str, pretty: bool) -> Self {
        Self { name: name.to_string(), source: source.to_string(), pretty, rendered: RefCell::new(Vec::new()) }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.borrow().clone()
    }
}

impl DiagnosticListener for RenderingListener {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        let formatter = DiagnosticFormatter::new(&self.source).with_file_name(&self.name);
        let text = if self.pretty { formatter.format(diagnostic) } else { formatter.format_plain(diagnostic) };
        tracing::debug!(template = %self.name, line = diagnostic.line(), "{}", diagnostic.message);
        self.rendered.borrow_mut().push(text);
    }
}
