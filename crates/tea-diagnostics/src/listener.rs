// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Synchronous diagnostic dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Diagnostic, Severity, ToDiagnostic};

/// A sink for diagnostics.
pub trait DiagnosticListener {
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

/// Fans diagnostics out to listeners in registration order.
///
/// Shared by reference between the scanner, parser and checker of one
/// compilation unit. Dispatch iterates a snapshot of the listener list, so a
/// listener may register further listeners while being notified; those only
/// see later diagnostics.
#[derive(Default)]
pub struct Reporter {
    listeners: RefCell<Vec<Rc<dyn DiagnosticListener>>>,
    errors: Cell<usize>,
    warnings: Cell<usize>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Rc<dyn DiagnosticListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.set(self.errors.get() + 1),
            Severity::Warning => self.warnings.set(self.warnings.get() + 1),
        }
        let snapshot: Vec<Rc<dyn DiagnosticListener>> = self.listeners.borrow().clone();
        for listener in snapshot {
            listener.on_diagnostic(&diagnostic);
        }
    }

    pub fn report_error<E: ToDiagnostic>(&self, error: &E) {
        self.report(error.to_diagnostic());
    }

    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.get()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("listeners", &self.listeners.borrow().len())
            .field("errors", &self.errors.get())
            .field("warnings", &self.warnings.get())
            .finish()
    }
}

/// Keeps every diagnostic it receives.
#[derive(Debug, Default)]
pub struct CollectingListener {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.borrow().iter().map(|d| d.message.clone()).collect()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().iter().filter(|d| d.is_error()).cloned().collect()
    }
}

impl DiagnosticListener for CollectingListener {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic.clone());
    }
}
