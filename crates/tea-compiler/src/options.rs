// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compiler configuration.

use serde::{Deserialize, Serialize};
use tea_types::CheckOptions;

/// Options for one compilation unit. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Token dumps include comments and `<%`/`%>` markers.
    pub emit_comments: bool,
    /// Wrap statements that can throw so the template keeps running.
    pub exception_guards: bool,
    /// Run the optimizer after a clean type check.
    pub optimize: bool,
    /// Packages searched for unqualified type names.
    pub default_imports: Vec<String>,
    /// Render diagnostics with the quoted source line instead of one line each.
    pub pretty_diagnostics: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            emit_comments: false,
            exception_guards: false,
            optimize: true,
            default_imports: CheckOptions::default().default_imports,
            pretty_diagnostics: false,
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn check_options(&self) -> CheckOptions {
        CheckOptions {
            exception_guards: self.exception_guards,
            default_imports: self.default_imports.clone(),
        }
    }
}
