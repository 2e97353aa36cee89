// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! In-memory template signature repository.

use std::collections::HashMap;

use tea_ast::Template;
use tea_types::{TemplateRepository, TemplateSignature};

/// Signatures keyed by qualified template name.
#[derive(Debug, Default)]
pub struct HashMapRepository {
    signatures: HashMap<String, TemplateSignature>,
}

impl HashMapRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, signature: TemplateSignature) {
        self.signatures.insert(signature.name.clone(), signature);
    }

    /// Record the signature of a checked template. Returns false while the
    /// template still has unresolved types.
    pub fn register(&mut self, template: &Template) -> bool {
        match TemplateSignature::of(template) {
            Some(signature) => {
                self.insert(signature);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl TemplateRepository for HashMapRepository {
    fn signature(&self, name: &str) -> Option<TemplateSignature> {
        self.signatures.get(name).cloned()
    }
}
