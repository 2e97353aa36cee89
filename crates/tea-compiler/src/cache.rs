// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parse tree cache shared across compilation units.
//!
//! Entries are keyed by qualified template name and remember a hash of the
//! source they came from. A lookup with different source is a miss.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use tea_ast::Template;

struct Entry {
    source_hash: u64,
    tree: Template,
}

#[derive(Default)]
pub struct ParseTreeCache {
    entries: HashMap<String, Entry>,
    hits: usize,
    misses: usize,
}

/// Not cryptographic; only needs to tell edited sources apart.
fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

impl ParseTreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached tree for `name`, if it was parsed from this `source`.
    pub fn get(&mut self, name: &str, source: &str) -> Option<&Template> {
        let hash = source_hash(source);
        match self.entries.get(name) {
            Some(entry) if entry.source_hash == hash => {
                self.hits += 1;
                tracing::trace!(name, "parse tree cache hit");
                Some(&entry.tree)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, name: impl Into<String>, source: &str, tree: Template) {
        self.entries.insert(name.into(), Entry { source_hash: source_hash(source), tree });
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_ast::SourceInfo;

    #[test]
    fn edited_source_misses() {
        let mut cache = ParseTreeCache::new();
        cache.put("page", "<% template page() %>", Template::new("page", SourceInfo::default()));
        assert!(cache.get("page", "<% template page() %>").is_some());
        assert!(cache.get("page", "<% template page() %>changed").is_none());
        assert!(cache.get("other", "").is_none());
        assert_eq!((cache.hits(), cache.misses()), (1, 2));
    }
}
