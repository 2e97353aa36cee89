// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-rewriting optimizer for checked Tea templates.
//!
//! Folds constant arithmetic, string concatenation, comparisons and boolean
//! operators, and removes branches and loop bodies that can never execute.

mod constant;
mod optimizer;

pub use constant::{constant_of, java_double, java_float, Constant};
pub use optimizer::BasicOptimizer;

use tea_ast::Template;

/// Optimize `template` in place, returning the number of rewrites.
pub fn optimize(template: &mut Template) -> usize {
    let mut optimizer = BasicOptimizer::new();
    optimizer.optimize(template);
    optimizer.rewrites()
}
