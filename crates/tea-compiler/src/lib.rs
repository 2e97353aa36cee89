// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compilation pipeline for Tea templates.
//!
//! Ties the scanner, parser, type checker and optimizer together for one
//! compilation unit at a time, with a signature repository for `call`
//! resolution and a parse tree cache keyed by template name.

mod cache;
mod options;
mod pipeline;
mod report;
mod repository;

pub use cache::ParseTreeCache;
pub use options::CompileOptions;
pub use pipeline::{CompiledTemplate, Compiler};
pub use report::RenderingListener;
pub use repository::HashMapRepository;
