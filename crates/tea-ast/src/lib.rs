// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the Tea template language.
//!
//! This crate defines the tokens, AST nodes, and type values shared between
//! the scanner, parser, type checker, and optimizer.

pub mod span;
pub mod token;
pub mod types;
pub mod expr;
pub mod stmt;
pub mod template;

pub use span::{LineMap, SourceInfo};
pub use types::{Class, ClassId, Conversion, Type};
pub use template::{Import, Param, Template, TypeName, VarArena, VarId, Variable};
