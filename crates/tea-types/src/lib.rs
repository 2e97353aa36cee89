// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host class model, scopes and type checker for Tea templates.
//!
//! The checker binds variables, attaches a type and conversion chain to
//! every expression, merges variable types across branches and loops, and
//! optionally wraps throwing statements in exception guards.

mod builtins;
mod class_table;
mod conversion;
mod members;
mod repository;
mod scope;
mod checker;

pub use class_table::{
    ClassDef, ClassTable, IndexFacet, IterationFacet, MemberType, MethodDef, PropertyDef,
};
pub use conversion::{
    BOXING, IDENTITY, ILLEGAL, NULL_TO_OBJECT, TO_STRING, UNBOXING, WIDENING_REFERENCE,
};
pub use members::{Index, LookupFailure, Method, Property};
pub use repository::{TemplateRepository, TemplateSignature};
pub use scope::{ScopeId, ScopeTree};
pub use checker::{typecheck, CheckOptions, InternalError, TypeChecker, TypeError};
