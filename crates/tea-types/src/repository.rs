// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Signatures of templates reachable through `call`.

use tea_ast::{Template, Type};

/// What a caller needs to know about another template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSignature {
    pub name: String,
    pub params: Vec<Type>,
    /// The template declares `{...}` and must be given a substitution block.
    pub subst_param: bool,
    pub return_type: Type,
}

impl TemplateSignature {
    /// Signature of a checked template, `None` while any type is unresolved.
    pub fn of(template: &Template) -> Option<Self> {
        let params = template
            .params
            .iter()
            .map(|p| p.var.and_then(|id| template.var(id)).map(|v| v.ty.clone()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            name: template.name.clone(),
            params,
            subst_param: template.subst_param,
            return_type: template.return_type.clone()?,
        })
    }
}

/// Source of template signatures for call resolution.
pub trait TemplateRepository {
    /// Signature of the template with the given qualified name.
    fn signature(&self, name: &str) -> Option<TemplateSignature>;
}
