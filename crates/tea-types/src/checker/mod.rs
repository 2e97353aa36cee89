// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type checker for Tea templates.
//!
//! One walk over the template binds every variable reference, attaches a
//! type and conversion chain to every expression, and merges variable types
//! where control flow joins. Semantic errors go to the [`Reporter`] and the
//! walk continues; only checker bugs surface as [`InternalError`].

mod check_expr;
mod check_stmt;
mod errors;
mod guards;
mod narrowing;
mod prepass;
mod promotion;

pub use errors::{InternalError, TypeError};

use tea_ast::expr::{Expr, ExprKind, VariableRef};
use tea_ast::stmt::{Assignment, Stmt, StmtKind};
use tea_ast::{ClassId, Param, SourceInfo, Template, Type, TypeName, VarArena, VarId, Variable};
use tea_diagnostics::Reporter;

use crate::class_table::ClassTable;
use crate::repository::TemplateRepository;
use crate::scope::{ScopeId, ScopeTree};

type Check<T = ()> = Result<T, InternalError>;

/// Knobs that change what the checker produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Wrap statements that can throw in exception guards.
    pub exception_guards: bool,
    /// Packages searched for unqualified type names after the imports.
    pub default_imports: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            exception_guards: false,
            default_imports: vec!["java.lang".to_string(), "java.util".to_string()],
        }
    }
}

/// Check `template` against the builtin context with default options.
pub fn typecheck(template: Template, classes: &ClassTable, reporter: &Reporter) -> Result<Template, InternalError> {
    TypeChecker::new(classes, reporter).check(template)
}

pub struct TypeChecker<'a> {
    classes: &'a ClassTable,
    reporter: &'a Reporter,
    repository: Option<&'a dyn TemplateRepository>,
    options: CheckOptions,
    context: ClassId,

    scopes: ScopeTree,
    scope: ScopeId,
    vars: VarArena,
    packages: Vec<String>,
    subst_param: bool,
    return_type: Option<(Type, SourceInfo)>,
    loop_depth: usize,
    loop_vars: Vec<VarId>,
    /// Root scopes of the substitution blocks being checked, innermost last.
    subst_scopes: Vec<ScopeId>,
    errors: usize,
}

impl<'a> TypeChecker<'a> {
    pub fn new(classes: &'a ClassTable, reporter: &'a Reporter) -> Self {
        let scopes = ScopeTree::new();
        let scope = scopes.root();
        Self {
            classes,
            reporter,
            repository: None,
            options: CheckOptions::default(),
            context: classes.default_context(),
            scopes,
            scope,
            vars: VarArena::new(),
            packages: Vec::new(),
            subst_param: false,
            return_type: None,
            loop_depth: 0,
            loop_vars: Vec::new(),
            subst_scopes: Vec::new(),
            errors: 0,
        }
    }

    /// Resolve context function calls against `context` instead of the default.
    pub fn with_context(mut self, context: ClassId) -> Self {
        self.context = context;
        self
    }

    pub fn with_repository(mut self, repository: &'a dyn TemplateRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of type errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Check the whole template and hand back the annotated tree.
    pub fn check(mut self, mut template: Template) -> Check<Template> {
        let _span = tracing::info_span!("typecheck", template = %template.name).entered();
        if self.classes.get(self.context).is_none() {
            return Err(InternalError::UnknownClass(self.context));
        }

        self.vars = std::mem::take(&mut template.vars);
        self.subst_param = template.subst_param;
        self.packages = template
            .imports
            .iter()
            .map(|import| import.name.clone())
            .chain(self.options.default_imports.iter().cloned())
            .collect();

        self.declare_params(&mut template.params)?;
        prepass::convert_returns(&mut template.body);
        prepass::split_concats(&mut template.body);

        self.check_block(&mut template.body)?;
        template.return_type = Some(self.finish_return_type(&mut template.body)?);

        if self.options.exception_guards {
            guards::insert_guards(&mut template.body, &self.vars);
        }

        tracing::debug!(
            errors = self.errors,
            vars = self.vars.len(),
            return_type = %template.return_type.as_ref().map(|t| self.classes.describe(t)).unwrap_or_default(),
            "checked template"
        );
        template.vars = self.vars;
        Ok(template)
    }

    fn declare_params(&mut self, params: &mut [Param]) -> Check {
        let root = self.scopes.root();
        for param in params {
            let ty = self.resolve_type_name(&param.type_name).unwrap_or(Type::OBJECT);
            let var = Variable::new(param.name.clone(), ty, param.info).statically_typed();
            param.var = Some(self.scopes.declare_variable(root, var, false, &mut self.vars));
        }
        Ok(())
    }

    fn error(&mut self, error: TypeError) {
        tracing::debug!(%error, line = error.info().line, "type error");
        self.errors += 1;
        self.reporter.report_error(&error);
    }

    fn var(&self, id: VarId) -> Check<&Variable> {
        self.vars.get(id).ok_or(InternalError::UnknownVariable(id))
    }

    fn var_mut(&mut self, id: VarId) -> Check<&mut Variable> {
        self.vars.get_mut(id).ok_or(InternalError::UnknownVariable(id))
    }

    fn describe(&self, ty: &Type) -> String {
        self.classes.describe(ty)
    }

    /// Resolve a written type against the imports, reporting unknown names.
    fn resolve_type_name(&mut self, name: &TypeName) -> Option<Type> {
        let resolved = self.classes.resolve_type(&name.name, name.dims, &self.packages);
        if resolved.is_none() {
            self.error(TypeError::UndefinedType { name: name.to_string(), info: name.info });
        }
        resolved
    }

    /// Run `f` with `scope` as the current scope.
    fn in_scope<T>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.scope, scope);
        let out = f(self);
        self.scope = saved;
        out
    }

    /// Declare `target` in the current scope with `ty` and bind it.
    fn define_variable(&mut self, target: &mut VariableRef, ty: Type, statically_typed: bool) -> VarId {
        let var = Variable::new(target.name.clone(), ty, target.info);
        let id = self.scopes.declare_variable(self.scope, var, false, &mut self.vars);
        if statically_typed {
            if let Some(var) = self.vars.get_mut(id) {
                var.is_statically_typed = true;
            }
        }
        self.scopes.bind(self.scope, target);
        id
    }

    /// `target = source`, converting between the two variables' types.
    fn conversion_assign(&self, target: VarId, source: VarId, info: SourceInfo) -> Check<Stmt> {
        let to = self.var(target)?;
        let from = self.var(source)?;
        let mut value = Expr::new(ExprKind::Var(VariableRef::bound(from.name.clone(), info, source)), info);
        value.set_type(from.ty.clone());
        value.convert_to(to.ty.clone(), self.classes.is_narrowing(&to.ty, &from.ty));
        let mut assign = Assignment::new(VariableRef::bound(to.name.clone(), info, target), value);
        assign.forced = Some(to.ty.clone());
        Ok(Stmt::new(StmtKind::Assign(assign), info))
    }
}
