// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression type checking.

use tea_ast::expr::{ArithOp, CallExpr, Expr, ExprKind, MemberRef, RelOp, VariableRef};
use tea_ast::{ClassId, SourceInfo, Type, TypeName};

use super::errors::TypeError;
use super::{Check, TypeChecker};
use crate::members::LookupFailure;

impl<'a> TypeChecker<'a> {
    // ------------------------------------------------------------------------
    // Expression Checking
    // ------------------------------------------------------------------------

    /// Infer the type of `expr` and its subexpressions from scratch.
    ///
    /// An expression whose operands did not type leaves its own type unset.
    pub(super) fn check_expr(&mut self, expr: &mut Expr) -> Check {
        expr.clear_type();
        let info = expr.info;
        let ty = match &mut expr.kind {
            ExprKind::Literal(lit) => Some(lit.ty()),
            ExprKind::NoOp => None,
            ExprKind::Var(var_ref) => self.check_var(var_ref)?,
            ExprKind::Paren(inner) => {
                self.check_expr(inner)?;
                inner.ty().cloned()
            }
            ExprKind::Negate(inner) => self.check_negate(inner)?,
            ExprKind::Not(inner) => {
                self.check_expr(inner)?;
                self.require_boolean(inner).map(|_| Type::BOOLEAN)
            }
            ExprKind::Concat { left, right } => self.check_concat(left, right)?,
            ExprKind::Arith { op, left, right } => self.check_arith(*op, left, right)?,
            ExprKind::Relational { op, left, right } => self.check_relational(*op, left, right, info)?,
            ExprKind::Isa { expr: inner, type_name, target } => self.check_isa(inner, type_name, target)?,
            ExprKind::Compare { left, right } => self.check_compare(left, right, info)?,
            ExprKind::And { left, right } | ExprKind::Or { left, right } => {
                self.check_expr(left)?;
                self.check_expr(right)?;
                let l = self.require_boolean(left);
                let r = self.require_boolean(right);
                l.and(r).map(|_| Type::BOOLEAN)
            }
            ExprKind::Ternary { cond, then_expr, else_expr } => {
                self.check_ternary(cond, then_expr, else_expr, info)?
            }
            ExprKind::NewArray { elems, associative } => self.check_new_array(elems, *associative, info)?,
            ExprKind::Lookup { expr: target, name, null_safe, member } => {
                self.check_lookup(target, name, *null_safe, member, info)?
            }
            ExprKind::ArrayLookup { expr: target, index, null_safe, member } => {
                self.check_array_lookup(target, index, *null_safe, member, info)?
            }
            ExprKind::Call(call) => self.check_call(call, info)?,
            ExprKind::TemplateCall(call) => self.check_template_call(call, info)?,
            ExprKind::Spread { expr: target, name, member } => self.check_spread(target, name, member, info)?,
        };

        let Some(ty) = ty else { return Ok(()) };
        expr.set_type(ty);
        // `char` never surfaces as a value of its own.
        let resolved_member = matches!(
            expr.kind,
            ExprKind::Lookup { .. } | ExprKind::ArrayLookup { .. } | ExprKind::Call(_) | ExprKind::TemplateCall(_)
        );
        if resolved_member && expr.ty().is_some_and(Type::is_char) {
            let string = string_of(expr.ty());
            expr.convert_to(string, false);
        }
        Ok(())
    }

    fn check_var(&mut self, var_ref: &mut VariableRef) -> Check<Option<Type>> {
        if !self.scopes.bind(self.scope, var_ref) {
            self.error(TypeError::UndefinedVariable { name: var_ref.name.clone(), info: var_ref.info });
            return Ok(None);
        }
        let Some(id) = var_ref.var else { return Ok(None) };
        self.mark_captured(&var_ref.name, id)?;
        Ok(Some(self.var(id)?.ty.clone()))
    }

    /// A variable read inside a substitution block but declared outside it
    /// must outlive the frame that declared it.
    fn mark_captured(&mut self, name: &str, id: tea_ast::VarId) -> Check {
        let Some(&block_scope) = self.subst_scopes.last() else { return Ok(()) };
        let Some(declared_in) = self.scopes.declaring_scope(self.scope, name) else { return Ok(()) };
        if !self.scopes.is_within(declared_in, block_scope) {
            self.var_mut(id)?.is_field = true;
        }
        Ok(())
    }

    /// Convert a typed operand to `boolean`, reporting anything else.
    ///
    /// Returns `None` when the operand has no type.
    pub(super) fn require_boolean(&mut self, expr: &mut Expr) -> Option<()> {
        let ty = expr.ty()?.clone();
        if ty.is_boolean() {
            expr.convert_to(Type::BOOLEAN, false);
        } else {
            self.error(TypeError::NotBoolean { found: self.describe(&ty), info: expr.info });
        }
        Some(())
    }

    /// Report a `void` operand. Returns its type otherwise.
    fn value_type(&mut self, expr: &Expr) -> Option<Type> {
        let ty = expr.ty()?.clone();
        if ty.is_void() {
            self.error(TypeError::NoValue { info: expr.info });
            return None;
        }
        Some(ty)
    }

    fn check_negate(&mut self, inner: &mut Expr) -> Check<Option<Type>> {
        self.check_expr(inner)?;
        let Some(ty) = self.value_type(inner) else { return Ok(None) };
        match self.classes.unary_promotion(&ty) {
            Some(promoted) => {
                inner.convert_to(promoted.clone(), false);
                Ok(Some(promoted))
            }
            None => {
                self.error(TypeError::NotNumeric { op: "-", found: self.describe(&ty), info: inner.info });
                Ok(None)
            }
        }
    }

    fn check_concat(&mut self, left: &mut Expr, right: &mut Expr) -> Check<Option<Type>> {
        self.check_expr(left)?;
        self.check_expr(right)?;
        let l = self.value_type(left);
        let r = self.value_type(right);
        let (Some(l), Some(r)) = (l, r) else { return Ok(None) };
        for (side, ty) in [(left, l), (right, r)] {
            if !ty.is_string() {
                side.convert_to(string_of(Some(&ty)), false);
            }
        }
        Ok(Some(Type::STRING.to_non_null()))
    }

    fn check_arith(&mut self, op: ArithOp, left: &mut Expr, right: &mut Expr) -> Check<Option<Type>> {
        self.check_expr(left)?;
        self.check_expr(right)?;
        let (Some(l), Some(r)) = (self.value_type(left), self.value_type(right)) else { return Ok(None) };
        let Some(promoted) = self.classes.numeric_promotion(&l, &r) else {
            let found = if l.is_numeric() { &r } else { &l };
            self.error(TypeError::NotNumeric { op: op.symbol(), found: self.describe(found), info: left.info.to(&right.info) });
            return Ok(None);
        };
        left.convert_to(promoted.clone(), false);
        right.convert_to(promoted.clone(), false);
        Ok(Some(promoted))
    }

    fn check_relational(
        &mut self,
        op: RelOp,
        left: &mut Expr,
        right: &mut Expr,
        info: SourceInfo,
    ) -> Check<Option<Type>> {
        self.check_expr(left)?;
        self.check_expr(right)?;
        let (Some(l), Some(r)) = (self.value_type(left), self.value_type(right)) else { return Ok(None) };

        if let Some(promoted) = self.classes.numeric_promotion(&l, &r) {
            left.convert_to(promoted.clone(), false);
            right.convert_to(promoted, false);
            return Ok(Some(Type::BOOLEAN));
        }

        if op.is_equality() {
            if l.is_boolean() && r.is_boolean() {
                left.convert_to(Type::BOOLEAN, false);
                right.convert_to(Type::BOOLEAN, false);
            } else {
                // Reference equality and null tests compare boxed values.
                left.convert_to(l.to_object(), false);
                right.convert_to(r.to_object(), false);
            }
            return Ok(Some(Type::BOOLEAN));
        }

        if self.is_ordered(&l) && self.is_ordered(&r) && self.classes.compatible_type(&l, &r).is_some() {
            left.convert_to(l.to_object(), false);
            right.convert_to(r.to_object(), false);
        } else {
            self.error(TypeError::Incomparable {
                op: op.symbol(),
                left: self.describe(&l),
                right: self.describe(&r),
                info,
            });
        }
        Ok(Some(Type::BOOLEAN))
    }

    /// Strings and `Comparable` implementations support `<` and friends.
    fn is_ordered(&self, ty: &Type) -> bool {
        !ty.is_null()
            && (ty.is_string()
                || self.classes.is_reference_assignable(&Type::object(ClassId::COMPARABLE), &ty.to_object()))
    }

    fn check_isa(
        &mut self,
        inner: &mut Expr,
        type_name: &TypeName,
        target: &mut Option<Type>,
    ) -> Check<Option<Type>> {
        self.check_expr(inner)?;
        *target = self.resolve_type_name(type_name).map(|t| t.to_object().to_non_null());
        let Some(ty) = self.value_type(inner) else { return Ok(None) };
        inner.convert_to(ty.to_object(), false);
        Ok(target.as_ref().map(|_| Type::BOOLEAN))
    }

    fn check_compare(&mut self, left: &mut Expr, right: &mut Expr, info: SourceInfo) -> Check<Option<Type>> {
        self.check_expr(left)?;
        self.check_expr(right)?;
        let (Some(l), Some(r)) = (self.value_type(left), self.value_type(right)) else { return Ok(None) };
        if let Some(promoted) = self.classes.numeric_promotion(&l, &r) {
            left.convert_to(promoted.clone(), false);
            right.convert_to(promoted, false);
        } else if self.classes.compatible_type(&l, &r).is_some() {
            left.convert_to(l.to_object(), false);
            right.convert_to(r.to_object(), false);
        } else {
            self.error(TypeError::Incomparable {
                op: "<=>",
                left: self.describe(&l),
                right: self.describe(&r),
                info,
            });
        }
        Ok(Some(Type::INT))
    }

    fn check_ternary(
        &mut self,
        cond: &mut Expr,
        then_expr: &mut Expr,
        else_expr: &mut Expr,
        info: SourceInfo,
    ) -> Check<Option<Type>> {
        self.check_expr(cond)?;
        self.require_boolean(cond);
        self.check_expr(then_expr)?;
        self.check_expr(else_expr)?;
        let (Some(a), Some(b)) = (self.value_type(then_expr), self.value_type(else_expr)) else {
            return Ok(None);
        };
        let Some(common) = self.classes.compatible_type(&a, &b) else {
            self.error(TypeError::Mismatch { expected: self.describe(&a), found: self.describe(&b), info });
            return Ok(None);
        };
        then_expr.convert_to(common.clone(), false);
        else_expr.convert_to(common.clone(), false);
        Ok(Some(common))
    }

    fn check_new_array(&mut self, elems: &mut [Expr], associative: bool, info: SourceInfo) -> Check<Option<Type>> {
        let mut types = Vec::with_capacity(elems.len());
        for elem in elems.iter_mut() {
            self.check_expr(elem)?;
            types.push(self.value_type(elem));
        }
        let Some(types) = types.into_iter().collect::<Option<Vec<Type>>>() else { return Ok(None) };

        if associative {
            let keys = self.common_element(types.iter().step_by(2), info);
            let values = self.common_element(types.iter().skip(1).step_by(2), info);
            for (i, elem) in elems.iter_mut().enumerate() {
                let to = if i % 2 == 0 { &keys } else { &values };
                elem.convert_to(to.clone(), false);
            }
            return Ok(Some(Type::generic(ClassId::MAP, vec![keys, values]).to_non_null()));
        }

        let elem_type = self.common_element(types.iter(), info);
        for elem in elems.iter_mut() {
            elem.convert_to(elem_type.clone(), false);
        }
        Ok(Some(Type::array(elem_type).to_non_null()))
    }

    /// Narrowest type every element converts to, `Object` when there is none.
    fn common_element<'t>(&mut self, types: impl Iterator<Item = &'t Type>, info: SourceInfo) -> Type {
        let mut common: Option<Type> = None;
        for ty in types {
            common = match common {
                None => Some(ty.clone()),
                Some(current) => match self.classes.compatible_type(&current, ty) {
                    Some(c) => Some(c),
                    None => {
                        self.error(TypeError::Mismatch {
                            expected: self.describe(&current),
                            found: self.describe(ty),
                            info,
                        });
                        Some(Type::OBJECT)
                    }
                },
            };
        }
        match common {
            Some(ty) if !ty.is_null() => ty,
            _ => Type::OBJECT,
        }
    }

    fn check_lookup(
        &mut self,
        target: &mut Expr,
        name: &str,
        null_safe: bool,
        member: &mut Option<MemberRef>,
        info: SourceInfo,
    ) -> Check<Option<Type>> {
        *member = None;
        self.check_expr(target)?;
        let Some(ty) = self.value_type(target) else { return Ok(None) };
        let receiver = ty.to_object();
        let Some(property) = self.classes.property(&receiver, name) else {
            self.error(TypeError::NoSuchProperty { ty: self.describe(&ty), name: name.to_string(), info });
            return Ok(None);
        };
        target.convert_to(receiver, false);
        *member = Some(property.member);
        Ok(Some(if null_safe { property.ty.to_nullable() } else { property.ty }))
    }

    fn check_array_lookup(
        &mut self,
        target: &mut Expr,
        index: &mut Expr,
        null_safe: bool,
        member: &mut Option<MemberRef>,
        info: SourceInfo,
    ) -> Check<Option<Type>> {
        *member = None;
        self.check_expr(target)?;
        self.check_expr(index)?;
        let (Some(ty), Some(key)) = (self.value_type(target), self.value_type(index)) else {
            return Ok(None);
        };
        let Some(read) = self.classes.index(&ty) else {
            self.error(TypeError::NotIndexable { ty: self.describe(&ty), info });
            return Ok(None);
        };
        if self.classes.convertable_from(&read.key, &key) < 0 {
            self.error(TypeError::Mismatch {
                expected: self.describe(&read.key),
                found: self.describe(&key),
                info: index.info,
            });
        } else {
            index.convert_to(read.key.clone(), false);
        }
        *member = Some(read.member);
        Ok(Some(if null_safe { read.element.to_nullable() } else { read.element }))
    }

    /// Check call arguments, returning their types once all of them typed.
    fn check_args(&mut self, args: &mut [Expr]) -> Check<Option<Vec<Type>>> {
        let mut types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            self.check_expr(arg)?;
            types.push(self.value_type(arg));
        }
        Ok(types.into_iter().collect())
    }

    fn describe_args(&self, args: &[Type]) -> String {
        args.iter().map(|a| self.describe(a)).collect::<Vec<_>>().join(", ")
    }

    fn check_call(&mut self, call: &mut CallExpr, info: SourceInfo) -> Check<Option<Type>> {
        call.member = None;
        let receiver = match call.target.as_deref_mut() {
            Some(target) => {
                self.check_expr(target)?;
                Some(self.value_type(target))
            }
            None => None,
        };
        if receiver == Some(None) {
            return self.abandon_call(call);
        }
        let receiver = receiver.flatten();
        let Some(arg_types) = self.check_args(&mut call.args)? else { return self.abandon_call(call) };

        let has_block = call.subst.is_some();
        let resolve = |block: bool| match &receiver {
            Some(ty) => self.classes.method(ty, &call.name, &arg_types, block),
            None => self.classes.function(self.context, &call.name, &arg_types, block),
        };
        let resolved = match resolve(has_block) {
            Err(LookupFailure::NoMatch) => resolve(!has_block).map_err(|_| LookupFailure::NoMatch),
            resolved => resolved,
        };
        let method = match resolved {
            Ok(method) => method,
            Err(failure) => {
                let args = self.describe_args(&arg_types);
                let name = call.name.clone();
                let error = match (failure, &receiver) {
                    (LookupFailure::Ambiguous(count), _) => TypeError::AmbiguousCall { name, args, count, info },
                    (_, Some(ty)) => TypeError::NoSuchMethod { ty: self.describe(ty), name, args, info },
                    (_, None) => TypeError::NoSuchFunction { name, args, info },
                };
                self.error(error);
                return self.abandon_call(call);
            }
        };

        if let (Some(target), Some(ty)) = (&mut call.target, &receiver) {
            target.convert_to(ty.to_object(), false);
        }
        for (arg, param) in call.args.iter_mut().zip(&method.params) {
            let arg_ty = arg.ty().cloned();
            let narrowing = arg_ty.map(|a| self.classes.is_narrowing(param, &a)).unwrap_or(false);
            arg.convert_to(param.clone(), narrowing);
        }
        call.member = Some(method.member);

        if let Some(block) = &mut call.subst {
            self.check_subst_block(block)?;
        }
        match (method.subst, has_block) {
            (true, false) => self.error(TypeError::SubstitutionRequired { name: call.name.clone(), info }),
            (false, true) => self.error(TypeError::SubstitutionNotAccepted { name: call.name.clone(), info }),
            _ => {}
        }
        Ok(Some(method.return_type))
    }

    /// Still check a substitution block attached to a call that failed.
    fn abandon_call(&mut self, call: &mut CallExpr) -> Check<Option<Type>> {
        if let Some(block) = &mut call.subst {
            self.check_subst_block(block)?;
        }
        Ok(None)
    }

    fn check_template_call(&mut self, call: &mut CallExpr, info: SourceInfo) -> Check<Option<Type>> {
        call.member = None;
        let arg_types = self.check_args(&mut call.args)?;
        if let Some(block) = &mut call.subst {
            self.check_subst_block(block)?;
        }

        let signature = self.repository.and_then(|repo| repo.signature(&call.name));
        let Some(signature) = signature else {
            self.error(TypeError::UnknownTemplate { name: call.name.clone(), info: call.name_info });
            return Ok(None);
        };

        match (signature.subst_param, call.subst.is_some()) {
            (true, false) => self.error(TypeError::SubstitutionRequired { name: call.name.clone(), info }),
            (false, true) => self.error(TypeError::SubstitutionNotAccepted { name: call.name.clone(), info }),
            _ => {}
        }

        if signature.params.len() != call.args.len() {
            self.error(TypeError::TemplateArity {
                name: call.name.clone(),
                expected: signature.params.len(),
                found: call.args.len(),
                info,
            });
            return Ok(Some(signature.return_type));
        }

        if let Some(arg_types) = arg_types {
            for ((arg, arg_ty), param) in call.args.iter_mut().zip(&arg_types).zip(&signature.params) {
                if self.classes.convertable_from(param, arg_ty) < 0 {
                    self.error(TypeError::Mismatch {
                        expected: self.describe(param),
                        found: self.describe(arg_ty),
                        info: arg.info,
                    });
                } else {
                    arg.convert_to(param.clone(), self.classes.is_narrowing(param, arg_ty));
                }
            }
        }
        call.member = Some(MemberRef::Template { name: signature.name });
        Ok(Some(signature.return_type))
    }

    fn check_spread(
        &mut self,
        target: &mut Expr,
        name: &str,
        member: &mut Option<MemberRef>,
        info: SourceInfo,
    ) -> Check<Option<Type>> {
        *member = None;
        self.check_expr(target)?;
        let Some(ty) = self.value_type(target) else { return Ok(None) };
        let Some(elem) = self.classes.iteration_element(&ty) else {
            self.error(TypeError::NotIterable { ty: self.describe(&ty), info: target.info });
            return Ok(None);
        };
        let Some(property) = self.classes.property(&elem.to_object(), name) else {
            self.error(TypeError::NoSuchProperty { ty: self.describe(&elem), name: name.to_string(), info });
            return Ok(None);
        };
        *member = Some(property.member);
        Ok(Some(Type::array(property.ty).to_non_null()))
    }
}

/// `String` with the nullability of `ty`.
pub(super) fn string_of(ty: Option<&Type>) -> Type {
    match ty {
        Some(ty) if ty.is_non_null() => Type::STRING.to_non_null(),
        _ => Type::STRING,
    }
}
