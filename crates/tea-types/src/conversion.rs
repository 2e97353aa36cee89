// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversion costs and common-type computation.
//!
//! Costs rank implicit conversions for overload resolution: lower is
//! better, -1 means the conversion is illegal.

use tea_ast::{Class, ClassId, Type};

use crate::class_table::ClassTable;

/// Cost of an identity conversion, including nullability-only changes.
pub const IDENTITY: i32 = 1;
/// Cost of assigning a subclass to a superclass.
pub const WIDENING_REFERENCE: i32 = 2;
/// Cost of boxing a primitive into its peer object.
pub const BOXING: i32 = 3;
/// Cost of unboxing an object into its primitive peer.
pub const UNBOXING: i32 = 4;
/// Base cost of a numeric widening; the rank distance is added.
const NUMERIC_WIDENING: i32 = 5;
/// Boxing followed by a reference widening, e.g. `int` to `Number`.
const BOXED_REFERENCE: i32 = 13;
/// Base cost of a numeric narrowing; the rank distance is added.
const NUMERIC_NARROWING: i32 = 20;
/// Cost of passing `null` where a nullable object is expected.
pub const NULL_TO_OBJECT: i32 = 38;
/// Cost of converting anything to a `String`.
pub const TO_STRING: i32 = 40;
pub const ILLEGAL: i32 = -1;

impl ClassTable {
    /// Whether a value of `from` can be stored in `to` without conversion.
    ///
    /// Both must be object types. Nullability is not considered.
    pub fn is_reference_assignable(&self, to: &Type, from: &Type) -> bool {
        if to.is_primitive() || from.is_primitive() || from.is_null() {
            return false;
        }
        match (&to.class, &from.class) {
            (Class::Named { id, .. }, _) if *id == ClassId::OBJECT => true,
            (Class::Array(to_elem), Class::Array(from_elem)) => {
                if to_elem.is_primitive() || from_elem.is_primitive() {
                    to_elem.same_class(from_elem)
                } else {
                    self.is_reference_assignable(to_elem, from_elem)
                }
            }
            (Class::Named { id: to_id, args: to_args }, Class::Named { id: from_id, args: from_args }) => {
                let args_agree = to_args.is_empty() || from_args.is_empty() || to_args == from_args;
                args_agree && self.is_subclass(*from_id, *to_id)
            }
            _ => false,
        }
    }

    /// Cost of implicitly converting a `from` value to `to`.
    pub fn convertable_from(&self, to: &Type, from: &Type) -> i32 {
        if to == from {
            return IDENTITY;
        }
        if to.is_void() || from.is_void() {
            return ILLEGAL;
        }
        if from.is_null() {
            return if to.is_primitive() || to.is_null() { ILLEGAL } else { NULL_TO_OBJECT };
        }
        if to.is_null() {
            return ILLEGAL;
        }
        if to.same_class(from) {
            return IDENTITY;
        }
        if to.class == from.class {
            return if from.is_primitive() { BOXING } else { UNBOXING };
        }
        if let (Some(to_rank), Some(from_rank)) = (to.numeric_rank(), from.numeric_rank()) {
            let distance = i32::from(to_rank.abs_diff(from_rank));
            let base = if to_rank > from_rank {
                NUMERIC_WIDENING + distance
            } else {
                NUMERIC_NARROWING + distance
            };
            let boxing = i32::from(!to.is_primitive()) + i32::from(!from.is_primitive());
            return base + boxing;
        }
        if self.is_reference_assignable(to, from) {
            return WIDENING_REFERENCE;
        }
        if from.is_primitive() && !to.is_primitive() && self.is_reference_assignable(to, &from.to_object()) {
            return BOXED_REFERENCE;
        }
        if to.is_string() {
            return TO_STRING;
        }
        ILLEGAL
    }

    /// Whether converting `from` to `to` loses range and should be written
    /// as an explicit cast.
    pub fn is_narrowing(&self, to: &Type, from: &Type) -> bool {
        match (to.numeric_rank(), from.numeric_rank()) {
            (Some(to_rank), Some(from_rank)) => to_rank < from_rank,
            _ => false,
        }
    }

    /// Whether an explicit `as` may convert `from` to `to`.
    ///
    /// Beyond implicit conversions this allows reference narrowing, such as
    /// `Object` to `String`.
    pub fn castable(&self, to: &Type, from: &Type) -> bool {
        if self.convertable_from(to, from) >= 0 {
            return true;
        }
        let (to_obj, from_obj) = (to.to_object(), from.to_object());
        if from.is_primitive() || to.is_null() || from.is_void() || to.is_void() {
            return false;
        }
        if self.is_reference_assignable(&from_obj, &to_obj) {
            // Downcast, then unbox if the target is primitive.
            return true;
        }
        let is_interface = to_obj
            .class_id()
            .and_then(|id| self.get(id))
            .map(|def| def.is_interface)
            .unwrap_or(false);
        is_interface && !from.is_array()
    }

    /// The most specific type both `a` and `b` convert to, `None` when the
    /// two cannot share a type.
    pub fn compatible_type(&self, a: &Type, b: &Type) -> Option<Type> {
        if a == b {
            return Some(a.clone());
        }
        if a.is_void() || b.is_void() {
            return None;
        }
        if a.is_null() {
            return Some(b.to_nullable());
        }
        if b.is_null() {
            return Some(a.to_nullable());
        }
        let non_null = a.is_non_null() && b.is_non_null();
        if let (Some(ra), Some(rb)) = (a.numeric_rank(), b.numeric_rank()) {
            let wider = if ra >= rb { a } else { b };
            if a.is_primitive() && b.is_primitive() {
                return Some(wider.clone());
            }
            return Some(with_nullability(wider.to_object(), non_null));
        }
        if a.same_class(b) {
            return Some(with_nullability(a.clone(), non_null));
        }
        if a.class == b.class {
            return Some(with_nullability(a.to_object(), non_null));
        }

        let (ao, bo) = (a.to_object(), b.to_object());
        if self.is_reference_assignable(&ao, &bo) {
            return Some(with_nullability(strip_args_unless_equal(ao, &bo), non_null));
        }
        if self.is_reference_assignable(&bo, &ao) {
            return Some(with_nullability(strip_args_unless_equal(bo, &ao), non_null));
        }
        if let (Some(ea), Some(eb)) = (ao.array_elem(), bo.array_elem()) {
            if !ea.is_primitive() && !eb.is_primitive() {
                if let Some(elem) = self.compatible_type(ea, eb) {
                    return Some(with_nullability(Type::array(elem.to_nullable()), non_null));
                }
            }
            return Some(with_nullability(Type::OBJECT, non_null));
        }
        Some(with_nullability(self.common_supertype(&ao, &bo), non_null))
    }

    /// Nearest common superclass other than `Object`, else the single most
    /// specific shared interface, else `Object`.
    fn common_supertype(&self, a: &Type, b: &Type) -> Type {
        let (Some(a_id), Some(b_id)) = (a.class_id(), b.class_id()) else {
            return Type::OBJECT;
        };
        for sup in self.superclass_chain(a_id) {
            if sup != ClassId::OBJECT && self.is_subclass(b_id, sup) {
                return Type::object(sup);
            }
        }
        let shared: Vec<ClassId> = self
            .all_interfaces(a_id)
            .into_iter()
            .filter(|&iface| self.is_subclass(b_id, iface))
            .collect();
        let most_specific: Vec<ClassId> = shared
            .iter()
            .copied()
            .filter(|&iface| !shared.iter().any(|&other| other != iface && self.is_subclass(other, iface)))
            .collect();
        match most_specific.as_slice() {
            [single] => Type::object(*single),
            _ => Type::OBJECT,
        }
    }

    /// The type binary arithmetic on `a` and `b` is performed in.
    ///
    /// Operands are unboxed and promoted to at least `int`.
    pub fn numeric_promotion(&self, a: &Type, b: &Type) -> Option<Type> {
        let rank = a.numeric_rank()?.max(b.numeric_rank()?).max(3);
        Some(primitive_of_rank(rank))
    }

    /// The type unary negation on `ty` is performed in.
    pub fn unary_promotion(&self, ty: &Type) -> Option<Type> {
        let rank = ty.numeric_rank()?.max(3);
        Some(primitive_of_rank(rank))
    }
}

fn primitive_of_rank(rank: u8) -> Type {
    match rank {
        1 => Type::BYTE,
        2 => Type::SHORT,
        3 => Type::INT,
        4 => Type::LONG,
        5 => Type::FLOAT,
        _ => Type::DOUBLE,
    }
}

fn with_nullability(mut ty: Type, non_null: bool) -> Type {
    if !ty.primitive && !ty.is_null() {
        ty.non_null = non_null;
    }
    ty
}

fn strip_args_unless_equal(mut ty: Type, other: &Type) -> Type {
    if ty.args() != other.args() {
        if let Class::Named { args, .. } = &mut ty.class {
            args.clear();
        }
    }
    ty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Type> {
        vec![
            Type::INT,
            Type::LONG,
            Type::DOUBLE,
            Type::BOOLEAN,
            Type::CHAR,
            Type::STRING,
            Type::STRING.to_non_null(),
            Type::INTEGER_OBJECT,
            Type::OBJECT,
            Type::LIST,
            Type::generic(ClassId::LIST, vec![Type::STRING]),
            Type::array(Type::INT),
            Type::array(Type::STRING),
            Type::NULL,
        ]
    }

    #[test]
    fn reflexive_for_identical_types() {
        let table = ClassTable::new();
        for ty in samples() {
            assert_eq!(table.compatible_type(&ty, &ty), Some(ty.clone()), "compatible {}", ty);
            assert_eq!(table.convertable_from(&ty, &ty), IDENTITY, "cost {}", ty);
        }
    }

    #[test]
    fn cost_table_ordering() {
        let table = ClassTable::new();
        let boxing = table.convertable_from(&Type::INTEGER_OBJECT, &Type::INT);
        let unboxing = table.convertable_from(&Type::INT, &Type::INTEGER_OBJECT);
        let widen = table.convertable_from(&Type::LONG, &Type::INT);
        let narrow = table.convertable_from(&Type::INT, &Type::LONG);
        let reference = table.convertable_from(&Type::OBJECT, &Type::STRING);
        assert_eq!(reference, WIDENING_REFERENCE);
        assert_eq!((boxing, unboxing), (BOXING, UNBOXING));
        assert!(widen < narrow);
        assert!(widen < table.convertable_from(&Type::OBJECT, &Type::INT));
        assert_eq!(table.convertable_from(&Type::STRING, &Type::INT), TO_STRING);
        assert_eq!(table.convertable_from(&Type::STRING, &Type::NULL), NULL_TO_OBJECT);
        assert_eq!(table.convertable_from(&Type::INT, &Type::NULL), ILLEGAL);
        assert_eq!(table.convertable_from(&Type::INTEGER_OBJECT, &Type::STRING), ILLEGAL);
        assert_eq!(table.convertable_from(&Type::OBJECT, &Type::VOID), ILLEGAL);
    }

    #[test]
    fn numeric_lattice() {
        let table = ClassTable::new();
        assert_eq!(table.compatible_type(&Type::INT, &Type::LONG), Some(Type::LONG));
        assert_eq!(table.compatible_type(&Type::INT, &Type::DOUBLE), Some(Type::DOUBLE));
        assert_eq!(table.compatible_type(&Type::INT, &Type::LONG_OBJECT), Some(Type::LONG_OBJECT));
        assert_eq!(table.compatible_type(&Type::INT, &Type::NULL), Some(Type::INTEGER_OBJECT));
        assert_eq!(table.numeric_promotion(&Type::BYTE, &Type::SHORT), Some(Type::INT));
        assert_eq!(table.numeric_promotion(&Type::INTEGER_OBJECT, &Type::FLOAT), Some(Type::FLOAT));
        assert_eq!(table.numeric_promotion(&Type::INT, &Type::STRING), None);
    }

    #[test]
    fn object_common_types() {
        let table = ClassTable::new();
        assert_eq!(
            table.compatible_type(&Type::INTEGER_OBJECT, &Type::object(ClassId::DOUBLE)),
            Some(Type::object(ClassId::DOUBLE))
        );
        assert_eq!(
            table.compatible_type(&Type::STRING, &Type::object(ClassId::BOOLEAN)),
            Some(Type::object(ClassId::COMPARABLE))
        );
        assert_eq!(
            table.compatible_type(&Type::object(ClassId::SET), &Type::LIST),
            Some(Type::object(ClassId::COLLECTION))
        );
        assert_eq!(
            table.compatible_type(&Type::STRING.to_non_null(), &Type::STRING),
            Some(Type::STRING)
        );
        assert_eq!(table.compatible_type(&Type::VOID, &Type::INT), None);
    }

    #[test]
    fn casts_allow_downcasts() {
        let table = ClassTable::new();
        assert!(table.castable(&Type::STRING, &Type::OBJECT));
        assert!(table.castable(&Type::INT, &Type::OBJECT));
        assert!(!table.castable(&Type::INTEGER_OBJECT, &Type::STRING));
        assert!(table.is_narrowing(&Type::INT, &Type::LONG));
    }
}
