// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Member resolution against the class table.

use tea_ast::expr::MemberRef;
use tea_ast::{ClassId, Type};

use crate::class_table::ClassTable;

/// A resolved property read.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub member: MemberRef,
    pub ty: Type,
}

/// A resolved method or context function.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub member: MemberRef,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub cost: i32,
    /// Takes a substitution block.
    pub subst: bool,
}

/// A resolved indexed read.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub member: MemberRef,
    pub key: Type,
    pub element: Type,
}

/// Why overload resolution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// No method of that name exists.
    NoSuchName,
    /// Methods exist, but none accepts the arguments.
    NoMatch,
    /// Several candidates share the lowest cost.
    Ambiguous(usize),
}

impl ClassTable {
    /// Look up a readable property. Primitive receivers are boxed first.
    pub fn property(&self, receiver: &Type, name: &str) -> Option<Property> {
        if receiver.is_array() {
            return (name == "length").then(|| Property { member: MemberRef::ArrayLength, ty: Type::INT });
        }
        let id = receiver.class_id()?;
        let args = receiver.args();
        self.find_in_hierarchy(id, |class, def| {
            let prop = def.properties.get(name).filter(|p| p.readable)?;
            Some(Property {
                member: MemberRef::Property { class, name: name.to_string() },
                ty: prop.ty.apply(args),
            })
        })
    }

    /// Resolve the best overload of `name` on the receiver's class. `subst`
    /// selects the overloads that take a substitution block.
    pub fn method(&self, receiver: &Type, name: &str, args: &[Type], subst: bool) -> Result<Method, LookupFailure> {
        let receiver = if receiver.is_array() { Type::OBJECT } else { receiver.to_object() };
        let id = receiver.class_id().ok_or(LookupFailure::NoSuchName)?;
        let member = |class, index| MemberRef::Method { class, index };
        self.best_overload(id, receiver.args(), name, args, subst, member)
    }

    /// Resolve a function on a template context class.
    pub fn function(&self, context: ClassId, name: &str, args: &[Type], subst: bool) -> Result<Method, LookupFailure> {
        self.best_overload(context, &[], name, args, subst, |_, index| MemberRef::Context { index })
    }

    /// Rank every same-named, same-arity method in the hierarchy by total
    /// conversion cost. The lowest wins; a tie is ambiguous.
    fn best_overload(
        &self,
        id: ClassId,
        receiver_args: &[Type],
        name: &str,
        args: &[Type],
        subst: bool,
        member: impl Fn(ClassId, usize) -> MemberRef,
    ) -> Result<Method, LookupFailure> {
        let mut any_named = false;
        let mut best: Option<Method> = None;
        let mut ties = 0;
        let mut seen_sigs: Vec<Vec<Type>> = Vec::new();

        let mut classes = vec![id];
        let mut cursor = 0;
        while let Some(&class) = classes.get(cursor) {
            cursor += 1;
            let Some(def) = self.get(class) else { continue };
            for (index, method) in def.methods.iter().enumerate() {
                if method.name != name {
                    continue;
                }
                any_named = true;
                // An override in a subclass hides the inherited method.
                if method.subst != subst || method.params.len() != args.len() || seen_sigs.contains(&method.params) {
                    continue;
                }
                seen_sigs.push(method.params.clone());
                let Some(cost) = total_cost(self, &method.params, args) else { continue };
                let candidate = Method {
                    member: member(class, index),
                    params: method.params.clone(),
                    return_type: method.return_type.apply(receiver_args),
                    cost,
                    subst,
                };
                let best_cost = best.as_ref().map(|m| m.cost);
                match best_cost {
                    Some(current) if current < cost => {}
                    Some(current) if current == cost => ties += 1,
                    _ => {
                        best = Some(candidate);
                        ties = 0;
                    }
                }
            }
            for sup in def.superclass.iter().chain(def.interfaces.iter()) {
                if !classes.contains(sup) {
                    classes.push(*sup);
                }
            }
            if cursor == classes.len() && !classes.contains(&ClassId::OBJECT) {
                classes.push(ClassId::OBJECT);
            }
        }

        match best {
            Some(_) if ties > 0 => Err(LookupFailure::Ambiguous(ties + 1)),
            Some(method) => Ok(method),
            None if any_named => Err(LookupFailure::NoMatch),
            None => Err(LookupFailure::NoSuchName),
        }
    }

    /// Element type produced by iterating a value of `ty`.
    pub fn iteration_element(&self, ty: &Type) -> Option<Type> {
        if let Some(elem) = ty.array_elem() {
            return Some(elem.clone());
        }
        let id = ty.class_id()?;
        let args = ty.args();
        self.find_in_hierarchy(id, |_, def| def.iteration.as_ref().map(|f| f.element.apply(args)))
    }

    /// Whether `foreach ... reverse` is supported over `ty`.
    pub fn supports_reverse(&self, ty: &Type) -> bool {
        if ty.is_array() {
            return true;
        }
        let Some(id) = ty.class_id() else { return false };
        self.find_in_hierarchy(id, |_, def| def.iteration.as_ref().map(|f| f.reverse))
            .unwrap_or(false)
    }

    /// How `value[key]` reads from a value of `ty`.
    pub fn index(&self, ty: &Type) -> Option<Index> {
        if let Some(elem) = ty.array_elem() {
            return Some(Index { member: MemberRef::ArrayElement, key: Type::INT, element: elem.clone() });
        }
        let id = ty.class_id()?;
        let args = ty.args();
        let facet = self.find_in_hierarchy(id, |_, def| def.index.clone())?;
        let method = self.method(ty, &facet.method, &[facet.key.clone()], false).ok()?;
        Some(Index { member: method.member, key: facet.key, element: facet.element.apply(args) })
    }
}

fn total_cost(table: &ClassTable, params: &[Type], args: &[Type]) -> Option<i32> {
    params.iter().zip(args).try_fold(0, |sum, (param, arg)| {
        let cost = table.convertable_from(param, arg);
        (cost >= 0).then_some(sum + cost)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_length_and_bean_properties() {
        let table = ClassTable::new();
        let length = table.property(&Type::array(Type::INT), "length").map(|p| p.member);
        assert_eq!(length, Some(MemberRef::ArrayLength));
        let empty = table.property(&Type::generic(ClassId::LIST, vec![Type::STRING]), "empty");
        assert_eq!(empty.map(|p| p.ty), Some(Type::BOOLEAN));
        assert!(table.property(&Type::STRING, "nope").is_none());
    }

    #[test]
    fn overloads_rank_by_total_cost() {
        let table = ClassTable::new();
        let ctx = table.default_context();
        let min = table.function(ctx, "min", &[Type::INT, Type::LONG], false).expect("min resolves");
        assert_eq!(min.params, vec![Type::LONG, Type::LONG]);
        let print = table.function(ctx, "print", &[Type::INT], false).expect("print resolves");
        assert_eq!(print.params, vec![Type::OBJECT]);
        let print = table.function(ctx, "print", &[Type::STRING.to_non_null()], false).expect("print resolves");
        assert_eq!(print.params, vec![Type::STRING]);
    }

    #[test]
    fn lookup_failures() {
        let table = ClassTable::new();
        let ctx = table.default_context();
        assert_eq!(table.function(ctx, "missing", &[], false), Err(LookupFailure::NoSuchName));
        assert_eq!(table.function(ctx, "min", &[Type::INT], false), Err(LookupFailure::NoMatch));
        assert_eq!(table.function(ctx, "print", &[Type::NULL], false), Err(LookupFailure::Ambiguous(2)));
    }

    #[test]
    fn substitution_overloads_match_only_with_a_block() {
        let table = ClassTable::new();
        let ctx = table.default_context();
        let repeat = table.function(ctx, "repeat", &[Type::INT], true).expect("repeat takes a block");
        assert!(repeat.subst);
        assert_eq!(repeat.return_type, Type::VOID);
        assert_eq!(table.function(ctx, "repeat", &[Type::INT], false), Err(LookupFailure::NoMatch));
        assert_eq!(table.function(ctx, "trim", &[Type::STRING], true), Err(LookupFailure::NoMatch));
    }

    #[test]
    fn inherited_and_generic_methods() {
        let table = ClassTable::new();
        let list = Type::generic(ClassId::LIST, vec![Type::STRING]);
        let size = table.method(&list, "size", &[], false).expect("size resolves");
        assert_eq!(size.member, MemberRef::Method { class: ClassId::COLLECTION, index: 0 });
        let get = table.method(&list, "get", &[Type::INT], false).expect("get resolves");
        assert_eq!(get.return_type, Type::STRING);
        let to_string = table.method(&Type::INT, "toString", &[], false).expect("boxed receiver");
        assert_eq!(to_string.return_type, Type::STRING);
    }

    #[test]
    fn iteration_facets() {
        let table = ClassTable::new();
        let list = Type::generic(ClassId::LIST, vec![Type::STRING]);
        assert_eq!(table.iteration_element(&list), Some(Type::STRING));
        assert_eq!(table.iteration_element(&Type::object(ClassId::ITERABLE)), Some(Type::OBJECT));
        assert_eq!(table.iteration_element(&Type::array(Type::INT)), Some(Type::INT));
        assert_eq!(table.iteration_element(&Type::STRING), None);
        assert!(table.supports_reverse(&list));
        assert!(table.supports_reverse(&Type::MAP));
        assert!(!table.supports_reverse(&Type::object(ClassId::ITERABLE)));
        assert!(!table.supports_reverse(&Type::object(ClassId::COLLECTION)));
    }

    #[test]
    fn indexed_reads() {
        let table = ClassTable::new();
        let map = Type::generic(ClassId::MAP, vec![Type::STRING, Type::INTEGER_OBJECT]);
        let index = table.index(&map).expect("maps are indexable");
        assert_eq!(index.element, Type::INTEGER_OBJECT);
        assert_eq!(index.key, Type::OBJECT);
        assert_eq!(table.index(&Type::array(Type::STRING)).map(|i| i.member), Some(MemberRef::ArrayElement));
        assert!(table.index(&Type::STRING).is_none());
    }
}
