// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builtin host classes.

use tea_ast::{ClassId, Type};

use crate::class_table::{ClassDef, ClassTable, MemberType, MethodDef};

fn fixed(ty: Type) -> MemberType {
    MemberType::Fixed(ty)
}

impl ClassTable {
    /// Register the builtins in `ClassId` order.
    pub(crate) fn register_builtins(&mut self) {
        let obj = Some(ClassId::OBJECT);
        let number = Some(ClassId::NUMBER);
        let comparable = [ClassId::COMPARABLE];

        let defs = [
            ClassDef::class("java.lang.Object", None)
                .method(MethodDef::new("toString", vec![], Type::STRING))
                .method(MethodDef::new("hashCode", vec![], Type::INT))
                .method(MethodDef::new("equals", vec![Type::OBJECT], Type::BOOLEAN)),
            ClassDef::class("java.lang.String", obj)
                .implements(&[ClassId::CHAR_SEQUENCE, ClassId::COMPARABLE])
                .property("empty", fixed(Type::BOOLEAN))
                .method(MethodDef::new("length", vec![], Type::INT))
                .method(MethodDef::new("charAt", vec![Type::INT], Type::CHAR))
                .method(MethodDef::new("substring", vec![Type::INT], Type::STRING))
                .method(MethodDef::new("substring", vec![Type::INT, Type::INT], Type::STRING))
                .method(MethodDef::new("indexOf", vec![Type::STRING], Type::INT))
                .method(MethodDef::new("startsWith", vec![Type::STRING], Type::BOOLEAN))
                .method(MethodDef::new("endsWith", vec![Type::STRING], Type::BOOLEAN))
                .method(MethodDef::new("contains", vec![Type::object(ClassId::CHAR_SEQUENCE)], Type::BOOLEAN))
                .method(MethodDef::new("toUpperCase", vec![], Type::STRING))
                .method(MethodDef::new("toLowerCase", vec![], Type::STRING))
                .method(MethodDef::new("trim", vec![], Type::STRING))
                .method(MethodDef::new("compareTo", vec![Type::STRING], Type::INT)),
            ClassDef::interface("java.lang.CharSequence", vec![])
                .method(MethodDef::new("length", vec![], Type::INT))
                .method(MethodDef::new("charAt", vec![Type::INT], Type::CHAR)),
            ClassDef::interface("java.lang.Comparable", vec![]),
            ClassDef::class("java.lang.Number", obj)
                .method(MethodDef::new("intValue", vec![], Type::INT))
                .method(MethodDef::new("longValue", vec![], Type::LONG))
                .method(MethodDef::new("doubleValue", vec![], Type::DOUBLE)),
            ClassDef::class("java.lang.Boolean", obj).implements(&comparable),
            ClassDef::class("java.lang.Character", obj).implements(&comparable),
            ClassDef::class("java.lang.Byte", number).implements(&comparable),
            ClassDef::class("java.lang.Short", number).implements(&comparable),
            ClassDef::class("java.lang.Integer", number).implements(&comparable),
            ClassDef::class("java.lang.Long", number).implements(&comparable),
            ClassDef::class("java.lang.Float", number).implements(&comparable),
            ClassDef::class("java.lang.Double", number).implements(&comparable),
            ClassDef::interface("java.lang.Iterable", vec![]).iterates(MemberType::Arg(0), false),
            ClassDef::interface("java.util.Collection", vec![ClassId::ITERABLE])
                .property("empty", fixed(Type::BOOLEAN))
                .method(MethodDef::new("size", vec![], Type::INT))
                .method(MethodDef::new("isEmpty", vec![], Type::BOOLEAN))
                .method(MethodDef::new("contains", vec![Type::OBJECT], Type::BOOLEAN)),
            ClassDef::interface("java.util.List", vec![ClassId::COLLECTION])
                .iterates(MemberType::Arg(0), true)
                .indexed(Type::INT, MemberType::Arg(0), "get")
                .method(MethodDef::generic("get", vec![Type::INT], 0))
                .method(MethodDef::new("indexOf", vec![Type::OBJECT], Type::INT)),
            ClassDef::interface("java.util.Set", vec![ClassId::COLLECTION]).iterates(MemberType::Arg(0), true),
            ClassDef::interface("java.util.Map", vec![])
                .iterates(MemberType::Arg(0), true)
                .indexed(Type::OBJECT, MemberType::Arg(1), "get")
                .property("empty", fixed(Type::BOOLEAN))
                .method(MethodDef::new("size", vec![], Type::INT))
                .method(MethodDef::new("isEmpty", vec![], Type::BOOLEAN))
                .method(MethodDef::generic("get", vec![Type::OBJECT], 1))
                .method(MethodDef::new("containsKey", vec![Type::OBJECT], Type::BOOLEAN)),
            ClassDef::class("java.lang.Void", obj),
        ];
        for def in defs {
            self.register(def);
        }
    }
}

/// Functions available to every template unless a custom context is used.
pub(crate) fn default_context() -> ClassDef {
    ClassDef::class("tea.runtime.DefaultContext", Some(ClassId::OBJECT))
        .method(MethodDef::new("print", vec![Type::OBJECT], Type::VOID))
        .method(MethodDef::new("print", vec![Type::STRING], Type::VOID))
        .method(MethodDef::new("toString", vec![Type::OBJECT], Type::STRING))
        .method(MethodDef::new("trim", vec![Type::STRING], Type::STRING))
        .method(MethodDef::new("min", vec![Type::INT, Type::INT], Type::INT))
        .method(MethodDef::new("min", vec![Type::LONG, Type::LONG], Type::LONG))
        .method(MethodDef::new("max", vec![Type::INT, Type::INT], Type::INT))
        .method(MethodDef::new("max", vec![Type::LONG, Type::LONG], Type::LONG))
        .method(MethodDef::new("isNull", vec![Type::OBJECT], Type::BOOLEAN))
        .method(MethodDef::new("repeat", vec![Type::INT], Type::VOID).with_subst())
}
