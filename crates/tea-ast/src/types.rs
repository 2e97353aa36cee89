// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type values attached to expressions and variables.
//!
//! A `Type` wraps a host class descriptor with primitive and nullability
//! bits. The algorithms that need the class hierarchy (compatibility,
//! conversion cost, element facets) live with the class table in
//! `tea-types`; this module only holds the value and hierarchy-free helpers.

use std::fmt;

/// Identifier of a host class registered in the class table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassId(pub u32);

impl ClassId {
    pub const OBJECT: ClassId = ClassId(0);
    pub const STRING: ClassId = ClassId(1);
    pub const CHAR_SEQUENCE: ClassId = ClassId(2);
    pub const COMPARABLE: ClassId = ClassId(3);
    pub const NUMBER: ClassId = ClassId(4);
    pub const BOOLEAN: ClassId = ClassId(5);
    pub const CHARACTER: ClassId = ClassId(6);
    pub const BYTE: ClassId = ClassId(7);
    pub const SHORT: ClassId = ClassId(8);
    pub const INTEGER: ClassId = ClassId(9);
    pub const LONG: ClassId = ClassId(10);
    pub const FLOAT: ClassId = ClassId(11);
    pub const DOUBLE: ClassId = ClassId(12);
    pub const ITERABLE: ClassId = ClassId(13);
    pub const COLLECTION: ClassId = ClassId(14);
    pub const LIST: ClassId = ClassId(15);
    pub const SET: ClassId = ClassId(16);
    pub const MAP: ClassId = ClassId(17);
    pub const VOID: ClassId = ClassId(18);

    /// Number of classes pre-registered by every class table.
    pub const BUILTIN_COUNT: u32 = 19;

    /// Simple name of a builtin class, `None` for user classes.
    pub fn builtin_name(self) -> Option<&'static str> {
        let name = match self {
            ClassId::OBJECT => "Object",
            ClassId::STRING => "String",
            ClassId::CHAR_SEQUENCE => "CharSequence",
            ClassId::COMPARABLE => "Comparable",
            ClassId::NUMBER => "Number",
            ClassId::BOOLEAN => "Boolean",
            ClassId::CHARACTER => "Character",
            ClassId::BYTE => "Byte",
            ClassId::SHORT => "Short",
            ClassId::INTEGER => "Integer",
            ClassId::LONG => "Long",
            ClassId::FLOAT => "Float",
            ClassId::DOUBLE => "Double",
            ClassId::ITERABLE => "Iterable",
            ClassId::COLLECTION => "Collection",
            ClassId::LIST => "List",
            ClassId::SET => "Set",
            ClassId::MAP => "Map",
            ClassId::VOID => "Void",
            _ => return None,
        };
        Some(name)
    }

    /// Primitive spelling for classes that have a primitive peer.
    pub fn primitive_name(self) -> Option<&'static str> {
        let name = match self {
            ClassId::BOOLEAN => "boolean",
            ClassId::CHARACTER => "char",
            ClassId::BYTE => "byte",
            ClassId::SHORT => "short",
            ClassId::INTEGER => "int",
            ClassId::LONG => "long",
            ClassId::FLOAT => "float",
            ClassId::DOUBLE => "double",
            ClassId::VOID => "void",
            _ => return None,
        };
        Some(name)
    }

    pub fn has_primitive_peer(self) -> bool {
        self.primitive_name().is_some()
    }

    /// Widening rank of the numeric classes; `None` for everything else.
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            ClassId::BYTE => Some(1),
            ClassId::SHORT => Some(2),
            ClassId::INTEGER => Some(3),
            ClassId::LONG => Some(4),
            ClassId::FLOAT => Some(5),
            ClassId::DOUBLE => Some(6),
            _ => None,
        }
    }
}

/// The host class a type refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Class {
    /// The type of the `null` literal.
    Null,
    /// A registered class, with optional type arguments (`List<String>`).
    Named { id: ClassId, args: Vec<Type> },
    /// An array of the element type.
    Array(Box<Type>),
}

/// A static type.
///
/// Equality is structural: same class, same primitive bit, same nullability.
/// `Type::NULL` only equals itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Type {
    pub class: Class,
    pub primitive: bool,
    pub non_null: bool,
}

macro_rules! primitive_const {
    ($name:ident, $id:expr) => {
        pub const $name: Type = Type {
            class: Class::Named { id: $id, args: Vec::new() },
            primitive: true,
            non_null: true,
        };
    };
}

macro_rules! object_const {
    ($name:ident, $id:expr) => {
        pub const $name: Type = Type {
            class: Class::Named { id: $id, args: Vec::new() },
            primitive: false,
            non_null: false,
        };
    };
}

impl Type {
    pub const NULL: Type = Type { class: Class::Null, primitive: false, non_null: false };

    primitive_const!(VOID, ClassId::VOID);
    primitive_const!(BOOLEAN, ClassId::BOOLEAN);
    primitive_const!(CHAR, ClassId::CHARACTER);
    primitive_const!(BYTE, ClassId::BYTE);
    primitive_const!(SHORT, ClassId::SHORT);
    primitive_const!(INT, ClassId::INTEGER);
    primitive_const!(LONG, ClassId::LONG);
    primitive_const!(FLOAT, ClassId::FLOAT);
    primitive_const!(DOUBLE, ClassId::DOUBLE);

    object_const!(OBJECT, ClassId::OBJECT);
    object_const!(STRING, ClassId::STRING);
    object_const!(NUMBER, ClassId::NUMBER);
    object_const!(BOOLEAN_OBJECT, ClassId::BOOLEAN);
    object_const!(INTEGER_OBJECT, ClassId::INTEGER);
    object_const!(LONG_OBJECT, ClassId::LONG);
    object_const!(LIST, ClassId::LIST);
    object_const!(MAP, ClassId::MAP);

    /// Nullable object type of a registered class.
    pub fn object(id: ClassId) -> Type {
        Type { class: Class::Named { id, args: Vec::new() }, primitive: false, non_null: false }
    }

    /// Nullable object type with type arguments, e.g. `List<String>`.
    pub fn generic(id: ClassId, args: Vec<Type>) -> Type {
        Type { class: Class::Named { id, args }, primitive: false, non_null: false }
    }

    /// Nullable array of `elem`.
    pub fn array(elem: Type) -> Type {
        Type { class: Class::Array(Box::new(elem)), primitive: false, non_null: false }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.class, Class::Null)
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Primitives are always non-null.
    pub fn is_non_null(&self) -> bool {
        self.primitive || self.non_null
    }

    pub fn is_void(&self) -> bool {
        self.class_id() == Some(ClassId::VOID)
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match &self.class {
            Class::Named { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn is_class(&self, id: ClassId) -> bool {
        self.class_id() == Some(id)
    }

    pub fn args(&self) -> &[Type] {
        match &self.class {
            Class::Named { args, .. } => args,
            _ => &[],
        }
    }

    pub fn array_elem(&self) -> Option<&Type> {
        match &self.class {
            Class::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.class, Class::Array(_))
    }

    /// Numeric widening rank (primitive or boxed).
    pub fn numeric_rank(&self) -> Option<u8> {
        self.class_id().and_then(ClassId::numeric_rank)
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_boolean(&self) -> bool {
        self.is_class(ClassId::BOOLEAN)
    }

    pub fn is_string(&self) -> bool {
        self.is_class(ClassId::STRING)
    }

    /// `char` and `Character`.
    pub fn is_char(&self) -> bool {
        self.is_class(ClassId::CHARACTER)
    }

    pub fn has_primitive_peer(&self) -> bool {
        self.class_id().map(ClassId::has_primitive_peer).unwrap_or(false)
    }

    /// The non-null form of this type.
    pub fn to_non_null(&self) -> Type {
        if self.is_null() {
            return self.clone();
        }
        let mut ty = self.clone();
        ty.non_null = true;
        ty
    }

    /// The object (boxed) peer; non-primitive types are returned unchanged.
    pub fn to_object(&self) -> Type {
        let mut ty = self.clone();
        if ty.primitive {
            ty.primitive = false;
            ty.non_null = true;
        }
        ty
    }

    /// A type that can hold `null`: primitives box, objects drop non-null.
    pub fn to_nullable(&self) -> Type {
        let mut ty = self.to_object();
        if !ty.is_null() {
            ty.non_null = false;
        }
        ty
    }

    /// The primitive peer, if this class has one.
    pub fn to_primitive(&self) -> Option<Type> {
        if self.primitive {
            return Some(self.clone());
        }
        if !self.has_primitive_peer() || self.is_void() {
            return None;
        }
        Some(Type { class: self.class.clone(), primitive: true, non_null: true })
    }

    /// Same class and primitive bit, ignoring nullability.
    pub fn same_class(&self, other: &Type) -> bool {
        self.class == other.class && self.primitive == other.primitive
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Class::Null => write!(f, "null"),
            Class::Array(elem) => write!(f, "{}[]", elem),
            Class::Named { id, args } => {
                if self.primitive {
                    if let Some(name) = id.primitive_name() {
                        return write!(f, "{}", name);
                    }
                }
                match id.builtin_name() {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "<class#{}>", id.0)?,
                }
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

/// One coercion step applied to an expression's runtime value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conversion {
    pub from: Type,
    pub to: Type,
    pub cast_preferred: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_type_equals_only_itself() {
        assert_eq!(Type::NULL, Type::NULL);
        assert_ne!(Type::NULL, Type::OBJECT);
        assert_ne!(Type::NULL, Type::STRING.to_nullable());
    }

    #[test]
    fn nullability_is_part_of_equality() {
        assert_ne!(Type::STRING, Type::STRING.to_non_null());
        assert!(Type::STRING.same_class(&Type::STRING.to_non_null()));
    }

    #[test]
    fn primitive_boxing_round_trip() {
        let boxed = Type::INT.to_object();
        assert!(!boxed.is_primitive());
        assert!(boxed.is_non_null());
        assert_eq!(boxed.to_primitive(), Some(Type::INT));
        assert_eq!(Type::INT.to_nullable(), Type::INTEGER_OBJECT);
        assert_eq!(Type::STRING.to_primitive(), None);
    }

    #[test]
    fn display_spellings() {
        assert_eq!(Type::INT.to_string(), "int");
        assert_eq!(Type::INTEGER_OBJECT.to_string(), "Integer");
        assert_eq!(Type::array(Type::STRING).to_string(), "String[]");
        assert_eq!(Type::generic(ClassId::LIST, vec![Type::STRING]).to_string(), "List<String>");
        assert_eq!(Type::object(ClassId(40)).to_string(), "<class#40>");
    }
}
