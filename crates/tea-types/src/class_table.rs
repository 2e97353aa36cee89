// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Central registry of host classes.

use std::collections::HashMap;

use indexmap::IndexMap;
use tea_ast::{Class, ClassId, Type};

/// A member type that may depend on the receiver's type arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberType {
    Fixed(Type),
    /// The receiver's type argument at this position, `Object` when raw.
    Arg(usize),
}

impl MemberType {
    /// Substitute the receiver's type arguments.
    pub fn apply(&self, receiver_args: &[Type]) -> Type {
        match self {
            MemberType::Fixed(ty) => ty.clone(),
            MemberType::Arg(i) => receiver_args.get(*i).cloned().unwrap_or(Type::OBJECT),
        }
    }
}

/// A readable bean property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub ty: MemberType,
    pub readable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: MemberType,
    pub is_static: bool,
    /// Whether a call must attach a `{ ... }` substitution block.
    pub subst: bool,
}

impl MethodDef {
    pub fn new(name: &str, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.to_string(),
            params,
            return_type: MemberType::Fixed(return_type),
            is_static: false,
            subst: false,
        }
    }

    /// A method whose result is one of the receiver's type arguments.
    pub fn generic(name: &str, params: Vec<Type>, arg: usize) -> Self {
        Self {
            name: name.to_string(),
            params,
            return_type: MemberType::Arg(arg),
            is_static: false,
            subst: false,
        }
    }

    /// Mark the method as taking a substitution block after its arguments.
    pub fn with_subst(mut self) -> Self {
        self.subst = true;
        self
    }
}

/// What a `foreach` over an instance yields.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationFacet {
    pub element: MemberType,
    pub reverse: bool,
}

/// What `value[key]` reads from an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFacet {
    pub key: Type,
    pub element: MemberType,
    /// Name of the method performing the read.
    pub method: String,
}

/// A host class descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Fully qualified name, e.g. `java.util.List`.
    pub name: String,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    pub properties: IndexMap<String, PropertyDef>,
    pub methods: Vec<MethodDef>,
    pub iteration: Option<IterationFacet>,
    pub index: Option<IndexFacet>,
}

impl ClassDef {
    pub fn class(name: &str, superclass: Option<ClassId>) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            interfaces: Vec::new(),
            is_interface: false,
            properties: IndexMap::new(),
            methods: Vec::new(),
            iteration: None,
            index: None,
        }
    }

    pub fn interface(name: &str, extends: Vec<ClassId>) -> Self {
        Self { interfaces: extends, is_interface: true, ..Self::class(name, None) }
    }

    pub fn implements(mut self, interfaces: &[ClassId]) -> Self {
        self.interfaces.extend_from_slice(interfaces);
        self
    }

    pub fn property(mut self, name: &str, ty: MemberType) -> Self {
        self.properties.insert(name.to_string(), PropertyDef { ty, readable: true });
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn iterates(mut self, element: MemberType, reverse: bool) -> Self {
        self.iteration = Some(IterationFacet { element, reverse });
        self
    }

    pub fn indexed(mut self, key: Type, element: MemberType, method: &str) -> Self {
        self.index = Some(IndexFacet { key, element, method: method.to_string() });
        self
    }

    /// The unqualified class name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Registry of every class a template can name.
#[derive(Debug, Clone)]
pub struct ClassTable {
    pub(crate) classes: Vec<ClassDef>,
    names: HashMap<String, ClassId>,
    default_context: ClassId,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTable {
    /// A table holding the builtin classes and the default context class.
    pub fn new() -> Self {
        let mut table = Self { classes: Vec::new(), names: HashMap::new(), default_context: ClassId::OBJECT };
        table.register_builtins();
        table.default_context = table.register(crate::builtins::default_context());
        table
    }

    /// Register a class and return its id.
    pub fn register(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.names.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    /// Look up a class by fully qualified name.
    pub fn lookup(&self, qualified: &str) -> Option<ClassId> {
        self.names.get(qualified).copied()
    }

    /// The class whose functions a template may call unqualified.
    pub fn default_context(&self) -> ClassId {
        self.default_context
    }

    /// Resolve a type name as written in source.
    ///
    /// Primitive spellings win, then an exact qualified name, then each of
    /// `packages` as a prefix. A package entry may also name the class itself.
    pub fn resolve_type(&self, name: &str, dims: u32, packages: &[String]) -> Option<Type> {
        let base = match primitive_named(name) {
            Some(ty) => ty,
            None => Type::object(self.resolve_class(name, packages)?),
        };
        if base.is_void() && dims > 0 {
            return None;
        }
        Some((0..dims).fold(base, |elem, _| Type::array(elem)))
    }

    fn resolve_class(&self, name: &str, packages: &[String]) -> Option<ClassId> {
        if let Some(id) = self.lookup(name) {
            return Some(id);
        }
        packages.iter().find_map(|pkg| {
            let imported_class = pkg.rsplit('.').next() == Some(name);
            if imported_class {
                if let Some(id) = self.lookup(pkg) {
                    return Some(id);
                }
            }
            self.lookup(&format!("{}.{}", pkg, name))
        })
    }

    /// Whether `sub` is `sup` or inherits from it through classes or interfaces.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup || sup == ClassId::OBJECT {
            return true;
        }
        let mut stack = vec![sub];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            if id == sup {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(def) = self.get(id) {
                stack.extend(def.superclass);
                stack.extend(def.interfaces.iter().copied());
            }
        }
        false
    }

    /// The class itself followed by its superclasses, nearest first.
    pub fn superclass_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(sup) = self.get(current).and_then(|d| d.superclass) {
            if chain.contains(&sup) {
                break;
            }
            chain.push(sup);
            current = sup;
        }
        chain
    }

    /// Every interface `id` implements, directly or inherited.
    pub fn all_interfaces(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(def) = self.get(current) else { continue };
            if def.is_interface && current != id && !out.contains(&current) {
                out.push(current);
            }
            stack.extend(def.superclass);
            stack.extend(def.interfaces.iter().copied());
        }
        out
    }

    /// Walk the class and its supertypes, nearest first, until `f` yields.
    pub(crate) fn find_in_hierarchy<'t, T>(
        &'t self,
        id: ClassId,
        mut f: impl FnMut(ClassId, &'t ClassDef) -> Option<T>,
    ) -> Option<T> {
        let mut queue = std::collections::VecDeque::from([id]);
        let mut seen = Vec::new();
        while let Some(current) = queue.pop_front() {
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            let Some(def) = self.get(current) else { continue };
            if let Some(found) = f(current, def) {
                return Some(found);
            }
            queue.extend(def.superclass);
            queue.extend(def.interfaces.iter().copied());
        }
        if id != ClassId::OBJECT && !seen.contains(&ClassId::OBJECT) {
            let def = self.get(ClassId::OBJECT)?;
            return f(ClassId::OBJECT, def);
        }
        None
    }

    /// Human-readable spelling of a type, using simple class names.
    pub fn describe(&self, ty: &Type) -> String {
        match &ty.class {
            Class::Null => "null".to_string(),
            Class::Array(elem) => format!("{}[]", self.describe(elem)),
            Class::Named { id, args } => {
                if ty.primitive {
                    if let Some(name) = id.primitive_name() {
                        return name.to_string();
                    }
                }
                let mut out = match self.get(*id) {
                    Some(def) => def.simple_name().to_string(),
                    None => format!("<class#{}>", id.0),
                };
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| self.describe(a)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
        }
    }
}

fn primitive_named(name: &str) -> Option<Type> {
    let ty = match name {
        "boolean" => Type::BOOLEAN,
        "char" => Type::CHAR,
        "byte" => Type::BYTE,
        "short" => Type::SHORT,
        "int" => Type::INT,
        "long" => Type::LONG,
        "float" => Type::FLOAT,
        "double" => Type::DOUBLE,
        "void" => Type::VOID,
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang() -> Vec<String> {
        vec!["java.lang".to_string(), "java.util".to_string()]
    }

    #[test]
    fn builtin_ids_match_constants() {
        let table = ClassTable::new();
        for raw in 0..ClassId::BUILTIN_COUNT {
            let id = ClassId(raw);
            let def = table.get(id).expect("builtin registered");
            assert_eq!(Some(def.simple_name()), id.builtin_name());
        }
        assert_eq!(table.default_context(), ClassId(ClassId::BUILTIN_COUNT));
    }

    #[test]
    fn resolves_primitives_imports_and_arrays() {
        let table = ClassTable::new();
        assert_eq!(table.resolve_type("int", 0, &[]), Some(Type::INT));
        assert_eq!(table.resolve_type("String", 1, &lang()), Some(Type::array(Type::STRING)));
        assert_eq!(table.resolve_type("java.util.List", 0, &[]), Some(Type::LIST));
        assert_eq!(table.resolve_type("List", 0, &[]), None);
        assert_eq!(table.resolve_type("Map", 0, &["java.util.Map".to_string()]), Some(Type::MAP));
        assert_eq!(table.resolve_type("Widget", 0, &lang()), None);
        assert_eq!(table.resolve_type("void", 1, &[]), None);
    }

    #[test]
    fn hierarchy_queries() {
        let table = ClassTable::new();
        assert!(table.is_subclass(ClassId::INTEGER, ClassId::NUMBER));
        assert!(table.is_subclass(ClassId::LIST, ClassId::ITERABLE));
        assert!(table.is_subclass(ClassId::STRING, ClassId::OBJECT));
        assert!(!table.is_subclass(ClassId::NUMBER, ClassId::INTEGER));
        assert_eq!(
            table.superclass_chain(ClassId::LONG),
            vec![ClassId::LONG, ClassId::NUMBER, ClassId::OBJECT]
        );
        assert!(table.all_interfaces(ClassId::STRING).contains(&ClassId::COMPARABLE));
    }

    #[test]
    fn user_classes_get_fresh_ids() {
        let mut table = ClassTable::new();
        let id = table.register(
            ClassDef::class("com.example.Widget", Some(ClassId::OBJECT))
                .property("label", MemberType::Fixed(Type::STRING)),
        );
        assert!(id.0 > ClassId::BUILTIN_COUNT);
        assert_eq!(table.resolve_type("Widget", 0, &["com.example".to_string()]), Some(Type::object(id)));
        assert_eq!(table.describe(&Type::array(Type::object(id))), "Widget[]");
    }
}
