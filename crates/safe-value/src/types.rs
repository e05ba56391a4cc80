//! Runtime type handles
//!
//! A `TypeHandle` is the metadata-side description of a static type: the
//! declaring type of a member, a parameter type, or a field's value type.
//! Coercions consult it to decide whether a `Value` can flow into a slot.
//!
//! | Kind        | Examples                      | Coercion on the untyped surface |
//! |-------------|-------------------------------|---------------------------------|
//! | `Any`       | `Value`                       | identity                        |
//! | `Void`      | `()`                          | identity                        |
//! | `Value`     | `bool`, `i32`, `i64`, `f64`   | unbox (exact variant)           |
//! | `Reference` | `String`, `Handle<T>`         | safe or hard cast               |

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::Value;

/// Category of a runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The universal object type; accepts every value
    Any,
    /// No value (method returning unit)
    Void,
    /// Primitive stored inline in `Value`
    Value,
    /// Heap value (string or class instance)
    Reference,
}

/// Handle to a runtime type.
///
/// Two handles are equal when they denote the same Rust type with the same
/// nullability.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
    nullable: bool,
}

impl TypeHandle {
    /// The universal object type
    pub fn any() -> Self {
        Self {
            id: TypeId::of::<Value>(),
            name: "object",
            kind: TypeKind::Any,
            nullable: true,
        }
    }

    /// The unit type
    pub fn void() -> Self {
        Self {
            id: TypeId::of::<()>(),
            name: "void",
            kind: TypeKind::Void,
            nullable: true,
        }
    }

    /// A primitive value type
    pub fn value<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Value,
            nullable: false,
        }
    }

    /// A reference type (strings and class instances)
    pub fn reference<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Reference,
            nullable: false,
        }
    }

    /// The same type, but admitting null
    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Rust type id of the stored type
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path (e.g. `app::model::Point`)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }

    /// Type category
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether null is an acceptable value
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether this is the universal object type
    pub fn is_any(&self) -> bool {
        self.kind == TypeKind::Any
    }

    /// Whether this is a primitive value type
    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Value
    }

    /// Whether this is a reference type
    pub fn is_reference_type(&self) -> bool {
        self.kind == TypeKind::Reference
    }

    /// Whether this handle denotes `T` (ignoring nullability)
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Whether two handles denote the same Rust type (ignoring nullability)
    pub fn same_type(&self, other: &TypeHandle) -> bool {
        self.id == other.id
    }

    /// Runtime type test: can `value` be stored in a slot of this type?
    pub fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            TypeKind::Any => true,
            TypeKind::Void => value.is_null(),
            TypeKind::Value | TypeKind::Reference => match value.runtime_type_id() {
                Some(id) => id == self.id,
                None => self.nullable,
            },
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.nullable == other.nullable
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.nullable.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({}", self.name)?;
        if self.nullable && self.kind != TypeKind::Any && self.kind != TypeKind::Void {
            write!(f, "?")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())?;
        if self.nullable && self.kind != TypeKind::Any && self.kind != TypeKind::Void {
            f.write_str("?")?;
        }
        Ok(())
    }
}
