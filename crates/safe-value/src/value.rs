//! Value: the untyped "object" of the accessor surface
//!
//! Primitives (`bool`, `i32`, `i64`, `f64`) are stored inline and behave as
//! value types: reading one out requires the exact variant. Strings and class
//! instances are reference types; class instances live in an [`ObjectRef`]
//! cell shared by every clone of the value.
//!
//! ```text
//! Null              absent value / null reference
//! Bool(bool)        value type
//! I32(i32)          value type
//! I64(i64)          value type
//! F64(f64)          value type
//! Str(Arc<str>)     reference type (immutable)
//! Object(ObjectRef) reference type (shared, interior-mutable)
//! ```

use std::any::TypeId;
use std::sync::Arc;

use crate::object::ObjectRef;
use crate::types::TypeHandle;

/// Untyped value passed across the accessor boundary.
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Class instance
    Object(ObjectRef),
}

impl Value {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an i32 value
    #[inline]
    pub const fn i32(i: i32) -> Self {
        Value::I32(i)
    }

    /// Create an i64 value
    #[inline]
    pub const fn i64(i: i64) -> Self {
        Value::I64(i)
    }

    /// Create an f64 value
    #[inline]
    pub const fn f64(f: f64) -> Self {
        Value::F64(f)
    }

    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Box a Rust value into a fresh object cell
    pub fn object<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Value::Object(ObjectRef::new(value))
    }

    // ========================================================================
    // Type checks
    // ========================================================================

    /// Check if value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is an object
    #[inline]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Rust type id of the runtime value, `None` for null
    pub fn runtime_type_id(&self) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeId::of::<bool>()),
            Value::I32(_) => Some(TypeId::of::<i32>()),
            Value::I64(_) => Some(TypeId::of::<i64>()),
            Value::F64(_) => Some(TypeId::of::<f64>()),
            Value::Str(_) => Some(TypeId::of::<String>()),
            Value::Object(obj) => Some(obj.class().id()),
        }
    }

    /// Runtime type handle, `None` for null
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeHandle::value::<bool>()),
            Value::I32(_) => Some(TypeHandle::value::<i32>()),
            Value::I64(_) => Some(TypeHandle::value::<i64>()),
            Value::F64(_) => Some(TypeHandle::value::<f64>()),
            Value::Str(_) => Some(TypeHandle::reference::<String>()),
            Value::Object(obj) => Some(*obj.class()),
        }
    }

    // ========================================================================
    // Extractors
    // ========================================================================

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract i32 value
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract i64 value
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract f64 value
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Borrow the object cell
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Str(_) => "String",
            Value::Object(obj) => obj.class().short_name(),
        }
    }
}

/// Primitives compare by value, strings by contents, objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::I32(i) => write!(f, "Value::I32({})", i),
            Value::I64(i) => write!(f, "Value::I64({})", i),
            Value::F64(x) => write!(f, "Value::F64({})", x),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::Object(obj) => write!(f, "Value::Object({:?})", obj),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i32,
    }

    #[test]
    fn test_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert!(v.runtime_type_id().is_none());
        assert_eq!(v.type_name(), "null");
    }

    #[test]
    fn test_primitive_extractors() {
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::i32(-4).as_i32(), Some(-4));
        assert_eq!(Value::i64(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::f64(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::i32(1).as_i64(), None);
        assert_eq!(Value::string("hi").as_str(), Some("hi"));
    }

    #[test]
    fn test_object_identity_equality() {
        let a = Value::object(Point { x: 1 });
        let b = a.clone();
        let c = Value::object(Point { x: 1 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.type_name(), "Point");
    }

    #[test]
    fn test_runtime_type() {
        let p = Value::object(Point { x: 3 });
        assert_eq!(p.runtime_type_id(), Some(TypeId::of::<Point>()));
        assert_eq!(
            Value::string("s").runtime_type(),
            Some(TypeHandle::reference::<String>())
        );
        let obj = p.as_object().map(|o| o.read().downcast_ref::<Point>().map(|p| p.x));
        assert_eq!(obj, Some(Some(3)));
    }
}
