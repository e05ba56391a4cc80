//! Conversion traits between Rust types and `Value`
//!
//! `Reflect` is implemented by every type that can appear as a member's
//! value type, parameter type, or return type. `from_value` is the checked
//! (hard) cast used once a coercion has accepted a value; `into_value` is
//! boxing.
//!
//! `Arguments` describes a positional parameter list. Member signatures are
//! heterogeneous, so arguments always travel as `&[Value]` and are unpacked
//! into a tuple right before the wrapped member runs.

use std::any::Any;
use std::sync::Arc;

use crate::error::{ValueError, ValueResult};
use crate::object::Handle;
use crate::types::TypeHandle;
use crate::value::Value;

/// Convert between a Rust type and an untyped `Value`.
pub trait Reflect: Sized + Send + Sync + 'static {
    /// Static type of `Self` as seen by coercions
    fn type_handle() -> TypeHandle;

    /// Unbox or cast from a `Value`, failing if the runtime type differs
    fn from_value(value: Value) -> ValueResult<Self>;

    /// Box into a `Value`
    fn into_value(self) -> Value;
}

fn mismatch<T: Reflect>(value: &Value) -> ValueError {
    if value.is_null() {
        ValueError::NullValue {
            expected: T::type_handle().to_string(),
        }
    } else {
        ValueError::mismatch(T::type_handle().to_string(), value.type_name())
    }
}

// ============================================================================
// Universal and unit types
// ============================================================================

impl Reflect for Value {
    fn type_handle() -> TypeHandle {
        TypeHandle::any()
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        Ok(value)
    }

    fn into_value(self) -> Value {
        self
    }
}

// Unit type (for members that return nothing)
impl Reflect for () {
    fn type_handle() -> TypeHandle {
        TypeHandle::void()
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        if value.is_null() {
            Ok(())
        } else {
            Err(mismatch::<()>(&value))
        }
    }

    fn into_value(self) -> Value {
        Value::Null
    }
}

// ============================================================================
// Primitive value types
// ============================================================================

macro_rules! impl_reflect_primitive {
    ($ty:ty, $variant:ident) => {
        impl Reflect for $ty {
            fn type_handle() -> TypeHandle {
                TypeHandle::value::<$ty>()
            }

            fn from_value(value: Value) -> ValueResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch::<$ty>(&other)),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_reflect_primitive!(bool, Bool);
impl_reflect_primitive!(i32, I32);
impl_reflect_primitive!(i64, I64);
impl_reflect_primitive!(f64, F64);

// ============================================================================
// Reference types
// ============================================================================

impl Reflect for String {
    fn type_handle() -> TypeHandle {
        TypeHandle::reference::<String>()
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch::<String>(&other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Str(Arc::from(self))
    }
}

impl<T: Any + Send + Sync> Reflect for Handle<T> {
    fn type_handle() -> TypeHandle {
        TypeHandle::reference::<T>()
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        Handle::cast(&value)
    }

    fn into_value(self) -> Value {
        self.to_value()
    }
}

/// `None` is null; the inner type decides everything else.
impl<T: Reflect> Reflect for Option<T> {
    fn type_handle() -> TypeHandle {
        T::type_handle().nullable()
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Ordered, positional parameter list.
pub trait Arguments: Sized + 'static {
    /// Number of positional parameters
    const ARITY: usize;

    /// Parameter types in declaration order
    fn parameter_types() -> Vec<TypeHandle>;

    /// Unpack an argument vector, failing on a length or type mismatch
    fn from_args(args: &[Value]) -> ValueResult<Self>;
}

impl Arguments for () {
    const ARITY: usize = 0;

    fn parameter_types() -> Vec<TypeHandle> {
        Vec::new()
    }

    fn from_args(args: &[Value]) -> ValueResult<Self> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(ValueError::ArgumentCount {
                expected: 0,
                got: args.len(),
            })
        }
    }
}

macro_rules! impl_arguments {
    ($arity:expr; $($ty:ident $arg:ident),+) => {
        impl<$($ty: Reflect),+> Arguments for ($($ty,)+) {
            const ARITY: usize = $arity;

            fn parameter_types() -> Vec<TypeHandle> {
                vec![$($ty::type_handle()),+]
            }

            fn from_args(args: &[Value]) -> ValueResult<Self> {
                match args {
                    [$($arg),+] => Ok(($($ty::from_value($arg.clone())?,)+)),
                    _ => Err(ValueError::ArgumentCount {
                        expected: $arity,
                        got: args.len(),
                    }),
                }
            }
        }
    };
}

impl_arguments!(1; A a);
impl_arguments!(2; A a, B b);
impl_arguments!(3; A a, B b, C c);
impl_arguments!(4; A a, B b, C c, D d);
impl_arguments!(5; A a, B b, C c, D d, E e);
impl_arguments!(6; A a, B b, C c, D d, E e, F f);
