//! Object cells and typed handles
//!
//! Class instances are reference values: every clone of an `ObjectRef`
//! points at the same `RwLock`-guarded cell, so a write through one
//! accessor is visible through every other reference.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::error::{ValueError, ValueResult};
use crate::types::TypeHandle;
use crate::value::Value;

/// Shared, interior-mutable cell holding one class instance.
#[derive(Clone)]
pub struct ObjectRef {
    class: TypeHandle,
    cell: Arc<RwLock<dyn Any + Send + Sync>>,
}

impl ObjectRef {
    /// Allocate a new object cell
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let cell: Arc<RwLock<dyn Any + Send + Sync>> = Arc::new(RwLock::new(value));
        Self {
            class: TypeHandle::reference::<T>(),
            cell,
        }
    }

    /// Class of the stored instance
    pub fn class(&self) -> &TypeHandle {
        &self.class
    }

    /// Whether the stored instance is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.class.is::<T>()
    }

    /// Lock the cell for reading
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Any + Send + Sync> {
        self.cell.read()
    }

    /// Lock the cell for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Any + Send + Sync> {
        self.cell.write()
    }

    /// Whether two references point at the same cell
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:p}",
            self.class.short_name(),
            Arc::as_ptr(&self.cell) as *const ()
        )
    }
}

// ============================================================================
// Handle<T>
// ============================================================================

/// Typed reference to an object whose class is known to be `T`.
pub struct Handle<T> {
    object: ObjectRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Handle<T> {
    /// Allocate a new instance and return a handle to it
    pub fn new(value: T) -> Self {
        Self {
            object: ObjectRef::new(value),
            _marker: PhantomData,
        }
    }

    /// Wrap an existing object, checking its class
    pub fn from_object(object: ObjectRef) -> ValueResult<Self> {
        if !object.is::<T>() {
            return Err(ValueError::mismatch(
                TypeHandle::reference::<T>().short_name(),
                object.class().short_name(),
            ));
        }
        Ok(Self {
            object,
            _marker: PhantomData,
        })
    }

    /// Wrap an untyped value, checking that it is a `T` instance
    pub fn cast(value: &Value) -> ValueResult<Self> {
        match value {
            Value::Object(obj) => Self::from_object(obj.clone()),
            Value::Null => Err(ValueError::NullValue {
                expected: TypeHandle::reference::<T>().short_name().to_string(),
            }),
            other => Err(ValueError::mismatch(
                TypeHandle::reference::<T>().short_name(),
                other.type_name(),
            )),
        }
    }

    /// Lock the instance for reading
    pub fn read(&self) -> ValueResult<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.object.read(), |any| any.downcast_ref::<T>())
            .map_err(|_| self.class_mismatch())
    }

    /// Lock the instance for writing
    pub fn write(&self) -> ValueResult<MappedRwLockWriteGuard<'_, T>> {
        RwLockWriteGuard::try_map(self.object.write(), |any| any.downcast_mut::<T>())
            .map_err(|_| self.class_mismatch())
    }

    /// Borrow the untyped object
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Convert into an untyped value sharing the same cell
    pub fn to_value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    fn class_mismatch(&self) -> ValueError {
        ValueError::mismatch(
            TypeHandle::reference::<T>().short_name(),
            self.object.class().short_name(),
        )
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.object.ptr_eq(&other.object)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:?})", self.object)
    }
}
