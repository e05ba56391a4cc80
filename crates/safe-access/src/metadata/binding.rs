//! Member bindings
//!
//! A binding is the raw, already-resolved implementation of a member, the
//! equivalent of what a reflection facility hands out for a field or method.
//! Each member carries two forms produced once at registration time:
//!
//! - **typed** bindings operate on `&T`/`&mut T` and `V` directly and back
//!   the typed accessor surface;
//! - **erased** bindings operate on `dyn Any` receivers and `Value`s and back
//!   the untyped surface.
//!
//! Erased bindings are derived from typed ones (`erase_*`), so both surfaces
//! run the same member code. Neither form coerces arguments; that is the
//! compiled thunk's job.

use std::any::Any;
use std::sync::Arc;

use safe_value::{Reflect, TypeHandle, Value, ValueError};

use crate::error::{AccessError, AccessResult};

/// Shared receiver of an erased binding (`None` for static members)
pub type Receiver<'a> = Option<&'a (dyn Any + Send + Sync)>;

/// Exclusive receiver of an erased binding (`None` for static members)
pub type ReceiverMut<'a> = Option<&'a mut (dyn Any + Send + Sync)>;

pub(crate) type ErasedConstruct = Arc<dyn Fn(&[Value]) -> AccessResult<Value> + Send + Sync>;
pub(crate) type ErasedReinit =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), &[Value]) -> AccessResult<()> + Send + Sync>;
pub(crate) type ErasedGet =
    Arc<dyn Fn(Receiver<'_>, &[Value]) -> AccessResult<Value> + Send + Sync>;
pub(crate) type ErasedSet =
    Arc<dyn Fn(ReceiverMut<'_>, &[Value], Value) -> AccessResult<()> + Send + Sync>;
pub(crate) type ErasedInvoke =
    Arc<dyn Fn(ReceiverMut<'_>, &[Value]) -> AccessResult<Value> + Send + Sync>;

/// Erased form of a member, selected by member kind
#[derive(Clone)]
pub(crate) enum ErasedBinding {
    /// Allocate a new instance, or rerun construction over an existing one
    Constructor {
        construct: ErasedConstruct,
        reinit: ErasedReinit,
    },
    /// Field, property, or indexer
    Value {
        get: Option<ErasedGet>,
        set: Option<ErasedSet>,
    },
    /// Static or instance method
    Method { invoke: ErasedInvoke },
}

// ============================================================================
// Typed bindings
// ============================================================================

/// Typed constructor: positional arguments in, new `T` out
pub(crate) struct TypedConstruct<T>(pub Arc<dyn Fn(&[Value]) -> AccessResult<T> + Send + Sync>);

/// Typed read: optional receiver and index arguments in, `V` out
pub(crate) struct TypedGet<T, V>(
    pub Arc<dyn Fn(Option<&T>, &[Value]) -> AccessResult<V> + Send + Sync>,
);

/// Typed write: optional receiver, index arguments and `V` in
pub(crate) struct TypedSet<T, V>(
    pub Arc<dyn Fn(Option<&mut T>, &[Value], V) -> AccessResult<()> + Send + Sync>,
);

/// Typed call: optional receiver and positional arguments in, `R` out
pub(crate) struct TypedInvoke<T, R>(
    pub Arc<dyn Fn(Option<&mut T>, &[Value]) -> AccessResult<R> + Send + Sync>,
);

impl<T> TypedConstruct<T> {
    pub(crate) fn new(f: impl Fn(&[Value]) -> AccessResult<T> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl<T, V> TypedGet<T, V> {
    pub(crate) fn new(
        f: impl Fn(Option<&T>, &[Value]) -> AccessResult<V> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }
}

impl<T, V> TypedSet<T, V> {
    pub(crate) fn new(
        f: impl Fn(Option<&mut T>, &[Value], V) -> AccessResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }
}

impl<T, R> TypedInvoke<T, R> {
    pub(crate) fn new(
        f: impl Fn(Option<&mut T>, &[Value]) -> AccessResult<R> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }
}

// Manual impls: derive would demand `T: Clone`.
impl<T> Clone for TypedConstruct<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T, V> Clone for TypedGet<T, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T, V> Clone for TypedSet<T, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T, R> Clone for TypedInvoke<T, R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// Typed binding of a constructor member
pub(crate) struct TypedConstructorBinding<T> {
    pub construct: TypedConstruct<T>,
}

/// Typed binding of a field, property, or indexer member
pub(crate) struct TypedValueBinding<T, V> {
    pub get: Option<TypedGet<T, V>>,
    pub set: Option<TypedSet<T, V>>,
}

/// Typed binding of a method member
pub(crate) struct TypedMethodBinding<T, R> {
    pub invoke: TypedInvoke<T, R>,
}

// ============================================================================
// Erasure
// ============================================================================

pub(crate) fn missing_receiver() -> AccessError {
    AccessError::InvalidOperation("instance member reached without a receiver".to_string())
}

fn receiver_mismatch<T: 'static>(found: &str) -> AccessError {
    AccessError::Value(ValueError::mismatch(
        TypeHandle::reference::<T>().short_name(),
        found,
    ))
}

fn downcast_ref<T: Any>(recv: &(dyn Any + Send + Sync)) -> AccessResult<&T> {
    recv.downcast_ref::<T>()
        .ok_or_else(|| receiver_mismatch::<T>("foreign receiver"))
}

fn downcast_mut<T: Any>(recv: &mut (dyn Any + Send + Sync)) -> AccessResult<&mut T> {
    recv.downcast_mut::<T>()
        .ok_or_else(|| receiver_mismatch::<T>("foreign receiver"))
}

pub(crate) fn erase_construct<T: Any + Send + Sync>(typed: &TypedConstruct<T>) -> ErasedConstruct {
    let typed = typed.clone();
    Arc::new(move |args: &[Value]| (typed.0)(args).map(Value::object))
}

pub(crate) fn erase_reinit<T: Any + Send + Sync>(typed: &TypedConstruct<T>) -> ErasedReinit {
    let typed = typed.clone();
    Arc::new(move |recv: &mut (dyn Any + Send + Sync), args: &[Value]| {
        let slot = downcast_mut::<T>(recv)?;
        *slot = (typed.0)(args)?;
        Ok(())
    })
}

pub(crate) fn erase_get<T: Any + Send + Sync, V: Reflect>(typed: &TypedGet<T, V>) -> ErasedGet {
    let typed = typed.clone();
    Arc::new(
        move |recv: Option<&(dyn Any + Send + Sync)>, index: &[Value]| {
            let target = match recv {
                Some(r) => Some(downcast_ref::<T>(r)?),
                None => None,
            };
            (typed.0)(target, index).map(Reflect::into_value)
        },
    )
}

pub(crate) fn erase_set<T: Any + Send + Sync, V: Reflect>(typed: &TypedSet<T, V>) -> ErasedSet {
    let typed = typed.clone();
    Arc::new(
        move |recv: Option<&mut (dyn Any + Send + Sync)>, index: &[Value], value: Value| {
            let target = match recv {
                Some(r) => Some(downcast_mut::<T>(r)?),
                None => None,
            };
            let value = V::from_value(value)?;
            (typed.0)(target, index, value)
        },
    )
}

pub(crate) fn erase_invoke<T: Any + Send + Sync, R: Reflect>(
    typed: &TypedInvoke<T, R>,
) -> ErasedInvoke {
    let typed = typed.clone();
    Arc::new(
        move |recv: Option<&mut (dyn Any + Send + Sync)>, args: &[Value]| {
            let target = match recv {
                Some(r) => Some(downcast_mut::<T>(r)?),
                None => None,
            };
            (typed.0)(target, args).map(Reflect::into_value)
        },
    )
}
