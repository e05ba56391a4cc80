//! Compiler/backend
//!
//! Turns an [`OperationPlan`] into a callable thunk, once, when an accessor
//! is built. Compilation selects one of a small closed set of closure shapes
//! by matching on the plan variant and the member's binding, and binds the
//! plan's coercions into it. Nothing is looked up per call.
//!
//! Access checks happen here too: a denied permission, allocating an
//! abstract type, or a plan that does not fit its descriptor fails with
//! `AccessorCompilationFailed` before any thunk exists.
//!
//! Untyped thunks receive the target as a `&Value` (`Value::Null` for none).
//! Instance members lock the target's cell for the duration of the call:
//! shared for reads, exclusive for writes, calls and in-place construction.
//! The cell lock is not reentrant, so an argument or assigned value that is
//! the target itself is refused with `AliasedTarget` before locking.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use safe_value::{ObjectRef, Reflect, TypeHandle, Value, NO_ARGS};

use crate::descriptor::MemberDescriptor;
use crate::error::{AccessError, AccessResult, CastSite};
use crate::metadata::{
    ErasedBinding, TypedConstructorBinding, TypedMethodBinding, TypedValueBinding,
};
use crate::permissions::AccessPolicy;
use crate::plan::{ArgumentPlan, ArgumentSlot, Coercion, Dispatch, OperationPlan};

type ConstructFn = Box<dyn Fn(&[Value]) -> AccessResult<Value> + Send + Sync>;
type TargetFn = Box<dyn Fn(&Value, &[Value]) -> AccessResult<Value> + Send + Sync>;
type WriteFn = Box<dyn Fn(&Value, &[Value], Value) -> AccessResult<()> + Send + Sync>;

/// Typed allocation thunk
pub type TypedConstructThunk<T> = Box<dyn Fn(&[Value]) -> AccessResult<T> + Send + Sync>;
/// Typed in-place construction thunk
pub type TypedReinitThunk<T> =
    Box<dyn Fn(Option<&mut T>, &[Value]) -> AccessResult<()> + Send + Sync>;
/// Typed read thunk (index arguments stay untyped)
pub type TypedReadThunk<T, V> =
    Box<dyn Fn(Option<&T>, &[Value]) -> AccessResult<V> + Send + Sync>;
/// Typed write thunk (index arguments stay untyped)
pub type TypedWriteThunk<T, V> =
    Box<dyn Fn(Option<&mut T>, &[Value], V) -> AccessResult<()> + Send + Sync>;
/// Typed call thunk (positional arguments stay untyped)
pub type TypedCallThunk<T, R> =
    Box<dyn Fn(Option<&mut T>, &[Value]) -> AccessResult<R> + Send + Sync>;

/// Compiled untyped operation
pub enum CompiledThunk {
    /// `(args) -> new instance`
    Construct(ConstructFn),
    /// `(target, args) -> result` for calls and in-place construction
    Call(TargetFn),
    /// `(target, index) -> value`
    Read(TargetFn),
    /// `(target, index, value)`
    Write(WriteFn),
}

impl CompiledThunk {
    fn shape(&self) -> &'static str {
        match self {
            CompiledThunk::Construct(_) => "construct",
            CompiledThunk::Call(_) => "call",
            CompiledThunk::Read(_) => "read",
            CompiledThunk::Write(_) => "write",
        }
    }

    fn wrong_shape(&self, wanted: &str) -> AccessError {
        AccessError::InvalidOperation(format!(
            "{} thunk used as a {} thunk",
            self.shape(),
            wanted
        ))
    }

    /// Run an allocation thunk
    pub fn construct(&self, args: &[Value]) -> AccessResult<Value> {
        match self {
            CompiledThunk::Construct(f) => f(args),
            other => Err(other.wrong_shape("construct")),
        }
    }

    /// Run a call thunk
    pub fn call(&self, target: &Value, args: &[Value]) -> AccessResult<Value> {
        match self {
            CompiledThunk::Call(f) => f(target, args),
            other => Err(other.wrong_shape("call")),
        }
    }

    /// Run a read thunk
    pub fn read(&self, target: &Value, index: &[Value]) -> AccessResult<Value> {
        match self {
            CompiledThunk::Read(f) => f(target, index),
            other => Err(other.wrong_shape("read")),
        }
    }

    /// Run a write thunk
    pub fn write(&self, target: &Value, index: &[Value], value: Value) -> AccessResult<()> {
        match self {
            CompiledThunk::Write(f) => f(target, index, value),
            other => Err(other.wrong_shape("write")),
        }
    }
}

impl fmt::Debug for CompiledThunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledThunk::{}", self.shape())
    }
}

// ============================================================================
// Coercion
// ============================================================================

enum Verdict {
    Keep,
    Null,
}

fn verdict(
    member: &str,
    site: CastSite,
    slot: &ArgumentSlot,
    value: &Value,
) -> AccessResult<Verdict> {
    match slot.coercion {
        Coercion::Identity => Ok(Verdict::Keep),
        _ if slot.ty.accepts(value) => Ok(Verdict::Keep),
        Coercion::SafeCast if slot.ty.is_nullable() => Ok(Verdict::Null),
        _ => Err(AccessError::InvalidCast {
            member: member.to_string(),
            site,
            expected: slot.ty.to_string(),
            found: value.type_name().to_string(),
        }),
    }
}

fn coerce_value(member: &str, slot: &ArgumentSlot, value: Value) -> AccessResult<Value> {
    match verdict(member, CastSite::Value, slot, &value)? {
        Verdict::Keep => Ok(value),
        Verdict::Null => Ok(Value::Null),
    }
}

/// Check length and coerce every position.
///
/// Positional parameters never use `SafeCast`, so the arguments pass through
/// unchanged once every position is accepted.
fn coerce_args<'a>(
    member: &str,
    plan: &ArgumentPlan,
    args: &'a [Value],
) -> AccessResult<&'a [Value]> {
    if args.len() != plan.arity() {
        return Err(AccessError::ArgumentCount {
            member: member.to_string(),
            expected: plan.arity(),
            got: args.len(),
        });
    }
    if plan.is_empty() {
        return Ok(NO_ARGS);
    }
    for (slot, arg) in plan.slots().iter().zip(args) {
        verdict(member, CastSite::Argument(slot.position), slot, arg)?;
    }
    Ok(args)
}

/// Refuse a call whose arguments or assigned value are the target itself
fn reject_alias(
    member: &str,
    target: &ObjectRef,
    args: &[Value],
    value: Option<&Value>,
) -> AccessResult<()> {
    let aliases = |v: &Value| matches!(v, Value::Object(o) if o.ptr_eq(target));
    let site = match args.iter().position(aliases) {
        Some(i) => CastSite::Argument(i),
        None if value.is_some_and(aliases) => CastSite::Value,
        None => return Ok(()),
    };
    Err(AccessError::AliasedTarget {
        member: member.to_string(),
        site,
    })
}

fn target_object<'t>(
    member: &str,
    declaring_type: &TypeHandle,
    target: &'t Value,
) -> AccessResult<&'t ObjectRef> {
    match target {
        Value::Null => Err(AccessError::TargetNull {
            member: member.to_string(),
        }),
        Value::Object(obj) if obj.class().same_type(declaring_type) => Ok(obj),
        other => Err(AccessError::TargetMismatch {
            member: member.to_string(),
            expected: declaring_type.short_name().to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

fn require_target<'t, T>(member: &str, target: Option<&'t T>) -> AccessResult<&'t T> {
    target.ok_or_else(|| AccessError::TargetNull {
        member: member.to_string(),
    })
}

fn require_target_mut<'t, T>(member: &str, target: Option<&'t mut T>) -> AccessResult<&'t mut T> {
    target.ok_or_else(|| AccessError::TargetNull {
        member: member.to_string(),
    })
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles operation plans under an access policy
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'p> {
    policy: &'p AccessPolicy,
}

impl<'p> Compiler<'p> {
    /// Create a compiler enforcing `policy`
    pub fn new(policy: &'p AccessPolicy) -> Self {
        Self { policy }
    }

    fn admit(&self, descriptor: &MemberDescriptor, plan: &OperationPlan) -> AccessResult<()> {
        let member = descriptor.qualified_name();
        if plan.arguments().arity() != descriptor.arity() {
            return Err(AccessError::compilation_failed(
                member,
                format!(
                    "plan unpacks {} argument(s) but the member declares {}",
                    plan.arguments().arity(),
                    descriptor.arity()
                ),
            ));
        }
        if matches!(plan, OperationPlan::Construct { .. }) && descriptor.member().is_abstract() {
            return Err(AccessError::compilation_failed(
                member,
                format!("{} is abstract", descriptor.declaring_type().short_name()),
            ));
        }
        self.policy.check(descriptor, plan.operation())
    }

    fn mismatch(descriptor: &MemberDescriptor, plan: &OperationPlan) -> AccessError {
        AccessError::compilation_failed(
            descriptor.qualified_name(),
            format!(
                "{} plan does not fit {} binding",
                plan.operation(),
                descriptor.kind()
            ),
        )
    }

    fn compiled(descriptor: &MemberDescriptor, plan: &OperationPlan, surface: &str) {
        tracing::debug!(
            member = %descriptor.qualified_name(),
            operation = %plan.operation(),
            dispatch = ?plan.dispatch(),
            arity = plan.arguments().arity(),
            surface,
            "compiled accessor thunk"
        );
    }

    /// Compile a plan for the untyped surface
    pub fn compile(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<CompiledThunk> {
        self.admit(descriptor, plan)?;
        let member = descriptor.qualified_name();

        let thunk = match (plan, &descriptor.member().erased) {
            (OperationPlan::Construct { args }, ErasedBinding::Constructor { construct, .. }) => {
                let construct = Arc::clone(construct);
                let args = args.clone();
                CompiledThunk::Construct(Box::new(move |values: &[Value]| {
                    let values = coerce_args(&member, &args, values)?;
                    construct(values)
                }))
            }
            (
                OperationPlan::ConstructInPlace {
                    declaring_type,
                    args,
                },
                ErasedBinding::Constructor { reinit, .. },
            ) => {
                let reinit = Arc::clone(reinit);
                let declaring_type = *declaring_type;
                let args = args.clone();
                CompiledThunk::Call(Box::new(move |target: &Value, values: &[Value]| {
                    let obj = target_object(&member, &declaring_type, target)?;
                    let values = coerce_args(&member, &args, values)?;
                    reject_alias(&member, obj, values, None)?;
                    let mut cell = obj.write();
                    reinit(&mut *cell, values)?;
                    Ok(Value::Null)
                }))
            }
            (
                OperationPlan::Get { dispatch, index },
                ErasedBinding::Value { get: Some(get), .. },
            ) => {
                let get = Arc::clone(get);
                let dispatch = *dispatch;
                let index = index.clone();
                CompiledThunk::Read(Box::new(move |target: &Value, values: &[Value]| {
                    match dispatch {
                        Dispatch::Static => {
                            let values = coerce_args(&member, &index, values)?;
                            get(None, values)
                        }
                        Dispatch::Instance { declaring_type } => {
                            let obj = target_object(&member, &declaring_type, target)?;
                            let values = coerce_args(&member, &index, values)?;
                            reject_alias(&member, obj, values, None)?;
                            let cell = obj.read();
                            get(Some(&*cell), values)
                        }
                    }
                }))
            }
            (
                OperationPlan::Set {
                    dispatch,
                    index,
                    value,
                },
                ErasedBinding::Value { set: Some(set), .. },
            ) => {
                let set = Arc::clone(set);
                let dispatch = *dispatch;
                let index = index.clone();
                let slot = *value;
                CompiledThunk::Write(Box::new(
                    move |target: &Value, values: &[Value], value: Value| match dispatch {
                        Dispatch::Static => {
                            let values = coerce_args(&member, &index, values)?;
                            let value = coerce_value(&member, &slot, value)?;
                            set(None, values, value)
                        }
                        Dispatch::Instance { declaring_type } => {
                            let obj = target_object(&member, &declaring_type, target)?;
                            let values = coerce_args(&member, &index, values)?;
                            let value = coerce_value(&member, &slot, value)?;
                            reject_alias(&member, obj, values, Some(&value))?;
                            let mut cell = obj.write();
                            set(Some(&mut *cell), values, value)
                        }
                    },
                ))
            }
            (OperationPlan::Invoke { dispatch, args }, ErasedBinding::Method { invoke }) => {
                let invoke = Arc::clone(invoke);
                let dispatch = *dispatch;
                let args = args.clone();
                CompiledThunk::Call(Box::new(move |target: &Value, values: &[Value]| {
                    match dispatch {
                        Dispatch::Static => {
                            let values = coerce_args(&member, &args, values)?;
                            invoke(None, values)
                        }
                        Dispatch::Instance { declaring_type } => {
                            let obj = target_object(&member, &declaring_type, target)?;
                            let values = coerce_args(&member, &args, values)?;
                            reject_alias(&member, obj, values, None)?;
                            let mut cell = obj.write();
                            invoke(Some(&mut *cell), values)
                        }
                    }
                }))
            }
            _ => return Err(Self::mismatch(descriptor, plan)),
        };

        Self::compiled(descriptor, plan, "untyped");
        Ok(thunk)
    }

    // ========================================================================
    // Typed surface
    // ========================================================================

    /// Compile an allocation plan for `T`
    pub fn compile_construct<T: Any + Send + Sync>(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<TypedConstructThunk<T>> {
        self.admit(descriptor, plan)?;
        let binding = descriptor.typed_binding::<TypedConstructorBinding<T>>(type_name::<T>())?;
        let OperationPlan::Construct { args } = plan else {
            return Err(Self::mismatch(descriptor, plan));
        };

        let member = descriptor.qualified_name();
        let construct = binding.construct.clone();
        let args = args.clone();
        Self::compiled(descriptor, plan, "typed");
        Ok(Box::new(move |values: &[Value]| {
            let values = coerce_args(&member, &args, values)?;
            (construct.0)(values)
        }))
    }

    /// Compile an in-place construction plan for `T`
    pub fn compile_reinit<T: Any + Send + Sync>(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<TypedReinitThunk<T>> {
        self.admit(descriptor, plan)?;
        let binding = descriptor.typed_binding::<TypedConstructorBinding<T>>(type_name::<T>())?;
        let OperationPlan::ConstructInPlace { args, .. } = plan else {
            return Err(Self::mismatch(descriptor, plan));
        };

        let member = descriptor.qualified_name();
        let construct = binding.construct.clone();
        let args = args.clone();
        Self::compiled(descriptor, plan, "typed");
        Ok(Box::new(move |target: Option<&mut T>, values: &[Value]| {
            let target = require_target_mut(&member, target)?;
            let values = coerce_args(&member, &args, values)?;
            *target = (construct.0)(values)?;
            Ok(())
        }))
    }

    /// Compile a read plan for a `V`-typed member of `T`
    pub fn compile_get<T: Any + Send + Sync, V: Reflect>(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<TypedReadThunk<T, V>> {
        self.admit(descriptor, plan)?;
        let binding = value_binding::<T, V>(descriptor)?;
        let (OperationPlan::Get { dispatch, index }, Some(get)) = (plan, binding.get.as_ref())
        else {
            return Err(Self::mismatch(descriptor, plan));
        };

        let member = descriptor.qualified_name();
        let get = get.clone();
        let dispatch = *dispatch;
        let index = index.clone();
        Self::compiled(descriptor, plan, "typed");
        Ok(Box::new(move |target: Option<&T>, values: &[Value]| {
            let target = match dispatch {
                Dispatch::Static => None,
                Dispatch::Instance { .. } => Some(require_target(&member, target)?),
            };
            let values = coerce_args(&member, &index, values)?;
            (get.0)(target, values)
        }))
    }

    /// Compile a write plan for a `V`-typed member of `T`
    pub fn compile_set<T: Any + Send + Sync, V: Reflect>(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<TypedWriteThunk<T, V>> {
        self.admit(descriptor, plan)?;
        let binding = value_binding::<T, V>(descriptor)?;
        let (OperationPlan::Set { dispatch, index, .. }, Some(set)) = (plan, binding.set.as_ref())
        else {
            return Err(Self::mismatch(descriptor, plan));
        };

        let member = descriptor.qualified_name();
        let set = set.clone();
        let dispatch = *dispatch;
        let index = index.clone();
        Self::compiled(descriptor, plan, "typed");
        Ok(Box::new(
            move |target: Option<&mut T>, values: &[Value], value: V| {
                let target = match dispatch {
                    Dispatch::Static => None,
                    Dispatch::Instance { .. } => Some(require_target_mut(&member, target)?),
                };
                let values = coerce_args(&member, &index, values)?;
                (set.0)(target, values, value)
            },
        ))
    }

    /// Compile a call plan for an `R`-returning method of `T`
    pub fn compile_invoke<T: Any + Send + Sync, R: Reflect>(
        &self,
        descriptor: &MemberDescriptor,
        plan: &OperationPlan,
    ) -> AccessResult<TypedCallThunk<T, R>> {
        self.admit(descriptor, plan)?;
        let binding = descriptor.typed_binding::<TypedMethodBinding<T, R>>(&format!(
            "fn(&mut {}, ..) -> {}",
            type_name::<T>(),
            type_name::<R>()
        ))?;
        let OperationPlan::Invoke { dispatch, args } = plan else {
            return Err(Self::mismatch(descriptor, plan));
        };

        let member = descriptor.qualified_name();
        let invoke = binding.invoke.clone();
        let dispatch = *dispatch;
        let args = args.clone();
        Self::compiled(descriptor, plan, "typed");
        Ok(Box::new(move |target: Option<&mut T>, values: &[Value]| {
            let target = match dispatch {
                Dispatch::Static => None,
                Dispatch::Instance { .. } => Some(require_target_mut(&member, target)?),
            };
            let values = coerce_args(&member, &args, values)?;
            (invoke.0)(target, values)
        }))
    }
}

fn value_binding<T: Any + Send + Sync, V: Reflect>(
    descriptor: &MemberDescriptor,
) -> AccessResult<&TypedValueBinding<T, V>> {
    descriptor.typed_binding::<TypedValueBinding<T, V>>(&format!(
        "{} on {}",
        type_name::<V>(),
        type_name::<T>()
    ))
}
