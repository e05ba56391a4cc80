//! Untyped accessor family
//!
//! Object-in/object-out facades over compiled thunks, one per member kind.
//! Every accessor owns its descriptor and the thunks compiled for it when it
//! was built; calls go straight to those thunks.
//!
//! | Accessor                     | Operations                                   |
//! |------------------------------|----------------------------------------------|
//! | [`ConstructorAccessor`]      | `invoke(args)`                               |
//! | [`ConstructorMethodAccessor`]| `invoke(target, args)`                       |
//! | [`FieldAccessor`]            | `get_value(target)`, `set_value(target, v)`  |
//! | [`PropertyAccessor`]         | `get_value(target)`, `set_value(target, v)`  |
//! | [`IndexedPropertyAccessor`]  | `get_value(target, idx)`, `set_value(target, v, idx)` |
//! | [`MethodAccessor`]           | `invoke(target, args)`, `invoke_static(args)`|
//!
//! Targets are passed as `&Value`; static members ignore them, so
//! `&Value::Null` is the usual argument.

mod constructor;
mod field;
mod indexed;
mod method;
mod property;

pub use constructor::{ConstructorAccessor, ConstructorMethodAccessor};
pub use field::FieldAccessor;
pub use indexed::IndexedPropertyAccessor;
pub use method::MethodAccessor;
pub use property::PropertyAccessor;

use safe_value::Value;

use crate::compile::{CompiledThunk, Compiler};
use crate::config::AccessorOptions;
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::{AccessError, AccessResult};
use crate::plan::{Operation, Surface, ThunkBuilder};

/// Access to the descriptor behind an accessor
pub trait MemberAccessor {
    /// Descriptor this accessor was built from
    fn descriptor(&self) -> &MemberDescriptor;

    /// Member name
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Whether the member ignores its target
    fn is_static(&self) -> bool {
        self.descriptor().is_static()
    }
}

/// Get/set over a target, implemented by field and property accessors
pub trait ValueAccessor: MemberAccessor {
    /// Whether `get_value` is available
    fn can_read(&self) -> bool {
        self.descriptor().can_read()
    }

    /// Whether `set_value` is available
    fn can_write(&self) -> bool {
        self.descriptor().can_write()
    }

    /// Read the member from `target`
    fn get_value(&self, target: &Value) -> AccessResult<Value>;

    /// Write `value` into the member of `target`
    fn set_value(&self, target: &Value, value: Value) -> AccessResult<()>;
}

pub(crate) fn expect_kind(
    descriptor: &MemberDescriptor,
    kinds: &[DescriptorKind],
) -> AccessResult<()> {
    if kinds.contains(&descriptor.kind()) {
        Ok(())
    } else {
        Err(AccessError::invalid_member(format!(
            "{} is described as a {}, which this accessor does not wrap",
            descriptor.qualified_name(),
            descriptor.kind()
        )))
    }
}

pub(crate) fn not_supported(descriptor: &MemberDescriptor, operation: &'static str) -> AccessError {
    AccessError::NotSupported {
        member: descriptor.qualified_name(),
        operation,
    }
}

/// Plan and compile one untyped operation
pub(crate) fn compile_untyped(
    descriptor: &MemberDescriptor,
    operation: Operation,
    options: &AccessorOptions,
) -> AccessResult<CompiledThunk> {
    let plan = ThunkBuilder::new(Surface::Untyped, options.cast_policy)
        .plan(descriptor, operation)?;
    Compiler::new(&options.policy).compile(descriptor, &plan)
}

/// Getter and setter thunks of a field, property or indexer.
///
/// The setter exists iff the descriptor is writable; the getter iff it is
/// readable.
pub(crate) struct ValueThunks {
    getter: Option<CompiledThunk>,
    setter: Option<CompiledThunk>,
}

impl ValueThunks {
    pub(crate) fn compile(
        descriptor: &MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        let getter = descriptor
            .can_read()
            .then(|| compile_untyped(descriptor, Operation::Get, options))
            .transpose()?;
        let setter = descriptor
            .can_write()
            .then(|| compile_untyped(descriptor, Operation::Set, options))
            .transpose()?;
        Ok(Self { getter, setter })
    }

    pub(crate) fn get(
        &self,
        descriptor: &MemberDescriptor,
        target: &Value,
        index: &[Value],
    ) -> AccessResult<Value> {
        match &self.getter {
            Some(thunk) => thunk.read(target, index),
            None => Err(not_supported(descriptor, "GetValue")),
        }
    }

    pub(crate) fn set(
        &self,
        descriptor: &MemberDescriptor,
        target: &Value,
        value: Value,
        index: &[Value],
    ) -> AccessResult<()> {
        match &self.setter {
            Some(thunk) => thunk.write(target, index, value),
            None => Err(not_supported(descriptor, "SetValue")),
        }
    }
}
