//! Typed method accessor

use std::any::Any;
use std::fmt;

use safe_value::{Reflect, Value, NO_ARGS};

use super::plan_typed;
use crate::accessor::{expect_kind, MemberAccessor};
use crate::compile::{Compiler, TypedCallThunk};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;
use crate::plan::Operation;

/// Calls an `R`-returning method of `T`
pub struct TypedMethodAccessor<T, R> {
    descriptor: MemberDescriptor,
    invoke: TypedCallThunk<T, R>,
}

impl<T: Any + Send + Sync, R: Reflect> TypedMethodAccessor<T, R> {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::Method])?;
        let plan = plan_typed(&descriptor, Operation::Invoke, options)?;
        let invoke = Compiler::new(&options.policy).compile_invoke::<T, R>(&descriptor, &plan)?;
        Ok(Self { descriptor, invoke })
    }

    /// Call on `target` (ignored for static methods)
    pub fn invoke(&self, target: Option<&mut T>, args: &[Value]) -> AccessResult<R> {
        (self.invoke)(target, args)
    }

    /// Call without arguments
    pub fn invoke0(&self, target: Option<&mut T>) -> AccessResult<R> {
        (self.invoke)(target, NO_ARGS)
    }
}

impl<T, R> MemberAccessor for TypedMethodAccessor<T, R> {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl<T, R> fmt::Debug for TypedMethodAccessor<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedMethodAccessor")
            .field("member", &self.descriptor.qualified_name())
            .field("arity", &self.descriptor.arity())
            .finish()
    }
}
