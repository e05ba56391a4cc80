//! Constructor accessors

use safe_value::{Value, NO_ARGS};

use super::{compile_untyped, expect_kind, MemberAccessor};
use crate::compile::CompiledThunk;
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;
use crate::plan::Operation;

/// Allocates new instances through a constructor
#[derive(Debug)]
pub struct ConstructorAccessor {
    descriptor: MemberDescriptor,
    thunk: CompiledThunk,
}

impl ConstructorAccessor {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::Constructor])?;
        let thunk = compile_untyped(&descriptor, Operation::Construct, options)?;
        Ok(Self { descriptor, thunk })
    }

    /// Construct a new instance from positional arguments
    pub fn invoke(&self, args: &[Value]) -> AccessResult<Value> {
        self.thunk.construct(args)
    }

    /// Construct through a parameterless constructor
    pub fn invoke0(&self) -> AccessResult<Value> {
        self.thunk.construct(NO_ARGS)
    }
}

impl MemberAccessor for ConstructorAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

/// Reruns a constructor over an existing instance
#[derive(Debug)]
pub struct ConstructorMethodAccessor {
    descriptor: MemberDescriptor,
    thunk: CompiledThunk,
}

impl ConstructorMethodAccessor {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::ConstructorAsMethod])?;
        let thunk = compile_untyped(&descriptor, Operation::Invoke, options)?;
        Ok(Self { descriptor, thunk })
    }

    /// Reinitialize `target` in place; returns null
    pub fn invoke(&self, target: &Value, args: &[Value]) -> AccessResult<Value> {
        self.thunk.call(target, args)
    }
}

impl MemberAccessor for ConstructorMethodAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}
