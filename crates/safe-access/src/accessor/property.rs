//! Property accessor

use std::fmt;

use safe_value::{Value, NO_ARGS};

use super::{expect_kind, MemberAccessor, ValueAccessor, ValueThunks};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;

/// Reads and writes one non-indexed property
pub struct PropertyAccessor {
    descriptor: MemberDescriptor,
    thunks: ValueThunks,
}

impl PropertyAccessor {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::Property])?;
        let thunks = ValueThunks::compile(&descriptor, options)?;
        Ok(Self { descriptor, thunks })
    }
}

impl MemberAccessor for PropertyAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl ValueAccessor for PropertyAccessor {
    fn get_value(&self, target: &Value) -> AccessResult<Value> {
        self.thunks.get(&self.descriptor, target, NO_ARGS)
    }

    fn set_value(&self, target: &Value, value: Value) -> AccessResult<()> {
        self.thunks.set(&self.descriptor, target, value, NO_ARGS)
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("member", &self.descriptor.qualified_name())
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .finish()
    }
}
