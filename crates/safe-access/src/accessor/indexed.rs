//! Indexed property accessor

use std::fmt;

use safe_value::Value;

use super::{expect_kind, MemberAccessor, ValueThunks};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;

/// Reads and writes an indexer.
///
/// The index vector must have exactly as many elements as the indexer
/// declares index parameters; any other length fails with `ArgumentCount`.
pub struct IndexedPropertyAccessor {
    descriptor: MemberDescriptor,
    thunks: ValueThunks,
}

impl IndexedPropertyAccessor {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::IndexedProperty])?;
        let thunks = ValueThunks::compile(&descriptor, options)?;
        Ok(Self { descriptor, thunks })
    }

    /// Number of index arguments
    pub fn index_arity(&self) -> usize {
        self.descriptor.arity()
    }

    /// Whether `get_value` is available
    pub fn can_read(&self) -> bool {
        self.descriptor.can_read()
    }

    /// Whether `set_value` is available
    pub fn can_write(&self) -> bool {
        self.descriptor.can_write()
    }

    /// Read the element at `index`
    pub fn get_value(&self, target: &Value, index: &[Value]) -> AccessResult<Value> {
        self.thunks.get(&self.descriptor, target, index)
    }

    /// Write `value` at `index`
    pub fn set_value(&self, target: &Value, value: Value, index: &[Value]) -> AccessResult<()> {
        self.thunks.set(&self.descriptor, target, value, index)
    }
}

impl MemberAccessor for IndexedPropertyAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl fmt::Debug for IndexedPropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedPropertyAccessor")
            .field("member", &self.descriptor.qualified_name())
            .field("index_arity", &self.index_arity())
            .field("can_write", &self.can_write())
            .finish()
    }
}
