//! Typed indexed property accessor

use std::any::Any;
use std::fmt;

use safe_value::{Reflect, Value};

use super::value::TypedValueThunks;
use crate::accessor::{expect_kind, MemberAccessor};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;

/// Reads and writes a `V` indexer of `T`; index arguments stay untyped
pub struct TypedIndexedPropertyAccessor<T, V> {
    descriptor: MemberDescriptor,
    thunks: TypedValueThunks<T, V>,
}

impl<T: Any + Send + Sync, V: Reflect> TypedIndexedPropertyAccessor<T, V> {
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
        let thunks = TypedValueThunks::compile(&descriptor, options)?;
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
    pub fn get_value(&self, target: Option<&T>, index: &[Value]) -> AccessResult<V> {
        self.thunks.get(&self.descriptor, target, index)
    }

    /// Write `value` at `index`
    pub fn set_value(&self, target: Option<&mut T>, value: V, index: &[Value]) -> AccessResult<()> {
        self.thunks.set(&self.descriptor, target, value, index)
    }
}

impl<T, V> MemberAccessor for TypedIndexedPropertyAccessor<T, V> {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl<T, V> fmt::Debug for TypedIndexedPropertyAccessor<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedIndexedPropertyAccessor")
            .field("member", &self.descriptor.qualified_name())
            .field("index_arity", &self.descriptor.arity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::metadata::MetadataRegistry;
    use safe_value::TypeHandle;

    struct Dictionary {
        entries: Vec<(String, String)>,
    }

    fn accessor() -> TypedIndexedPropertyAccessor<Dictionary, Option<String>> {
        let mut registry = MetadataRegistry::new();
        registry.describe::<Dictionary>().indexer(
            "entry",
            |d: &Dictionary, (key,): (String,)| {
                d.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
            },
            |d: &mut Dictionary, (key,): (String,), v: Option<String>| {
                d.entries.retain(|(k, _)| *k != key);
                if let Some(v) = v {
                    d.entries.push((key, v));
                }
            },
        );
        let descriptor = MemberDescriptor::resolve(
            &registry,
            &TypeHandle::reference::<Dictionary>(),
            "entry",
            DescriptorKind::IndexedProperty,
        )
        .unwrap();
        TypedIndexedPropertyAccessor::new(descriptor).unwrap()
    }

    #[test]
    fn test_typed_index_round_trip() {
        let entry = accessor();
        assert!(entry.can_read());
        assert!(entry.can_write());
        let mut dict = Dictionary { entries: Vec::new() };
        let key = [Value::string("lang")];

        assert_eq!(entry.get_value(Some(&dict), &key).unwrap(), None);
        entry.set_value(Some(&mut dict), Some("rust".to_string()), &key).unwrap();
        assert_eq!(entry.get_value(Some(&dict), &key).unwrap().as_deref(), Some("rust"));
        entry.set_value(Some(&mut dict), None, &key).unwrap();
        assert!(dict.entries.is_empty());
    }

    #[test]
    fn test_typed_index_validation() {
        let entry = accessor();
        let dict = Dictionary { entries: Vec::new() };
        assert!(matches!(
            entry.get_value(Some(&dict), &[]),
            Err(AccessError::ArgumentCount { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            entry.get_value(Some(&dict), &[Value::i32(1)]),
            Err(AccessError::InvalidCast { .. })
        ));
    }
}
