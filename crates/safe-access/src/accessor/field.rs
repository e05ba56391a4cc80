//! Field accessor

use std::fmt;

use safe_value::{Value, NO_ARGS};

use super::{expect_kind, MemberAccessor, ValueAccessor, ValueThunks};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;

/// Reads and writes one field.
///
/// A read-only field gets no setter thunk; `set_value` on it fails with
/// `NotSupported` and leaves the target untouched.
pub struct FieldAccessor {
    descriptor: MemberDescriptor,
    thunks: ValueThunks,
}

impl FieldAccessor {
    /// Build with the process-wide default options
    pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
        Self::with_options(descriptor, default_options())
    }

    /// Build with explicit options
    pub fn with_options(
        descriptor: MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        expect_kind(&descriptor, &[DescriptorKind::Field])?;
        let thunks = ValueThunks::compile(&descriptor, options)?;
        Ok(Self { descriptor, thunks })
    }
}

impl MemberAccessor for FieldAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl ValueAccessor for FieldAccessor {
    fn get_value(&self, target: &Value) -> AccessResult<Value> {
        self.thunks.get(&self.descriptor, target, NO_ARGS)
    }

    fn set_value(&self, target: &Value, value: Value) -> AccessResult<()> {
        self.thunks.set(&self.descriptor, target, value, NO_ARGS)
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("member", &self.descriptor.qualified_name())
            .field("can_write", &self.can_write())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::metadata::MetadataRegistry;
    use safe_value::{Handle, TypeHandle};
    use std::sync::atomic::{AtomicI64, Ordering};

    static SEQUENCE: AtomicI64 = AtomicI64::new(100);

    struct Ticket {
        id: i64,
        seat: i32,
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Ticket>()
            .readonly_field("id", |t: &Ticket| t.id)
            .field("seat", |t: &Ticket| t.seat, |t: &mut Ticket, v| t.seat = v)
            .static_field(
                "sequence",
                || SEQUENCE.load(Ordering::SeqCst),
                |v| SEQUENCE.store(v, Ordering::SeqCst),
            );
        registry
    }

    fn field(registry: &MetadataRegistry, name: &str) -> FieldAccessor {
        let ty = TypeHandle::reference::<Ticket>();
        let descriptor =
            MemberDescriptor::resolve(registry, &ty, name, DescriptorKind::Field).unwrap();
        FieldAccessor::new(descriptor).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let registry = registry();
        let seat = field(&registry, "seat");
        let ticket = Handle::new(Ticket { id: 1, seat: 4 });
        let target = ticket.to_value();

        assert_eq!(seat.get_value(&target).unwrap(), Value::i32(4));
        seat.set_value(&target, Value::i32(12)).unwrap();
        assert_eq!(seat.get_value(&target).unwrap(), Value::i32(12));
        assert_eq!(ticket.read().unwrap().seat, 12);
    }

    #[test]
    fn test_readonly_field() {
        let registry = registry();
        let id = field(&registry, "id");
        let target = Value::object(Ticket { id: 7, seat: 0 });

        assert!(!id.can_write());
        let err = id.set_value(&target, Value::i64(8)).unwrap_err();
        assert_eq!(
            err,
            AccessError::NotSupported {
                member: "Ticket.id".to_string(),
                operation: "SetValue",
            }
        );
        assert_eq!(id.get_value(&target).unwrap(), Value::i64(7));
    }

    #[test]
    fn test_unbox_mismatch() {
        let registry = registry();
        let seat = field(&registry, "seat");
        let target = Value::object(Ticket { id: 1, seat: 4 });
        assert!(matches!(
            seat.set_value(&target, Value::i64(5)),
            Err(AccessError::InvalidCast { .. })
        ));
        assert_eq!(seat.get_value(&target).unwrap(), Value::i32(4));
    }

    #[test]
    fn test_static_field_ignores_target() {
        let registry = registry();
        let sequence = field(&registry, "sequence");
        assert!(sequence.is_static());

        let unrelated = Value::string("ignored");
        sequence.set_value(&Value::Null, Value::i64(500)).unwrap();
        assert_eq!(sequence.get_value(&unrelated).unwrap(), Value::i64(500));
        assert_eq!(sequence.get_value(&Value::Null).unwrap(), Value::i64(500));
    }

    #[test]
    fn test_instance_field_requires_target() {
        let registry = registry();
        let seat = field(&registry, "seat");
        assert!(matches!(
            seat.get_value(&Value::Null),
            Err(AccessError::TargetNull { .. })
        ));
    }
}
