//! Member descriptors
//!
//! A `MemberDescriptor` is the immutable handle an accessor owns: which
//! member it wraps, in which role, and the shape queries (`is_static`,
//! `can_read`, `can_write`, `parameter_types`) the planner and the caller
//! consult. Descriptor errors are detected here and never deferred.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use safe_value::TypeHandle;

use crate::error::{AccessError, AccessResult};
use crate::metadata::{MemberInfo, MemberKind, MetadataRegistry, Modifiers, ParameterInfo};

/// Role a member plays behind an accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Allocate a new instance through a constructor
    Constructor,
    /// Rerun a constructor over an existing instance
    ConstructorAsMethod,
    /// Field read/write
    Field,
    /// Property read/write
    Property,
    /// Property taking one or more index arguments
    IndexedProperty,
    /// Static or instance method call
    Method,
}

impl DescriptorKind {
    /// Member kind a descriptor of this kind must wrap
    pub fn member_kind(self) -> MemberKind {
        match self {
            DescriptorKind::Constructor | DescriptorKind::ConstructorAsMethod => {
                MemberKind::Constructor
            }
            DescriptorKind::Field => MemberKind::Field,
            DescriptorKind::Property => MemberKind::Property,
            DescriptorKind::IndexedProperty => MemberKind::Indexer,
            DescriptorKind::Method => MemberKind::Method,
        }
    }

    /// Whether accessors of this kind read and write a value
    pub fn is_value_kind(self) -> bool {
        matches!(
            self,
            DescriptorKind::Field | DescriptorKind::Property | DescriptorKind::IndexedProperty
        )
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DescriptorKind::Constructor => "constructor",
            DescriptorKind::ConstructorAsMethod => "constructor-as-method",
            DescriptorKind::Field => "field",
            DescriptorKind::Property => "property",
            DescriptorKind::IndexedProperty => "indexed property",
            DescriptorKind::Method => "method",
        };
        f.write_str(s)
    }
}

/// Immutable description of one wrapped member
#[derive(Clone)]
pub struct MemberDescriptor {
    kind: DescriptorKind,
    member: Arc<MemberInfo>,
}

impl MemberDescriptor {
    /// Build a descriptor over registered metadata.
    ///
    /// Fails with `InvalidMember` when the metadata is absent, when its member
    /// kind does not fit `kind`, or when an indexed property has no index
    /// parameters.
    pub fn new(member: Option<&Arc<MemberInfo>>, kind: DescriptorKind) -> AccessResult<Self> {
        let member = member
            .ok_or_else(|| AccessError::invalid_member(format!("no metadata for {}", kind)))?;

        if member.kind() != kind.member_kind() {
            return Err(AccessError::invalid_member(format!(
                "{} is a {}, not a {}",
                member.qualified_name(),
                member.kind(),
                kind
            )));
        }
        if kind == DescriptorKind::IndexedProperty && member.parameters().is_empty() {
            return Err(AccessError::invalid_member(format!(
                "indexer {} declares no index parameters",
                member.qualified_name()
            )));
        }

        let descriptor = Self {
            kind,
            member: Arc::clone(member),
        };
        tracing::debug!(
            member = %descriptor.qualified_name(),
            %kind,
            is_static = descriptor.is_static(),
            can_read = descriptor.can_read(),
            can_write = descriptor.can_write(),
            "built member descriptor"
        );
        Ok(descriptor)
    }

    /// Look up `(type, name)` in the registry and build a descriptor over it
    pub fn resolve(
        registry: &MetadataRegistry,
        ty: &TypeHandle,
        name: &str,
        kind: DescriptorKind,
    ) -> AccessResult<Self> {
        match registry.find(ty, name, kind.member_kind()) {
            Some(member) => Self::new(Some(member), kind),
            None => Err(AccessError::invalid_member(format!(
                "{} has no {} named {}",
                ty.short_name(),
                kind.member_kind(),
                name
            ))),
        }
    }

    /// Descriptor kind
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Wrapped member metadata
    pub fn member(&self) -> &Arc<MemberInfo> {
        &self.member
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// `Type.member` form used in errors and logs
    pub fn qualified_name(&self) -> String {
        self.member.qualified_name()
    }

    /// Type declaring the member
    pub fn declaring_type(&self) -> TypeHandle {
        self.member.declaring_type()
    }

    /// Field/property type, return type, or constructed type
    pub fn value_type(&self) -> TypeHandle {
        self.member.value_type()
    }

    /// Member modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.member.modifiers()
    }

    /// Whether the member needs no target.
    ///
    /// Constructors allocate and are therefore static; a constructor used as a
    /// method runs against an existing instance and is not.
    pub fn is_static(&self) -> bool {
        match self.kind {
            DescriptorKind::Constructor => true,
            DescriptorKind::ConstructorAsMethod => false,
            _ => self.member.is_static(),
        }
    }

    /// Whether a getter exists (value kinds only)
    pub fn can_read(&self) -> bool {
        self.kind.is_value_kind() && self.member.has_getter()
    }

    /// Whether a setter exists and the member is not read-only (value kinds only)
    pub fn can_write(&self) -> bool {
        self.kind.is_value_kind() && self.member.has_setter() && !self.modifiers().is_readonly
    }

    /// Whether the member is called rather than read or written
    pub fn can_invoke(&self) -> bool {
        !self.kind.is_value_kind()
    }

    /// Parameters in declaration order (index parameters for indexers)
    pub fn parameters(&self) -> &[ParameterInfo] {
        self.member.parameters()
    }

    /// Parameter types in declaration order
    pub fn parameter_types(&self) -> Vec<TypeHandle> {
        self.parameters().iter().map(|p| p.ty).collect()
    }

    /// Number of positional (or index) parameters
    pub fn arity(&self) -> usize {
        self.parameters().len()
    }

    /// Downcast the typed binding to the shape a typed accessor expects
    pub(crate) fn typed_binding<B: Any>(&self, expected: &str) -> AccessResult<&B> {
        self.member.typed.downcast_ref::<B>().ok_or_else(|| {
            AccessError::invalid_member(format!(
                "{} does not have the static type {}",
                self.qualified_name(),
                expected
            ))
        })
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("kind", &self.kind)
            .field("member", &self.qualified_name())
            .field("is_static", &self.is_static())
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .field("arity", &self.arity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        id: i64,
        cells: Vec<i32>,
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Sample>()
            .constructor(|(): ()| Sample { id: 1, cells: vec![0; 4] })
            .readonly_field("id", |s: &Sample| s.id)
            .readonly_property("len", |s: &Sample| s.cells.len() as i32)
            .indexer(
                "cell",
                |s: &Sample, (i,): (i32,)| s.cells[i as usize],
                |s: &mut Sample, (i,): (i32,), v| s.cells[i as usize] = v,
            )
            .readonly_indexer("first", |s: &Sample, (): ()| s.cells[0])
            .static_method("version", |(): ()| 3i32);
        registry
    }

    fn ty() -> TypeHandle {
        TypeHandle::reference::<Sample>()
    }

    #[test]
    fn test_absent_metadata() {
        let err = MemberDescriptor::new(None, DescriptorKind::Field).unwrap_err();
        assert!(matches!(err, AccessError::InvalidMember(_)));
    }

    #[test]
    fn test_kind_mismatch() {
        let registry = registry();
        let id = registry.find_field(&ty(), "id");
        let err = MemberDescriptor::new(id, DescriptorKind::Property).unwrap_err();
        assert!(matches!(err, AccessError::InvalidMember(_)));
    }

    #[test]
    fn test_indexer_requires_index_parameters() {
        let registry = registry();
        let kind = DescriptorKind::IndexedProperty;
        let err = MemberDescriptor::resolve(&registry, &ty(), "first", kind).unwrap_err();
        assert!(matches!(err, AccessError::InvalidMember(_)));

        let cell =
            MemberDescriptor::resolve(&registry, &ty(), "cell", DescriptorKind::IndexedProperty)
                .unwrap();
        assert_eq!(cell.arity(), 1);
        assert_eq!(cell.parameter_types(), vec![TypeHandle::value::<i32>()]);
        assert!(cell.can_read());
        assert!(cell.can_write());
    }

    #[test]
    fn test_readonly_queries() {
        let registry = registry();
        let id = MemberDescriptor::resolve(&registry, &ty(), "id", DescriptorKind::Field).unwrap();
        assert!(id.can_read());
        assert!(!id.can_write());
        assert!(!id.is_static());

        let len =
            MemberDescriptor::resolve(&registry, &ty(), "len", DescriptorKind::Property).unwrap();
        assert!(!len.can_write());
    }

    #[test]
    fn test_constructor_roles() {
        let registry = registry();
        let ctor = registry.find_constructor(&ty(), 0);
        let alloc = MemberDescriptor::new(ctor, DescriptorKind::Constructor).unwrap();
        let in_place = MemberDescriptor::new(ctor, DescriptorKind::ConstructorAsMethod).unwrap();
        assert!(alloc.is_static());
        assert!(!in_place.is_static());
        assert!(alloc.can_invoke());
        assert!(!alloc.can_read());
        assert_eq!(alloc.value_type(), ty());
    }

    #[test]
    fn test_unknown_member() {
        let registry = registry();
        let err = MemberDescriptor::resolve(&registry, &ty(), "missing", DescriptorKind::Method)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid member: Sample has no method named missing"
        );
    }
}
