//! Typed constructor accessors

use std::any::Any;
use std::fmt;

use safe_value::{Value, NO_ARGS};

use super::plan_typed;
use crate::accessor::{expect_kind, MemberAccessor};
use crate::compile::{Compiler, TypedConstructThunk, TypedReinitThunk};
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;
use crate::plan::Operation;

/// Allocates `T` values through a constructor
pub struct TypedConstructorAccessor<T> {
    descriptor: MemberDescriptor,
    construct: TypedConstructThunk<T>,
}

impl<T: Any + Send + Sync> TypedConstructorAccessor<T> {
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
        let plan = plan_typed(&descriptor, Operation::Construct, options)?;
        let construct = Compiler::new(&options.policy).compile_construct::<T>(&descriptor, &plan)?;
        Ok(Self {
            descriptor,
            construct,
        })
    }

    /// Construct from positional arguments
    pub fn invoke(&self, args: &[Value]) -> AccessResult<T> {
        (self.construct)(args)
    }

    /// Construct through a parameterless constructor
    pub fn invoke0(&self) -> AccessResult<T> {
        (self.construct)(NO_ARGS)
    }
}

impl<T> MemberAccessor for TypedConstructorAccessor<T> {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl<T> fmt::Debug for TypedConstructorAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedConstructorAccessor")
            .field("member", &self.descriptor.qualified_name())
            .finish()
    }
}

/// Reruns a constructor over an existing `T`
pub struct TypedConstructorMethodAccessor<T> {
    descriptor: MemberDescriptor,
    reinit: TypedReinitThunk<T>,
}

impl<T: Any + Send + Sync> TypedConstructorMethodAccessor<T> {
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
        let plan = plan_typed(&descriptor, Operation::Invoke, options)?;
        let reinit = Compiler::new(&options.policy).compile_reinit::<T>(&descriptor, &plan)?;
        Ok(Self { descriptor, reinit })
    }

    /// Reinitialize `target` in place
    pub fn invoke(&self, target: Option<&mut T>, args: &[Value]) -> AccessResult<()> {
        (self.reinit)(target, args)
    }
}

impl<T> MemberAccessor for TypedConstructorMethodAccessor<T> {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

impl<T> fmt::Debug for TypedConstructorMethodAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedConstructorMethodAccessor")
            .field("member", &self.descriptor.qualified_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::metadata::MetadataRegistry;
    use safe_value::TypeHandle;

    #[derive(Debug, PartialEq)]
    struct Span {
        start: i64,
        end: i64,
    }

    #[derive(Debug)]
    struct Other;

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Span>()
            .constructor(|(): ()| Span { start: 0, end: 0 })
            .constructor(|(start, end): (i64, i64)| Span { start, end });
        registry
    }

    fn ctor(registry: &MetadataRegistry, arity: usize, kind: DescriptorKind) -> MemberDescriptor {
        let ty = TypeHandle::reference::<Span>();
        MemberDescriptor::new(registry.find_constructor(&ty, arity), kind).unwrap()
    }

    #[test]
    fn test_typed_construct() {
        let registry = registry();
        let make = ctor(&registry, 2, DescriptorKind::Constructor);
        let make = TypedConstructorAccessor::<Span>::new(make).unwrap();
        assert_eq!(
            make.invoke(&[Value::i64(2), Value::i64(9)]).unwrap(),
            Span { start: 2, end: 9 }
        );

        let empty = ctor(&registry, 0, DescriptorKind::Constructor);
        let empty = TypedConstructorAccessor::<Span>::new(empty).unwrap();
        assert_eq!(empty.invoke0().unwrap(), Span { start: 0, end: 0 });
    }

    #[test]
    fn test_typed_reinit() {
        let registry = registry();
        let reinit = TypedConstructorMethodAccessor::<Span>::new(ctor(
            &registry,
            2,
            DescriptorKind::ConstructorAsMethod,
        ))
        .unwrap();
        let mut span = Span { start: 5, end: 6 };
        reinit.invoke(Some(&mut span), &[Value::i64(1), Value::i64(3)]).unwrap();
        assert_eq!(span, Span { start: 1, end: 3 });
        assert!(matches!(
            reinit.invoke(None, &[Value::i64(1), Value::i64(3)]),
            Err(AccessError::TargetNull { .. })
        ));
    }

    #[test]
    fn test_static_type_mismatch() {
        let registry = registry();
        let other = ctor(&registry, 0, DescriptorKind::Constructor);
        let err = TypedConstructorAccessor::<Other>::new(other).unwrap_err();
        assert!(matches!(err, AccessError::InvalidMember(_)));
    }
}
