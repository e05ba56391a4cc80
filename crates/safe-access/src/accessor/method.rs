//! Method accessor

use safe_value::{Value, NO_ARGS};

use super::{compile_untyped, expect_kind, MemberAccessor};
use crate::compile::CompiledThunk;
use crate::config::{default_options, AccessorOptions};
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;
use crate::plan::Operation;

/// Calls a static or instance method
#[derive(Debug)]
pub struct MethodAccessor {
    descriptor: MemberDescriptor,
    thunk: CompiledThunk,
}

impl MethodAccessor {
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
        let thunk = compile_untyped(&descriptor, Operation::Invoke, options)?;
        Ok(Self { descriptor, thunk })
    }

    /// Call on `target` (ignored for static methods)
    pub fn invoke(&self, target: &Value, args: &[Value]) -> AccessResult<Value> {
        self.thunk.call(target, args)
    }

    /// Call without arguments
    pub fn invoke0(&self, target: &Value) -> AccessResult<Value> {
        self.thunk.call(target, NO_ARGS)
    }

    /// Call without a target
    pub fn invoke_static(&self, args: &[Value]) -> AccessResult<Value> {
        self.thunk.call(&Value::Null, args)
    }
}

impl MemberAccessor for MethodAccessor {
    fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use crate::metadata::MetadataRegistry;
    use safe_value::TypeHandle;

    struct Counter {
        count: i64,
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Counter>()
            .method("add", |c: &mut Counter, (n,): (i64,)| {
                c.count += n;
                c.count
            })
            .method("reset", |c: &mut Counter, (): ()| c.count = 0)
            .try_method("take", |c: &mut Counter, (n,): (i64,)| {
                if n > c.count {
                    Err(format!("only {} left", c.count))
                } else {
                    c.count -= n;
                    Ok(c.count)
                }
            })
            .static_method("describe", |(name,): (String,)| format!("Counter({})", name));
        registry
    }

    fn method(registry: &MetadataRegistry, name: &str) -> MethodAccessor {
        let ty = TypeHandle::reference::<Counter>();
        let descriptor =
            MemberDescriptor::resolve(registry, &ty, name, DescriptorKind::Method).unwrap();
        MethodAccessor::new(descriptor).unwrap()
    }

    #[test]
    fn test_instance_method() {
        let registry = registry();
        let add = method(&registry, "add");
        let reset = method(&registry, "reset");
        let target = Value::object(Counter { count: 1 });

        assert_eq!(add.invoke(&target, &[Value::i64(4)]).unwrap(), Value::i64(5));
        assert!(reset.invoke0(&target).unwrap().is_null());
        assert_eq!(add.invoke(&target, &[Value::i64(2)]).unwrap(), Value::i64(2));
    }

    #[test]
    fn test_instance_method_requires_target() {
        let registry = registry();
        let add = method(&registry, "add");
        assert!(matches!(
            add.invoke_static(&[Value::i64(1)]),
            Err(AccessError::TargetNull { .. })
        ));
    }

    #[test]
    fn test_static_method_ignores_target() {
        let registry = registry();
        let describe = method(&registry, "describe");
        let args = [Value::string("hits")];
        let expected = Value::string("Counter(hits)");

        assert_eq!(describe.invoke_static(&args).unwrap(), expected);
        let unrelated = Value::object(Counter { count: 0 });
        assert_eq!(describe.invoke(&unrelated, &args).unwrap(), expected);
    }

    #[test]
    fn test_member_failure() {
        let registry = registry();
        let take = method(&registry, "take");
        let target = Value::object(Counter { count: 3 });

        assert_eq!(take.invoke(&target, &[Value::i64(2)]).unwrap(), Value::i64(1));
        assert_eq!(
            take.invoke(&target, &[Value::i64(5)]).unwrap_err(),
            AccessError::MemberFailed {
                member: "Counter.take".to_string(),
                message: "only 1 left".to_string(),
            }
        );
    }
}
