//! Thunk builder
//!
//! Synthesizes an [`OperationPlan`] from a descriptor and an operation. A
//! plan is plain data: per-position coercions plus the terminal operation
//! (allocate, reinitialize, read, write, or call) and its dispatch. The
//! [`Compiler`](crate::Compiler) turns it into a callable thunk.
//!
//! | Slot type        | Parameter / index | Untyped set value  | Typed set value |
//! |------------------|-------------------|--------------------|-----------------|
//! | object (`Value`) | `Identity`        | `Identity`         | `Identity`      |
//! | value type       | `Unbox`           | `Unbox`            | `HardCast`      |
//! | reference type   | `HardCast`        | `SafeCast` *       | `HardCast`      |
//!
//! \* `HardCast` when the cast policy is [`CastPolicy::Fail`].

use std::fmt;

use safe_value::{TypeHandle, TypeKind};

use crate::config::CastPolicy;
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::{AccessError, AccessResult};

/// Which accessor surface a plan is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Object-in/object-out accessors
    Untyped,
    /// Statically typed accessors
    Typed,
}

/// Operation requested from the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Allocate (or reinitialize) through a constructor
    Construct,
    /// Read a field, property, or indexer
    Get,
    /// Write a field, property, or indexer
    Set,
    /// Call a method (or a constructor as a method)
    Invoke,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Construct => "construct",
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Invoke => "invoke",
        };
        f.write_str(s)
    }
}

/// Conversion applied to one incoming value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    /// Pass through untouched (object-typed slot)
    Identity,
    /// Require the exact primitive variant
    Unbox,
    /// Checked cast; a mismatch fails the call
    HardCast,
    /// Checked cast; a mismatch yields null
    SafeCast,
}

impl Coercion {
    /// Coercion for a positional parameter or index argument
    pub fn for_parameter(ty: &TypeHandle) -> Self {
        match ty.kind() {
            TypeKind::Any | TypeKind::Void => Coercion::Identity,
            TypeKind::Value => Coercion::Unbox,
            TypeKind::Reference => Coercion::HardCast,
        }
    }

    /// Coercion for the value assigned by a setter
    pub fn for_assigned_value(ty: &TypeHandle, surface: Surface, cast_policy: CastPolicy) -> Self {
        match (ty.kind(), surface) {
            (TypeKind::Any | TypeKind::Void, _) => Coercion::Identity,
            (_, Surface::Typed) => Coercion::HardCast,
            (TypeKind::Value, Surface::Untyped) => Coercion::Unbox,
            (TypeKind::Reference, Surface::Untyped) => match cast_policy {
                CastPolicy::NullOnMismatch => Coercion::SafeCast,
                CastPolicy::Fail => Coercion::HardCast,
            },
        }
    }
}

/// One coerced position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentSlot {
    /// Zero-based position
    pub position: usize,
    /// Required type
    pub ty: TypeHandle,
    /// Coercion applied to the incoming value
    pub coercion: Coercion,
}

/// Ordered coercions for a positional argument (or index) vector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentPlan {
    slots: Vec<ArgumentSlot>,
}

impl ArgumentPlan {
    fn for_parameters(types: &[TypeHandle]) -> Self {
        let slots = types
            .iter()
            .enumerate()
            .map(|(position, ty)| ArgumentSlot {
                position,
                ty: *ty,
                coercion: Coercion::for_parameter(ty),
            })
            .collect();
        Self { slots }
    }

    /// Coerced positions in order
    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    /// Required vector length
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// True when there is nothing to unpack
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// How the member is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No target; a supplied target is ignored
    Static,
    /// Target required, of the declaring type
    Instance {
        /// Type the target must be an instance of
        declaring_type: TypeHandle,
    },
}

/// Synthesized description of one accessor operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationPlan {
    /// Allocate a new instance
    Construct {
        /// Constructor arguments
        args: ArgumentPlan,
    },
    /// Rerun a constructor over an existing instance
    ConstructInPlace {
        /// Type the target must be an instance of
        declaring_type: TypeHandle,
        /// Constructor arguments
        args: ArgumentPlan,
    },
    /// Read a field, property, or indexer
    Get {
        /// Static or instance read
        dispatch: Dispatch,
        /// Index arguments (empty for fields and properties)
        index: ArgumentPlan,
    },
    /// Write a field, property, or indexer
    Set {
        /// Static or instance write
        dispatch: Dispatch,
        /// Index arguments (empty for fields and properties)
        index: ArgumentPlan,
        /// Assigned value
        value: ArgumentSlot,
    },
    /// Call a method
    Invoke {
        /// Static or instance call
        dispatch: Dispatch,
        /// Method arguments
        args: ArgumentPlan,
    },
}

impl OperationPlan {
    /// Operation the plan performs
    pub fn operation(&self) -> Operation {
        match self {
            OperationPlan::Construct { .. } | OperationPlan::ConstructInPlace { .. } => {
                Operation::Construct
            }
            OperationPlan::Get { .. } => Operation::Get,
            OperationPlan::Set { .. } => Operation::Set,
            OperationPlan::Invoke { .. } => Operation::Invoke,
        }
    }

    /// Dispatch of the terminal operation
    pub fn dispatch(&self) -> Dispatch {
        match self {
            OperationPlan::Construct { .. } => Dispatch::Static,
            OperationPlan::ConstructInPlace { declaring_type, .. } => Dispatch::Instance {
                declaring_type: *declaring_type,
            },
            OperationPlan::Get { dispatch, .. }
            | OperationPlan::Set { dispatch, .. }
            | OperationPlan::Invoke { dispatch, .. } => *dispatch,
        }
    }

    /// Positional (or index) argument coercions
    pub fn arguments(&self) -> &ArgumentPlan {
        match self {
            OperationPlan::Construct { args }
            | OperationPlan::ConstructInPlace { args, .. }
            | OperationPlan::Invoke { args, .. } => args,
            OperationPlan::Get { index, .. } | OperationPlan::Set { index, .. } => index,
        }
    }
}

/// Builds operation plans for one accessor surface
#[derive(Debug, Clone, Copy)]
pub struct ThunkBuilder {
    surface: Surface,
    cast_policy: CastPolicy,
}

impl ThunkBuilder {
    /// Create a builder for `surface`
    pub fn new(surface: Surface, cast_policy: CastPolicy) -> Self {
        Self {
            surface,
            cast_policy,
        }
    }

    /// Target surface
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Synthesize the plan for `operation` on `descriptor`.
    ///
    /// Requesting an operation the member does not offer (a set on a
    /// non-writable member, a get on a set-only property, a call on a field)
    /// fails with `InvalidOperation`.
    pub fn plan(
        &self,
        descriptor: &MemberDescriptor,
        operation: Operation,
    ) -> AccessResult<OperationPlan> {
        let args = || ArgumentPlan::for_parameters(&descriptor.parameter_types());
        let plan = match (descriptor.kind(), operation) {
            (DescriptorKind::Constructor, Operation::Construct | Operation::Invoke) => {
                OperationPlan::Construct { args: args() }
            }
            (DescriptorKind::ConstructorAsMethod, Operation::Construct | Operation::Invoke) => {
                OperationPlan::ConstructInPlace {
                    declaring_type: descriptor.declaring_type(),
                    args: args(),
                }
            }
            (DescriptorKind::Method, Operation::Invoke) => OperationPlan::Invoke {
                dispatch: dispatch_of(descriptor),
                args: args(),
            },
            (kind, Operation::Get) if kind.is_value_kind() => {
                if !descriptor.can_read() {
                    return Err(unavailable(descriptor, operation));
                }
                OperationPlan::Get {
                    dispatch: dispatch_of(descriptor),
                    index: args(),
                }
            }
            (kind, Operation::Set) if kind.is_value_kind() => {
                if !descriptor.can_write() {
                    return Err(unavailable(descriptor, operation));
                }
                let ty = descriptor.value_type();
                OperationPlan::Set {
                    dispatch: dispatch_of(descriptor),
                    index: args(),
                    value: ArgumentSlot {
                        position: descriptor.arity(),
                        ty,
                        coercion: Coercion::for_assigned_value(
                            &ty,
                            self.surface,
                            self.cast_policy,
                        ),
                    },
                }
            }
            _ => return Err(unavailable(descriptor, operation)),
        };

        tracing::trace!(
            member = %descriptor.qualified_name(),
            surface = ?self.surface,
            ?plan,
            "synthesized operation plan"
        );
        Ok(plan)
    }
}

fn dispatch_of(descriptor: &MemberDescriptor) -> Dispatch {
    if descriptor.is_static() {
        Dispatch::Static
    } else {
        Dispatch::Instance {
            declaring_type: descriptor.declaring_type(),
        }
    }
}

fn unavailable(descriptor: &MemberDescriptor, operation: Operation) -> AccessError {
    AccessError::InvalidOperation(format!(
        "{} {} offers no {} operation",
        descriptor.kind(),
        descriptor.qualified_name(),
        operation
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataRegistry;
    use safe_value::Value;

    struct Widget {
        label: String,
        weight: i32,
        tag: Value,
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Widget>()
            .constructor(|(label, weight): (String, i32)| Widget {
                label,
                weight,
                tag: Value::Null,
            })
            .field("label", |w: &Widget| w.label.clone(), |w: &mut Widget, v| w.label = v)
            .field("weight", |w: &Widget| w.weight, |w: &mut Widget, v| w.weight = v)
            .field("tag", |w: &Widget| w.tag.clone(), |w: &mut Widget, v| w.tag = v)
            .readonly_field("kind", |_: &Widget| 1i32)
            .static_method("count", |(): ()| 0i64);
        registry
    }

    fn descriptor(
        registry: &MetadataRegistry,
        name: &str,
        kind: DescriptorKind,
    ) -> MemberDescriptor {
        let ty = TypeHandle::reference::<Widget>();
        MemberDescriptor::resolve(registry, &ty, name, kind).unwrap()
    }

    fn untyped() -> ThunkBuilder {
        ThunkBuilder::new(Surface::Untyped, CastPolicy::NullOnMismatch)
    }

    fn set_coercion(builder: ThunkBuilder, descriptor: &MemberDescriptor) -> Coercion {
        match builder.plan(descriptor, Operation::Set).unwrap() {
            OperationPlan::Set { value, .. } => value.coercion,
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_constructor_argument_coercions() {
        let registry = registry();
        let ty = TypeHandle::reference::<Widget>();
        let ctor = registry.find_constructor(&ty, 2);
        let ctor = MemberDescriptor::new(ctor, DescriptorKind::Constructor).unwrap();
        let plan = untyped().plan(&ctor, Operation::Construct).unwrap();
        let coercions: Vec<_> = plan.arguments().slots().iter().map(|s| s.coercion).collect();
        assert_eq!(coercions, vec![Coercion::HardCast, Coercion::Unbox]);
        assert_eq!(plan.dispatch(), Dispatch::Static);
    }

    #[test]
    fn test_set_value_coercions() {
        let registry = registry();
        let label = descriptor(&registry, "label", DescriptorKind::Field);
        let weight = descriptor(&registry, "weight", DescriptorKind::Field);
        let tag = descriptor(&registry, "tag", DescriptorKind::Field);

        assert_eq!(set_coercion(untyped(), &label), Coercion::SafeCast);
        assert_eq!(set_coercion(untyped(), &weight), Coercion::Unbox);
        assert_eq!(set_coercion(untyped(), &tag), Coercion::Identity);

        let strict = ThunkBuilder::new(Surface::Untyped, CastPolicy::Fail);
        assert_eq!(set_coercion(strict, &label), Coercion::HardCast);

        let typed = ThunkBuilder::new(Surface::Typed, CastPolicy::NullOnMismatch);
        assert_eq!(set_coercion(typed, &label), Coercion::HardCast);
        assert_eq!(set_coercion(typed, &weight), Coercion::HardCast);
    }

    #[test]
    fn test_readonly_member_has_no_set_plan() {
        let registry = registry();
        let kind = descriptor(&registry, "kind", DescriptorKind::Field);
        assert!(untyped().plan(&kind, Operation::Get).is_ok());
        assert!(matches!(
            untyped().plan(&kind, Operation::Set),
            Err(AccessError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_static_dispatch() {
        let registry = registry();
        let count = descriptor(&registry, "count", DescriptorKind::Method);
        let plan = untyped().plan(&count, Operation::Invoke).unwrap();
        assert_eq!(plan.dispatch(), Dispatch::Static);
        assert!(plan.arguments().is_empty());

        let weight = descriptor(&registry, "weight", DescriptorKind::Field);
        let plan = untyped().plan(&weight, Operation::Get).unwrap();
        assert_eq!(
            plan.dispatch(),
            Dispatch::Instance {
                declaring_type: TypeHandle::reference::<Widget>()
            }
        );
    }

    #[test]
    fn test_operation_not_offered() {
        let registry = registry();
        let weight = descriptor(&registry, "weight", DescriptorKind::Field);
        assert!(matches!(
            untyped().plan(&weight, Operation::Invoke),
            Err(AccessError::InvalidOperation(_))
        ));
    }
}
