//! Typed accessor family
//!
//! Same operations as the untyped family, with the target and primary value
//! typed statically: a `TypedFieldAccessor<Point, i32>` reads an `i32` from
//! a `&Point` without boxing either. Constructor and method arguments, and
//! indexer index arguments, remain an untyped `&[Value]` vector since member
//! signatures are heterogeneous.
//!
//! Every typed accessor runs the same thunk builder and compiler as its
//! untyped counterpart. The member's registered static types must match the
//! accessor's type parameters exactly, otherwise construction fails with
//! `InvalidMember`.

mod constructor;
mod indexed;
mod method;
mod value;

pub use constructor::{TypedConstructorAccessor, TypedConstructorMethodAccessor};
pub use indexed::TypedIndexedPropertyAccessor;
pub use method::TypedMethodAccessor;
pub use value::{TypedFieldAccessor, TypedPropertyAccessor};

use crate::config::AccessorOptions;
use crate::descriptor::MemberDescriptor;
use crate::error::AccessResult;
use crate::plan::{Operation, OperationPlan, Surface, ThunkBuilder};

pub(crate) fn plan_typed(
    descriptor: &MemberDescriptor,
    operation: Operation,
    options: &AccessorOptions,
) -> AccessResult<OperationPlan> {
    ThunkBuilder::new(Surface::Typed, options.cast_policy).plan(descriptor, operation)
}
