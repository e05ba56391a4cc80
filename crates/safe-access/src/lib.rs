//! Safe Access - precompiled member accessors
//!
//! Given metadata for a constructor, field, property, indexer or method,
//! this crate builds reusable accessor objects that construct instances,
//! read and write values, or invoke methods without any per-call lookup.
//!
//! # Pipeline
//!
//! ```text
//! MetadataRegistry ──► MemberDescriptor ──► ThunkBuilder ──► OperationPlan
//!                                                                  │
//!            Accessor (untyped / typed) ◄── CompiledThunk ◄── Compiler
//! ```
//!
//! - [`metadata`]: registration of member metadata ([`MetadataRegistry`], [`TypeBuilder`])
//! - [`MemberDescriptor`]: immutable shape of one member
//! - [`ThunkBuilder`]: operation plans with per-position coercions
//! - [`Compiler`]: plans to closures, under an [`AccessPolicy`]
//! - [`accessor`]: object-in/object-out accessors
//! - [`typed`]: statically typed accessors
//! - [`AccessorCache`]: optional cache keyed by member identity
//!
//! # Example
//!
//! ```ignore
//! use safe_access::*;
//! use safe_value::{TypeHandle, Value};
//!
//! struct Point { x: i32, y: i32 }
//!
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .describe::<Point>()
//!     .constructor(|(x, y): (i32, i32)| Point { x, y })
//!     .field("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v);
//!
//! let ty = TypeHandle::reference::<Point>();
//! let ctor = registry.find_constructor(&ty, 2);
//! let ctor = MemberDescriptor::new(ctor, DescriptorKind::Constructor)?;
//! let point = ConstructorAccessor::new(ctor)?.invoke(&[Value::i32(3), Value::i32(4)])?;
//!
//! let x = MemberDescriptor::resolve(&registry, &ty, "x", DescriptorKind::Field)?;
//! let x = FieldAccessor::new(x)?;
//! assert_eq!(x.get_value(&point)?, Value::i32(3));
//! ```

#![warn(missing_docs)]

pub mod accessor;
mod cache;
mod compile;
pub mod config;
mod descriptor;
mod error;
pub mod metadata;
mod permissions;
mod plan;
pub mod typed;

pub use accessor::{
    ConstructorAccessor, ConstructorMethodAccessor, FieldAccessor, IndexedPropertyAccessor,
    MemberAccessor, MethodAccessor, PropertyAccessor, ValueAccessor,
};
pub use cache::AccessorCache;
pub use compile::{
    CompiledThunk, Compiler, TypedCallThunk, TypedConstructThunk, TypedReadThunk,
    TypedReinitThunk, TypedWriteThunk,
};
pub use config::{AccessorConfig, AccessorOptions, CastPolicy, ConfigError};
pub use descriptor::{DescriptorKind, MemberDescriptor};
pub use error::{AccessError, AccessResult, CastSite};
pub use metadata::{MemberId, MemberInfo, MemberKind, MetadataRegistry, TypeBuilder, Visibility};
pub use permissions::{AccessPermission, AccessPolicy, TypeRule};
pub use plan::{
    ArgumentPlan, ArgumentSlot, Coercion, Dispatch, Operation, OperationPlan, Surface,
    ThunkBuilder,
};
pub use typed::{
    TypedConstructorAccessor, TypedConstructorMethodAccessor, TypedFieldAccessor,
    TypedIndexedPropertyAccessor, TypedMethodAccessor, TypedPropertyAccessor,
};

pub use safe_value::{Handle, ObjectRef, TypeHandle, Value, NO_ARGS};
