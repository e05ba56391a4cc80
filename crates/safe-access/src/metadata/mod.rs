//! Member metadata facility
//!
//! The registry plays the role of a host reflection facility: types describe
//! their constructors, fields, properties, indexers and methods once through
//! a [`TypeBuilder`], and descriptors are later created from the resulting
//! [`MemberInfo`] entries.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .describe::<Point>()
//!     .constructor(|(x, y): (i32, i32)| Point { x, y })
//!     .field("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v);
//!
//! let x = registry.find_field(&TypeHandle::reference::<Point>(), "x");
//! ```

mod binding;
mod builder;
mod member;
mod registry;

pub use binding::{Receiver, ReceiverMut};
pub use builder::TypeBuilder;
pub use member::{MemberId, MemberInfo, MemberKind, Modifiers, ParameterInfo, Visibility};
pub use registry::{MetadataRegistry, TypeMetadata};

pub(crate) use binding::{
    ErasedBinding, TypedConstructorBinding, TypedMethodBinding, TypedValueBinding,
};
