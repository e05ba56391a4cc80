//! Safe Value - untyped value model for member accessors
//!
//! This crate provides the minimal types and traits shared by the accessor
//! core and its callers, without depending on the core itself:
//!
//! - [`Value`]: the universal "object" passed across the untyped surface
//! - [`ObjectRef`] / [`Handle`]: reference-semantics class instances
//! - [`TypeHandle`]: runtime description of a static type
//! - [`Reflect`] / [`Arguments`]: boxing, unboxing and argument unpacking
//!
//! # Example
//!
//! ```ignore
//! use safe_value::{Handle, Reflect, Value};
//!
//! struct Point { x: i32, y: i32 }
//!
//! let p = Handle::new(Point { x: 3, y: 4 });
//! let boxed: Value = p.clone().into_value();
//! assert_eq!(Handle::<Point>::from_value(boxed)?, p);
//! ```

#![warn(missing_docs)]

mod convert;
mod error;
mod object;
mod types;
mod value;

pub use convert::{Arguments, Reflect};
pub use error::{ValueError, ValueResult};
pub use object::{Handle, ObjectRef};
pub use types::{TypeHandle, TypeKind};
pub use value::Value;

/// Shared empty argument vector for zero-argument calls.
pub const NO_ARGS: &[Value] = &[];
