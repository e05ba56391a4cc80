//! Typed field and property accessors

use std::any::Any;
use std::fmt;

use safe_value::{Reflect, Value, NO_ARGS};

use super::plan_typed;
use crate::accessor::{expect_kind, not_supported, MemberAccessor};
use crate::compile::{Compiler, TypedReadThunk, TypedWriteThunk};
use crate::config::AccessorOptions;
use crate::descriptor::{DescriptorKind, MemberDescriptor};
use crate::error::AccessResult;
use crate::plan::Operation;

/// Getter and setter thunks of a typed value member
pub(crate) struct TypedValueThunks<T, V> {
    getter: Option<TypedReadThunk<T, V>>,
    setter: Option<TypedWriteThunk<T, V>>,
}

impl<T: Any + Send + Sync, V: Reflect> TypedValueThunks<T, V> {
    pub(crate) fn compile(
        descriptor: &MemberDescriptor,
        options: &AccessorOptions,
    ) -> AccessResult<Self> {
        let compiler = Compiler::new(&options.policy);
        let getter = if descriptor.can_read() {
            let plan = plan_typed(descriptor, Operation::Get, options)?;
            Some(compiler.compile_get::<T, V>(descriptor, &plan)?)
        } else {
            None
        };
        let setter = if descriptor.can_write() {
            let plan = plan_typed(descriptor, Operation::Set, options)?;
            Some(compiler.compile_set::<T, V>(descriptor, &plan)?)
        } else {
            None
        };
        Ok(Self { getter, setter })
    }

    pub(crate) fn get(
        &self,
        descriptor: &MemberDescriptor,
        target: Option<&T>,
        index: &[Value],
    ) -> AccessResult<V> {
        match &self.getter {
            Some(get) => get(target, index),
            None => Err(not_supported(descriptor, "GetValue")),
        }
    }

    pub(crate) fn set(
        &self,
        descriptor: &MemberDescriptor,
        target: Option<&mut T>,
        value: V,
        index: &[Value],
    ) -> AccessResult<()> {
        match &self.setter {
            Some(set) => set(target, index, value),
            None => Err(not_supported(descriptor, "SetValue")),
        }
    }
}

macro_rules! typed_value_accessor {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        pub struct $name<T, V> {
            descriptor: MemberDescriptor,
            thunks: TypedValueThunks<T, V>,
        }

        impl<T: Any + Send + Sync, V: Reflect> $name<T, V> {
            /// Build with the process-wide default options
            pub fn new(descriptor: MemberDescriptor) -> AccessResult<Self> {
                Self::with_options(descriptor, crate::config::default_options())
            }

            /// Build with explicit options
            pub fn with_options(
                descriptor: MemberDescriptor,
                options: &AccessorOptions,
            ) -> AccessResult<Self> {
                expect_kind(&descriptor, &[$kind])?;
                let thunks = TypedValueThunks::compile(&descriptor, options)?;
                Ok(Self { descriptor, thunks })
            }

            /// Whether `get_value` is available
            pub fn can_read(&self) -> bool {
                self.descriptor.can_read()
            }

            /// Whether `set_value` is available
            pub fn can_write(&self) -> bool {
                self.descriptor.can_write()
            }

            /// Read the member of `target` (ignored for static members)
            pub fn get_value(&self, target: Option<&T>) -> AccessResult<V> {
                self.thunks.get(&self.descriptor, target, NO_ARGS)
            }

            /// Write the member of `target` (ignored for static members)
            pub fn set_value(&self, target: Option<&mut T>, value: V) -> AccessResult<()> {
                self.thunks.set(&self.descriptor, target, value, NO_ARGS)
            }
        }

        impl<T, V> MemberAccessor for $name<T, V> {
            fn descriptor(&self) -> &MemberDescriptor {
                &self.descriptor
            }
        }

        impl<T, V> fmt::Debug for $name<T, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("member", &self.descriptor.qualified_name())
                    .field("can_read", &self.descriptor.can_read())
                    .field("can_write", &self.descriptor.can_write())
                    .finish()
            }
        }
    };
}

typed_value_accessor!(
    /// Reads and writes a `V` field of `T`
    TypedFieldAccessor,
    DescriptorKind::Field
);

typed_value_accessor!(
    /// Reads and writes a `V` property of `T`
    TypedPropertyAccessor,
    DescriptorKind::Property
);
