//! Member metadata
//!
//! `MemberInfo` is the host-side description of one constructor, field,
//! property, indexer, or method, together with its bindings. It is created
//! once by [`TypeBuilder`](super::TypeBuilder) and shared (via `Arc`) by every
//! descriptor built over it.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use safe_value::TypeHandle;

use super::binding::ErasedBinding;

/// Stable identity of a registered member (index into the registry arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub(crate) u32);

impl MemberId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a registered member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Constructor of the declaring type
    Constructor,
    /// Plain data field
    Field,
    /// Property with optional getter and setter
    Property,
    /// Property taking one or more index arguments
    Indexer,
    /// Static or instance method
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberKind::Constructor => "constructor",
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Indexer => "indexer",
            MemberKind::Method => "method",
        };
        f.write_str(s)
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Accessible to every caller
    #[default]
    Public,
    /// Accessible only with private-access permission
    Private,
}

/// Modifier flags for members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Member visibility
    pub visibility: Visibility,
    /// Static member (no receiver)
    pub is_static: bool,
    /// Read-only field (no setter)
    pub is_readonly: bool,
}

impl Modifiers {
    /// Whether the member is private
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// Parameter information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Zero-based position
    pub position: usize,
    /// Declared parameter type
    pub ty: TypeHandle,
}

impl ParameterInfo {
    pub(crate) fn list(types: Vec<TypeHandle>) -> Vec<ParameterInfo> {
        types
            .into_iter()
            .enumerate()
            .map(|(position, ty)| ParameterInfo { position, ty })
            .collect()
    }
}

/// Registered member with its bindings
#[derive(Clone)]
pub struct MemberInfo {
    pub(crate) id: MemberId,
    pub(crate) name: String,
    pub(crate) kind: MemberKind,
    pub(crate) declaring_type: TypeHandle,
    pub(crate) value_type: TypeHandle,
    pub(crate) parameters: Vec<ParameterInfo>,
    pub(crate) modifiers: Modifiers,
    pub(crate) erased: ErasedBinding,
    pub(crate) typed: Arc<dyn Any + Send + Sync>,
    /// Shared with the declaring type's metadata and every clone of this entry
    pub(crate) type_abstract: Arc<AtomicBool>,
}

impl MemberInfo {
    /// Member identity
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Member name (`new` for constructors)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Type.member` form used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type.short_name(), self.name)
    }

    /// Member kind
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Type that declares the member
    pub fn declaring_type(&self) -> TypeHandle {
        self.declaring_type
    }

    /// Field/property type, return type, or constructed type
    pub fn value_type(&self) -> TypeHandle {
        self.value_type
    }

    /// Parameters (constructor/method arguments or indexer index arguments)
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    /// Modifier flags
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Constructor of a type currently marked abstract
    pub fn is_abstract(&self) -> bool {
        self.kind == MemberKind::Constructor && self.type_abstract.load(Ordering::Acquire)
    }

    /// Whether the member is static
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    /// Whether a getter is bound (always true for constructors and methods)
    pub fn has_getter(&self) -> bool {
        match &self.erased {
            ErasedBinding::Value { get, .. } => get.is_some(),
            ErasedBinding::Constructor { .. } | ErasedBinding::Method { .. } => true,
        }
    }

    /// Whether a setter is bound
    pub fn has_setter(&self) -> bool {
        match &self.erased {
            ErasedBinding::Value { set, .. } => set.is_some(),
            ErasedBinding::Constructor { .. } | ErasedBinding::Method { .. } => false,
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("id", &self.id)
            .field("name", &self.qualified_name())
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("parameters", &self.parameters.len())
            .field("modifiers", &self.modifiers)
            .field("is_abstract", &self.is_abstract())
            .finish()
    }
}
