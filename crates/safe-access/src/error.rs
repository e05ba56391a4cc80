//! Error types for accessor construction and invocation
//!
//! Errors fall into three classes, each detected at a fixed point:
//!
//! | Class       | Variants                                            | Detected at             |
//! |-------------|-----------------------------------------------------|-------------------------|
//! | Descriptor  | `InvalidMember`                                     | descriptor construction |
//! | Compilation | `AccessorCompilationFailed`, `InvalidOperation`     | accessor construction   |
//! | Invocation  | `TargetNull`, `TargetMismatch`, `NotSupported`,     | every call              |
//! |             | `ArgumentCount`, `InvalidCast`, `AliasedTarget`,    |                         |
//! |             | `MemberFailed`                                      |                         |

use std::fmt;

use safe_value::ValueError;

/// Result type for accessor operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Where a failed coercion happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastSite {
    /// Positional argument or index argument
    Argument(usize),
    /// Value assigned by a setter
    Value,
    /// Target instance of an instance member
    Target,
}

impl fmt::Display for CastSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastSite::Argument(i) => write!(f, "argument {}", i),
            CastSite::Value => write!(f, "assigned value"),
            CastSite::Target => write!(f, "target"),
        }
    }
}

/// Accessor error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// Metadata absent, of the wrong kind, or malformed
    #[error("Invalid member: {0}")]
    InvalidMember(String),

    /// The operation plan could not be turned into a runnable thunk
    #[error("Accessor compilation failed for {member}: {reason}")]
    AccessorCompilationFailed {
        /// Member name
        member: String,
        /// Why compilation was refused
        reason: String,
    },

    /// Instance member invoked without a target
    #[error("Target required for instance member {member}")]
    TargetNull {
        /// Member name
        member: String,
    },

    /// Target is not an instance of the declaring type
    #[error("Target of {member} must be {expected}, got {found}")]
    TargetMismatch {
        /// Member name
        member: String,
        /// Declaring type
        expected: String,
        /// Runtime type of the supplied target
        found: String,
    },

    /// Operation not available on this member (e.g. writing a read-only field)
    #[error("{operation} is not supported by {member}")]
    NotSupported {
        /// Member name
        member: String,
        /// Operation attempted
        operation: &'static str,
    },

    /// Programming error: a plan was requested for an operation the member lacks
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Wrong number of positional or index arguments
    #[error("{member} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Member name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// A value could not be coerced to the required type
    #[error("Cannot convert {site} of {member}: expected {expected}, got {found}")]
    InvalidCast {
        /// Member name
        member: String,
        /// Where the coercion failed
        site: CastSite,
        /// Required type
        expected: String,
        /// Runtime type of the value
        found: String,
    },

    /// An argument or assigned value is the target instance itself
    #[error("{site} of {member} is its own target")]
    AliasedTarget {
        /// Member name
        member: String,
        /// Position of the aliasing value
        site: CastSite,
    },

    /// The wrapped member itself reported a failure
    #[error("{member} failed: {message}")]
    MemberFailed {
        /// Member name
        member: String,
        /// Failure reported by the member
        message: String,
    },

    /// Conversion failure inside a member binding
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl AccessError {
    /// Build an `InvalidMember` from any displayable reason
    pub fn invalid_member(reason: impl Into<String>) -> Self {
        AccessError::InvalidMember(reason.into())
    }

    /// Build an `AccessorCompilationFailed`
    pub fn compilation_failed(member: impl Into<String>, reason: impl Into<String>) -> Self {
        AccessError::AccessorCompilationFailed {
            member: member.into(),
            reason: reason.into(),
        }
    }
}
