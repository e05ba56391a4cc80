//! Access policy
//!
//! Controls which members an accessor may be compiled for. Permissions are
//! resolved per declaring type (exact type path first, then wildcard rules
//! in declaration order, then the global default) and checked once, at
//! compile time; a denied permission fails accessor construction with
//! `AccessorCompilationFailed`.
//!
//! | Operation      | Public member    | Private member    |
//! |----------------|------------------|-------------------|
//! | get            | `READ_PUBLIC`    | `READ_PRIVATE`    |
//! | set            | `WRITE_PUBLIC`   | `WRITE_PRIVATE`   |
//! | invoke         | `INVOKE_PUBLIC`  | `INVOKE_PRIVATE`  |
//! | construct      | `CONSTRUCT`      | `CONSTRUCT` + `INVOKE_PRIVATE` |
//!
//! Type rules use `::` paths: `app::model::Point` matches exactly,
//! `app::model::*` matches direct children of `app::model`, and
//! `app::**` matches anything below `app`.

use std::fmt;
use std::ops::BitOr;

use rustc_hash::FxHashMap;
use safe_value::TypeHandle;

use crate::descriptor::MemberDescriptor;
use crate::error::{AccessError, AccessResult};
use crate::plan::Operation;

/// Access permission flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessPermission(u8);

impl AccessPermission {
    /// Nothing allowed
    pub const NONE: Self = Self(0x00);
    /// Read public fields and properties
    pub const READ_PUBLIC: Self = Self(0x01);
    /// Read private fields and properties
    pub const READ_PRIVATE: Self = Self(0x02);
    /// Write public fields and properties
    pub const WRITE_PUBLIC: Self = Self(0x04);
    /// Write private fields and properties
    pub const WRITE_PRIVATE: Self = Self(0x08);
    /// Invoke public methods
    pub const INVOKE_PUBLIC: Self = Self(0x10);
    /// Invoke private methods (and private constructors)
    pub const INVOKE_PRIVATE: Self = Self(0x20);
    /// Run constructors
    pub const CONSTRUCT: Self = Self(0x40);

    /// READ_PUBLIC | READ_PRIVATE
    pub const READ_ALL: Self = Self(0x03);
    /// WRITE_PUBLIC | WRITE_PRIVATE
    pub const WRITE_ALL: Self = Self(0x0C);
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x30);
    /// Public members plus construction
    pub const PUBLIC_ONLY: Self = Self(0x55);
    /// Everything
    pub const ALL: Self = Self(0x7F);

    const NAMED: [(&'static str, Self); 13] = [
        ("NONE", Self::NONE),
        ("READ_PUBLIC", Self::READ_PUBLIC),
        ("READ_PRIVATE", Self::READ_PRIVATE),
        ("WRITE_PUBLIC", Self::WRITE_PUBLIC),
        ("WRITE_PRIVATE", Self::WRITE_PRIVATE),
        ("INVOKE_PUBLIC", Self::INVOKE_PUBLIC),
        ("INVOKE_PRIVATE", Self::INVOKE_PRIVATE),
        ("CONSTRUCT", Self::CONSTRUCT),
        ("READ_ALL", Self::READ_ALL),
        ("WRITE_ALL", Self::WRITE_ALL),
        ("INVOKE_ALL", Self::INVOKE_ALL),
        ("PUBLIC_ONLY", Self::PUBLIC_ONLY),
        ("ALL", Self::ALL),
    ];

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Whether every flag of `other` is set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Parse a single name, or a hex (`0x..`) or decimal literal
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        if let Some((_, perm)) = Self::NAMED.iter().find(|(name, _)| *name == upper) {
            return Some(*perm);
        }
        let bits = match upper.strip_prefix("0X") {
            Some(hex) => u8::from_str_radix(hex, 16).ok()?,
            None => upper.parse::<u8>().ok()?,
        };
        (bits & !Self::ALL.0 == 0).then_some(Self(bits))
    }

    /// Parse a pipe-separated combination (e.g. `READ_PUBLIC|WRITE_PUBLIC`)
    pub fn parse_combined(s: &str) -> Option<Self> {
        s.split('|')
            .try_fold(Self::NONE, |acc, part| Some(acc.union(Self::parse(part)?)))
    }

    /// Permission required to run `operation` on a member
    pub fn required(operation: Operation, is_private: bool) -> Self {
        match (operation, is_private) {
            (Operation::Get, false) => Self::READ_PUBLIC,
            (Operation::Get, true) => Self::READ_PRIVATE,
            (Operation::Set, false) => Self::WRITE_PUBLIC,
            (Operation::Set, true) => Self::WRITE_PRIVATE,
            (Operation::Invoke, false) => Self::INVOKE_PUBLIC,
            (Operation::Invoke, true) => Self::INVOKE_PRIVATE,
            (Operation::Construct, false) => Self::CONSTRUCT,
            (Operation::Construct, true) => Self::CONSTRUCT | Self::INVOKE_PRIVATE,
        }
    }
}

impl Default for AccessPermission {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for AccessPermission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for AccessPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMED.iter().find(|(_, perm)| perm == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Wildcard rule over type paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    /// Pattern (`path::*`, `path::**`, `*` or `**`)
    pub pattern: String,
    /// Permissions for matching types
    pub permissions: AccessPermission,
}

impl TypeRule {
    /// Whether `type_path` matches this rule
    pub fn matches(&self, type_path: &str) -> bool {
        if self.pattern == "*" || self.pattern == "**" {
            return true;
        }
        if let Some(prefix) = self.pattern.strip_suffix("::**") {
            type_path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
        } else if let Some(prefix) = self.pattern.strip_suffix("::*") {
            type_path
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix("::"))
                .is_some_and(|leaf| !leaf.is_empty() && !leaf.contains("::"))
        } else {
            self.pattern == type_path
        }
    }
}

/// Permissions per declaring type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    global: AccessPermission,
    exact: FxHashMap<String, AccessPermission>,
    rules: Vec<TypeRule>,
}

impl AccessPolicy {
    /// Policy allowing everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with a different global default
    pub fn with_global(global: AccessPermission) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Global default
    pub fn global(&self) -> AccessPermission {
        self.global
    }

    /// Set the global default
    pub fn set_global(&mut self, permissions: AccessPermission) {
        self.global = permissions;
    }

    /// Add an exact type path or wildcard rule
    pub fn add_rule(&mut self, pattern: &str, permissions: AccessPermission) {
        if pattern.contains('*') {
            self.rules.push(TypeRule {
                pattern: pattern.to_string(),
                permissions,
            });
        } else {
            self.exact.insert(pattern.to_string(), permissions);
        }
    }

    /// Whether anything narrower than `ALL` is configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global != AccessPermission::ALL || !self.exact.is_empty() || !self.rules.is_empty()
    }

    /// Permissions in force for `ty`
    pub fn resolve(&self, ty: &TypeHandle) -> AccessPermission {
        let path = ty.name();
        if let Some(perms) = self.exact.get(path) {
            return *perms;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map_or(self.global, |rule| rule.permissions)
    }

    /// Check that `operation` on `descriptor` is allowed
    pub fn check(&self, descriptor: &MemberDescriptor, operation: Operation) -> AccessResult<()> {
        if !self.has_any_restrictions() {
            return Ok(());
        }
        let is_private = descriptor.modifiers().is_private();
        let required = AccessPermission::required(operation, is_private);
        let granted = self.resolve(&descriptor.declaring_type());
        if granted.contains(required) {
            Ok(())
        } else {
            Err(AccessError::compilation_failed(
                descriptor.qualified_name(),
                format!(
                    "permission denied: {} {} member requires {}, {} grants {}",
                    operation,
                    if is_private { "private" } else { "public" },
                    required,
                    descriptor.declaring_type().short_name(),
                    granted
                ),
            ))
        }
    }
}
