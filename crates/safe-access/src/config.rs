//! Accessor configuration (TOML)
//!
//! ```toml
//! [accessors]
//! safe_cast = "null"        # "null" (default) or "fail"
//!
//! [accessors.permissions]
//! global = "ALL"
//!
//! [accessors.permissions.types]
//! "app::model::Point" = "READ_ALL|WRITE_PUBLIC"
//! "app::model::*" = "PUBLIC_ONLY"
//! "plugins::**" = "READ_PUBLIC"
//! ```
//!
//! Type rules are applied in file order, so a wildcard listed earlier wins
//! over a later one.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::{AccessPermission, AccessPolicy};

/// Errors that can occur while loading accessor configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read accessor config: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse accessor config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid accessor config: {0}")]
    ValidationError(String),
}

/// What an untyped setter does when a reference value has the wrong type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CastPolicy {
    /// Assign null instead (nullable slots only; others still fail)
    #[default]
    #[serde(rename = "null")]
    NullOnMismatch,
    /// Fail the call with `InvalidCast`
    #[serde(rename = "fail")]
    Fail,
}

/// Root of an accessor configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessorConfig {
    /// `[accessors]` table
    #[serde(default)]
    pub accessors: AccessorsSection,
}

/// `[accessors]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessorsSection {
    /// Safe-cast behavior of untyped setters
    #[serde(default)]
    pub safe_cast: CastPolicy,

    /// Access policy
    #[serde(default)]
    pub permissions: PermissionsSection,
}

/// `[accessors.permissions]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PermissionsSection {
    /// Global default permission expression
    #[serde(default = "default_global")]
    pub global: String,

    /// Per-type rules: type path or wildcard to permission expression
    #[serde(default)]
    pub types: toml::Table,
}

fn default_global() -> String {
    "ALL".to_string()
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            global: default_global(),
            types: toml::Table::new(),
        }
    }
}

impl AccessorConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: AccessorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate permission expressions and patterns
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy().map(|_| ())
    }

    /// Build the access policy described by the file
    pub fn policy(&self) -> Result<AccessPolicy, ConfigError> {
        let section = &self.accessors.permissions;
        let global = AccessPermission::parse_combined(&section.global).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "invalid global permission: {}",
                section.global
            ))
        })?;

        let mut policy = AccessPolicy::with_global(global);
        for (pattern, value) in &section.types {
            validate_pattern(pattern)?;
            let expr = value.as_str().ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "permission for {} must be a string",
                    pattern
                ))
            })?;
            let perms = AccessPermission::parse_combined(expr).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "invalid permission for {}: {}",
                    pattern, expr
                ))
            })?;
            policy.add_rule(pattern, perms);
        }
        Ok(policy)
    }

    /// Resolve into accessor options
    pub fn options(&self) -> Result<AccessorOptions, ConfigError> {
        Ok(AccessorOptions {
            policy: self.policy()?,
            cast_policy: self.accessors.safe_cast,
        })
    }
}

fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    let body = pattern
        .strip_suffix("::**")
        .or_else(|| pattern.strip_suffix("::*"))
        .unwrap_or(pattern);
    let valid = pattern == "*"
        || pattern == "**"
        || (!body.is_empty()
            && !body.contains('*')
            && body.split("::").all(|segment| !segment.is_empty()));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "invalid type pattern: {}",
            pattern
        )))
    }
}

/// Options every accessor is compiled with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorOptions {
    /// Which members may be compiled
    pub policy: AccessPolicy,
    /// Safe-cast behavior of untyped setters
    pub cast_policy: CastPolicy,
}

impl AccessorOptions {
    /// Options with an explicit cast policy and no access restrictions
    pub fn with_cast_policy(cast_policy: CastPolicy) -> Self {
        Self {
            policy: AccessPolicy::new(),
            cast_policy,
        }
    }
}

static DEFAULT_OPTIONS: Lazy<AccessorOptions> = Lazy::new(AccessorOptions::default);

/// Process-wide options used by the `new(descriptor)` constructors
pub fn default_options() -> &'static AccessorOptions {
    &DEFAULT_OPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = AccessorConfig::from_str(
            r#"
            [accessors]
            safe_cast = "fail"

            [accessors.permissions]
            global = "READ_ALL|INVOKE_PUBLIC"

            [accessors.permissions.types]
            "app::model::*" = "PUBLIC_ONLY"
            "app::secret::Key" = "NONE"
            "#,
        )
        .unwrap();

        let options = config.options().unwrap();
        assert_eq!(options.cast_policy, CastPolicy::Fail);
        assert_eq!(
            options.policy.global(),
            AccessPermission::READ_ALL | AccessPermission::INVOKE_PUBLIC
        );
    }

    #[test]
    fn test_defaults() {
        let config = AccessorConfig::from_str("").unwrap();
        assert_eq!(config.accessors.safe_cast, CastPolicy::NullOnMismatch);
        let options = config.options().unwrap();
        assert!(!options.policy.has_any_restrictions());
        assert_eq!(&options, default_options());
    }

    #[test]
    fn test_invalid_permission() {
        let err = AccessorConfig::from_str(
            r#"
            [accessors.permissions]
            global = "EVERYTHING"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = AccessorConfig::from_str(
            r#"
            [accessors.permissions.types]
            "app::*::Point" = "ALL"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_cast_policy() {
        let err = AccessorConfig::from_str(
            r#"
            [accessors]
            safe_cast = "maybe"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
