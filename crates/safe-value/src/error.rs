//! Error types for value conversion

/// Result type for value conversions
pub type ValueResult<T> = Result<T, ValueError>;

/// Value conversion error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Type mismatch during unboxing or casting
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Positional argument list has the wrong length
    #[error("Argument count mismatch: expected {expected}, got {got}")]
    ArgumentCount {
        /// Number of parameters declared
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// Null supplied where a non-nullable value is required
    #[error("Null value where {expected} is required")]
    NullValue {
        /// Expected type name
        expected: String,
    },
}

impl ValueError {
    /// Build a type mismatch from two displayable type names
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ValueError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
