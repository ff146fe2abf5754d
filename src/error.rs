//! Error types for registry access operations.
//!
//! Every failure of the access layer is reported through [`RegistryError`].
//! Callers that only care about the broad category of a failure can match on
//! [`RegistryError::kind`], which is what the fallback-value accessors do to
//! tell an absent value apart from every other problem.

use crate::types::ValueType;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Broad category of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The native binding is not loaded or was disabled.
    Unavailable,
    /// The native layer reported a failure status.
    NativeFailure,
    /// The key or value does not exist.
    NotFound,
    /// The stored value type does not match the requested one.
    TypeMismatch,
    /// The caller supplied an unusable argument.
    InvalidArgument,
}

/// Errors that can occur while accessing the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry access is not available in this process.
    #[error("Registry is not available")]
    Unavailable,

    /// Native call returned a non-success status.
    #[error("{context} (native error {code})")]
    Native {
        /// Raw status code returned by the native layer.
        code: u32,
        /// Operation and subject of the failed call.
        context: String,
    },

    /// The key or value does not exist.
    #[error("{context}: not found")]
    NotFound {
        /// Raw status code returned by the native layer.
        code: u32,
        /// Operation and subject of the failed call.
        context: String,
    },

    /// The stored value type does not belong to the requested category.
    #[error("Value '{name}' has type {actual}, expected {expected}")]
    TypeMismatch {
        /// Value name.
        name: String,
        /// Description of the accepted types.
        expected: &'static str,
        /// Type reported by the registry.
        actual: ValueType,
    },

    /// Value data is shorter than its declared type requires.
    #[error("Value '{name}' is truncated: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Value name.
        name: String,
        /// Bytes required by the declared type.
        expected: usize,
        /// Bytes actually stored.
        actual: usize,
    },

    /// The value was modified between the probe and fetch phases.
    #[error("Value '{name}' changed while being read: {detail}")]
    ValueChanged {
        /// Value name.
        name: String,
        /// What differed between the two phases.
        detail: String,
    },

    /// Invalid caller-supplied argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configured narrow-string encoding label is not recognized or not usable.
    #[error("Unsupported text encoding: {0}")]
    UnknownEncoding(String),
}

impl RegistryError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable => ErrorKind::Unavailable,
            Self::Native { .. } | Self::ValueChanged { .. } => ErrorKind::NativeFailure,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TypeMismatch { .. } | Self::TruncatedData { .. } => ErrorKind::TypeMismatch,
            Self::InvalidArgument(_) | Self::UnknownEncoding(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Returns the raw native status code, if the error came from a native call.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Native { code, .. } | Self::NotFound { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this error means the key or value does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Maps a non-success native status to an error.
    ///
    /// `ERROR_FILE_NOT_FOUND` becomes [`RegistryError::NotFound`]; every other
    /// code is reported as [`RegistryError::Native`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use reg_access::error::{ErrorKind, RegistryError};
    /// let err = RegistryError::from_status(2, "Failed to query value 'Foo'".to_string());
    /// assert_eq!(err.kind(), ErrorKind::NotFound);
    /// assert_eq!(err.code(), Some(2));
    /// ```
    pub fn from_status(code: u32, context: String) -> Self {
        if code == crate::native::ERROR_FILE_NOT_FOUND {
            Self::NotFound { code, context }
        } else {
            Self::Native { code, context }
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_not_found() {
        let err = RegistryError::from_status(2, "Could not open registry key 'X' for reading".into());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_not_found());
        assert_eq!(err.code(), Some(2));
    }

    #[test]
    fn test_from_status_other() {
        let err = RegistryError::from_status(5, "Could not open registry key 'X' for writing".into());
        assert_eq!(err.kind(), ErrorKind::NativeFailure);
        assert_eq!(err.code(), Some(5));
        assert_eq!(
            err.to_string(),
            "Could not open registry key 'X' for writing (native error 5)"
        );
    }

    #[test]
    fn test_kinds_without_code() {
        assert_eq!(RegistryError::Unavailable.kind(), ErrorKind::Unavailable);
        assert_eq!(RegistryError::Unavailable.code(), None);

        let err = RegistryError::TruncatedData {
            name: "Flag".into(),
            expected: 4,
            actual: 2,
        };
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = RegistryError::ValueChanged {
            name: "Flag".into(),
            detail: "length 4 became 8".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NativeFailure);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = RegistryError::TypeMismatch {
            name: "Version".into(),
            expected: "a textual type",
            actual: ValueType::Dword,
        };
        assert_eq!(
            err.to_string(),
            "Value 'Version' has type REG_DWORD, expected a textual type"
        );
    }
}
