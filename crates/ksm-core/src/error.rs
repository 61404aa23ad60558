//! Error types for the KSM key service.
//!
//! Errors are organized by domain:
//!
//! - [`CryptoError`] - Algorithm resolution and simulated primitive failures
//! - [`StoreError`] - Persistent key store failures
//! - [`ConfigError`] - Configuration failures
//! - [`KsmError`] - Top-level error that wraps all of the above
//!
//! [`ErrorCode`] gives every failure class a stable machine-readable code for
//! the collaborator API.
//!
//! # Example
//!
//! ```rust
//! use ksm_core::error::{CryptoError, ErrorCode, KsmError};
//!
//! let err: KsmError = CryptoError::invalid_algorithm("FALCON512").into();
//! assert_eq!(ErrorCode::from(&err), ErrorCode::InvalidAlgorithm);
//! assert_eq!(err.to_string(), "Crypto error: invalid algorithm: FALCON512");
//! ```

use std::fmt;

use serde::Serialize;

use crate::algorithm::{Algorithm, AlgorithmFamily};

/// Top-level error type for the KSM key service.
#[derive(Debug, thiserror::Error)]
pub enum KsmError {
    /// Algorithm or primitive failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Key storage failure.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration failure.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The operation needs a key pair that is neither cached nor stored.
    #[error("no key pair found for entity: {entity_id}")]
    EntityKeyNotFound {
        /// The entity that has no key pair.
        entity_id: String,
    },

    /// The request was malformed (missing or mistyped parameter).
    #[error("invalid request: {context}")]
    InvalidRequest {
        /// What was wrong with the request.
        context: String,
    },
}

impl KsmError {
    /// Create an `EntityKeyNotFound` error.
    #[must_use]
    pub fn entity_key_not_found(entity_id: impl Into<String>) -> Self {
        Self::EntityKeyNotFound {
            entity_id: entity_id.into(),
        }
    }

    /// Create an `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(context: impl Into<String>) -> Self {
        Self::InvalidRequest {
            context: context.into(),
        }
    }
}

// ============================================================================
// ErrorCode
// ============================================================================

/// Stable machine-readable failure codes.
///
/// Serialized in `SCREAMING_SNAKE_CASE` in API failure responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown algorithm name.
    InvalidAlgorithm,
    /// Algorithm recognized but not implemented.
    UnsupportedAlgorithm,
    /// Operation not offered by the algorithm's family.
    WrongOperationForAlgorithm,
    /// No key pair for the requested entity.
    EntityKeyNotFound,
    /// Ciphertext could not be decrypted.
    DecryptionError,
    /// Storage could not be initialized.
    StorageInitError,
    /// A stored record failed to parse or unwrap.
    RecordCorrupt,
    /// The request was malformed.
    InvalidRequest,
    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// The wire form of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidAlgorithm => "INVALID_ALGORITHM",
            Self::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            Self::WrongOperationForAlgorithm => "WRONG_OPERATION_FOR_ALGORITHM",
            Self::EntityKeyNotFound => "ENTITY_KEY_NOT_FOUND",
            Self::DecryptionError => "DECRYPTION_ERROR",
            Self::StorageInitError => "STORAGE_INIT_ERROR",
            Self::RecordCorrupt => "RECORD_CORRUPT",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&KsmError> for ErrorCode {
    fn from(error: &KsmError) -> Self {
        match error {
            KsmError::Crypto(CryptoError::InvalidAlgorithm { .. }) => Self::InvalidAlgorithm,
            KsmError::Crypto(
                CryptoError::UnsupportedAlgorithm { .. } | CryptoError::UnsupportedVariant { .. },
            ) => Self::UnsupportedAlgorithm,
            KsmError::Crypto(CryptoError::WrongOperation { .. }) => {
                Self::WrongOperationForAlgorithm
            }
            KsmError::Crypto(CryptoError::Decryption { .. }) => Self::DecryptionError,
            KsmError::Store(StoreError::Init { .. }) => Self::StorageInitError,
            KsmError::Store(StoreError::RecordCorrupt { .. }) => Self::RecordCorrupt,
            KsmError::Store(StoreError::InvalidEntityId { .. }) | KsmError::InvalidRequest { .. } => {
                Self::InvalidRequest
            }
            KsmError::EntityKeyNotFound { .. } => Self::EntityKeyNotFound,
            KsmError::Crypto(_) | KsmError::Store(_) | KsmError::Config(_) => Self::InternalError,
        }
    }
}

impl From<KsmError> for ErrorCode {
    fn from(error: KsmError) -> Self {
        Self::from(&error)
    }
}

// ============================================================================
// CryptoError
// ============================================================================

/// Errors raised by the algorithm catalog, the service factory and the
/// simulated primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The name does not match any catalog entry.
    #[error("invalid algorithm: {name}")]
    InvalidAlgorithm {
        /// The name that was requested.
        name: String,
    },

    /// The variant is registered but has no implementation.
    #[error("unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The unimplemented variant.
        algorithm: Algorithm,
    },

    /// A service was asked to handle a variant outside its family.
    #[error("unsupported variant {algorithm} for {expected} service")]
    UnsupportedVariant {
        /// The variant that was passed.
        algorithm: Algorithm,
        /// The family the service handles.
        expected: AlgorithmFamily,
    },

    /// The operation is not offered by this family.
    #[error("operation {operation} is not supported by {algorithm}")]
    WrongOperation {
        /// Name of the rejected operation.
        operation: &'static str,
        /// The variant the operation was attempted with.
        algorithm: Algorithm,
    },

    /// Key material does not match the declared size.
    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Which buffer was wrong.
        what: &'static str,
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// The cipher could not be set up for encryption.
    #[error("encryption failed: {context}")]
    EncryptionFailed {
        /// What went wrong.
        context: String,
    },

    /// Ciphertext was truncated, malformed or failed its padding check.
    #[error("decryption failed: {context}")]
    Decryption {
        /// What went wrong.
        context: String,
    },
}

impl CryptoError {
    /// Create an `InvalidAlgorithm` error.
    #[must_use]
    pub fn invalid_algorithm(name: impl Into<String>) -> Self {
        Self::InvalidAlgorithm { name: name.into() }
    }

    /// Create an `UnsupportedAlgorithm` error.
    #[must_use]
    pub const fn unsupported_algorithm(algorithm: Algorithm) -> Self {
        Self::UnsupportedAlgorithm { algorithm }
    }

    /// Create an `UnsupportedVariant` error.
    #[must_use]
    pub const fn unsupported_variant(algorithm: Algorithm, expected: AlgorithmFamily) -> Self {
        Self::UnsupportedVariant {
            algorithm,
            expected,
        }
    }

    /// Create a `WrongOperation` error.
    #[must_use]
    pub const fn wrong_operation(operation: &'static str, algorithm: Algorithm) -> Self {
        Self::WrongOperation {
            operation,
            algorithm,
        }
    }

    /// Create an `InvalidKeyLength` error.
    #[must_use]
    pub const fn invalid_key_length(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidKeyLength {
            what,
            expected,
            actual,
        }
    }

    /// Create an `EncryptionFailed` error.
    #[must_use]
    pub fn encryption_failed(context: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            context: context.into(),
        }
    }

    /// Create a `Decryption` error.
    #[must_use]
    pub fn decryption(context: impl Into<String>) -> Self {
        Self::Decryption {
            context: context.into(),
        }
    }
}

// ============================================================================
// StoreError
// ============================================================================

/// Errors that can occur in the persistent key store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage directories or the master key could not be set up.
    ///
    /// Fatal: the process must not continue without a usable store.
    #[error("storage initialization failed: {context}")]
    Init {
        /// What could not be initialized.
        context: String,
        /// Underlying I/O failure, when there is one.
        #[source]
        source: Option<std::io::Error>,
    },

    /// An I/O error occurred while reading or writing a record.
    #[error("I/O error: {0}")]
    IoError(#[source] std::io::Error),

    /// A stored record failed to parse or unwrap.
    #[error("corrupt record for {entity_id}: {context}")]
    RecordCorrupt {
        /// The entity whose record is corrupt.
        entity_id: String,
        /// What was wrong with it.
        context: String,
    },

    /// The entity id cannot be used as a record name.
    #[error("invalid entity id: {entity_id:?}")]
    InvalidEntityId {
        /// The rejected id.
        entity_id: String,
    },

    /// Wrapping a private key under the master key failed.
    #[error("failed to wrap private key: {0}")]
    Wrap(#[source] CryptoError),

    /// Insufficient file system permissions.
    #[error("permission denied")]
    PermissionDenied,
}

impl StoreError {
    /// Create an `Init` error without an I/O cause.
    #[must_use]
    pub fn init(context: impl Into<String>) -> Self {
        Self::Init {
            context: context.into(),
            source: None,
        }
    }

    /// Create an `Init` error caused by an I/O failure.
    #[must_use]
    pub fn init_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Init {
            context: context.into(),
            source: Some(source),
        }
    }

    /// Create a `RecordCorrupt` error.
    #[must_use]
    pub fn record_corrupt(entity_id: impl Into<String>, context: impl Into<String>) -> Self {
        Self::RecordCorrupt {
            entity_id: entity_id.into(),
            context: context.into(),
        }
    }

    /// Create an `InvalidEntityId` error.
    #[must_use]
    pub fn invalid_entity_id(entity_id: impl Into<String>) -> Self {
        Self::InvalidEntityId {
            entity_id: entity_id.into(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::IoError(error),
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {context}")]
    ParseFailed {
        /// Context about the parsing failure.
        context: String,
    },

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field name with the invalid value.
        field: String,
        /// The invalid value.
        value: String,
    },

    /// A required configuration field is missing.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// Reading or writing the configuration file failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// `~` could not be expanded.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    /// Create a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a `ParseFailed` error.
    #[must_use]
    pub fn parse_failed(context: impl Into<String>) -> Self {
        Self::ParseFailed {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an `Io` error.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a `NoHomeDirectory` error.
    #[must_use]
    pub const fn no_home_directory() -> Self {
        Self::NoHomeDirectory
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias using [`KsmError`] as the error type.
pub type Result<T> = std::result::Result<T, KsmError>;

/// A `Result` type alias for algorithm and primitive operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// A `Result` type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A `Result` type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
