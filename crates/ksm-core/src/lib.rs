//! # ksm-core
//!
//! Core types, configuration and error definitions for the KSM key service.
//!
//! ## Modules
//!
//! - [`algorithm`] - Algorithm catalog (variants, families, byte sizes)
//! - [`error`] - Error types, result aliases and API error codes
//! - [`config`] - Configuration types
//! - [`config_loader`] - Configuration file loading and storage root resolution
//! - [`clock`] - Wall-clock abstraction
//!
//! ## Error Handling
//!
//! ```rust
//! use ksm_core::{Algorithm, CryptoError, ErrorCode, KsmError};
//!
//! let err = "FALCON512".parse::<Algorithm>().unwrap_err();
//! assert!(matches!(err, CryptoError::InvalidAlgorithm { .. }));
//!
//! let err: KsmError = err.into();
//! assert_eq!(ErrorCode::from(&err), ErrorCode::InvalidAlgorithm);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod algorithm;
pub mod clock;
pub mod config;
pub mod config_loader;
pub mod error;

pub use algorithm::{Algorithm, AlgorithmFamily, AlgorithmSpec, KeySizes};

pub use clock::{Clock, FixedClock, SystemClock};

pub use config::{AlgorithmsConfig, ConfigBuilder, KsmConfig, LoggingConfig, StorageConfig};

pub use config_loader::{expand_path, resolve_storage_root, ConfigLoader};

pub use error::{
    ConfigError, ConfigResult, CryptoError, CryptoResult, ErrorCode, KsmError, Result,
    StoreError, StoreResult,
};
