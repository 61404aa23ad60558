//! # Command Handlers
//!
//! - [`api`] - Service subcommands, each one collaborator API call
//! - [`config`] - Configuration file management
//! - [`exit_codes`] - Process exit codes

pub mod api;
pub mod config;
pub mod exit_codes;

pub use api::ApiCommand;
pub use config::ConfigCommand;
pub use exit_codes::{EXIT_ERROR, EXIT_FAILURE, EXIT_SUCCESS};

use ksm_core::error::{ConfigError, KsmError, StoreError};

/// Errors that stop a command before it can print a response.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Configuration could not be loaded, written or resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The key store could not be opened.
    #[error("Storage initialization failed: {0}")]
    StorageInit(#[from] StoreError),

    /// The service could not be constructed.
    #[error("Service error: {0}")]
    Service(#[from] KsmError),

    /// Input could not be read.
    #[error("Failed to read {context}: {source}")]
    Io {
        /// What was being read.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Input or output was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `config init` would overwrite an existing file.
    #[error("Configuration file already exists at {path} (use --force to overwrite)")]
    ConfigExists {
        /// Existing file.
        path: String,
    },
}

impl CommandError {
    /// Create an `Io` error.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
