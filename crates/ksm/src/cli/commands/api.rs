//! # API Commands
//!
//! Every service subcommand becomes one collaborator API call. The command
//! opens the key store, dispatches the call through [`KsmApi`] and prints
//! the [`ApiResponse`] as pretty JSON on stdout.
//!
//! ## Usage
//!
//! ```no_run
//! use ksm::cli::commands::ApiCommand;
//! use ksm::cli::Commands;
//! use ksm_core::config::KsmConfig;
//!
//! let command = Commands::Generate { entity_id: "vietcombank".into() };
//! let cmd = ApiCommand::from_command(&command, None)
//!     .expect("readable input")
//!     .expect("service command");
//! let exit_code = cmd.run(&KsmConfig::default()).expect("storage available");
//! std::process::exit(exit_code);
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use ksm_core::config::KsmConfig;
use ksm_core::config_loader::resolve_storage_root;
use ksm_crypto::FileKeyStore;

use super::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};
use super::CommandError;
use crate::api::{ApiResponse, KsmApi, Method};
use crate::cli::args::Commands;
use crate::process::ProcessService;

/// A single API call built from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCommand {
    /// Method to call.
    pub method: Method,
    /// JSON parameters.
    pub params: Value,
    /// Storage root override from `--storage-dir`.
    pub storage_dir: Option<PathBuf>,
}

impl ApiCommand {
    /// Creates a command for `method` with `params`.
    #[must_use]
    pub const fn new(method: Method, params: Value, storage_dir: Option<PathBuf>) -> Self {
        Self {
            method,
            params,
            storage_dir,
        }
    }

    /// Maps a subcommand onto its API call.
    ///
    /// Returns `Ok(None)` for subcommands that are not API calls (`config`).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if `verify-transfer` input cannot be read or
    /// is not JSON.
    pub fn from_command(
        command: &Commands,
        storage_dir: Option<PathBuf>,
    ) -> Result<Option<Self>, CommandError> {
        let (method, params) = match command {
            Commands::Generate { entity_id } => {
                (Method::GenerateKey, json!({ "entityId": entity_id }))
            }
            Commands::PublicKey { entity_id } => {
                (Method::GetPublicKey, json!({ "entityId": entity_id }))
            }
            Commands::Sign { entity_id, message } => (
                Method::Sign,
                json!({ "entityId": entity_id, "message": message }),
            ),
            Commands::Verify {
                entity_id,
                message,
                signature,
                algorithm,
            } => {
                let mut params = json!({
                    "entityId": entity_id,
                    "message": message,
                    "signature": signature,
                });
                if let (Some(algorithm), Value::Object(map)) = (algorithm, &mut params) {
                    map.insert("algorithm".to_string(), Value::String(algorithm.clone()));
                }
                (Method::Verify, params)
            }
            Commands::Encrypt { entity_id, data } => (
                Method::Encrypt,
                json!({ "entityId": entity_id, "data": data }),
            ),
            Commands::Decrypt {
                entity_id,
                encrypted_data,
            } => (
                Method::Decrypt,
                json!({ "entityId": entity_id, "encryptedData": encrypted_data }),
            ),
            Commands::Transfer {
                from,
                to,
                amount,
                description,
            } => (
                Method::CreateSignedTransaction,
                json!({ "from": from, "to": to, "amount": amount, "description": description }),
            ),
            Commands::VerifyTransfer { file } => (
                Method::VerifySignedTransaction,
                json!({ "transaction": read_transaction(file)? }),
            ),
            Commands::List => (Method::ListEntities, Value::Null),
            Commands::Delete { entity_id } => {
                (Method::DeleteKey, json!({ "entityId": entity_id }))
            }
            Commands::Stats => (Method::StorageStats, Value::Null),
            Commands::Health => (Method::Health, Value::Null),
            Commands::Config { .. } => return Ok(None),
        };

        Ok(Some(Self::new(method, params, storage_dir)))
    }

    /// Opens the store and performs the call.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::StorageInit`] if the key store cannot be
    /// initialized, [`CommandError::Config`] if the storage root cannot be
    /// resolved, or [`CommandError::Service`] if the configured algorithms
    /// are unusable.
    pub fn execute(&self, config: &KsmConfig) -> Result<ApiResponse, CommandError> {
        let root = resolve_storage_root(self.storage_dir.as_deref(), config)?;
        debug!(root = %root.display(), method = %self.method, "opening key store");

        let store = FileKeyStore::initialize(&root)?;
        let service = ProcessService::new(store, config.algorithms)?;
        let api = KsmApi::new(Arc::new(service));

        Ok(api.handle(self.method.as_str(), &self.params))
    }

    /// Performs the call and prints the response.
    ///
    /// Returns the process exit code: [`EXIT_SUCCESS`] or [`EXIT_FAILURE`].
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn run(&self, config: &KsmConfig) -> Result<i32, CommandError> {
        let response = self.execute(config)?;
        println!("{}", serde_json::to_string_pretty(&response)?);

        Ok(if response.success {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        })
    }
}

/// Reads a transaction from `path` (or stdin for `-`).
///
/// Accepts either the bare transaction object or a full `transfer` response
/// that wraps it under `transaction`.
fn read_transaction(path: &Path) -> Result<Value, CommandError> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CommandError::io("stdin", e))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CommandError::io(path.display().to_string(), e))?
    };

    let mut value: Value = serde_json::from_str(&content)?;
    if let Value::Object(ref mut map) = value {
        if let Some(inner) = map.remove("transaction") {
            return Ok(inner);
        }
    }
    Ok(value)
}
