//! # ksm
//!
//! Entity-scoped key service: per-entity post-quantum key pairs persisted
//! under a master key, with signing, hybrid encryption and signed
//! transactions on top.
//!
//! ## Modules
//!
//! - [`process`] - The orchestrator that binds entities to key pairs
//! - [`transaction`] - Signed transaction records and their canonical form
//! - [`api`] - Structured request/response API for an outer transport
//! - [`cli`] - Command-line interface
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ksm::api::KsmApi;
//! use ksm::process::ProcessService;
//! use ksm_core::config::AlgorithmsConfig;
//! use ksm_crypto::FileKeyStore;
//! use serde_json::json;
//!
//! let store = FileKeyStore::initialize("./ksm-data")?;
//! let api = KsmApi::new(Arc::new(ProcessService::new(store, AlgorithmsConfig::default())?));
//!
//! let response = api.handle("generateKey", &json!({ "entityId": "vietcombank" }));
//! assert!(response.success);
//! # Ok::<(), ksm_core::KsmError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod cli;
pub mod logging;
pub mod process;
pub mod transaction;

pub use api::{ApiResponse, KsmApi, Method};
pub use process::{ProcessService, ServiceStats};
pub use transaction::{canonical_transaction, SignedTransaction};
