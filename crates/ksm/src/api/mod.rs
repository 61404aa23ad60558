//! # Collaborator API
//!
//! Structured request/response surface for an outer transport layer.
//!
//! ## Submodules
//!
//! - [`protocol`] - Method names, parameters, results and the response envelope
//! - [`handler`] - [`KsmApi`], which dispatches methods to the orchestrator
//!
//! ## Methods
//!
//! | Method | Parameters | Result fields |
//! |--------|------------|---------------|
//! | `health` | none | `status`, `service`, `version`, `signatureAlgorithm`, `encryptionAlgorithm`, `supportedAlgorithms` |
//! | `generateKey` | `entityId` | `entityId`, `publicKey`, `algorithm`, `publicKeySize`, `fingerprint` |
//! | `getPublicKey` | `entityId` | same as `generateKey` |
//! | `sign` | `entityId`, `message` | `entityId`, `signature`, `algorithm`, `signatureSize` |
//! | `verify` | `entityId`, `message`, `signature`, `algorithm`? | `valid` |
//! | `encrypt` | `entityId`, `data` | `entityId`, `encryptedData`, `algorithm` |
//! | `decrypt` | `entityId`, `encryptedData` | `entityId`, `data` |
//! | `createSignedTransaction` | `from`, `to`, `amount`, `description` | `transaction` |
//! | `verifySignedTransaction` | `transaction` | `valid` |
//! | `listEntities` | none | `entities`, `count` |
//! | `deleteKey` | `entityId` | `entityId`, `deleted` |
//! | `storageStats` | none | `storageRoot`, `recordCount`, `masterKeyPresent`, `totalBytes`, `cachedKeys` |

pub mod handler;
pub mod protocol;

pub use handler::{KsmApi, SERVICE_NAME};
pub use protocol::{ApiResponse, Method, ParseMethodError};
