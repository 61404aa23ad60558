//! # Collaborator API Types
//!
//! Request parameters, results and the response envelope for
//! [`KsmApi`](super::KsmApi).
//!
//! Every response is a flat JSON object with a `success` flag:
//!
//! ```json
//! { "success": true, "entityId": "vcb", "publicKey": "...", "algorithm": "DILITHIUM3" }
//! { "success": false, "error": "no key pair found for entity: vcb",
//!   "code": "ENTITY_KEY_NOT_FOUND", "timestamp": 1700000000000 }
//! ```
//!
//! Binary values travel as standard base64. Field names are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ksm_core::error::{ErrorCode, KsmError};
use ksm_core::Algorithm;

use crate::transaction::SignedTransaction;

// ============================================================================
// Method
// ============================================================================

/// Methods supported by the collaborator API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Service status and algorithm catalog
    Health,
    /// Generate (or return) an entity's key pair
    GenerateKey,
    /// Sign a message with an entity's key
    Sign,
    /// Verify a message signature against an entity's key
    Verify,
    /// Encrypt data to an entity
    Encrypt,
    /// Decrypt data encrypted to an entity
    Decrypt,
    /// Build and sign a transaction
    CreateSignedTransaction,
    /// Re-verify a signed transaction
    VerifySignedTransaction,
    /// Fetch an entity's public key
    GetPublicKey,
    /// List entities with stored keys
    ListEntities,
    /// Delete an entity's key pair
    DeleteKey,
    /// Storage usage summary
    StorageStats,
}

impl Method {
    /// Every method, in documentation order.
    pub const ALL: [Self; 12] = [
        Self::Health,
        Self::GenerateKey,
        Self::Sign,
        Self::Verify,
        Self::Encrypt,
        Self::Decrypt,
        Self::CreateSignedTransaction,
        Self::VerifySignedTransaction,
        Self::GetPublicKey,
        Self::ListEntities,
        Self::DeleteKey,
        Self::StorageStats,
    ];

    /// Returns the canonical method name string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::GenerateKey => "generateKey",
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::CreateSignedTransaction => "createSignedTransaction",
            Self::VerifySignedTransaction => "verifySignedTransaction",
            Self::GetPublicKey => "getPublicKey",
            Self::ListEntities => "listEntities",
            Self::DeleteKey => "deleteKey",
            Self::StorageStats => "storageStats",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown method: {method}")]
pub struct ParseMethodError {
    /// The unknown method name that failed to parse.
    pub method: String,
}

impl std::str::FromStr for Method {
    type Err = ParseMethodError;

    /// Parses a method name.
    ///
    /// Accepts the camelCase name and its `snake_case` spelling.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ksm::api::Method;
    ///
    /// assert_eq!("generateKey".parse(), Ok(Method::GenerateKey));
    /// assert_eq!("generate_key".parse(), Ok(Method::GenerateKey));
    /// assert!("rotateKey".parse::<Method>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s || snake_case(m.as_str()) == s)
            .ok_or_else(|| ParseMethodError {
                method: s.to_string(),
            })
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Response envelope
// ============================================================================

/// Response to any API call.
///
/// On success the result's fields sit beside `success`. On failure the
/// object carries `error`, `code` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded.
    pub success: bool,

    /// Result or failure fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ApiResponse {
    /// Creates a successful response from a serializable result.
    ///
    /// Object results are flattened into the envelope; anything else is
    /// placed under `result`.
    pub fn success(result: impl Serialize) -> Self {
        let fields = match serde_json::to_value(result).unwrap_or(Value::Null) {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self {
            success: true,
            fields,
        }
    }

    /// Creates a failure response for `error`.
    #[must_use]
    pub fn failure(error: &KsmError, timestamp: i64) -> Self {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Value::String(error.to_string()));
        fields.insert(
            "code".to_string(),
            Value::String(ErrorCode::from(error).as_str().to_string()),
        );
        fields.insert("timestamp".to_string(), Value::from(timestamp));
        Self {
            success: false,
            fields,
        }
    }

    /// A field of the response.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The failure message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.get("error").and_then(Value::as_str)
    }

    /// The failure code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code").and_then(Value::as_str)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Parameters naming a single entity (`generateKey`, `getPublicKey`,
/// `deleteKey`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityParams {
    /// Target entity.
    pub entity_id: String,
}

/// Parameters for the `sign` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignParams {
    /// Signing entity.
    pub entity_id: String,
    /// UTF-8 message to sign.
    pub message: String,
}

/// Parameters for the `verify` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyParams {
    /// Entity whose key should have produced the signature.
    pub entity_id: String,
    /// UTF-8 message that was signed.
    pub message: String,
    /// Base64 signature.
    pub signature: String,
    /// Signature variant; defaults to the service's signature variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

/// Parameters for the `encrypt` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptParams {
    /// Recipient entity.
    pub entity_id: String,
    /// UTF-8 plaintext.
    pub data: String,
}

/// Parameters for the `decrypt` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptParams {
    /// Recipient entity.
    pub entity_id: String,
    /// Base64 `iv || ciphertext`.
    pub encrypted_data: String,
}

/// Parameters for the `createSignedTransaction` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionParams {
    /// Sending entity.
    pub from: String,
    /// Receiving entity.
    pub to: String,
    /// Transfer amount.
    pub amount: f64,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Parameters for the `verifySignedTransaction` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyTransactionParams {
    /// The transaction as returned by `createSignedTransaction`.
    pub transaction: SignedTransaction,
}

// ============================================================================
// Results
// ============================================================================

/// Result of the `health` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResult {
    /// Always `"UP"`.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// Variant used for entity keys and signatures.
    pub signature_algorithm: Algorithm,
    /// Variant used for sensitive-data encryption.
    pub encryption_algorithm: Algorithm,
    /// Every implemented variant.
    pub supported_algorithms: Vec<Algorithm>,
}

/// An entity's public key (`generateKey`, `getPublicKey`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    /// Owning entity.
    pub entity_id: String,
    /// Base64 public key.
    pub public_key: String,
    /// Key variant.
    pub algorithm: Algorithm,
    /// Public key length in bytes.
    pub public_key_size: usize,
    /// Hex SHA-256 of the public key.
    pub fingerprint: String,
}

/// Result of the `sign` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    /// Signing entity.
    pub entity_id: String,
    /// Base64 signature.
    pub signature: String,
    /// Signature variant.
    pub algorithm: Algorithm,
    /// Signature length in bytes.
    pub signature_size: usize,
}

/// Result of the `verify` and `verifySignedTransaction` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    /// Whether the signature is valid.
    pub valid: bool,
}

/// Result of the `encrypt` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptResult {
    /// Recipient entity.
    pub entity_id: String,
    /// Base64 `iv || ciphertext`.
    pub encrypted_data: String,
    /// Encryption variant.
    pub algorithm: Algorithm,
}

/// Result of the `decrypt` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResult {
    /// Recipient entity.
    pub entity_id: String,
    /// Recovered UTF-8 plaintext.
    pub data: String,
}

/// Result of the `createSignedTransaction` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// The signed transaction.
    pub transaction: SignedTransaction,
}

/// Result of the `listEntities` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntitiesResult {
    /// Entity ids, sorted.
    pub entities: Vec<String>,
    /// Number of entities.
    pub count: usize,
}

/// Result of the `deleteKey` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteKeyResult {
    /// Target entity.
    pub entity_id: String,
    /// Whether a record existed and was removed.
    pub deleted: bool,
}
