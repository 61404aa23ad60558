//! Request dispatch for the collaborator API.
//!
//! [`KsmApi::handle`] is the single boundary where failures become
//! structured [`ApiResponse`]s. Typed methods return `Result` for callers
//! that want the domain values.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use ksm_core::error::{CryptoError, ErrorCode, KsmError, Result};
use ksm_core::{Algorithm, Clock, SystemClock};
use ksm_crypto::{KeyPair, KeyStore, Signature};

use super::protocol::{
    ApiResponse, CreateTransactionParams, DecryptParams, DecryptResult, DeleteKeyResult,
    EncryptParams, EncryptResult, EntityParams, HealthResult, KeyInfo, ListEntitiesResult, Method,
    SignParams, SignResult, TransactionResult, VerifyParams, VerifyResult,
    VerifyTransactionParams,
};
use crate::process::{ProcessService, ServiceStats};

/// Service name reported by `health`.
pub const SERVICE_NAME: &str = "ksm";

/// Collaborator-facing API over a [`ProcessService`].
pub struct KsmApi<S: KeyStore> {
    service: Arc<ProcessService<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyStore> std::fmt::Debug for KsmApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KsmApi")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl<S: KeyStore> KsmApi<S> {
    /// Wraps `service`, timestamping failures with the system clock.
    #[must_use]
    pub fn new(service: Arc<ProcessService<S>>) -> Self {
        Self::with_clock(service, Arc::new(SystemClock))
    }

    /// Wraps `service` with an explicit clock for failure timestamps.
    #[must_use]
    pub fn with_clock(service: Arc<ProcessService<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { service, clock }
    }

    /// The wrapped orchestrator.
    #[must_use]
    pub fn service(&self) -> &ProcessService<S> {
        &self.service
    }

    /// Dispatches `method` with JSON `params`.
    ///
    /// Never panics and never returns an error: failures become
    /// `success = false` responses.
    pub fn handle(&self, method: &str, params: &Value) -> ApiResponse {
        let outcome = method
            .parse::<Method>()
            .map_err(|e| KsmError::invalid_request(e.to_string()))
            .and_then(|method| self.dispatch(method, params));

        match outcome {
            Ok(response) => {
                debug!(method = %method, "api call succeeded");
                response
            }
            Err(e) => {
                let code = ErrorCode::from(&e);
                warn!(method = %method, code = %code, error = %e, "api call failed");
                ApiResponse::failure(&e, self.clock.now_millis())
            }
        }
    }

    fn dispatch(&self, method: Method, params: &Value) -> Result<ApiResponse> {
        let response = match method {
            Method::Health => ApiResponse::success(self.health()),
            Method::GenerateKey => ApiResponse::success(self.generate_key(&parse_params(params)?)?),
            Method::Sign => ApiResponse::success(self.sign(&parse_params(params)?)?),
            Method::Verify => ApiResponse::success(self.verify(&parse_params(params)?)?),
            Method::Encrypt => ApiResponse::success(self.encrypt(&parse_params(params)?)?),
            Method::Decrypt => ApiResponse::success(self.decrypt(&parse_params(params)?)?),
            Method::CreateSignedTransaction => {
                ApiResponse::success(self.create_signed_transaction(&parse_params(params)?)?)
            }
            Method::VerifySignedTransaction => {
                ApiResponse::success(self.verify_signed_transaction(&parse_params(params)?)?)
            }
            Method::GetPublicKey => ApiResponse::success(self.get_public_key(&parse_params(params)?)?),
            Method::ListEntities => ApiResponse::success(self.list_entities()?),
            Method::DeleteKey => ApiResponse::success(self.delete_key(&parse_params(params)?)?),
            Method::StorageStats => ApiResponse::success(self.storage_stats()?),
        };
        Ok(response)
    }

    // ------------------------------------------------------------------------
    // Typed methods
    // ------------------------------------------------------------------------

    /// Service status and algorithm catalog.
    #[must_use]
    pub fn health(&self) -> HealthResult {
        let algorithms = self.service.algorithms();
        HealthResult {
            status: "UP".to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            signature_algorithm: algorithms.signature,
            encryption_algorithm: algorithms.encryption,
            supported_algorithms: Algorithm::implemented().collect(),
        }
    }

    /// Generates (or returns) the entity's key pair.
    ///
    /// # Errors
    ///
    /// Propagates orchestrator failures.
    pub fn generate_key(&self, params: &EntityParams) -> Result<KeyInfo> {
        let key_pair = self.service.generate_key_pair_for_entity(&params.entity_id)?;
        Ok(key_info(&params.entity_id, &key_pair))
    }

    /// The entity's public key.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn get_public_key(&self, params: &EntityParams) -> Result<KeyInfo> {
        let key_pair = self.service.require_key_pair(&params.entity_id)?;
        Ok(key_info(&params.entity_id, &key_pair))
    }

    /// Signs a UTF-8 message.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn sign(&self, params: &SignParams) -> Result<SignResult> {
        let signature = self
            .service
            .sign_transaction(&params.entity_id, params.message.as_bytes())?;
        Ok(SignResult {
            entity_id: params.entity_id.clone(),
            signature_size: signature.len(),
            algorithm: signature.algorithm(),
            signature: STANDARD.encode(signature.as_bytes()),
        })
    }

    /// Verifies a base64 signature over a UTF-8 message.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::InvalidRequest`] for bad base64,
    /// [`CryptoError::InvalidAlgorithm`] for an unknown `algorithm`, or
    /// [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn verify(&self, params: &VerifyParams) -> Result<VerifyResult> {
        let bytes = decode_base64("signature", &params.signature)?;
        let algorithm = match params.algorithm.as_deref() {
            Some(name) => name.parse::<Algorithm>()?,
            None => self.service.algorithms().signature,
        };

        let valid = self.service.verify_transaction(
            &params.entity_id,
            params.message.as_bytes(),
            &Signature::new(bytes, algorithm),
        )?;
        Ok(VerifyResult { valid })
    }

    /// Encrypts UTF-8 data to the entity.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn encrypt(&self, params: &EncryptParams) -> Result<EncryptResult> {
        let ciphertext = self
            .service
            .encrypt_sensitive_data(&params.entity_id, params.data.as_bytes())?;
        Ok(EncryptResult {
            entity_id: params.entity_id.clone(),
            encrypted_data: STANDARD.encode(ciphertext),
            algorithm: self.service.algorithms().encryption,
        })
    }

    /// Decrypts base64 data encrypted to the entity.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::InvalidRequest`] for bad base64, or a
    /// `Decryption` crypto error if the ciphertext is malformed or the
    /// plaintext is not UTF-8.
    pub fn decrypt(&self, params: &DecryptParams) -> Result<DecryptResult> {
        let ciphertext = decode_base64("encryptedData", &params.encrypted_data)?;
        let plaintext = self
            .service
            .decrypt_sensitive_data(&params.entity_id, &ciphertext)?;
        let data = String::from_utf8(plaintext)
            .map_err(|_| CryptoError::decryption("plaintext is not valid UTF-8"))?;
        Ok(DecryptResult {
            entity_id: params.entity_id.clone(),
            data,
        })
    }

    /// Builds and signs a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the sender has no key.
    pub fn create_signed_transaction(
        &self,
        params: &CreateTransactionParams,
    ) -> Result<TransactionResult> {
        let transaction = self.service.create_signed_transaction(
            &params.from,
            &params.to,
            params.amount,
            &params.description,
        )?;
        Ok(TransactionResult { transaction })
    }

    /// Re-verifies a signed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the sender has no key.
    pub fn verify_signed_transaction(
        &self,
        params: &VerifyTransactionParams,
    ) -> Result<VerifyResult> {
        let valid = self.service.verify_signed_transaction(&params.transaction)?;
        Ok(VerifyResult { valid })
    }

    /// Entities with stored keys.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn list_entities(&self) -> Result<ListEntitiesResult> {
        let entities = self.service.list_entities()?;
        Ok(ListEntitiesResult {
            count: entities.len(),
            entities,
        })
    }

    /// Deletes the entity's key pair.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn delete_key(&self, params: &EntityParams) -> Result<DeleteKeyResult> {
        let deleted = self.service.delete_key_pair(&params.entity_id)?;
        Ok(DeleteKeyResult {
            entity_id: params.entity_id.clone(),
            deleted,
        })
    }

    /// Storage usage summary.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn storage_stats(&self) -> Result<ServiceStats> {
        self.service.storage_stats()
    }
}

fn key_info(entity_id: &str, key_pair: &KeyPair) -> KeyInfo {
    KeyInfo {
        entity_id: entity_id.to_string(),
        public_key: STANDARD.encode(key_pair.public_key()),
        algorithm: key_pair.algorithm(),
        public_key_size: key_pair.public_key().len(),
        fingerprint: key_pair.fingerprint(),
    }
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T> {
    T::deserialize(params).map_err(|e| KsmError::invalid_request(format!("invalid params: {e}")))
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| KsmError::invalid_request(format!("{field} is not valid base64: {e}")))
}
