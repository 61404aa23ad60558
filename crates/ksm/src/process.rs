//! # Process Orchestrator
//!
//! [`ProcessService`] binds entity identifiers to key pairs and exposes
//! entity-scoped signing, verification, encryption and signed transactions.
//!
//! ## Cache discipline
//!
//! The orchestrator owns an in-memory cache of `entity id → Arc<KeyPair>`
//! in front of its [`KeyStore`]. The store is the source of truth.
//!
//! - Cache hits take only the cache read lock.
//! - Misses, generate and delete hold a single write mutex across the store
//!   access and the cache update. Two concurrent first-time `generate` calls
//!   for the same entity return the same key pair and persist exactly one
//!   record, and a read-through can never re-cache a key pair that a
//!   concurrent `delete` has removed from the store.
//!
//! ## Example
//!
//! ```no_run
//! use ksm::process::ProcessService;
//! use ksm_core::config::AlgorithmsConfig;
//! use ksm_crypto::FileKeyStore;
//!
//! let store = FileKeyStore::initialize("./ksm-data")?;
//! let service = ProcessService::new(store, AlgorithmsConfig::default())?;
//!
//! service.generate_key_pair_for_entity("vietcombank")?;
//! let sig = service.sign_transaction("vietcombank", b"payload")?;
//! assert!(service.verify_transaction("vietcombank", b"payload", &sig)?);
//! # Ok::<(), ksm_core::KsmError>(())
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use ksm_core::config::AlgorithmsConfig;
use ksm_core::error::{ConfigError, KsmError, Result};
use ksm_core::{Algorithm, AlgorithmFamily, Clock, SystemClock};
use ksm_crypto::factory::{encryption_service, signature_service};
use ksm_crypto::{CryptoService, KeyPair, KeyStore, Signature, StorageStats};

use crate::logging::log_security_event;
use crate::transaction::{canonical_transaction, SignedTransaction};

/// Store statistics plus the number of cached key pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Storage root.
    pub storage_root: PathBuf,
    /// Number of stored entity records.
    pub record_count: usize,
    /// Whether the master key is on disk.
    pub master_key_present: bool,
    /// Bytes used by the master key and all records.
    pub total_bytes: u64,
    /// Key pairs currently held in memory.
    pub cached_keys: usize,
}

impl ServiceStats {
    fn new(stats: StorageStats, cached_keys: usize) -> Self {
        Self {
            storage_root: stats.root,
            record_count: stats.record_count,
            master_key_present: stats.master_key_present,
            total_bytes: stats.total_bytes,
            cached_keys,
        }
    }
}

/// Entity-scoped key lifecycle and cryptographic operations.
pub struct ProcessService<S: KeyStore> {
    store: S,
    cache: RwLock<HashMap<String, Arc<KeyPair>>>,
    write_lock: Mutex<()>,
    algorithms: AlgorithmsConfig,
    clock: Arc<dyn Clock>,
}

impl<S: KeyStore> std::fmt::Debug for ProcessService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessService")
            .field("algorithms", &self.algorithms)
            .field("cached_keys", &self.cached_count())
            .finish_non_exhaustive()
    }
}

impl<S: KeyStore> ProcessService<S> {
    /// Creates an orchestrator over `store` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::Config`] if `algorithms.signature` is not a
    /// signature variant or `algorithms.encryption` is not an encapsulation
    /// variant.
    pub fn new(store: S, algorithms: AlgorithmsConfig) -> Result<Self> {
        Self::with_clock(store, algorithms, Arc::new(SystemClock))
    }

    /// Creates an orchestrator with an explicit clock.
    ///
    /// The cache is warmed from the store. Unreadable records are skipped by
    /// the store, and a failure to list records leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessService::new`].
    pub fn with_clock(
        store: S,
        algorithms: AlgorithmsConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        check_family(
            "algorithms.signature",
            algorithms.signature,
            AlgorithmFamily::Signature,
        )?;
        check_family(
            "algorithms.encryption",
            algorithms.encryption,
            AlgorithmFamily::Encapsulation,
        )?;

        let cache = match store.load_all() {
            Ok(loaded) => loaded
                .into_iter()
                .map(|(id, key_pair)| (id, Arc::new(key_pair)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to warm key cache, starting empty");
                HashMap::new()
            }
        };

        info!(
            cached_keys = cache.len(),
            signature = %algorithms.signature,
            encryption = %algorithms.encryption,
            "process service ready"
        );

        Ok(Self {
            store,
            cache: RwLock::new(cache),
            write_lock: Mutex::new(()),
            algorithms,
            clock,
        })
    }

    /// The configured default variants.
    #[must_use]
    pub const fn algorithms(&self) -> AlgorithmsConfig {
        self.algorithms
    }

    /// The underlying key store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the service, returning the key store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    fn cached(&self, entity_id: &str) -> Option<Arc<KeyPair>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }

    fn cache_insert(&self, entity_id: &str, key_pair: Arc<KeyPair>) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id.to_string(), key_pair);
    }

    fn cached_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // ------------------------------------------------------------------------
    // Key lifecycle
    // ------------------------------------------------------------------------

    /// Returns the entity's key pair, generating and persisting one if none
    /// exists.
    ///
    /// Calling this twice returns the same key pair and leaves one record.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record cannot be read or written, or
    /// [`KsmError::Store`] with `InvalidEntityId` for unusable identifiers.
    pub fn generate_key_pair_for_entity(&self, entity_id: &str) -> Result<Arc<KeyPair>> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.cached(entity_id) {
            debug!(entity_id = %entity_id, "key pair already cached");
            return Ok(existing);
        }

        if let Some(stored) = self.store.load(entity_id)? {
            debug!(entity_id = %entity_id, "key pair loaded from store");
            let stored = Arc::new(stored);
            self.cache_insert(entity_id, Arc::clone(&stored));
            return Ok(stored);
        }

        let algorithm = self.algorithms.signature;
        let key_pair = signature_service(algorithm)?.generate_key_pair(algorithm)?;
        self.store.save(entity_id, &key_pair)?;

        let key_pair = Arc::new(key_pair);
        self.cache_insert(entity_id, Arc::clone(&key_pair));

        log_security_event(
            "key_pair_generated",
            entity_id,
            &format!("algorithm={} fingerprint={}", algorithm.id(), key_pair.fingerprint()),
        );
        Ok(key_pair)
    }

    /// Looks up the entity's key pair in the cache, then the store.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record exists but cannot be read.
    pub fn get_key_pair(&self, entity_id: &str) -> Result<Option<Arc<KeyPair>>> {
        if let Some(hit) = self.cached(entity_id) {
            return Ok(Some(hit));
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Filled by a generate or another miss while we waited.
        if let Some(hit) = self.cached(entity_id) {
            return Ok(Some(hit));
        }

        match self.store.load(entity_id)? {
            Some(key_pair) => {
                let key_pair = Arc::new(key_pair);
                self.cache_insert(entity_id, Arc::clone(&key_pair));
                Ok(Some(key_pair))
            }
            None => Ok(None),
        }
    }

    /// Like [`get_key_pair`](Self::get_key_pair) but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when no key pair exists.
    pub fn require_key_pair(&self, entity_id: &str) -> Result<Arc<KeyPair>> {
        self.get_key_pair(entity_id)?
            .ok_or_else(|| KsmError::entity_key_not_found(entity_id))
    }

    /// Removes the entity's key pair from the cache and the store.
    ///
    /// Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record cannot be removed.
    pub fn delete_key_pair(&self, entity_id: &str) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let was_cached = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity_id)
            .is_some();
        let was_stored = self.store.delete(entity_id)?;

        if was_stored {
            log_security_event("key_pair_deleted", entity_id, "record removed");
        } else if was_cached {
            warn!(entity_id = %entity_id, "cached key pair had no backing record");
        }
        Ok(was_stored)
    }

    /// The entity's public key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when no key pair exists.
    pub fn public_key(&self, entity_id: &str) -> Result<Vec<u8>> {
        Ok(self.require_key_pair(entity_id)?.public_key().to_vec())
    }

    /// Every entity with a stored record, sorted.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record directory cannot be listed.
    pub fn list_entities(&self) -> Result<Vec<String>> {
        Ok(self.store.list()?)
    }

    /// Store statistics plus the cache size.
    ///
    /// # Errors
    ///
    /// Returns a store error if the storage root cannot be inspected.
    pub fn storage_stats(&self) -> Result<ServiceStats> {
        let stats = self.store.stats()?;
        Ok(ServiceStats::new(stats, self.cached_count()))
    }

    // ------------------------------------------------------------------------
    // Entity-scoped crypto
    // ------------------------------------------------------------------------

    /// Signs `message` with the entity's key.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key, or
    /// a crypto error if the stored key does not fit the signature variant.
    pub fn sign_transaction(&self, entity_id: &str, message: &[u8]) -> Result<Signature> {
        let key_pair = self.require_key_pair(entity_id)?;
        let signature = self.sign_with(&key_pair, message)?;
        debug!(entity_id = %entity_id, algorithm = %signature.algorithm(), "message signed");
        Ok(signature)
    }

    fn sign_with(&self, key_pair: &KeyPair, message: &[u8]) -> Result<Signature> {
        let algorithm = self.algorithms.signature;
        Ok(signature_service(algorithm)?.sign(message, key_pair.private_key(), algorithm)?)
    }

    /// Checks `signature` over `message` against the entity's key.
    ///
    /// Signatures produced under a different variant verify as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn verify_transaction(
        &self,
        entity_id: &str,
        message: &[u8],
        signature: &Signature,
    ) -> Result<bool> {
        let key_pair = self.require_key_pair(entity_id)?;
        let algorithm = self.algorithms.signature;
        if signature.algorithm() != algorithm {
            debug!(
                entity_id = %entity_id,
                expected = %algorithm,
                actual = %signature.algorithm(),
                "signature variant mismatch"
            );
            return Ok(false);
        }

        let valid = signature_service(algorithm)?.verify(
            message,
            signature.as_bytes(),
            key_pair.public_key(),
            algorithm,
        )?;
        Ok(valid)
    }

    /// Encrypts `plaintext` to the entity's public key.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key.
    pub fn encrypt_sensitive_data(&self, entity_id: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key_pair = self.require_key_pair(entity_id)?;
        let algorithm = self.algorithms.encryption;
        Ok(encryption_service(algorithm)?.encrypt(plaintext, key_pair.public_key(), algorithm)?)
    }

    /// Decrypts data previously encrypted to the entity.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the entity has no key, or
    /// a `Decryption` crypto error for malformed or foreign ciphertext.
    pub fn decrypt_sensitive_data(&self, entity_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key_pair = self.require_key_pair(entity_id)?;
        let algorithm = self.algorithms.encryption;
        Ok(encryption_service(algorithm)?.decrypt(ciphertext, key_pair.private_key(), algorithm)?)
    }

    // ------------------------------------------------------------------------
    // Signed transactions
    // ------------------------------------------------------------------------

    /// Builds and signs a transaction from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when `from` has no key, or
    /// [`KsmError::InvalidRequest`] for a non-finite amount.
    pub fn create_signed_transaction(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        description: &str,
    ) -> Result<SignedTransaction> {
        if !amount.is_finite() {
            return Err(KsmError::invalid_request(format!(
                "amount must be finite, got {amount}"
            )));
        }

        let key_pair = self.require_key_pair(from)?;
        let timestamp = self.clock.now_millis();
        let canonical = canonical_transaction(from, to, amount, description, timestamp);
        let signature = self.sign_with(&key_pair, canonical.as_bytes())?;

        info!(from = %from, to = %to, timestamp, "signed transaction created");

        Ok(SignedTransaction {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            description: description.to_string(),
            timestamp,
            canonical,
            algorithm: signature.algorithm(),
            signature: signature.into_bytes(),
            signer_fingerprint: key_pair.fingerprint(),
        })
    }

    /// Re-verifies a signed transaction against the sender's current key.
    ///
    /// Returns `false` if the sender's key changed since signing, if the
    /// canonical string no longer matches the fields, or if the signature
    /// does not verify.
    ///
    /// # Errors
    ///
    /// Returns [`KsmError::EntityKeyNotFound`] when the sender has no key.
    pub fn verify_signed_transaction(&self, transaction: &SignedTransaction) -> Result<bool> {
        let key_pair = self.require_key_pair(&transaction.from)?;

        if key_pair.fingerprint() != transaction.signer_fingerprint {
            debug!(from = %transaction.from, "signer key changed since signing");
            return Ok(false);
        }
        if !transaction.is_consistent() {
            debug!(from = %transaction.from, "transaction fields do not match signed data");
            return Ok(false);
        }

        let signature = Signature::new(transaction.signature.clone(), transaction.algorithm);
        self.verify_transaction(
            &transaction.from,
            transaction.canonical.as_bytes(),
            &signature,
        )
    }
}

fn check_family(field: &str, algorithm: Algorithm, expected: AlgorithmFamily) -> Result<()> {
    if algorithm.family() == expected {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(field, algorithm.id()).into())
    }
}
