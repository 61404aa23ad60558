//! The process-wide master key.
//!
//! The master key wraps every stored private key. It is generated once on
//! first startup, persisted, and never rotated.
//!
//! # Security
//!
//! - Zeroized on drop
//! - Redacted in debug output
//! - Compared in constant time
//! - Not `Clone`

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use ksm_core::error::{CryptoError, CryptoResult};

/// Length of the master key in bytes (AES-256).
pub const MASTER_KEY_LEN: usize = 32;

/// A 32-byte symmetric key that wraps private keys at rest.
///
/// # Example
///
/// ```
/// use ksm_crypto::keys::MasterKey;
///
/// let key = MasterKey::generate();
/// assert_eq!(key.as_bytes().len(), 32);
/// assert_eq!(format!("{key:?}"), "MasterKey([REDACTED])");
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl MasterKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn new(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generates a fresh key from `OsRng`.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Builds a key from a slice read off disk.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless `bytes` is exactly
    /// [`MASTER_KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; MASTER_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::invalid_key_length("master key", MASTER_KEY_LEN, bytes.len())
        })?;
        Ok(Self { bytes: array })
    }

    /// Raw key bytes for the wrap cipher.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

impl PartialEq for MasterKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for MasterKey {}
