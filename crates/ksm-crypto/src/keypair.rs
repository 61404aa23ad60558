//! Key pair and signature value types.
//!
//! Every private key generated here ends with a 32-byte commitment equal to
//! SHA-256 of its public key. The simulated signature tag and the hybrid
//! symmetric key are both derived from that commitment: signing and
//! decryption read it from the private key, verification and encryption
//! recompute it from the public key.
//!
//! # Example
//!
//! ```rust
//! use ksm_core::Algorithm;
//! use ksm_crypto::keypair::{commitment_of, KeyPair};
//!
//! let kp = KeyPair::generate(Algorithm::Dilithium2);
//! assert_eq!(kp.public_key().len(), 1312);
//! assert_eq!(kp.private_key().len(), 2560);
//! assert_eq!(kp.commitment().unwrap(), commitment_of(kp.public_key()));
//! ```

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use ksm_core::error::{CryptoError, CryptoResult};
use ksm_core::Algorithm;

/// Length of the public-key commitment carried at the end of private keys.
pub const COMMITMENT_LEN: usize = 32;

/// SHA-256 of a public key.
#[must_use]
pub fn commitment_of(public_key: &[u8]) -> [u8; COMMITMENT_LEN] {
    Sha256::digest(public_key).into()
}

/// The commitment embedded in the trailing bytes of a private key.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyLength`] if the key is shorter than
/// [`COMMITMENT_LEN`].
pub fn embedded_commitment(private_key: &[u8]) -> CryptoResult<[u8; COMMITMENT_LEN]> {
    let start = private_key
        .len()
        .checked_sub(COMMITMENT_LEN)
        .ok_or_else(|| {
            CryptoError::invalid_key_length("private key", COMMITMENT_LEN, private_key.len())
        })?;

    let mut out = [0u8; COMMITMENT_LEN];
    if let Some(tail) = private_key.get(start..) {
        out.copy_from_slice(tail);
    }
    Ok(out)
}

/// Hex SHA-256 of a public key, used to pin a signer's key version.
#[must_use]
pub fn fingerprint(public_key: &[u8]) -> String {
    hex::encode(commitment_of(public_key))
}

// ============================================================================
// KeyPair
// ============================================================================

/// An immutable public/private key pair for one algorithm variant.
///
/// Both buffers always match the sizes the variant declares. The private
/// half is zeroized on drop and never printed.
///
/// This type intentionally does not implement `Clone`; share it behind an
/// `Arc`.
pub struct KeyPair {
    public_key: Vec<u8>,
    private_key: Zeroizing<Vec<u8>>,
    algorithm: Algorithm,
}

impl KeyPair {
    /// Builds a key pair, checking both lengths against the variant.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] on any size mismatch.
    pub fn new(
        algorithm: Algorithm,
        public_key: Vec<u8>,
        private_key: impl Into<Zeroizing<Vec<u8>>>,
    ) -> CryptoResult<Self> {
        let private_key = private_key.into();
        let sizes = algorithm.sizes();

        if public_key.len() != sizes.public_key_len {
            return Err(CryptoError::invalid_key_length(
                "public key",
                sizes.public_key_len,
                public_key.len(),
            ));
        }
        if private_key.len() != sizes.private_key_len {
            return Err(CryptoError::invalid_key_length(
                "private key",
                sizes.private_key_len,
                private_key.len(),
            ));
        }

        Ok(Self {
            public_key,
            private_key,
            algorithm,
        })
    }

    /// Generates random key material sized for `algorithm`.
    ///
    /// The private key's last [`COMMITMENT_LEN`] bytes are the public-key
    /// commitment; everything else is drawn from `OsRng`. Family checks are
    /// the caller's job.
    #[must_use]
    pub fn generate(algorithm: Algorithm) -> Self {
        let sizes = algorithm.sizes();

        let mut public_key = vec![0u8; sizes.public_key_len];
        rand::rngs::OsRng.fill_bytes(&mut public_key);

        let mut private_key = Zeroizing::new(vec![0u8; sizes.private_key_len]);
        rand::rngs::OsRng.fill_bytes(&mut private_key);

        let commitment = commitment_of(&public_key);
        let start = sizes.private_key_len.saturating_sub(COMMITMENT_LEN);
        if let Some(tail) = private_key.get_mut(start..) {
            let n = tail.len().min(COMMITMENT_LEN);
            tail[..n].copy_from_slice(&commitment[..n]);
        }

        Self {
            public_key,
            private_key,
            algorithm,
        }
    }

    /// The public half.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The private half.
    ///
    /// The returned slice must not outlive the operation it is passed to.
    #[must_use]
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// The variant this pair was generated for.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The commitment embedded in the private key.
    ///
    /// # Errors
    ///
    /// Only fails for variants whose private key is shorter than
    /// [`COMMITMENT_LEN`], which the catalog never declares.
    pub fn commitment(&self) -> CryptoResult<[u8; COMMITMENT_LEN]> {
        embedded_commitment(&self.private_key)
    }

    /// Hex fingerprint of the public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("fingerprint", &self.fingerprint())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.public_key == other.public_key
            && bool::from(self.private_key.as_slice().ct_eq(other.private_key.as_slice()))
    }
}

impl Eq for KeyPair {}

// ============================================================================
// Signature
// ============================================================================

/// Signature bytes tagged with the variant that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
    algorithm: Algorithm,
}

impl Signature {
    /// Wraps raw signature bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, algorithm: Algorithm) -> Self {
        Self { bytes, algorithm }
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the signature, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Producing variant.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for an empty signature.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
