//! The capability trait every algorithm service implements.
//!
//! A service exposes the full operation set; operations outside its family
//! fail with [`CryptoError::WrongOperation`](ksm_core::CryptoError::WrongOperation)
//! instead of being absent, so callers can hold any service behind
//! `&dyn CryptoService`.

use ksm_core::{Algorithm, AlgorithmFamily, CryptoResult};

use crate::keypair::{KeyPair, Signature};

/// Key generation plus family operations for a set of algorithm variants.
pub trait CryptoService: Send + Sync {
    /// The family this service handles.
    fn family(&self) -> AlgorithmFamily;

    /// Generates a key pair sized for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVariant` if `algorithm` is outside this family.
    fn generate_key_pair(&self, algorithm: Algorithm) -> CryptoResult<KeyPair>;

    /// Signs `message` with `private_key`.
    ///
    /// # Errors
    ///
    /// Returns `WrongOperation` on encapsulation services.
    fn sign(&self, message: &[u8], private_key: &[u8], algorithm: Algorithm)
        -> CryptoResult<Signature>;

    /// Checks `signature` over `message` against `public_key`.
    ///
    /// # Errors
    ///
    /// Returns `WrongOperation` on encapsulation services.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<bool>;

    /// Encrypts `plaintext` to `public_key`.
    ///
    /// # Errors
    ///
    /// Returns `WrongOperation` on signature services.
    fn encrypt(&self, plaintext: &[u8], public_key: &[u8], algorithm: Algorithm)
        -> CryptoResult<Vec<u8>>;

    /// Decrypts `ciphertext` with `private_key`.
    ///
    /// # Errors
    ///
    /// Returns `WrongOperation` on signature services, or `Decryption` on
    /// malformed input.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<Vec<u8>>;
}
