//! Simulated hybrid encryption service (Kyber family).
//!
//! The symmetric key is SHA-256 over a domain label and the public-key
//! commitment. Encryption recomputes the commitment from the public key;
//! decryption reads it from the tail of the private key. The payload is
//! sealed with AES-256-CBC under a fresh IV (see [`crate::cipher`]).
//!
//! Key sizes are not checked against the variant here, so any key pair this
//! crate generates can encrypt to itself.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use ksm_core::error::{CryptoError, CryptoResult};
use ksm_core::{Algorithm, AlgorithmFamily};

use crate::cipher::{self, KEY_LEN};
use crate::keypair::{commitment_of, embedded_commitment, KeyPair, Signature, COMMITMENT_LEN};
use crate::service::CryptoService;

const KEY_DOMAIN: &[u8] = b"ksm/sim-kem/v1";

/// Keygen, encrypt and decrypt for encapsulation-family variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncapsulationService;

impl EncapsulationService {
    fn check_family(algorithm: Algorithm) -> CryptoResult<()> {
        if algorithm.family() == AlgorithmFamily::Encapsulation {
            Ok(())
        } else {
            Err(CryptoError::unsupported_variant(
                algorithm,
                AlgorithmFamily::Encapsulation,
            ))
        }
    }
}

fn derive_key(commitment: &[u8; COMMITMENT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DOMAIN);
    hasher.update(commitment);
    Zeroizing::new(hasher.finalize().into())
}

impl CryptoService for EncapsulationService {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Encapsulation
    }

    fn generate_key_pair(&self, algorithm: Algorithm) -> CryptoResult<KeyPair> {
        Self::check_family(algorithm)?;
        Ok(KeyPair::generate(algorithm))
    }

    fn sign(&self, _: &[u8], _: &[u8], algorithm: Algorithm) -> CryptoResult<Signature> {
        Err(CryptoError::wrong_operation("sign", algorithm))
    }

    fn verify(&self, _: &[u8], _: &[u8], _: &[u8], algorithm: Algorithm) -> CryptoResult<bool> {
        Err(CryptoError::wrong_operation("verify", algorithm))
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        public_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<Vec<u8>> {
        Self::check_family(algorithm)?;
        if public_key.is_empty() {
            return Err(CryptoError::invalid_key_length(
                "public key",
                algorithm.sizes().public_key_len,
                0,
            ));
        }

        let key = derive_key(&commitment_of(public_key));
        cipher::encrypt(&key, plaintext)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<Vec<u8>> {
        Self::check_family(algorithm)?;

        let key = derive_key(&embedded_commitment(private_key)?);
        cipher::decrypt(&key, ciphertext)
    }
}
