//! Simulated signature service (Dilithium family).
//!
//! # Signature layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ message prefix (first half of the body)      │
//! │ private key prefix (second half of the body) │
//! │ tag: [u8; 32]                                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The body is the signature minus its trailing tag. Unused body bytes are
//! zero. The tag is SHA-256 over a domain label, the signer's public-key
//! commitment, the message length and bytes, and the body, so flipping any
//! byte of the message or the signature breaks verification.
//!
//! This is a placeholder with the shapes of a real scheme. It proves nothing
//! about possession of the private key.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use ksm_core::error::{CryptoError, CryptoResult};
use ksm_core::{Algorithm, AlgorithmFamily};

use crate::keypair::{commitment_of, embedded_commitment, KeyPair, Signature, COMMITMENT_LEN};
use crate::service::CryptoService;

/// Width of the trailing integrity tag.
pub const TAG_LEN: usize = 32;

const TAG_DOMAIN: &[u8] = b"ksm/sim-signature/v1";

/// Keygen, sign and verify for signature-family variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureService;

impl SignatureService {
    fn check_family(algorithm: Algorithm) -> CryptoResult<usize> {
        match (algorithm.family(), algorithm.sizes().signature_len) {
            (AlgorithmFamily::Signature, Some(len)) if len > TAG_LEN => Ok(len),
            _ => Err(CryptoError::unsupported_variant(
                algorithm,
                AlgorithmFamily::Signature,
            )),
        }
    }
}

fn signature_tag(
    commitment: &[u8; COMMITMENT_LEN],
    message: &[u8],
    body: &[u8],
) -> [u8; TAG_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(TAG_DOMAIN);
    hasher.update(commitment);
    hasher.update((message.len() as u64).to_be_bytes());
    hasher.update(message);
    hasher.update(body);
    hasher.finalize().into()
}

impl CryptoService for SignatureService {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Signature
    }

    fn generate_key_pair(&self, algorithm: Algorithm) -> CryptoResult<KeyPair> {
        Self::check_family(algorithm)?;
        Ok(KeyPair::generate(algorithm))
    }

    fn sign(
        &self,
        message: &[u8],
        private_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<Signature> {
        let signature_len = Self::check_family(algorithm)?;

        let expected = algorithm.sizes().private_key_len;
        if private_key.len() != expected {
            return Err(CryptoError::invalid_key_length(
                "private key",
                expected,
                private_key.len(),
            ));
        }
        let commitment = embedded_commitment(private_key)?;

        let body_len = signature_len - TAG_LEN;
        let half = body_len / 2;
        let mut bytes = vec![0u8; signature_len];

        let m = message.len().min(half);
        bytes[..m].copy_from_slice(&message[..m]);

        let k = private_key.len().min(body_len - half);
        bytes[half..half + k].copy_from_slice(&private_key[..k]);

        let tag = signature_tag(&commitment, message, &bytes[..body_len]);
        bytes[body_len..].copy_from_slice(&tag);

        Ok(Signature::new(bytes, algorithm))
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
        algorithm: Algorithm,
    ) -> CryptoResult<bool> {
        Self::check_family(algorithm)?;

        let expected = algorithm.sizes().public_key_len;
        if public_key.len() != expected {
            return Err(CryptoError::invalid_key_length(
                "public key",
                expected,
                public_key.len(),
            ));
        }

        if signature.len() < TAG_LEN {
            return Ok(false);
        }

        let (body, embedded) = signature.split_at(signature.len() - TAG_LEN);
        let expected_tag = signature_tag(&commitment_of(public_key), message, body);

        Ok(embedded.ct_eq(&expected_tag).into())
    }

    fn encrypt(&self, _: &[u8], _: &[u8], algorithm: Algorithm) -> CryptoResult<Vec<u8>> {
        Err(CryptoError::wrong_operation("encrypt", algorithm))
    }

    fn decrypt(&self, _: &[u8], _: &[u8], algorithm: Algorithm) -> CryptoResult<Vec<u8>> {
        Err(CryptoError::wrong_operation("decrypt", algorithm))
    }
}
