//! AES-256-CBC with PKCS#7 padding.
//!
//! Shared by hybrid encryption and by master-key wrapping of stored private
//! keys. Every call draws a fresh random IV from `OsRng`.
//!
//! # Format
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ iv: [u8; 16]                 │
//! │ ciphertext: [u8; 16 * n]     │
//! └──────────────────────────────┘
//! ```
//!
//! Output length is `16 + padded_len`, where `padded_len` is the plaintext
//! length rounded up to the next multiple of 16 (a full block is added when
//! it is already aligned).

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use ksm_core::error::{CryptoError, CryptoResult};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block and IV length in bytes.
pub const IV_LEN: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Encrypts `plaintext` under `key`, returning `iv || ciphertext`.
///
/// # Errors
///
/// Returns [`CryptoError::EncryptionFailed`] if the cipher rejects the key.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| CryptoError::encryption_failed(format!("cipher setup: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts `iv || ciphertext` under `key`.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] if the input is shorter than the IV,
/// the body is empty or not block-aligned, or the padding is invalid.
pub fn decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < IV_LEN {
        return Err(CryptoError::decryption(format!(
            "ciphertext too short: {} bytes, need at least {IV_LEN}",
            data.len()
        )));
    }

    let (iv, body) = data.split_at(IV_LEN);

    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::decryption(format!(
            "ciphertext body of {} bytes is not a positive multiple of {BLOCK_LEN}",
            body.len()
        )));
    }

    Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| CryptoError::decryption(format!("cipher setup: {e}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| CryptoError::decryption("invalid padding"))
}
