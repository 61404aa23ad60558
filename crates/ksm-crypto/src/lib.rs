//! # ksm-crypto
//!
//! Key material, simulated post-quantum services and persistent key storage
//! for the KSM key service.
//!
//! ## Modules
//!
//! - [`keys`] - The process-wide master key
//! - [`keypair`] - Key pairs, signatures and public-key commitments
//! - [`cipher`] - AES-256-CBC used for hybrid encryption and key wrapping
//! - [`service`] - The [`CryptoService`] capability trait
//! - [`signature`] - Simulated Dilithium-family signatures
//! - [`encapsulation`] - Simulated Kyber-family hybrid encryption
//! - [`factory`] - Dispatch from algorithm variant to service
//! - [`store`] - File-backed key store
//!
//! ## Simulation
//!
//! The services keep the sizes and round-trip behavior of the real schemes
//! but implement no lattice mathematics. They are not cryptographically
//! sound and must not protect real assets.
//!
//! ## Example
//!
//! ```rust
//! use ksm_core::Algorithm;
//! use ksm_crypto::factory::service_for;
//!
//! let alg = Algorithm::Dilithium3;
//! let svc = service_for(alg).unwrap();
//! let kp = svc.generate_key_pair(alg).unwrap();
//! let sig = svc.sign(b"hello", kp.private_key(), alg).unwrap();
//! assert!(svc.verify(b"hello", sig.as_bytes(), kp.public_key(), alg).unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cipher;
pub mod encapsulation;
pub mod factory;
pub mod keypair;
pub mod keys;
pub mod service;
pub mod signature;
pub mod store;

pub use encapsulation::EncapsulationService;
pub use factory::{encryption_service, service_for, service_for_name, signature_service};
pub use keypair::{fingerprint, KeyPair, Signature};
pub use keys::{MasterKey, MASTER_KEY_LEN};
pub use service::CryptoService;
pub use signature::SignatureService;
pub use store::{FileKeyStore, KeyStore, StorageStats, StoredKeyRecord};
