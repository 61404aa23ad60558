//! Service factory: dispatch by algorithm family.
//!
//! Services are stateless unit structs held in statics, so the factory hands
//! out `&'static` references.
//!
//! # Example
//!
//! ```rust
//! use ksm_core::{Algorithm, AlgorithmFamily, CryptoError};
//! use ksm_crypto::factory::{service_for, service_for_name};
//!
//! let svc = service_for(Algorithm::Kyber768).unwrap();
//! assert_eq!(svc.family(), AlgorithmFamily::Encapsulation);
//!
//! assert!(matches!(
//!     service_for(Algorithm::SphincsPlus128f),
//!     Err(CryptoError::UnsupportedAlgorithm { .. })
//! ));
//! assert!(matches!(
//!     service_for_name("RSA2048"),
//!     Err(CryptoError::InvalidAlgorithm { .. })
//! ));
//! ```

use ksm_core::error::{CryptoError, CryptoResult};
use ksm_core::{Algorithm, AlgorithmFamily};

use crate::encapsulation::EncapsulationService;
use crate::service::CryptoService;
use crate::signature::SignatureService;

static SIGNATURE: SignatureService = SignatureService;
static ENCAPSULATION: EncapsulationService = EncapsulationService;

/// The service handling `algorithm`'s family.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for unimplemented variants.
pub fn service_for(algorithm: Algorithm) -> CryptoResult<&'static dyn CryptoService> {
    match algorithm.family() {
        AlgorithmFamily::Signature => Ok(&SIGNATURE),
        AlgorithmFamily::Encapsulation => Ok(&ENCAPSULATION),
        AlgorithmFamily::Unimplemented => Err(CryptoError::unsupported_algorithm(algorithm)),
    }
}

/// Parses `name` and returns its service.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidAlgorithm`] for names outside the catalog,
/// or [`CryptoError::UnsupportedAlgorithm`] for unimplemented variants.
pub fn service_for_name(name: &str) -> CryptoResult<&'static dyn CryptoService> {
    service_for(name.parse()?)
}

/// The signature service, if `algorithm` is a signature variant.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for unimplemented variants
/// and [`CryptoError::UnsupportedVariant`] for encapsulation variants.
pub fn signature_service(algorithm: Algorithm) -> CryptoResult<&'static SignatureService> {
    match algorithm.family() {
        AlgorithmFamily::Signature => Ok(&SIGNATURE),
        AlgorithmFamily::Unimplemented => Err(CryptoError::unsupported_algorithm(algorithm)),
        AlgorithmFamily::Encapsulation => Err(CryptoError::unsupported_variant(
            algorithm,
            AlgorithmFamily::Signature,
        )),
    }
}

/// The encryption service, if `algorithm` is an encapsulation variant.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for unimplemented variants
/// and [`CryptoError::UnsupportedVariant`] for signature variants.
pub fn encryption_service(algorithm: Algorithm) -> CryptoResult<&'static EncapsulationService> {
    match algorithm.family() {
        AlgorithmFamily::Encapsulation => Ok(&ENCAPSULATION),
        AlgorithmFamily::Unimplemented => Err(CryptoError::unsupported_algorithm(algorithm)),
        AlgorithmFamily::Signature => Err(CryptoError::unsupported_variant(
            algorithm,
            AlgorithmFamily::Encapsulation,
        )),
    }
}

/// Returns `true` if `algorithm` belongs to the signature family.
#[must_use]
pub fn is_signature_algorithm(algorithm: Algorithm) -> bool {
    algorithm.is_signature()
}

/// Returns `true` if `algorithm` belongs to the encapsulation family.
#[must_use]
pub fn is_encryption_algorithm(algorithm: Algorithm) -> bool {
    algorithm.is_encryption()
}
