//! Algorithm catalog for the simulated post-quantum primitives.
//!
//! Every supported variant is a static [`AlgorithmSpec`] carrying its family
//! tag and byte sizes. The family tag is the only source of truth for
//! dispatch: callers never inspect variant names to decide whether a variant
//! signs or encrypts.
//!
//! # Example
//!
//! ```
//! use ksm_core::algorithm::{Algorithm, AlgorithmFamily};
//!
//! let alg: Algorithm = "Dilithium3".parse().expect("known variant");
//! assert_eq!(alg, Algorithm::Dilithium3);
//! assert_eq!(alg.family(), AlgorithmFamily::Signature);
//!
//! let sizes = alg.sizes();
//! assert_eq!(sizes.public_key_len, 1952);
//! assert_eq!(sizes.private_key_len, 4032);
//! assert_eq!(sizes.signature_len, Some(3309));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;

// ============================================================================
// AlgorithmFamily
// ============================================================================

/// Capability set an algorithm variant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Digital signature schemes (key generation, sign, verify).
    Signature,
    /// Key-encapsulation schemes used for public-key encryption.
    Encapsulation,
    /// Recognized but not implemented by this service.
    Unimplemented,
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => write!(f, "signature"),
            Self::Encapsulation => write!(f, "encapsulation"),
            Self::Unimplemented => write!(f, "unimplemented"),
        }
    }
}

// ============================================================================
// AlgorithmSpec
// ============================================================================

/// Byte sizes declared by an algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySizes {
    /// Public key length in bytes.
    pub public_key_len: usize,
    /// Private key length in bytes.
    pub private_key_len: usize,
    /// Signature length in bytes (signature family only).
    pub signature_len: Option<usize>,
}

/// Static catalog entry for one algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmSpec {
    /// Family tag, resolved once when the catalog is defined.
    pub family: AlgorithmFamily,
    /// Stable identifier written to stored records (e.g. `DILITHIUM3`).
    pub id: &'static str,
    /// Human-readable name (e.g. `Dilithium3`).
    pub display_name: &'static str,
    /// Declared sizes.
    pub sizes: KeySizes,
}

const fn spec(
    family: AlgorithmFamily,
    id: &'static str,
    display_name: &'static str,
    public_key_len: usize,
    private_key_len: usize,
    signature_len: Option<usize>,
) -> AlgorithmSpec {
    AlgorithmSpec {
        family,
        id,
        display_name,
        sizes: KeySizes {
            public_key_len,
            private_key_len,
            signature_len,
        },
    }
}

const DILITHIUM2: AlgorithmSpec = spec(
    AlgorithmFamily::Signature,
    "DILITHIUM2",
    "Dilithium2",
    1312,
    2560,
    Some(2420),
);
const DILITHIUM3: AlgorithmSpec = spec(
    AlgorithmFamily::Signature,
    "DILITHIUM3",
    "Dilithium3",
    1952,
    4032,
    Some(3309),
);
const DILITHIUM5: AlgorithmSpec = spec(
    AlgorithmFamily::Signature,
    "DILITHIUM5",
    "Dilithium5",
    2592,
    4864,
    Some(4595),
);
const KYBER512: AlgorithmSpec = spec(
    AlgorithmFamily::Encapsulation,
    "KYBER512",
    "Kyber512",
    800,
    1632,
    None,
);
const KYBER768: AlgorithmSpec = spec(
    AlgorithmFamily::Encapsulation,
    "KYBER768",
    "Kyber768",
    1184,
    2400,
    None,
);
const KYBER1024: AlgorithmSpec = spec(
    AlgorithmFamily::Encapsulation,
    "KYBER1024",
    "Kyber1024",
    1568,
    3168,
    None,
);
const SPHINCS_PLUS_128F: AlgorithmSpec = spec(
    AlgorithmFamily::Unimplemented,
    "SPHINCS_PLUS_128F",
    "SPHINCS+-128f",
    32,
    64,
    Some(17088),
);
const SPHINCS_PLUS_192F: AlgorithmSpec = spec(
    AlgorithmFamily::Unimplemented,
    "SPHINCS_PLUS_192F",
    "SPHINCS+-192f",
    48,
    96,
    Some(35664),
);
const SPHINCS_PLUS_256F: AlgorithmSpec = spec(
    AlgorithmFamily::Unimplemented,
    "SPHINCS_PLUS_256F",
    "SPHINCS+-256f",
    64,
    128,
    Some(49856),
);

// ============================================================================
// Algorithm
// ============================================================================

/// A registered algorithm variant.
///
/// The set is fixed at compile time. Serializes as its stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// CRYSTALS-Dilithium, NIST level 2.
    Dilithium2,
    /// CRYSTALS-Dilithium, NIST level 3.
    Dilithium3,
    /// CRYSTALS-Dilithium, NIST level 5.
    Dilithium5,
    /// CRYSTALS-Kyber, NIST level 1.
    Kyber512,
    /// CRYSTALS-Kyber, NIST level 3.
    Kyber768,
    /// CRYSTALS-Kyber, NIST level 5.
    Kyber1024,
    /// SPHINCS+ fast, 128-bit.
    SphincsPlus128f,
    /// SPHINCS+ fast, 192-bit.
    SphincsPlus192f,
    /// SPHINCS+ fast, 256-bit.
    SphincsPlus256f,
}

impl Algorithm {
    /// Every registered variant, in catalog order.
    pub const ALL: [Self; 9] = [
        Self::Dilithium2,
        Self::Dilithium3,
        Self::Dilithium5,
        Self::Kyber512,
        Self::Kyber768,
        Self::Kyber1024,
        Self::SphincsPlus128f,
        Self::SphincsPlus192f,
        Self::SphincsPlus256f,
    ];

    /// Default variant for entity signing keys.
    pub const DEFAULT_SIGNATURE: Self = Self::Dilithium3;

    /// Default variant for hybrid encryption.
    pub const DEFAULT_ENCRYPTION: Self = Self::Kyber768;

    /// The static catalog entry for this variant.
    #[must_use]
    pub const fn spec(self) -> &'static AlgorithmSpec {
        match self {
            Self::Dilithium2 => &DILITHIUM2,
            Self::Dilithium3 => &DILITHIUM3,
            Self::Dilithium5 => &DILITHIUM5,
            Self::Kyber512 => &KYBER512,
            Self::Kyber768 => &KYBER768,
            Self::Kyber1024 => &KYBER1024,
            Self::SphincsPlus128f => &SPHINCS_PLUS_128F,
            Self::SphincsPlus192f => &SPHINCS_PLUS_192F,
            Self::SphincsPlus256f => &SPHINCS_PLUS_256F,
        }
    }

    /// Declared byte sizes.
    #[must_use]
    pub const fn sizes(self) -> KeySizes {
        self.spec().sizes
    }

    /// Family tag.
    #[must_use]
    pub const fn family(self) -> AlgorithmFamily {
        self.spec().family
    }

    /// Stable identifier used in stored records.
    #[must_use]
    pub const fn id(self) -> &'static str {
        self.spec().id
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    /// Returns `true` for signature-family variants.
    #[must_use]
    pub fn is_signature(self) -> bool {
        self.family() == AlgorithmFamily::Signature
    }

    /// Returns `true` for encapsulation-family variants.
    #[must_use]
    pub fn is_encryption(self) -> bool {
        self.family() == AlgorithmFamily::Encapsulation
    }

    /// Variants that have a working service behind them.
    pub fn implemented() -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(|alg| alg.family() != AlgorithmFamily::Unimplemented)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    /// Accepts either the identifier (`KYBER768`) or the display name
    /// (`Kyber768`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|alg| {
                alg.id().eq_ignore_ascii_case(needle)
                    || alg.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| CryptoError::invalid_algorithm(s))
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
