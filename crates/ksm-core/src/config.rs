//! Configuration types for the KSM key service.
//!
//! Configuration is stored in TOML format, by default at `./ksm.toml`.
//!
//! # Examples
//!
//! ```
//! use ksm_core::algorithm::Algorithm;
//! use ksm_core::config::KsmConfig;
//!
//! let config = KsmConfig::default();
//! assert_eq!(config.storage.directory, "./ksm-data");
//! assert_eq!(config.algorithms.signature, Algorithm::Dilithium3);
//! assert_eq!(config.algorithms.encryption, Algorithm::Kyber768);
//! ```
//!
//! # Default TOML Output
//!
//! ```toml
//! [storage]
//! directory = "./ksm-data"
//!
//! [algorithms]
//! signature = "DILITHIUM3"
//! encryption = "KYBER768"
//!
//! [logging]
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};

use crate::algorithm::{Algorithm, AlgorithmFamily};
use crate::error::ConfigError;

/// Default storage root.
pub const DEFAULT_STORAGE_DIR: &str = "./ksm-data";

/// Log formats accepted by `logging.format`.
pub const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

/// Top-level configuration for the KSM key service.
///
/// # Examples
///
/// ```
/// use ksm_core::algorithm::Algorithm;
/// use ksm_core::config::KsmConfig;
///
/// let toml_str = r#"
/// [storage]
/// directory = "/var/lib/ksm"
///
/// [algorithms]
/// signature = "Dilithium5"
/// "#;
///
/// let config: KsmConfig = toml::from_str(toml_str).expect("valid TOML");
/// assert_eq!(config.algorithms.signature, Algorithm::Dilithium5);
/// assert_eq!(config.algorithms.encryption, Algorithm::Kyber768);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KsmConfig {
    /// Key storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default algorithm variants.
    #[serde(default)]
    pub algorithms: AlgorithmsConfig,

    /// Logging output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_storage_dir() -> String {
    DEFAULT_STORAGE_DIR.to_string()
}

const fn default_signature_algorithm() -> Algorithm {
    Algorithm::DEFAULT_SIGNATURE
}

const fn default_encryption_algorithm() -> Algorithm {
    Algorithm::DEFAULT_ENCRYPTION
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Where key records and the master key live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage root. `~` is expanded when the root is resolved.
    #[serde(default = "default_storage_dir")]
    pub directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_dir(),
        }
    }
}

/// Default algorithm variants for entity keys and hybrid encryption.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlgorithmsConfig {
    /// Variant used for entity key generation and signing.
    #[serde(default = "default_signature_algorithm")]
    pub signature: Algorithm,

    /// Variant used for sensitive-data encryption.
    #[serde(default = "default_encryption_algorithm")]
    pub encryption: Algorithm,
}

impl Default for AlgorithmsConfig {
    fn default() -> Self {
        Self {
            signature: default_signature_algorithm(),
            encryption: default_encryption_algorithm(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `pretty`, `json` or `compact`.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            file: None,
        }
    }
}

impl KsmConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the signature default is not
    /// a signature-family variant, the encryption default is not an
    /// encapsulation-family variant, the storage directory is empty, or the
    /// log format is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.directory.trim().is_empty() {
            return Err(ConfigError::invalid_value("storage.directory", "\"\""));
        }

        if self.algorithms.signature.family() != AlgorithmFamily::Signature {
            return Err(ConfigError::invalid_value(
                "algorithms.signature",
                format!(
                    "{} is not a signature algorithm",
                    self.algorithms.signature
                ),
            ));
        }

        if self.algorithms.encryption.family() != AlgorithmFamily::Encapsulation {
            return Err(ConfigError::invalid_value(
                "algorithms.encryption",
                format!(
                    "{} is not an encryption algorithm",
                    self.algorithms.encryption
                ),
            ));
        }

        let format = self.logging.format.to_ascii_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.format",
                self.logging.format.clone(),
            ));
        }

        Ok(())
    }

    /// The commented default configuration file.
    #[must_use]
    pub fn default_toml() -> String {
        r#"[storage]
directory = "./ksm-data"

[algorithms]
signature = "DILITHIUM3"
encryption = "KYBER768"

[logging]
format = "pretty"   # pretty | json | compact
# file = "./ksm-data/logs/ksm.log"
"#
        .to_string()
    }

    /// Creates a configuration builder for customizing values.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`KsmConfig`].
///
/// # Examples
///
/// ```
/// use ksm_core::algorithm::Algorithm;
/// use ksm_core::config::KsmConfig;
///
/// let config = KsmConfig::builder()
///     .storage_directory("/tmp/ksm")
///     .signature_algorithm(Algorithm::Dilithium2)
///     .build();
///
/// assert_eq!(config.storage.directory, "/tmp/ksm");
/// assert_eq!(config.algorithms.signature, Algorithm::Dilithium2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: KsmConfig,
}

impl ConfigBuilder {
    /// Sets the storage root.
    #[must_use]
    pub fn storage_directory(mut self, directory: impl Into<String>) -> Self {
        self.config.storage.directory = directory.into();
        self
    }

    /// Sets the default signature variant.
    #[must_use]
    pub const fn signature_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithms.signature = algorithm;
        self
    }

    /// Sets the default encryption variant.
    #[must_use]
    pub const fn encryption_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithms.encryption = algorithm;
        self
    }

    /// Sets the log format.
    #[must_use]
    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Sets the log file.
    #[must_use]
    pub fn log_file(mut self, file: impl Into<String>) -> Self {
        self.config.logging.file = Some(file.into());
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> KsmConfig {
        self.config
    }
}
