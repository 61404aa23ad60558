//! Configuration loader for the KSM key service.
//!
//! Locates, reads and writes the TOML configuration file, expands `~` in
//! paths, and resolves the storage root from its override sources.
//!
//! # Lookup order
//!
//! 1. An explicit path (CLI `--config`)
//! 2. The `KSM_CONFIG` environment variable
//! 3. `./ksm.toml`
//!
//! A missing file yields [`KsmConfig::default`].
//!
//! # Examples
//!
//! ```no_run
//! use ksm_core::config_loader::ConfigLoader;
//!
//! let loader = ConfigLoader::from_env();
//! let config = loader.load().expect("failed to load config");
//! println!("storage: {}", config.storage.directory);
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::KsmConfig;
use crate::error::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "KSM_CONFIG";

/// Environment variable overriding the storage root.
pub const STORAGE_DIR_ENV_VAR: &str = "KSM_STORAGE_DIR";

/// Configuration file used when no other source names one.
const DEFAULT_CONFIG_FILE: &str = "ksm.toml";

/// Reads and writes a single configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader for an explicit configuration file.
    #[must_use]
    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Creates a loader for `$KSM_CONFIG`, or `./ksm.toml` when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let path = env::var_os(CONFIG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        Self::with_path(path)
    }

    /// Creates a loader for `explicit` when given, otherwise [`from_env`](Self::from_env).
    #[must_use]
    pub fn resolve(explicit: Option<&Path>) -> Self {
        explicit.map_or_else(Self::from_env, |p| Self::with_path(p.to_path_buf()))
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads and validates the configuration, using defaults if the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseFailed`] for invalid TOML,
    /// [`ConfigError::InvalidValue`] when validation fails, and
    /// [`ConfigError::Io`] if the file cannot be read.
    pub fn load(&self) -> Result<KsmConfig, ConfigError> {
        if !self.config_path.exists() {
            return Ok(KsmConfig::default());
        }

        Self::load_from_path(&self.config_path)
    }

    /// Loads the configuration, failing if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the file is missing, plus
    /// every error [`load`](Self::load) can return.
    pub fn load_required(&self) -> Result<KsmConfig, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::file_not_found(
                self.config_path.display().to_string(),
            ));
        }

        Self::load_from_path(&self.config_path)
    }

    /// Saves the configuration, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure and
    /// [`ConfigError::ParseFailed`] if serialization fails.
    pub fn save(&self, config: &KsmConfig) -> Result<(), ConfigError> {
        self.ensure_parent_dir()?;

        let toml_str = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::parse_failed(format!("failed to serialize configuration: {e}"))
        })?;

        fs::write(&self.config_path, toml_str).map_err(|e| {
            ConfigError::io(
                format!(
                    "failed to write configuration to {}",
                    self.config_path.display()
                ),
                e,
            )
        })
    }

    /// Writes the commented default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on write failure.
    pub fn write_default(&self) -> Result<(), ConfigError> {
        self.ensure_parent_dir()?;

        fs::write(&self.config_path, KsmConfig::default_toml()).map_err(|e| {
            ConfigError::io(
                format!(
                    "failed to write default configuration to {}",
                    self.config_path.display()
                ),
                e,
            )
        })
    }

    /// Checks if the configuration file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    fn ensure_parent_dir(&self) -> Result<(), ConfigError> {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::io(
                        format!("failed to create directory {}", parent.display()),
                        e,
                    )
                })
            }
            _ => Ok(()),
        }
    }

    fn load_from_path(path: &Path) -> Result<KsmConfig, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("failed to read {}", path.display()), e))?;

        let config: KsmConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::parse_failed(format!("invalid TOML in {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Expands `~` in paths to the home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the path starts with `~` and
/// the home directory cannot be determined.
///
/// # Examples
///
/// ```
/// use ksm_core::config_loader::expand_path;
///
/// let path = expand_path("/var/lib/ksm").expect("absolute path");
/// assert_eq!(path.to_string_lossy(), "/var/lib/ksm");
/// ```
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(ConfigError::no_home_directory)?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir().ok_or_else(ConfigError::no_home_directory)
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Resolves the storage root from the process environment.
///
/// Order: `flag`, then `$KSM_STORAGE_DIR`, then `storage.directory`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if `~` cannot be expanded.
pub fn resolve_storage_root(
    flag: Option<&Path>,
    config: &KsmConfig,
) -> Result<PathBuf, ConfigError> {
    let env_value = env::var(STORAGE_DIR_ENV_VAR).ok();
    resolve_storage_root_from(flag, env_value.as_deref(), config)
}

/// Resolves the storage root from explicit sources.
///
/// Blank values are treated as unset.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if `~` cannot be expanded.
///
/// # Examples
///
/// ```
/// use ksm_core::config::KsmConfig;
/// use ksm_core::config_loader::resolve_storage_root_from;
/// use std::path::Path;
///
/// let config = KsmConfig::default();
/// let root = resolve_storage_root_from(None, Some("/srv/ksm"), &config).unwrap();
/// assert_eq!(root, Path::new("/srv/ksm"));
///
/// let root = resolve_storage_root_from(None, None, &config).unwrap();
/// assert_eq!(root, Path::new("./ksm-data"));
/// ```
pub fn resolve_storage_root_from(
    flag: Option<&Path>,
    env_value: Option<&str>,
    config: &KsmConfig,
) -> Result<PathBuf, ConfigError> {
    if let Some(flag) = flag {
        return expand_path(&flag.to_string_lossy());
    }

    if let Some(value) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
        return expand_path(value);
    }

    expand_path(&config.storage.directory)
}
