//! # Config Command
//!
//! `ksm config init [--force]`, `ksm config path` and `ksm config show`.

use ksm_core::config::KsmConfig;
use ksm_core::ConfigLoader;

use super::exit_codes::EXIT_SUCCESS;
use super::CommandError;
use crate::cli::args::ConfigAction;

/// Command to manage the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigCommand {
    loader: ConfigLoader,
    action: ConfigAction,
}

impl ConfigCommand {
    /// Creates a config command operating on `loader`'s file.
    #[must_use]
    pub const fn new(loader: ConfigLoader, action: ConfigAction) -> Self {
        Self { loader, action }
    }

    /// Performs the action and returns the text to print.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ConfigExists`] when `init` would overwrite a
    /// file without `--force`, or [`CommandError::Config`] if the file
    /// cannot be written or parsed.
    pub fn execute(&self) -> Result<String, CommandError> {
        let path = self.loader.config_path();
        match self.action {
            ConfigAction::Init { force } => {
                if self.loader.exists() && !force {
                    return Err(CommandError::ConfigExists {
                        path: path.display().to_string(),
                    });
                }
                self.loader.write_default()?;
                tracing::info!(path = %path.display(), "wrote default configuration");
                Ok(format!("Wrote default configuration to {}", path.display()))
            }
            ConfigAction::Path => Ok(path.display().to_string()),
            ConfigAction::Show => {
                let config: KsmConfig = self.loader.load()?;
                Ok(serde_json::to_string_pretty(&config)?)
            }
        }
    }

    /// Performs the action and prints the result.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn run(&self) -> Result<i32, CommandError> {
        println!("{}", self.execute()?);
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    fn loader_in(temp_dir: &TempDir) -> ConfigLoader {
        ConfigLoader::with_path(temp_dir.path().join("conf").join("ksm.toml"))
    }

    #[test]
    fn test_init_writes_default() {
        let temp_dir = TempDir::new().unwrap();
        let loader = loader_in(&temp_dir);

        let out = ConfigCommand::new(loader.clone(), ConfigAction::Init { force: false })
            .execute()
            .unwrap();
        assert!(out.contains("ksm.toml"));
        assert_eq!(loader.load_required().unwrap(), KsmConfig::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let loader = loader_in(&temp_dir);
        ConfigCommand::new(loader.clone(), ConfigAction::Init { force: false })
            .execute()
            .unwrap();

        let err = ConfigCommand::new(loader.clone(), ConfigAction::Init { force: false })
            .execute()
            .unwrap_err();
        assert!(matches!(err, CommandError::ConfigExists { .. }));

        assert!(ConfigCommand::new(loader, ConfigAction::Init { force: true })
            .execute()
            .is_ok());
    }

    #[test]
    fn test_path() {
        let temp_dir = TempDir::new().unwrap();
        let loader = loader_in(&temp_dir);
        let out = ConfigCommand::new(loader.clone(), ConfigAction::Path)
            .execute()
            .unwrap();
        assert_eq!(out, loader.config_path().display().to_string());
    }

    #[test]
    fn test_show_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let out = ConfigCommand::new(loader_in(&temp_dir), ConfigAction::Show)
            .execute()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["algorithms"]["signature"], "DILITHIUM3");
        assert_eq!(value["storage"]["directory"], "./ksm-data");
    }

    #[test]
    fn test_show_reports_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let loader = loader_in(&temp_dir);
        std::fs::create_dir_all(temp_dir.path().join("conf")).unwrap();
        std::fs::write(loader.config_path(), "[algorithms]\nsignature = \"KYBER512\"\n").unwrap();

        let err = ConfigCommand::new(loader, ConfigAction::Show)
            .execute()
            .unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
    }
}
