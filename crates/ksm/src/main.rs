//! # ksm
//!
//! Entity-scoped post-quantum key service.
//!
//! ## Usage
//!
//! ```bash
//! # Generate keys for two banks
//! ksm generate vietcombank
//! ksm generate vietinbank
//!
//! # Sign and verify a message
//! ksm sign vietcombank "pay 100"
//! ksm verify vietcombank "pay 100" <SIGNATURE>
//!
//! # Create and verify a signed transfer
//! ksm transfer vietcombank vietinbank 1000000 --description transfer > tx.json
//! ksm verify-transfer tx.json
//!
//! # Storage overview
//! ksm --storage-dir /var/lib/ksm stats
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use clap::Parser;
use ksm::cli::commands::{ApiCommand, ConfigCommand, EXIT_ERROR, EXIT_SUCCESS};
use ksm::cli::{Cli, Commands};
use ksm::logging::{init_logging, LogConfig, LogError, LogGuard};
use ksm_core::config::{KsmConfig, LoggingConfig};
use ksm_core::ConfigLoader;

/// Set up logging from the `[logging]` settings and the verbosity flag.
///
/// # Errors
///
/// Returns [`LogError`] if logging initialization fails.
fn setup_logging(settings: &LoggingConfig, verbose: u8) -> Result<LogGuard, LogError> {
    let config = LogConfig::from_settings(settings, verbose)?;
    init_logging(&config)
}

/// Parses arguments, runs the command and returns the exit code.
///
/// The log guard is dropped before returning so file logs are flushed.
fn run() -> i32 {
    let cli = Cli::parse();
    let loader = ConfigLoader::resolve(cli.config.as_deref());

    // `config` subcommands must work even when the current file is broken.
    let config = match (loader.load(), &cli.command) {
        (Ok(config), _) => config,
        (Err(_), Commands::Config { .. }) => KsmConfig::default(),
        (Err(e), _) => {
            eprintln!("Error: {e}");
            return EXIT_ERROR;
        }
    };

    let _guard = match setup_logging(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return EXIT_ERROR;
        }
    };

    let result = match cli.command {
        Commands::Config { action } => ConfigCommand::new(loader, action).run(),
        ref command => ApiCommand::from_command(command, cli.storage_dir.clone()).and_then(
            |cmd| cmd.map_or(Ok(EXIT_SUCCESS), |cmd| cmd.run(&config)),
        ),
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        EXIT_ERROR
    })
}

/// Main entry point for the `ksm` binary.
fn main() {
    std::process::exit(run());
}
