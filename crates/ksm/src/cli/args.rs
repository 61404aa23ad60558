//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Entity-scoped key service.
#[derive(Debug, Parser)]
#[command(name = "ksm", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: $KSM_CONFIG or ./ksm.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Storage root (overrides $KSM_STORAGE_DIR and the config file)
    #[arg(long, value_name = "PATH", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// Generate a key pair for an entity (returns the existing one if present)
    Generate {
        /// Entity identifier
        entity_id: String,
    },

    /// Show an entity's public key
    PublicKey {
        /// Entity identifier
        entity_id: String,
    },

    /// Sign a message with an entity's key
    Sign {
        /// Entity identifier
        entity_id: String,
        /// Message text
        message: String,
    },

    /// Verify a base64 signature against an entity's key
    Verify {
        /// Entity identifier
        entity_id: String,
        /// Message text
        message: String,
        /// Base64 signature
        signature: String,
        /// Signature algorithm (default: the configured signature algorithm)
        #[arg(long)]
        algorithm: Option<String>,
    },

    /// Encrypt text to an entity
    Encrypt {
        /// Entity identifier
        entity_id: String,
        /// Plaintext
        data: String,
    },

    /// Decrypt base64 data encrypted to an entity
    Decrypt {
        /// Entity identifier
        entity_id: String,
        /// Base64 ciphertext
        encrypted_data: String,
    },

    /// Create and sign a transfer between two entities
    Transfer {
        /// Sending entity (signs the transaction)
        from: String,
        /// Receiving entity
        to: String,
        /// Amount
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Verify a signed transfer read from a JSON file (`-` for stdin)
    VerifyTransfer {
        /// File holding the `transaction` object printed by `transfer`
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List entities with stored keys
    List,

    /// Delete an entity's key pair
    Delete {
        /// Entity identifier
        entity_id: String,
    },

    /// Show storage statistics
    Stats,

    /// Show service health and supported algorithms
    Health,

    /// Manage the configuration file
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}
