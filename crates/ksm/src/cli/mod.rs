//! # CLI Module
//!
//! Command-line interface for the key service.
//!
//! ## Module Structure
//!
//! - [`args`] - Argument parsing and CLI structure definitions
//! - [`commands`] - Command handler implementations
//!
//! ## Commands
//!
//! - `ksm generate <ENTITY>` - Generate (or return) an entity key pair
//! - `ksm public-key <ENTITY>` - Show an entity's public key
//! - `ksm sign <ENTITY> <MESSAGE>` - Sign a message
//! - `ksm verify <ENTITY> <MESSAGE> <SIGNATURE> [--algorithm ALG]` - Verify a signature
//! - `ksm encrypt <ENTITY> <DATA>` - Encrypt text to an entity
//! - `ksm decrypt <ENTITY> <DATA>` - Decrypt base64 ciphertext
//! - `ksm transfer <FROM> <TO> <AMOUNT> [--description TEXT]` - Create a signed transfer
//! - `ksm verify-transfer <FILE>` - Verify a signed transfer
//! - `ksm list` - List entities
//! - `ksm delete <ENTITY>` - Delete an entity key pair
//! - `ksm stats` - Storage statistics
//! - `ksm health` - Service health
//! - `ksm config [init|path|show]` - Manage the configuration file
//!
//! Service commands print the API response as JSON on stdout. Logs go to
//! stderr.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigAction};
