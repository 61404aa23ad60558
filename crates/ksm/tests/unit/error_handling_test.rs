//! Error handling and conversion tests.
//!
//! These tests verify that error types implement the correct traits,
//! have proper Display implementations, and map to the right API codes.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::doc_markdown,
    clippy::io_other_error
)]

use std::error::Error;

use ksm::api::{ApiResponse, Method, ParseMethodError};
use ksm::cli::commands::CommandError;
use ksm::logging::LogError;
use ksm_core::error::{ConfigError, CryptoError, ErrorCode, KsmError, StoreError};
use ksm_core::Algorithm;

use crate::common::TEST_NOW;

/// Test that all error types implement the Error trait.
#[test]
fn test_error_trait_implementation() {
    // LogError
    let err = LogError::FileCreation("test".to_string());
    assert!(err.source().is_none());

    // ParseMethodError
    let err = "rotateKey".parse::<Method>().unwrap_err();
    assert!(err.source().is_none());

    // KsmError wraps its domain errors
    let err: KsmError = CryptoError::invalid_algorithm("FALCON512").into();
    assert!(err.source().is_some());

    // CommandError keeps the io source
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = CommandError::io("tx.json", io_err);
    assert!(err.source().is_some());
}

/// Test error Display implementations.
#[test]
fn test_error_display() {
    assert_eq!(
        LogError::InvalidConfig("bad level".to_string()).to_string(),
        "Invalid log configuration: bad level"
    );
    assert_eq!(
        ParseMethodError {
            method: "rotateKey".to_string()
        }
        .to_string(),
        "unknown method: rotateKey"
    );
    assert_eq!(
        KsmError::entity_key_not_found("vcb").to_string(),
        "no key pair found for entity: vcb"
    );
    assert!(CommandError::ConfigExists {
        path: "/etc/ksm.toml".to_string()
    }
    .to_string()
    .contains("/etc/ksm.toml"));
}

/// Test conversions into the command-level error.
#[test]
fn test_command_error_conversions() {
    let err: CommandError = ConfigError::invalid_value("algorithms.signature", "KYBER512").into();
    assert!(matches!(err, CommandError::Config(_)));

    let err: CommandError = StoreError::init("read-only filesystem").into();
    assert!(matches!(err, CommandError::StorageInit(_)));

    let err: CommandError = KsmError::invalid_request("bad").into();
    assert!(matches!(err, CommandError::Service(_)));

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: CommandError = json_err.into();
    assert!(matches!(err, CommandError::Json(_)));
}

/// Test that every failure class reaches the API with its stable code.
#[test]
fn test_failure_codes() {
    let cases: Vec<(KsmError, &str)> = vec![
        (
            CryptoError::invalid_algorithm("FALCON512").into(),
            "INVALID_ALGORITHM",
        ),
        (
            CryptoError::unsupported_algorithm(Algorithm::SphincsPlus128f).into(),
            "UNSUPPORTED_ALGORITHM",
        ),
        (
            CryptoError::wrong_operation("encrypt", Algorithm::Dilithium3).into(),
            "WRONG_OPERATION_FOR_ALGORITHM",
        ),
        (
            CryptoError::decryption("bad padding").into(),
            "DECRYPTION_ERROR",
        ),
        (
            StoreError::record_corrupt("vcb", "invalid record").into(),
            "RECORD_CORRUPT",
        ),
        (StoreError::invalid_entity_id("../x").into(), "INVALID_REQUEST"),
        (KsmError::entity_key_not_found("vcb"), "ENTITY_KEY_NOT_FOUND"),
        (KsmError::invalid_request("missing entityId"), "INVALID_REQUEST"),
    ];

    for (err, code) in cases {
        assert_eq!(ErrorCode::from(&err).as_str(), code);

        let response = ApiResponse::failure(&err, TEST_NOW);
        assert!(!response.success);
        assert_eq!(response.code(), Some(code));
        assert_eq!(response.error(), Some(err.to_string().as_str()));
    }
}
