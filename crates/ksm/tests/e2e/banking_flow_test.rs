//! Integration tests for the interbank transfer flow.
//!
//! These tests drive the orchestrator the way a bank integration would:
//! - Key generation for two banks
//! - Signed transfer creation and verification
//! - Tamper detection on the canonical string and the fields
//! - Encryption of sensitive account data

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]

use ksm_core::{Algorithm, KsmError};

use crate::common::{open_service, temp_data_dir, test_clock, TEST_NOW};

// ============================================================================
// Transfers
// ============================================================================

#[test]
fn test_vietcombank_to_vietinbank_transfer() {
    let dir = temp_data_dir();
    let clock = test_clock();
    let service = open_service(dir.path(), &clock);

    service.generate_key_pair_for_entity("vietcombank").unwrap();
    service.generate_key_pair_for_entity("vietinbank").unwrap();

    let tx = service
        .create_signed_transaction("vietcombank", "vietinbank", 1_000_000.00, "transfer")
        .unwrap();

    assert!(tx
        .canonical
        .contains("FROM:vietcombank|TO:vietinbank|AMOUNT:1000000.00|DESC:transfer"));
    assert!(tx.canonical.ends_with(&format!("|TIMESTAMP:{TEST_NOW}")));
    assert_eq!(tx.algorithm, Algorithm::Dilithium3);
    assert_eq!(tx.signature.len(), 3309);
    assert!(service.verify_signed_transaction(&tx).unwrap());
}

#[test]
fn test_mutated_amount_in_canonical_string_fails() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());
    service.generate_key_pair_for_entity("vietcombank").unwrap();

    let tx = service
        .create_signed_transaction("vietcombank", "vietinbank", 1_000_000.00, "transfer")
        .unwrap();

    let mut copy = tx.clone();
    copy.canonical = copy.canonical.replace("AMOUNT:1000000.00", "AMOUNT:1000001.00");
    assert!(!service.verify_signed_transaction(&copy).unwrap());

    // Mutating both the fields and the string still fails on the signature.
    copy.amount = 1_000_001.00;
    assert!(copy.is_consistent());
    assert!(!service.verify_signed_transaction(&copy).unwrap());

    assert!(service.verify_signed_transaction(&tx).unwrap());
}

#[test]
fn test_mutated_recipient_fails() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());
    service.generate_key_pair_for_entity("vietcombank").unwrap();

    let tx = service
        .create_signed_transaction("vietcombank", "vietinbank", 50.0, "fee")
        .unwrap();

    let mut copy = tx;
    copy.to = "attacker".to_string();
    copy.canonical = copy.recompute_canonical();
    assert!(!service.verify_signed_transaction(&copy).unwrap());
}

#[test]
fn test_forged_sender_fails() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());
    service.generate_key_pair_for_entity("vietcombank").unwrap();
    service.generate_key_pair_for_entity("vietinbank").unwrap();

    let tx = service
        .create_signed_transaction("vietinbank", "vietcombank", 10.0, "refund")
        .unwrap();

    let mut forged = tx;
    forged.from = "vietcombank".to_string();
    forged.canonical = forged.recompute_canonical();
    assert!(!service.verify_signed_transaction(&forged).unwrap());
}

#[test]
fn test_timestamps_follow_the_clock() {
    let dir = temp_data_dir();
    let clock = test_clock();
    let service = open_service(dir.path(), &clock);
    service.generate_key_pair_for_entity("vcb").unwrap();

    let first = service.create_signed_transaction("vcb", "ctg", 1.0, "a").unwrap();
    clock.advance(1_000);
    let second = service.create_signed_transaction("vcb", "ctg", 1.0, "a").unwrap();

    assert_eq!(second.timestamp - first.timestamp, 1_000);
    assert_ne!(first.canonical, second.canonical);
    assert!(service.verify_signed_transaction(&first).unwrap());
    assert!(service.verify_signed_transaction(&second).unwrap());
}

#[test]
fn test_transfer_from_unknown_sender() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());

    let err = service
        .create_signed_transaction("ghost", "vietinbank", 1.0, "x")
        .unwrap_err();
    assert!(matches!(err, KsmError::EntityKeyNotFound { .. }));
}

// ============================================================================
// Sensitive data
// ============================================================================

#[test]
fn test_account_data_round_trip() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());
    service.generate_key_pair_for_entity("vietinbank").unwrap();

    let secret = "account=0011004455667; owner=Nguyen Van A";
    let first = service
        .encrypt_sensitive_data("vietinbank", secret.as_bytes())
        .unwrap();
    let second = service
        .encrypt_sensitive_data("vietinbank", secret.as_bytes())
        .unwrap();
    assert_ne!(first, second);

    for ciphertext in [first, second] {
        let plaintext = service
            .decrypt_sensitive_data("vietinbank", &ciphertext)
            .unwrap();
        assert_eq!(plaintext, secret.as_bytes());
    }
}

#[test]
fn test_other_bank_cannot_decrypt() {
    let dir = temp_data_dir();
    let service = open_service(dir.path(), &test_clock());
    service.generate_key_pair_for_entity("vietcombank").unwrap();
    service.generate_key_pair_for_entity("vietinbank").unwrap();

    let ciphertext = service
        .encrypt_sensitive_data("vietinbank", b"for vietinbank only, padded to blocks")
        .unwrap();

    match service.decrypt_sensitive_data("vietcombank", &ciphertext) {
        Ok(plaintext) => assert_ne!(plaintext, b"for vietinbank only, padded to blocks"),
        Err(err) => assert!(matches!(err, KsmError::Crypto(_))),
    }
}
