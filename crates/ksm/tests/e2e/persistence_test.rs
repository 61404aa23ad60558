//! Integration tests for persistence across process restarts.
//!
//! These tests reopen the same storage root to simulate a restart:
//! - Key pairs survive with identical bytes
//! - The master key is reused, never regenerated
//! - Signatures and ciphertexts made before a restart still verify and decrypt
//! - Deleted keys stay deleted

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]

use std::fs;

use ksm_crypto::{FileKeyStore, KeyStore};

use crate::common::{open_service, temp_data_dir, test_clock};

#[test]
fn test_key_pair_survives_restart() {
    let dir = temp_data_dir();
    let clock = test_clock();

    let before = open_service(dir.path(), &clock)
        .generate_key_pair_for_entity("vcb")
        .unwrap();

    let service = open_service(dir.path(), &clock);
    let after = service.get_key_pair("vcb").unwrap().expect("key should persist");

    assert_eq!(*before, *after);
    assert_eq!(before.fingerprint(), after.fingerprint());
}

#[test]
fn test_master_key_is_stable_across_restarts() {
    let dir = temp_data_dir();
    let clock = test_clock();
    let master_path = dir.path().join("master.key");

    open_service(dir.path(), &clock);
    let first = fs::read(&master_path).unwrap();
    assert_eq!(first.len(), 32);

    open_service(dir.path(), &clock);
    assert_eq!(fs::read(&master_path).unwrap(), first);
}

#[test]
fn test_signature_made_before_restart_verifies_after() {
    let dir = temp_data_dir();
    let clock = test_clock();

    let (signature, tx) = {
        let service = open_service(dir.path(), &clock);
        service.generate_key_pair_for_entity("vietcombank").unwrap();
        let signature = service.sign_transaction("vietcombank", b"batch 42").unwrap();
        let tx = service
            .create_signed_transaction("vietcombank", "vietinbank", 1_000_000.00, "transfer")
            .unwrap();
        (signature, tx)
    };

    let service = open_service(dir.path(), &clock);
    assert!(service
        .verify_transaction("vietcombank", b"batch 42", &signature)
        .unwrap());
    assert!(service.verify_signed_transaction(&tx).unwrap());
}

#[test]
fn test_ciphertext_made_before_restart_decrypts_after() {
    let dir = temp_data_dir();
    let clock = test_clock();

    let ciphertext = {
        let service = open_service(dir.path(), &clock);
        service.generate_key_pair_for_entity("vcb").unwrap();
        service.encrypt_sensitive_data("vcb", b"Sensitive banking data").unwrap()
    };

    let service = open_service(dir.path(), &clock);
    assert_eq!(
        service.decrypt_sensitive_data("vcb", &ciphertext).unwrap(),
        b"Sensitive banking data"
    );
}

#[test]
fn test_delete_persists() {
    let dir = temp_data_dir();
    let clock = test_clock();

    {
        let service = open_service(dir.path(), &clock);
        service.generate_key_pair_for_entity("vcb").unwrap();
        assert!(service.delete_key_pair("vcb").unwrap());
    }

    let service = open_service(dir.path(), &clock);
    assert!(service.get_key_pair("vcb").unwrap().is_none());
    assert!(service.list_entities().unwrap().is_empty());
}

#[test]
fn test_corrupt_record_is_skipped_at_startup_and_reported_on_load() {
    let dir = temp_data_dir();
    let clock = test_clock();

    {
        let service = open_service(dir.path(), &clock);
        service.generate_key_pair_for_entity("good").unwrap();
        service.generate_key_pair_for_entity("bad").unwrap();
    }
    fs::write(dir.path().join("keys").join("bad.toml"), "not = [valid").unwrap();

    let service = open_service(dir.path(), &clock);
    let stats = service.storage_stats().unwrap();
    assert_eq!(stats.record_count, 2);
    assert_eq!(stats.cached_keys, 1);

    assert!(service.get_key_pair("good").unwrap().is_some());
    let err = service.get_key_pair("bad").unwrap_err();
    assert_eq!(
        ksm_core::ErrorCode::from(&err),
        ksm_core::ErrorCode::RecordCorrupt
    );
}

#[test]
fn test_records_written_by_service_are_readable_by_store() {
    let dir = temp_data_dir();
    let clock = test_clock();

    let generated = open_service(dir.path(), &clock)
        .generate_key_pair_for_entity("vcb")
        .unwrap();

    let store = FileKeyStore::initialize(dir.path()).unwrap();
    assert!(store.exists("vcb"));
    let loaded = store.load("vcb").unwrap().unwrap();
    assert_eq!(loaded, *generated);
}
