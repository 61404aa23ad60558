//! Integration tests for the orchestrator over an in-memory store.
//!
//! The memory store counts writes and can mark records as corrupt, which
//! lets these tests observe write-through and failure propagation.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]

use std::sync::Arc;

use proptest::prelude::*;

use ksm::process::ProcessService;
use ksm_core::{AlgorithmsConfig, ErrorCode, KsmError};
use ksm_crypto::KeyStore;

use crate::common::{self, test_clock, MemoryKeyStore};

fn memory_service() -> ProcessService<MemoryKeyStore> {
    ProcessService::with_clock(MemoryKeyStore::new(), AlgorithmsConfig::default(), test_clock())
        .unwrap()
}

#[test]
fn test_repeated_generate_writes_once() {
    let service = memory_service();

    let first = service.generate_key_pair_for_entity("vcb").unwrap();
    let second = service.generate_key_pair_for_entity("vcb").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(service.store().save_count(), 1);
}

#[test]
fn test_corrupt_record_is_skipped_during_warm_up() {
    let store = MemoryKeyStore::new();
    let seeded = ProcessService::with_clock(store, AlgorithmsConfig::default(), test_clock())
        .unwrap();
    seeded.generate_key_pair_for_entity("good").unwrap();
    seeded.generate_key_pair_for_entity("bad").unwrap();

    let store = seeded.into_store();
    store.corrupt("bad");

    let service =
        ProcessService::with_clock(store, AlgorithmsConfig::default(), test_clock()).unwrap();
    assert_eq!(service.storage_stats().unwrap().cached_keys, 1);

    let err = service.sign_transaction("bad", b"m").unwrap_err();
    assert_eq!(ErrorCode::from(&err), ErrorCode::RecordCorrupt);
    assert!(service.sign_transaction("good", b"m").is_ok());
}

#[test]
fn test_generate_over_corrupt_record_propagates() {
    let store = MemoryKeyStore::new();
    store.corrupt("vcb");
    let service =
        ProcessService::with_clock(store, AlgorithmsConfig::default(), test_clock()).unwrap();

    let err = service.generate_key_pair_for_entity("vcb").unwrap_err();
    assert!(matches!(err, KsmError::Store(_)));
    assert_eq!(service.store().save_count(), 0);
}

#[test]
fn test_deleted_key_is_gone_from_cache_and_store() {
    let service = memory_service();
    service.generate_key_pair_for_entity("vcb").unwrap();

    assert!(service.delete_key_pair("vcb").unwrap());
    assert!(!service.store().exists("vcb"));
    assert!(service.get_key_pair("vcb").unwrap().is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_sign_verify_round_trip(id in common::entity_id(), msg in common::message()) {
        let service = memory_service();
        service.generate_key_pair_for_entity(&id).unwrap();

        let signature = service.sign_transaction(&id, msg.as_bytes()).unwrap();
        prop_assert!(service.verify_transaction(&id, msg.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn prop_encrypt_decrypt_round_trip(id in common::entity_id(), msg in common::message()) {
        let service = memory_service();
        service.generate_key_pair_for_entity(&id).unwrap();

        let ciphertext = service.encrypt_sensitive_data(&id, msg.as_bytes()).unwrap();
        let plaintext = service.decrypt_sensitive_data(&id, &ciphertext).unwrap();
        prop_assert_eq!(plaintext, msg.into_bytes());
    }
}
