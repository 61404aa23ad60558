//! Integration tests for concurrent access to one orchestrator.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ksm::process::ProcessService;
use ksm_core::AlgorithmsConfig;
use ksm_crypto::{KeyPair, KeyStore};

use crate::common::{open_service, temp_data_dir, test_clock, GatedKeyStore, MemoryKeyStore};

#[test]
fn test_racing_generates_yield_one_key_pair() {
    let service = Arc::new(
        ProcessService::with_clock(
            MemoryKeyStore::new(),
            AlgorithmsConfig::default(),
            test_clock(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.generate_key_pair_for_entity("vcb").unwrap())
        })
        .collect();

    let pairs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = pairs[0].fingerprint();
    assert!(pairs.iter().all(|p| p.fingerprint() == first));
    assert_eq!(service.storage_stats().unwrap().record_count, 1);
}

#[test]
fn test_parallel_sign_and_verify() {
    let dir = temp_data_dir();
    let service = Arc::new(open_service(dir.path(), &test_clock()));
    for id in ["vietcombank", "vietinbank", "bidv", "agribank"] {
        service.generate_key_pair_for_entity(id).unwrap();
    }

    let handles: Vec<_> = ["vietcombank", "vietinbank", "bidv", "agribank"]
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for n in 0..5 {
                    let message = format!("{id} batch {n}");
                    let signature = service.sign_transaction(id, message.as_bytes()).unwrap();
                    assert!(service
                        .verify_transaction(id, message.as_bytes(), &signature)
                        .unwrap());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_generate_for_distinct_entities() {
    let dir = temp_data_dir();
    let service = Arc::new(open_service(dir.path(), &test_clock()));

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .generate_key_pair_for_entity(&format!("bank-{n}"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entities = service.list_entities().unwrap();
    assert_eq!(entities.len(), 6);
    assert_eq!(service.storage_stats().unwrap().cached_keys, 6);
}

#[test]
fn test_delete_during_read_through_does_not_resurrect_key() {
    let service = Arc::new(
        ProcessService::with_clock(GatedKeyStore::new(), AlgorithmsConfig::default(), test_clock())
            .unwrap(),
    );
    // Stored but not cached, so the next lookup reads through.
    service
        .store()
        .save("vcb", &KeyPair::generate(ksm_core::Algorithm::Dilithium3))
        .unwrap();
    service.store().arm();

    let reader = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.get_key_pair("vcb").unwrap().is_some())
    };
    service.store().wait_until_loading();

    let deleter = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.delete_key_pair("vcb").unwrap())
    };
    // Give the delete a chance to run while the load is paused.
    thread::sleep(Duration::from_millis(100));
    service.store().release();

    assert!(reader.join().unwrap());
    assert!(deleter.join().unwrap());

    assert!(!service.store().exists("vcb"));
    assert!(service.get_key_pair("vcb").unwrap().is_none());
    assert_eq!(service.storage_stats().unwrap().cached_keys, 0);

    // A fresh generate persists a new record instead of reusing a stale one.
    service.generate_key_pair_for_entity("vcb").unwrap();
    assert!(service.store().exists("vcb"));
}
