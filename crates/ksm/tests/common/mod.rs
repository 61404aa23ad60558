//! # Test Utilities for `ksm`
//!
//! Shared helpers for integration tests.
//!
//! ## Functions
//!
//! - [`temp_data_dir`] - Create an isolated temporary storage root
//! - [`open_service`] - Open a file-backed orchestrator on a storage root
//! - [`open_api`] - Open a file-backed API on a storage root
//!
//! ## Types
//!
//! - [`MemoryKeyStore`] - In-memory store with corruption injection
//! - [`GatedKeyStore`] - Store whose next `load` pauses until released
//!
//! ## Proptest Strategies
//!
//! - [`entity_id`] - Valid entity identifiers
//! - [`message`] - Arbitrary UTF-8 message text

#![allow(dead_code)]
// Allow expect() in test utilities since panicking on setup failures is acceptable in tests
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use tempfile::TempDir;

use ksm::api::KsmApi;
use ksm::process::ProcessService;
use ksm_core::config::AlgorithmsConfig;
use ksm_core::error::{StoreError, StoreResult};
use ksm_core::{Algorithm, FixedClock};
use ksm_crypto::{FileKeyStore, KeyPair, KeyStore, StorageStats};

/// Fixed test time: 2023-11-14T22:13:20Z.
pub const TEST_NOW: i64 = 1_700_000_000_000;

/// Create an isolated temporary directory for test data.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn temp_data_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("ksm-test-")
        .tempdir()
        .expect("failed to create temp dir")
}

/// A fixed clock shared between store, orchestrator and API.
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(TEST_NOW))
}

/// Open a file-backed orchestrator on `root` with default algorithms.
///
/// Calling this twice on the same root simulates a process restart.
pub fn open_service(root: &Path, clock: &Arc<FixedClock>) -> ProcessService<FileKeyStore> {
    let store = FileKeyStore::initialize_with_clock(root, clock.clone())
        .expect("failed to initialize store");
    ProcessService::with_clock(store, AlgorithmsConfig::default(), clock.clone())
        .expect("failed to create service")
}

/// Open a file-backed API on `root`.
pub fn open_api(root: &Path, clock: &Arc<FixedClock>) -> KsmApi<FileKeyStore> {
    KsmApi::with_clock(Arc::new(open_service(root, clock)), clock.clone())
}

// ============================================================================
// MemoryKeyStore
// ============================================================================

struct StoredPair {
    algorithm: Algorithm,
    public_key: Vec<u8>,
    private_key: Vec<u8>,
}

/// In-memory [`KeyStore`] that can mark records as corrupt.
#[derive(Default)]
pub struct MemoryKeyStore {
    records: Mutex<BTreeMap<String, StoredPair>>,
    corrupt: Mutex<HashSet<String>>,
    saves: AtomicUsize,
}

impl MemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `load` of `entity_id` fail with `RecordCorrupt`.
    pub fn corrupt(&self, entity_id: &str) {
        self.corrupt
            .lock()
            .expect("lock poisoned")
            .insert(entity_id.to_string());
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&self, entity_id: &str, key_pair: &KeyPair) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.records.lock().expect("lock poisoned").insert(
            entity_id.to_string(),
            StoredPair {
                algorithm: key_pair.algorithm(),
                public_key: key_pair.public_key().to_vec(),
                private_key: key_pair.private_key().to_vec(),
            },
        );
        Ok(())
    }

    fn load(&self, entity_id: &str) -> StoreResult<Option<KeyPair>> {
        if self.corrupt.lock().expect("lock poisoned").contains(entity_id) {
            return Err(StoreError::record_corrupt(entity_id, "injected corruption"));
        }
        let records = self.records.lock().expect("lock poisoned");
        records
            .get(entity_id)
            .map(|r| {
                KeyPair::new(r.algorithm, r.public_key.clone(), r.private_key.clone())
                    .map_err(StoreError::Wrap)
            })
            .transpose()
    }

    fn delete(&self, entity_id: &str) -> StoreResult<bool> {
        Ok(self
            .records
            .lock()
            .expect("lock poisoned")
            .remove(entity_id)
            .is_some())
    }

    fn exists(&self, entity_id: &str) -> bool {
        self.records
            .lock()
            .expect("lock poisoned")
            .contains_key(entity_id)
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .records
            .lock()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn stats(&self) -> StoreResult<StorageStats> {
        let records = self.records.lock().expect("lock poisoned");
        let total_bytes = records
            .values()
            .map(|r| (r.public_key.len() + r.private_key.len()) as u64)
            .sum();
        Ok(StorageStats {
            root: PathBuf::from("memory"),
            record_count: records.len(),
            master_key_present: true,
            total_bytes,
        })
    }
}

// ============================================================================
// GatedKeyStore
// ============================================================================

/// How long a gated `load` waits for [`GatedKeyStore::release`].
const GATE_TIMEOUT: Duration = Duration::from_secs(5);

/// [`MemoryKeyStore`] whose next `load` after [`arm`](Self::arm) reads the
/// record, signals, and then blocks until [`release`](Self::release).
pub struct GatedKeyStore {
    inner: MemoryKeyStore,
    armed: AtomicBool,
    entered_tx: Mutex<Sender<()>>,
    entered_rx: Mutex<Receiver<()>>,
    release_tx: Mutex<Sender<()>>,
    release_rx: Mutex<Receiver<()>>,
}

impl GatedKeyStore {
    /// Create an empty, unarmed store.
    pub fn new() -> Self {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        Self {
            inner: MemoryKeyStore::new(),
            armed: AtomicBool::new(false),
            entered_tx: Mutex::new(entered_tx),
            entered_rx: Mutex::new(entered_rx),
            release_tx: Mutex::new(release_tx),
            release_rx: Mutex::new(release_rx),
        }
    }

    /// Pause the next `load`.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Block until a gated `load` has read its record.
    pub fn wait_until_loading(&self) {
        self.entered_rx
            .lock()
            .expect("lock poisoned")
            .recv_timeout(GATE_TIMEOUT)
            .expect("gated load never started");
    }

    /// Let the paused `load` return.
    pub fn release(&self) {
        self.release_tx
            .lock()
            .expect("lock poisoned")
            .send(())
            .expect("gate receiver dropped");
    }
}

impl Default for GatedKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for GatedKeyStore {
    fn save(&self, entity_id: &str, key_pair: &KeyPair) -> StoreResult<()> {
        self.inner.save(entity_id, key_pair)
    }

    fn load(&self, entity_id: &str) -> StoreResult<Option<KeyPair>> {
        let loaded = self.inner.load(entity_id);
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered_tx
                .lock()
                .expect("lock poisoned")
                .send(())
                .expect("gate receiver dropped");
            // A timeout only means the test moved on; the load still completes.
            let _ = self
                .release_rx
                .lock()
                .expect("lock poisoned")
                .recv_timeout(GATE_TIMEOUT);
        }
        loaded
    }

    fn delete(&self, entity_id: &str) -> StoreResult<bool> {
        self.inner.delete(entity_id)
    }

    fn exists(&self, entity_id: &str) -> bool {
        self.inner.exists(entity_id)
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        self.inner.list()
    }

    fn stats(&self) -> StoreResult<StorageStats> {
        self.inner.stats()
    }
}

// ============================================================================
// Proptest Strategies
// ============================================================================

/// Generate valid entity identifiers.
pub fn entity_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9_-]{0,31}"
}

/// Generate arbitrary UTF-8 message text.
pub fn message() -> impl Strategy<Value = String> {
    any::<String>()
}
