//! Persistent key storage.
//!
//! - A trait-based interface for pluggable storage backends
//! - A file-based implementation keeping one TOML record per entity
//! - Private keys wrapped with AES-256-CBC under a process-wide master key
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── master.key            32 raw bytes, 0600
//! └── keys/                 0700
//!     ├── vietcombank.toml  0600
//!     └── vietinbank.toml   0600
//! ```
//!
//! # Security Properties
//!
//! - **Wrap before persist**: private keys never reach disk unwrapped
//! - **Restricted permissions**: directories 0700, files 0600
//! - **Atomic writes**: uniquely named temp file, fsync, rename
//! - **Master key stability**: an existing master key is never regenerated
//! - **Master key publication**: a new master key is written to a temp file
//!   and hard-linked into place, so `master.key` is either absent or complete
//!
//! # Example
//!
//! ```no_run
//! use ksm_core::Algorithm;
//! use ksm_crypto::keypair::KeyPair;
//! use ksm_crypto::store::{FileKeyStore, KeyStore};
//!
//! let store = FileKeyStore::initialize("./ksm-data").expect("storage init failed");
//! let kp = KeyPair::generate(Algorithm::Dilithium3);
//! store.save("vietcombank", &kp).expect("save failed");
//!
//! let loaded = store.load("vietcombank").expect("load failed");
//! assert_eq!(loaded.as_ref(), Some(&kp));
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use ksm_core::clock::{Clock, SystemClock};
use ksm_core::error::{StoreError, StoreResult};
use ksm_core::Algorithm;

use crate::cipher;
use crate::keypair::KeyPair;
use crate::keys::MasterKey;

/// Master key file name under the storage root.
pub const MASTER_KEY_FILE: &str = "master.key";

/// Record directory name under the storage root.
pub const KEYS_DIR: &str = "keys";

/// Record file extension.
pub const RECORD_EXTENSION: &str = "toml";

// ============================================================================
// KeyStore Trait
// ============================================================================

/// Trait for per-entity key pair storage.
///
/// Implementations must ensure:
/// - Private keys are wrapped at rest
/// - A concurrent reader never observes a partially written record
/// - Thread-safe operations (`Send + Sync`)
pub trait KeyStore: Send + Sync {
    /// Writes the record for `entity_id`, replacing any previous one.
    ///
    /// # Errors
    /// - `StoreError::InvalidEntityId` if the id cannot name a record
    /// - `StoreError::Wrap` if the private key cannot be wrapped
    /// - `StoreError::IoError` if file operations fail
    fn save(&self, entity_id: &str, key_pair: &KeyPair) -> StoreResult<()>;

    /// Reads and unwraps the record for `entity_id`.
    ///
    /// Returns `Ok(None)` when no record exists.
    ///
    /// # Errors
    /// - `StoreError::InvalidEntityId` if the id cannot name a record
    /// - `StoreError::RecordCorrupt` if the record fails to parse or unwrap
    /// - `StoreError::IoError` if file operations fail
    fn load(&self, entity_id: &str) -> StoreResult<Option<KeyPair>>;

    /// Removes the record for `entity_id`.
    ///
    /// Returns `true` iff a record existed and was removed.
    ///
    /// # Errors
    /// - `StoreError::InvalidEntityId` if the id cannot name a record
    /// - `StoreError::IoError` if file operations fail
    fn delete(&self, entity_id: &str) -> StoreResult<bool>;

    /// Returns `true` if a record exists. Invalid ids return `false`.
    fn exists(&self, entity_id: &str) -> bool;

    /// All stored entity ids, sorted.
    ///
    /// # Errors
    /// - `StoreError::IoError` if directory operations fail
    fn list(&self) -> StoreResult<Vec<String>>;

    /// Storage usage summary.
    ///
    /// # Errors
    /// - `StoreError::IoError` if directory operations fail
    fn stats(&self) -> StoreResult<StorageStats>;

    /// Loads every record, skipping (and logging) any that fail.
    ///
    /// # Errors
    /// - `StoreError::IoError` if the record directory cannot be listed
    fn load_all(&self) -> StoreResult<BTreeMap<String, KeyPair>> {
        let mut loaded = BTreeMap::new();

        for entity_id in self.list()? {
            match self.load(&entity_id) {
                Ok(Some(key_pair)) => {
                    loaded.insert(entity_id, key_pair);
                }
                Ok(None) => {
                    debug!(entity_id = %entity_id, "record vanished during load_all");
                }
                Err(e) => {
                    warn!(entity_id = %entity_id, error = %e, "skipping unreadable key record");
                }
            }
        }

        Ok(loaded)
    }
}

/// Storage usage summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Storage root.
    pub root: PathBuf,
    /// Number of entity records.
    pub record_count: usize,
    /// Whether `master.key` is on disk.
    pub master_key_present: bool,
    /// Bytes used by the master key and all records.
    pub total_bytes: u64,
}

// ============================================================================
// StoredKeyRecord
// ============================================================================

/// On-disk form of one entity's key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredKeyRecord {
    /// Owning entity.
    pub entity_id: String,
    /// Algorithm identifier (e.g. `DILITHIUM3`).
    pub algorithm: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Base64 public key.
    pub public_key: String,
    /// Public key length in bytes.
    pub public_key_size: usize,
    /// Base64 of `iv || ciphertext` of the wrapped private key.
    pub private_key_encrypted: String,
}

// ============================================================================
// FileKeyStore Implementation
// ============================================================================

/// File-backed key store rooted at a storage directory.
pub struct FileKeyStore {
    root: PathBuf,
    keys_dir: PathBuf,
    master_key: MasterKey,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyStore")
            .field("root", &self.root)
            .field("master_key", &self.master_key)
            .finish_non_exhaustive()
    }
}

impl FileKeyStore {
    /// Prepares the storage root and loads or creates the master key.
    ///
    /// Must complete before any other store operation. On first run this
    /// writes `master.key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Init`] if a directory cannot be created, or the
    /// master key cannot be read, written, or has the wrong length.
    pub fn initialize(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::initialize_with_clock(root, Arc::new(SystemClock))
    }

    /// Like [`initialize`](Self::initialize), stamping records with `clock`.
    ///
    /// # Errors
    ///
    /// See [`initialize`](Self::initialize).
    pub fn initialize_with_clock(
        root: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let keys_dir = root.join(KEYS_DIR);

        create_private_dir(&root)?;
        create_private_dir(&keys_dir)?;

        let master_key = load_or_create_master_key(&root.join(MASTER_KEY_FILE))?;

        info!(root = %root.display(), "key store initialized");

        Ok(Self {
            root,
            keys_dir,
            master_key,
            clock,
        })
    }

    /// Storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record directory.
    #[must_use]
    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    fn record_path(&self, entity_id: &str) -> PathBuf {
        self.keys_dir
            .join(format!("{entity_id}.{RECORD_EXTENSION}"))
    }

    /// Validate an entity id.
    ///
    /// Valid ids:
    /// - Are not empty
    /// - Contain only ASCII alphanumerics, hyphens and underscores
    /// - Do not start with a dot (reserved for temp files)
    fn validate_entity_id(entity_id: &str) -> StoreResult<()> {
        let valid = !entity_id.is_empty()
            && !entity_id.starts_with('.')
            && entity_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(())
        } else {
            Err(StoreError::invalid_entity_id(entity_id))
        }
    }

    fn to_record(&self, entity_id: &str, key_pair: &KeyPair) -> StoreResult<StoredKeyRecord> {
        let wrapped = cipher::encrypt(self.master_key.as_bytes(), key_pair.private_key())
            .map_err(StoreError::Wrap)?;

        Ok(StoredKeyRecord {
            entity_id: entity_id.to_string(),
            algorithm: key_pair.algorithm().id().to_string(),
            created_at: self.clock.now_millis(),
            public_key: BASE64.encode(key_pair.public_key()),
            public_key_size: key_pair.public_key().len(),
            private_key_encrypted: BASE64.encode(wrapped),
        })
    }

    fn from_record(&self, entity_id: &str, record: &StoredKeyRecord) -> StoreResult<KeyPair> {
        let corrupt = |context: String| StoreError::record_corrupt(entity_id, context);

        if record.entity_id != entity_id {
            return Err(corrupt(format!(
                "record names entity {:?}",
                record.entity_id
            )));
        }

        let algorithm: Algorithm = record
            .algorithm
            .parse()
            .map_err(|_| corrupt(format!("unknown algorithm {:?}", record.algorithm)))?;

        let public_key = BASE64
            .decode(&record.public_key)
            .map_err(|e| corrupt(format!("public key is not base64: {e}")))?;

        if public_key.len() != record.public_key_size {
            return Err(corrupt(format!(
                "public key has {} bytes, record says {}",
                public_key.len(),
                record.public_key_size
            )));
        }

        let wrapped = BASE64
            .decode(&record.private_key_encrypted)
            .map_err(|e| corrupt(format!("wrapped private key is not base64: {e}")))?;

        let private_key = Zeroizing::new(
            cipher::decrypt(self.master_key.as_bytes(), &wrapped)
                .map_err(|e| corrupt(format!("cannot unwrap private key: {e}")))?,
        );

        KeyPair::new(algorithm, public_key, private_key).map_err(|e| corrupt(e.to_string()))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> StoreResult<()> {
        let temp_path = sibling_temp_path(path);

        let result = (|| -> StoreResult<()> {
            {
                let mut file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&temp_path)?;
                file.write_all(contents)?;
                file.sync_all()?;
            }

            set_mode(&temp_path, 0o600)?;
            fs::rename(&temp_path, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl KeyStore for FileKeyStore {
    fn save(&self, entity_id: &str, key_pair: &KeyPair) -> StoreResult<()> {
        Self::validate_entity_id(entity_id)?;

        let record = self.to_record(entity_id, key_pair)?;
        let text = toml::to_string_pretty(&record)
            .map_err(|e| StoreError::record_corrupt(entity_id, format!("serialize: {e}")))?;

        let path = self.record_path(entity_id);
        self.write_atomic(&path, text.as_bytes())?;

        debug!(
            entity_id = %entity_id,
            algorithm = %key_pair.algorithm(),
            path = %path.display(),
            "key record saved"
        );
        Ok(())
    }

    fn load(&self, entity_id: &str) -> StoreResult<Option<KeyPair>> {
        Self::validate_entity_id(entity_id)?;

        let path = self.record_path(entity_id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(StoreError::record_corrupt(entity_id, "record is not UTF-8"));
            }
            Err(e) => return Err(e.into()),
        };

        let record: StoredKeyRecord = toml::from_str(&text)
            .map_err(|e| StoreError::record_corrupt(entity_id, format!("invalid record: {e}")))?;

        self.from_record(entity_id, &record).map(Some)
    }

    fn delete(&self, entity_id: &str) -> StoreResult<bool> {
        Self::validate_entity_id(entity_id)?;

        let path = self.record_path(entity_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(entity_id = %entity_id, path = %path.display(), "key record deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, entity_id: &str) -> bool {
        if Self::validate_entity_id(entity_id).is_err() {
            return false;
        }
        self.record_path(entity_id).is_file()
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.keys_dir)? {
            let path = entry?.path();

            if !path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if Self::validate_entity_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn stats(&self) -> StoreResult<StorageStats> {
        let master_path = self.root.join(MASTER_KEY_FILE);
        let (master_key_present, mut total_bytes) = match fs::metadata(&master_path) {
            Ok(meta) => (true, meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => (false, 0),
            Err(e) => return Err(e.into()),
        };

        let ids = self.list()?;
        for id in &ids {
            match fs::metadata(self.record_path(id)) {
                Ok(meta) => total_bytes += meta.len(),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(StorageStats {
            root: self.root.clone(),
            record_count: ids.len(),
            master_key_present,
            total_bytes,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn create_private_dir(dir: &Path) -> StoreResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        StoreError::init_io(format!("cannot create directory {}", dir.display()), e)
    })?;
    set_mode(dir, 0o700).map_err(|e| match e {
        StoreError::IoError(io) => StoreError::init_io(
            format!("cannot set permissions on {}", dir.display()),
            io,
        ),
        other => StoreError::init(format!(
            "cannot set permissions on {}: {other}",
            dir.display()
        )),
    })
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> StoreResult<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> StoreResult<()> {
    Ok(())
}

/// Uniquely named hidden temp file next to `path`.
fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut suffix = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut suffix);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{}.tmp", hex::encode(suffix)))
}

fn load_or_create_master_key(path: &Path) -> StoreResult<MasterKey> {
    match read_existing_master_key(path)? {
        Some(bytes) if bytes.is_empty() => reclaim_empty_master_key(path)?,
        Some(bytes) => return read_master_key(path, &bytes),
        None => {}
    }

    let key = MasterKey::generate();
    if !publish_master_key(path, &key)? {
        // Another process published first.
        return match read_existing_master_key(path)? {
            Some(bytes) => read_master_key(path, &bytes),
            None => Err(StoreError::init(format!(
                "master key {} vanished during creation",
                path.display()
            ))),
        };
    }

    info!(
        target: "ksm::security",
        event = "master_key_generated",
        path = %path.display(),
        "generated new master key"
    );
    Ok(key)
}

fn read_existing_master_key(path: &Path) -> StoreResult<Option<Zeroizing<Vec<u8>>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(Zeroizing::new(bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::init_io(
            format!("cannot read master key {}", path.display()),
            e,
        )),
    }
}

/// Writes `key` to a private temp file and hard-links it to `path`.
///
/// Returns `false` without touching `path` if it already exists.
fn publish_master_key(path: &Path, key: &MasterKey) -> StoreResult<bool> {
    let io_err = |e: std::io::Error| {
        StoreError::init_io(format!("cannot write master key {}", path.display()), e)
    };
    let temp_path = sibling_temp_path(path);

    let result = (|| -> StoreResult<bool> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(io_err)?;
        set_mode(&temp_path, 0o600)
            .map_err(|e| StoreError::init(format!("cannot protect {}: {e}", temp_path.display())))?;
        file.write_all(key.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        match fs::hard_link(&temp_path, path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(io_err(e)),
        }
    })();

    let _ = fs::remove_file(&temp_path);
    result
}

/// Moves an empty `master.key` aside so a new key can be published.
///
/// An empty file never held a key, so no record can be wrapped under it.
/// The file is claimed by rename; if a complete key was published in the
/// meantime it is linked back instead of being discarded.
fn reclaim_empty_master_key(path: &Path) -> StoreResult<()> {
    let io_err = |e: std::io::Error| {
        StoreError::init_io(format!("cannot replace empty master key {}", path.display()), e)
    };
    let claimed = sibling_temp_path(path);

    match fs::rename(path, &claimed) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_err(e)),
    }

    if fs::metadata(&claimed).map_err(io_err)?.len() == 0 {
        warn!(path = %path.display(), "replacing empty master key file");
        let _ = fs::remove_file(&claimed);
        return Ok(());
    }

    match fs::hard_link(&claimed, path) {
        Ok(()) => {
            let _ = fs::remove_file(&claimed);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::init(format!(
            "conflicting master keys created for {}; displaced key kept at {}",
            path.display(),
            claimed.display()
        ))),
        Err(e) => Err(io_err(e)),
    }
}

fn read_master_key(path: &Path, bytes: &[u8]) -> StoreResult<MasterKey> {
    MasterKey::from_slice(bytes).map_err(|e| {
        StoreError::init(format!(
            "refusing to use master key {}: {e}",
            path.display()
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
