// ============================================
// File: crates/peerlink-node/src/directory/store.rs
// ============================================
//! # Key Stores
//!
//! ## Creation Reason
//! Both the directory service and every peer's local key cache are plain
//! identity → public key maps. One trait serves both so the storage can be
//! swapped between memory and a JSON file.
//!
//! ## Main Functionality
//! - `KeyStore`: get / put / entries
//! - `MemoryKeyStore`: `RwLock<HashMap>`, used by the directory and tests
//! - `FileKeyStore`: JSON keyring loaded at open, rewritten on every put
//!
//! ## File Format
//! ```json
//! {
//!   "Bob": [12317, 17],
//!   "Charlie": [11663, 19]
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `FileKeyStore::put` holds its mutex across the file rewrite so two
//!   concurrent writers cannot interleave partial files
//!
//! ## Last Modified
//! v0.1.0 - Initial key stores

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use peerlink_common::types::PeerId;
use peerlink_core::crypto::PublicKey;
use tracing::{debug, info};

use crate::error::{NodeError, Result};

// ============================================
// KeyStore Trait
// ============================================

/// Identity → public key storage.
pub trait KeyStore: Send + Sync {
    /// Returns the stored key of `peer`.
    fn get(&self, peer: &PeerId) -> Option<PublicKey>;

    /// Stores or overwrites the key of `peer`.
    ///
    /// # Errors
    /// Persistence failures.
    fn put(&self, peer: &PeerId, key: PublicKey) -> Result<()>;

    /// Returns every entry, ordered by identity.
    fn entries(&self) -> Vec<(PeerId, PublicKey)>;
}

// ============================================
// MemoryKeyStore
// ============================================

/// In-memory key store.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<PeerId, PublicKey>>,
}

impl MemoryKeyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, peer: &PeerId) -> Option<PublicKey> {
        self.keys.read().get(peer).copied()
    }

    fn put(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
        self.keys.write().insert(peer.clone(), key);
        Ok(())
    }

    fn entries(&self) -> Vec<(PeerId, PublicKey)> {
        let mut entries: Vec<_> = self
            .keys
            .read()
            .iter()
            .map(|(peer, key)| (peer.clone(), *key))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// ============================================
// FileKeyStore
// ============================================

type KeyringFile = BTreeMap<PeerId, (u64, u64)>;

/// JSON-file-backed key store.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    keys: Mutex<BTreeMap<PeerId, PublicKey>>,
}

impl FileKeyStore {
    /// Opens `path`, loading existing entries. A missing file is an empty
    /// keyring.
    ///
    /// # Errors
    /// [`NodeError::KeyStore`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let shown = path.display().to_string();

        let keys = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| NodeError::key_store(&shown, e))?;
            let file: KeyringFile = serde_json::from_str(&content)
                .map_err(|e| NodeError::key_store(&shown, e))?;
            file.into_iter()
                .map(|(peer, (modulus, exponent))| (peer, PublicKey::new(modulus, exponent)))
                .collect()
        } else {
            BTreeMap::new()
        };

        info!(path = %shown, entries = keys.len(), "Keyring loaded");
        Ok(Self {
            path,
            keys: Mutex::new(keys),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, keys: &BTreeMap<PeerId, PublicKey>) -> Result<()> {
        let shown = self.path.display().to_string();
        let file: KeyringFile = keys
            .iter()
            .map(|(peer, key)| (peer.clone(), (key.modulus, key.exponent)))
            .collect();
        let content =
            serde_json::to_string_pretty(&file).map_err(|e| NodeError::key_store(&shown, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| NodeError::key_store(&shown, e))?;
        }
        std::fs::write(&self.path, content).map_err(|e| NodeError::key_store(&shown, e))
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, peer: &PeerId) -> Option<PublicKey> {
        self.keys.lock().get(peer).copied()
    }

    fn put(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
        let mut keys = self.keys.lock();
        keys.insert(peer.clone(), key);
        self.persist(&keys)?;
        debug!(peer = %peer, path = %self.path.display(), "Keyring updated");
        Ok(())
    }

    fn entries(&self) -> Vec<(PeerId, PublicKey)> {
        self.keys
            .lock()
            .iter()
            .map(|(peer, key)| (peer.clone(), *key))
            .collect()
    }
}

// ============================================
// Tests
// ============================================
