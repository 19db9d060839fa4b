// ============================================
// File: crates/peerlink-node/src/directory/resolver.rs
// ============================================
//! # Key Resolver
//!
//! ## Creation Reason
//! Every handshake and every inbound message needs the counterpart's public
//! key. Asking the directory each time is slow and makes the directory a
//! hard dependency of every message, so keys are cached locally.
//!
//! ## Main Logical Flow
//! ```text
//! resolve(peer)
//!   ├── cache hit  ─────────────────────────► key
//!   └── cache miss ─► directory GETKEY
//!                        ├── KEY      ─► cache.put ─► key
//!                        └── NOTFOUND ─► UnknownPeer (not cached)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Misses are never cached; a peer registering later must become
//!   resolvable without restarting anyone
//! - A cached key is never refreshed. A peer that re-registers with a new
//!   key stays stale in existing caches
//!
//! ## Last Modified
//! v0.1.0 - Initial key resolver

use std::sync::Arc;

use peerlink_common::types::PeerId;
use peerlink_core::crypto::PublicKey;
use tracing::{debug, info, warn};

use crate::directory::client::DirectoryClient;
use crate::directory::store::KeyStore;
use crate::error::{NodeError, Result};

/// Cache-first public key lookup.
pub struct KeyResolver {
    cache: Arc<dyn KeyStore>,
    directory: Arc<dyn DirectoryClient>,
}

impl KeyResolver {
    /// Creates a resolver over a local cache and a directory client.
    pub fn new(cache: Arc<dyn KeyStore>, directory: Arc<dyn DirectoryClient>) -> Self {
        Self { cache, directory }
    }

    /// Resolves `peer`'s public key.
    ///
    /// # Errors
    /// - [`NodeError::UnknownPeer`] if the directory has no key
    /// - Directory transport or protocol errors on a cache miss
    pub async fn resolve(&self, peer: &PeerId) -> Result<PublicKey> {
        if let Some(key) = self.cache.get(peer) {
            debug!(peer = %peer, "Key cache hit");
            return Ok(key);
        }

        match self.directory.lookup(peer).await? {
            Some(key) => {
                if let Err(e) = self.cache.put(peer, key) {
                    // The key is still valid for this call
                    warn!(peer = %peer, error = %e, "Failed to cache key");
                }
                info!(peer = %peer, key = %key, "Fetched key from directory");
                Ok(key)
            }
            None => Err(NodeError::UnknownPeer(peer.clone())),
        }
    }

    /// Publishes `key` as `peer`'s key.
    ///
    /// # Errors
    /// Directory transport or protocol errors.
    pub async fn register(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
        self.directory.register(peer, key).await?;
        info!(peer = %peer, key = %key, "Registered with directory");
        Ok(())
    }

    /// Returns the cached entries.
    #[must_use]
    pub fn cached(&self) -> Vec<(PeerId, PublicKey)> {
        self.cache.entries()
    }
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("cached", &self.cache.entries().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::store::MemoryKeyStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Directory fake that counts lookups.
    #[derive(Default)]
    struct FakeDirectory {
        keys: Mutex<HashMap<PeerId, PublicKey>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl DirectoryClient for FakeDirectory {
        async fn register(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
            self.keys.lock().insert(peer.clone(), key);
            Ok(())
        }

        async fn lookup(&self, peer: &PeerId) -> Result<Option<PublicKey>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.lock().get(peer).copied())
        }
    }

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    fn setup() -> (KeyResolver, Arc<FakeDirectory>, Arc<MemoryKeyStore>) {
        let directory = Arc::new(FakeDirectory::default());
        let cache = Arc::new(MemoryKeyStore::new());
        let resolver = KeyResolver::new(cache.clone(), directory.clone());
        (resolver, directory, cache)
    }

    #[tokio::test]
    async fn test_resolve_caches_hits() {
        let (resolver, directory, cache) = setup();
        let bob = PublicKey::new(12_317, 17);
        directory.register(&peer("Bob"), bob).await.unwrap();

        assert_eq!(resolver.resolve(&peer("Bob")).await.unwrap(), bob);
        assert_eq!(resolver.resolve(&peer("Bob")).await.unwrap(), bob);
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&peer("Bob")), Some(bob));
    }

    #[tokio::test]
    async fn test_miss_is_not_cached() {
        let (resolver, directory, cache) = setup();

        let err = resolver.resolve(&peer("Charlie")).await.unwrap_err();
        assert!(matches!(err, NodeError::UnknownPeer(ref p) if p.as_str() == "Charlie"));
        assert!(cache.entries().is_empty());

        // Registering later makes the peer resolvable
        let charlie = PublicKey::new(11_663, 19);
        directory.register(&peer("Charlie"), charlie).await.unwrap();
        assert_eq!(resolver.resolve(&peer("Charlie")).await.unwrap(), charlie);
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_key_is_not_refreshed() {
        let (resolver, directory, _cache) = setup();
        directory.register(&peer("Bob"), PublicKey::new(12_317, 17)).await.unwrap();
        resolver.resolve(&peer("Bob")).await.unwrap();

        directory.register(&peer("Bob"), PublicKey::new(14_351, 19)).await.unwrap();
        assert_eq!(
            resolver.resolve(&peer("Bob")).await.unwrap(),
            PublicKey::new(12_317, 17)
        );
    }

    #[tokio::test]
    async fn test_register_goes_to_directory() {
        let (resolver, directory, cache) = setup();
        resolver.register(&peer("Alice"), PublicKey::new(11_021, 17)).await.unwrap();
        assert!(directory.keys.lock().contains_key(&peer("Alice")));
        assert!(cache.entries().is_empty());
        assert!(resolver.cached().is_empty());
    }
}
