// ============================================
// File: crates/peerlink-node/src/testing.rs
// ============================================
//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use peerlink_common::types::PeerId;
use peerlink_core::crypto::keys::{DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT};
use peerlink_core::crypto::{DefaultHandshakeCrypto, KeyPair, PublicKey};
use peerlink_transport::Timeouts;

use crate::directory::{DirectoryClient, KeyResolver, MemoryKeyStore};
use crate::error::Result;

/// In-process directory.
#[derive(Default)]
pub struct StaticDirectory {
    keys: Mutex<HashMap<PeerId, PublicKey>>,
}

impl StaticDirectory {
    pub fn with(self, peer: &PeerId, key: PublicKey) -> Self {
        self.keys.lock().insert(peer.clone(), key);
        self
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn register(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
        self.keys.lock().insert(peer.clone(), key);
        Ok(())
    }

    async fn lookup(&self, peer: &PeerId) -> Result<Option<PublicKey>> {
        Ok(self.keys.lock().get(peer).copied())
    }
}

pub fn peer(name: &str) -> PeerId {
    PeerId::new(name).unwrap()
}

pub fn crypto() -> Arc<DefaultHandshakeCrypto> {
    Arc::new(DefaultHandshakeCrypto::new(
        KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap(),
    ))
}

/// Resolver whose directory knows every `(peer, key)` pair.
pub fn resolver(known: &[(&PeerId, PublicKey)]) -> Arc<KeyResolver> {
    let directory = known
        .iter()
        .fold(StaticDirectory::default(), |dir, (peer, key)| dir.with(peer, *key));
    Arc::new(KeyResolver::new(
        Arc::new(MemoryKeyStore::new()),
        Arc::new(directory),
    ))
}

pub fn short() -> Timeouts {
    Timeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(500),
    }
}
