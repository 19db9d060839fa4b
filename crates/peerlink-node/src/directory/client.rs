// ============================================
// File: crates/peerlink-node/src/directory/client.rs
// ============================================
//! # Directory Client
//!
//! ## Creation Reason
//! Peers publish their public key to, and fetch counterpart keys from, the
//! directory service. The trait lets the resolver run against a fake in
//! tests.
//!
//! ## Main Functionality
//! - `DirectoryClient`: `register` / `lookup`
//! - `TcpDirectoryClient`: One TCP connection per request, bounded waits
//!
//! ## Main Logical Flow
//! 1. Connect to the directory within the connect bound
//! 2. Write one request line
//! 3. Read one reply line within the read bound
//! 4. Map the reply: `OK`, `KEY`, `NOTFOUND`, anything else is a protocol
//!    error
//!
//! ## Last Modified
//! v0.1.0 - Initial directory client

use std::net::SocketAddr;

use async_trait::async_trait;
use peerlink_common::types::PeerId;
use peerlink_core::crypto::PublicKey;
use peerlink_core::protocol::{DirectoryRequest, DirectoryResponse, LineCodec};
use peerlink_transport::{LineConnection, LineTransport, Timeouts};
use tracing::{debug, warn};

use crate::error::{NodeError, Result};

// ============================================
// DirectoryClient Trait
// ============================================

/// Two-operation contract of the key directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Registers or overwrites the key of `peer`.
    ///
    /// # Errors
    /// `DirectoryUnreachable`, `Timeout` or `DirectoryProtocol`.
    async fn register(&self, peer: &PeerId, key: PublicKey) -> Result<()>;

    /// Looks up the key of `peer`; `Ok(None)` when none is registered.
    ///
    /// # Errors
    /// `DirectoryUnreachable`, `Timeout` or `DirectoryProtocol`.
    async fn lookup(&self, peer: &PeerId) -> Result<Option<PublicKey>>;
}

// ============================================
// TcpDirectoryClient
// ============================================

/// Directory client speaking the line protocol over TCP.
#[derive(Debug, Clone)]
pub struct TcpDirectoryClient {
    addr: SocketAddr,
    timeouts: Timeouts,
    codec: LineCodec,
}

impl TcpDirectoryClient {
    /// Creates a client for the directory at `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr, timeouts: Timeouts) -> Self {
        Self {
            addr,
            timeouts,
            codec: LineCodec::new(),
        }
    }

    /// Returns the directory address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn exchange(&self, request: &DirectoryRequest) -> Result<DirectoryResponse> {
        let mut conn = LineConnection::connect(self.addr, self.timeouts)
            .await
            .map_err(NodeError::from_directory_transport)?;
        conn.write_frame(&self.codec.to_bytes(request))
            .await
            .map_err(NodeError::from_directory_transport)?;
        let line = conn
            .expect_line()
            .await
            .map_err(NodeError::from_directory_transport)?;
        conn.shutdown().await;

        self.codec
            .from_lines(&[line])
            .map_err(|e| NodeError::directory_protocol(e.to_string()))
    }
}

#[async_trait]
impl DirectoryClient for TcpDirectoryClient {
    async fn register(&self, peer: &PeerId, key: PublicKey) -> Result<()> {
        let request = DirectoryRequest::Register {
            peer: peer.clone(),
            key,
        };
        match self.exchange(&request).await? {
            DirectoryResponse::Ok => {
                debug!(peer = %peer, key = %key, "Registered with directory");
                Ok(())
            }
            DirectoryResponse::Error => {
                Err(NodeError::directory_protocol("directory rejected the registration"))
            }
            other => Err(NodeError::directory_protocol(format!(
                "unexpected reply to REGISTER: {other:?}"
            ))),
        }
    }

    async fn lookup(&self, peer: &PeerId) -> Result<Option<PublicKey>> {
        let request = DirectoryRequest::GetKey { peer: peer.clone() };
        match self.exchange(&request).await? {
            DirectoryResponse::Key { peer: found, key } if found == *peer => {
                debug!(peer = %peer, key = %key, "Directory lookup hit");
                Ok(Some(key))
            }
            DirectoryResponse::Key { peer: found, .. } => {
                warn!(requested = %peer, returned = %found, "Directory answered for another identity");
                Err(NodeError::directory_protocol(format!(
                    "asked for '{peer}', directory answered for '{found}'"
                )))
            }
            DirectoryResponse::NotFound => {
                debug!(peer = %peer, "Directory lookup miss");
                Ok(None)
            }
            DirectoryResponse::Error => {
                Err(NodeError::directory_protocol("directory rejected the lookup"))
            }
            DirectoryResponse::Ok => {
                Err(NodeError::directory_protocol("unexpected reply to GETKEY: OK"))
            }
        }
    }
}

// ============================================
// Tests
// ============================================
