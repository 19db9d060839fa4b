// ============================================
// File: crates/peerlink-node/src/directory/server.rs
// ============================================
//! # Directory Server
//!
//! ## Creation Reason
//! Standalone identity → public key service that peers register with and
//! query before a handshake.
//!
//! ## Main Functionality
//! - `DirectoryServer`: Accept loop with graceful shutdown
//! - `DirectoryServer::handle_request`: Pure request → reply mapping
//!
//! ## Connection Lifecycle
//! ```text
//! accept ──► spawn task ──► read one line (bounded)
//!                              ├── REGISTER id n e ─► store.put ─► OK
//!                              ├── GETKEY id       ─► KEY id n e | NOTFOUND
//!                              └── anything else   ─► ERROR
//!                           ──► close
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The accept loop never awaits a connection handler
//! - Registration silently overwrites an existing key
//! - A silent client is dropped after the read timeout without a reply
//!
//! ## Last Modified
//! v0.1.0 - Initial directory server

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use peerlink_core::protocol::{DirectoryRequest, DirectoryResponse, LineCodec};
use peerlink_transport::{LineConnection, LineTransport, TcpLineListener};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::directory::store::KeyStore;
use crate::error::Result;

// ============================================
// DirectoryServer
// ============================================

/// Key directory service.
///
/// # Lifecycle
/// 1. Create with `DirectoryServer::new(store)`
/// 2. Run with `server.serve(listener).await`
/// 3. Stop with `server.shutdown()`
pub struct DirectoryServer {
    store: Arc<dyn KeyStore>,
    codec: LineCodec,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DirectoryServer {
    /// Creates a directory over `store`.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            store,
            codec: LineCodec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Serves connections from `listener` until [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    /// Currently never fails; accept errors are logged and the loop goes on.
    pub async fn serve(&self, listener: TcpLineListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        info!(addr = %listener.local_addr(), "Directory service listening");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Directory accept loop received shutdown signal");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok(conn) => {
                            let store = Arc::clone(&self.store);
                            let codec = self.codec;
                            tokio::spawn(async move {
                                Self::handle_connection(conn, store.as_ref(), codec).await;
                            });
                        }
                        Err(e) => {
                            if !self.shutdown.load(Ordering::SeqCst) {
                                error!(error = %e, "Directory accept error");
                            }
                        }
                    }
                }
            }
        }

        info!("Directory service stopped");
        Ok(())
    }

    /// Stops the accept loop. Connections in flight finish on their own.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Maps one request to its reply, applying registrations to `store`.
    pub fn handle_request(store: &dyn KeyStore, request: DirectoryRequest) -> DirectoryResponse {
        match request {
            DirectoryRequest::Register { peer, key } => match store.put(&peer, key) {
                Ok(()) => {
                    info!(peer = %peer, key = %key, "Registered public key");
                    DirectoryResponse::Ok
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Failed to store registration");
                    DirectoryResponse::Error
                }
            },
            DirectoryRequest::GetKey { peer } => match store.get(&peer) {
                Some(key) => {
                    debug!(peer = %peer, "Key lookup hit");
                    DirectoryResponse::Key { peer, key }
                }
                None => {
                    debug!(peer = %peer, "Key lookup miss");
                    DirectoryResponse::NotFound
                }
            },
        }
    }

    async fn handle_connection<S>(mut conn: LineConnection<S>, store: &dyn KeyStore, codec: LineCodec)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let addr = conn.peer_addr();
        let response = match conn.read_line().await {
            Ok(Some(line)) => match codec.from_lines::<DirectoryRequest>(&[line]) {
                Ok(request) => Self::handle_request(store, request),
                Err(e) => {
                    debug!(addr = ?addr, error = %e, "Malformed directory request");
                    DirectoryResponse::Error
                }
            },
            Ok(None) => {
                debug!(addr = ?addr, "Client closed before sending a request");
                return;
            }
            Err(e) if e.is_framing_error() => {
                debug!(addr = ?addr, error = %e, "Unreadable directory request");
                DirectoryResponse::Error
            }
            Err(e) => {
                debug!(addr = ?addr, error = %e, "Dropping directory connection");
                return;
            }
        };

        if let Err(e) = conn.write_frame(&codec.to_bytes(&response)).await {
            debug!(addr = ?addr, error = %e, "Failed to send directory reply");
        }
        conn.shutdown().await;
    }
}

impl std::fmt::Debug for DirectoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryServer")
            .field("entries", &self.store.entries().len())
            .field("shutdown", &self.shutdown.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::client::{DirectoryClient, TcpDirectoryClient};
    use crate::directory::store::MemoryKeyStore;
    use peerlink_common::types::PeerId;
    use peerlink_core::crypto::PublicKey;
    use peerlink_transport::Timeouts;
    use std::time::Duration;

    fn short() -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(500),
            read: Duration::from_millis(500),
        }
    }

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    async fn start() -> (Arc<DirectoryServer>, std::net::SocketAddr) {
        let server = Arc::new(DirectoryServer::new(Arc::new(MemoryKeyStore::new())));
        let listener = TcpLineListener::bind("127.0.0.1:0".parse().unwrap(), short())
            .await
            .unwrap();
        let addr = listener.local_addr();
        let running = Arc::clone(&server);
        tokio::spawn(async move { running.serve(listener).await });
        (server, addr)
    }

    async fn raw(addr: std::net::SocketAddr, line: &str) -> Option<String> {
        let mut conn = LineConnection::connect(addr, short()).await.unwrap();
        conn.write_line(line).await.unwrap();
        conn.read_line().await.unwrap()
    }

    #[test]
    fn test_handle_request() {
        let store = MemoryKeyStore::new();
        let key = PublicKey::new(12_317, 17);

        let reply = DirectoryServer::handle_request(&store, DirectoryRequest::GetKey { peer: peer("Bob") });
        assert_eq!(reply, DirectoryResponse::NotFound);

        let reply = DirectoryServer::handle_request(
            &store,
            DirectoryRequest::Register { peer: peer("Bob"), key },
        );
        assert_eq!(reply, DirectoryResponse::Ok);

        let reply = DirectoryServer::handle_request(&store, DirectoryRequest::GetKey { peer: peer("Bob") });
        assert_eq!(reply, DirectoryResponse::Key { peer: peer("Bob"), key });
    }

    #[tokio::test]
    async fn test_wire_commands() {
        let (server, addr) = start().await;

        assert_eq!(raw(addr, "GETKEY Bob").await.as_deref(), Some("NOTFOUND"));
        assert_eq!(raw(addr, "register Bob 12317 17").await.as_deref(), Some("OK"));
        assert_eq!(raw(addr, "GetKey Bob").await.as_deref(), Some("KEY Bob 12317 17"));

        // Overwrite
        assert_eq!(raw(addr, "REGISTER Bob 14351 19").await.as_deref(), Some("OK"));
        assert_eq!(raw(addr, "GETKEY Bob").await.as_deref(), Some("KEY Bob 14351 19"));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let (server, addr) = start().await;

        for line in [
            "REGISTER Bob 12317",
            "REGISTER Bob twelve 17",
            "GETKEY",
            "GETKEY Bob Alice",
            "DELETE Bob",
            "",
        ] {
            assert_eq!(raw(addr, line).await.as_deref(), Some("ERROR"), "request {line:?}");
        }

        server.shutdown();
    }

    #[tokio::test]
    async fn test_with_client() {
        let (server, addr) = start().await;
        let client = TcpDirectoryClient::new(addr, short());

        assert_eq!(client.lookup(&peer("Alice")).await.unwrap(), None);
        client.register(&peer("Alice"), PublicKey::new(11_021, 17)).await.unwrap();
        assert_eq!(
            client.lookup(&peer("Alice")).await.unwrap(),
            Some(PublicKey::new(11_021, 17))
        );

        server.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let server = Arc::new(DirectoryServer::new(Arc::new(MemoryKeyStore::new())));
        let listener = TcpLineListener::bind("127.0.0.1:0".parse().unwrap(), short())
            .await
            .unwrap();
        let running = Arc::clone(&server);
        let handle = tokio::spawn(async move { running.serve(listener).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
