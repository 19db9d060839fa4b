// ============================================
// File: crates/peerlink-node/src/node.rs
// ============================================
//! # Peer Node Orchestrator
//!
//! ## Creation Reason
//! Wires one peer together: identity, key resolution, session table,
//! handshake and messaging services, and the inbound accept loop.
//!
//! ## Main Functionality
//! - `PeerNode`: Outbound API (`register`, `initiate_handshake`,
//!   `send_message`) and the inbound `run` loop
//! - `NodeEvent`: Outcomes of inbound processing, published over mpsc
//! - `NodeStatus`: Snapshot of sessions and cached keys
//!
//! ## Node Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          PeerNode                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Accept loop (select! with shutdown)                        │
//! │     │  one task per connection                              │
//! │     ▼                                                       │
//! │  read envelope ──► HANDSHAKE ──► HandshakeService::respond  │
//! │                │                   └─► HS_OK | HS_FAIL      │
//! │                └─► DATA ──────► MessagingService::receive   │
//! │                                                             │
//! │  every outcome ──► mpsc::Sender<NodeEvent> ──► application  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The accept loop never awaits a connection handler
//! - A dropped event receiver is not an error; events are discarded
//! - Unknown tags close the connection without a reply
//!
//! ## Last Modified
//! v0.1.0 - Initial peer node

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use peerlink_common::types::PeerId;
use peerlink_core::crypto::{DefaultHandshakeCrypto, HandshakeCrypto, KeyPair, PublicKey};
use peerlink_core::error::CoreError;
use peerlink_core::protocol::{Envelope, EnvelopeKind, HandshakeAck, LineCodec};
use peerlink_transport::{LineConnection, LineTransport, TcpLineListener, Timeouts};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use crate::config::{AddressBook, NodeConfig};
use crate::directory::{FileKeyStore, KeyResolver, TcpDirectoryClient};
use crate::error::{NodeError, Result};
use crate::services::{HandshakeService, MessagingService, Session, SessionManager};

/// Capacity of the inbound event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================
// NodeEvent
// ============================================

/// Outcome of processing one inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// A counterpart completed a handshake with us.
    HandshakeAccepted {
        /// Initiator
        from: PeerId,
    },
    /// An inbound handshake was answered with `HS_FAIL`.
    HandshakeRejected {
        /// Claimed initiator
        from: PeerId,
        /// Why it failed
        reason: String,
    },
    /// A message verified and was decrypted.
    MessageDelivered {
        /// Sender
        from: PeerId,
        /// Decrypted text
        plaintext: String,
    },
    /// A message was dropped without decryption.
    MessageRejected {
        /// Claimed sender
        from: PeerId,
        /// Why it was dropped
        reason: String,
    },
}

impl NodeEvent {
    /// Returns the claimed sender.
    #[must_use]
    pub const fn sender(&self) -> &PeerId {
        match self {
            Self::HandshakeAccepted { from }
            | Self::HandshakeRejected { from, .. }
            | Self::MessageDelivered { from, .. }
            | Self::MessageRejected { from, .. } => from,
        }
    }
}

impl std::fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HandshakeAccepted { from } => write!(f, "Session established with {from}"),
            Self::HandshakeRejected { from, reason } => {
                write!(f, "Rejected handshake from {from}: {reason}")
            }
            Self::MessageDelivered { from, plaintext } => write!(f, "Message from {from}: {plaintext}"),
            Self::MessageRejected { from, reason } => {
                write!(f, "Rejected message from {from}: {reason}")
            }
        }
    }
}

// ============================================
// NodeStatus
// ============================================

/// Snapshot for the status view.
#[derive(Debug, Clone)]
pub struct NodeStatus {
    /// This peer
    pub identity: PeerId,
    /// Key published to the directory
    pub public_key: PublicKey,
    /// Established sessions by counterpart
    pub sessions: Vec<Arc<Session>>,
    /// Counterparts with a handshake in flight
    pub pending: Vec<PeerId>,
    /// Counterpart keys in the local cache
    pub cached_keys: Vec<(PeerId, PublicKey)>,
}

// ============================================
// PeerNode
// ============================================

/// One peer of the network.
///
/// # Lifecycle
/// 1. Create with `PeerNode::from_config` (or `PeerNode::new` in tests)
/// 2. Bind the listener and spawn `node.run(listener)`
/// 3. Drive the outbound API; consume `NodeEvent`s from the receiver
/// 4. Stop with `node.shutdown()`
pub struct PeerNode {
    identity: PeerId,
    crypto: Arc<DefaultHandshakeCrypto>,
    resolver: Arc<KeyResolver>,
    sessions: Arc<SessionManager>,
    handshake: Arc<HandshakeService>,
    messaging: Arc<MessagingService>,
    events: mpsc::Sender<NodeEvent>,
    codec: LineCodec,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PeerNode {
    /// Creates a node from its parts. Returns the node and the receiving end
    /// of its event channel.
    pub fn new(
        identity: PeerId,
        key_pair: KeyPair,
        secret_range: RangeInclusive<u64>,
        resolver: Arc<KeyResolver>,
        peers: Arc<AddressBook>,
        timeouts: Timeouts,
    ) -> (Self, mpsc::Receiver<NodeEvent>) {
        let crypto = Arc::new(DefaultHandshakeCrypto::new(key_pair).with_secret_range(secret_range));
        let sessions = Arc::new(SessionManager::new());

        let handshake = Arc::new(HandshakeService::new(
            identity.clone(),
            crypto.clone(),
            Arc::clone(&resolver),
            Arc::clone(&sessions),
            Arc::clone(&peers),
            timeouts,
        ));
        let messaging = Arc::new(MessagingService::new(
            identity.clone(),
            crypto.clone(),
            Arc::clone(&resolver),
            Arc::clone(&sessions),
            peers,
            timeouts,
        ));

        let (events, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(1);

        let node = Self {
            identity,
            crypto,
            resolver,
            sessions,
            handshake,
            messaging,
            events,
            codec: LineCodec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        };
        (node, events_rx)
    }

    /// Creates the node named `identity` from configuration: generates a
    /// fresh key pair, opens its keyring and points it at the directory.
    ///
    /// # Errors
    /// - `UnknownAddress` if `identity` is not in the address book
    /// - `Core(KeyGeneration)` if the prime pool is unusable
    /// - `KeyStore` if the keyring file is corrupt
    pub fn from_config(config: &NodeConfig, identity: PeerId) -> Result<(Self, mpsc::Receiver<NodeEvent>)> {
        config.peers.resolve(&identity)?;

        let key_pair = KeyPair::generate(&config.keys.prime_pool, config.keys.initial_exponent)?;
        let timeouts = config.timeouts.to_timeouts();
        let cache = Arc::new(FileKeyStore::open(config.keyring_path(&identity))?);
        let directory = Arc::new(TcpDirectoryClient::new(config.directory.addr, timeouts));
        let resolver = Arc::new(KeyResolver::new(cache, directory));

        info!(
            peer = %identity,
            public_key = %key_pair.public_key(),
            "Peer identity created"
        );

        Ok(Self::new(
            identity,
            key_pair,
            config.keys.secret_range(),
            resolver,
            Arc::new(config.peers.clone()),
            timeouts,
        ))
    }

    /// Returns this peer's identity.
    #[must_use]
    pub const fn identity(&self) -> &PeerId {
        &self.identity
    }

    /// Returns the key this run generated.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.crypto.public_key()
    }

    /// Returns the session table.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Publishes this node's public key to the directory.
    ///
    /// # Errors
    /// Directory transport or protocol errors.
    pub async fn register(&self) -> Result<()> {
        self.resolver.register(&self.identity, self.public_key()).await
    }

    /// Establishes a session with `counterpart`.
    ///
    /// # Errors
    /// See [`HandshakeService::initiate`].
    pub async fn initiate_handshake(&self, counterpart: &PeerId) -> Result<Arc<Session>> {
        self.handshake.initiate(counterpart).await
    }

    /// Sends `plaintext` to `counterpart` over the established session.
    ///
    /// # Errors
    /// See [`MessagingService::send`].
    pub async fn send_message(&self, counterpart: &PeerId, plaintext: &str) -> Result<()> {
        self.messaging.send(counterpart, plaintext).await
    }

    /// Returns a snapshot of sessions and cached keys.
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            identity: self.identity.clone(),
            public_key: self.public_key(),
            sessions: self.sessions.list(),
            pending: self.sessions.pending(),
            cached_keys: self.resolver.cached(),
        }
    }

    /// Serves inbound connections from `listener` until shutdown.
    ///
    /// # Errors
    /// Currently never fails; accept errors are logged and the loop goes on.
    pub async fn run(&self, listener: TcpLineListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        info!(peer = %self.identity, addr = %listener.local_addr(), "Peer listening");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!(peer = %self.identity, "Accept loop received shutdown signal");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok(conn) => {
                            let inbound = Inbound {
                                handshake: Arc::clone(&self.handshake),
                                messaging: Arc::clone(&self.messaging),
                                events: self.events.clone(),
                                codec: self.codec,
                            };
                            tokio::spawn(async move { inbound.serve(conn).await });
                        }
                        Err(e) => {
                            if !self.shutdown.load(Ordering::SeqCst) {
                                error!(peer = %self.identity, error = %e, "Accept error");
                            }
                        }
                    }
                }
            }
        }

        info!(peer = %self.identity, "Peer stopped");
        Ok(())
    }

    /// Stops the accept loop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for PeerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerNode")
            .field("identity", &self.identity)
            .field("public_key", &self.public_key())
            .field("sessions", &self.sessions.count())
            .finish_non_exhaustive()
    }
}

// ============================================
// Inbound Connection Handling
// ============================================

/// Everything one connection task needs.
struct Inbound {
    handshake: Arc<HandshakeService>,
    messaging: Arc<MessagingService>,
    events: mpsc::Sender<NodeEvent>,
    codec: LineCodec,
}

impl Inbound {
    async fn serve<S>(self, mut conn: LineConnection<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let addr = conn.peer_addr();
        loop {
            match read_envelope(&mut conn, self.codec).await {
                Ok(Some(envelope)) => {
                    if let Err(e) = self.dispatch(&mut conn, envelope).await {
                        debug!(addr = ?addr, error = %e, "Failed to answer envelope");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(addr = ?addr, error = %e, "Closing connection");
                    break;
                }
            }
        }
        conn.shutdown().await;
        trace!(addr = ?addr, "Connection closed");
    }

    async fn dispatch<T: LineTransport>(&self, conn: &mut T, envelope: Envelope) -> Result<()> {
        match envelope {
            Envelope::Handshake { sender, offer } => {
                let (ack, event) = match self.handshake.respond(&sender, &offer).await {
                    Ok(_) => (
                        HandshakeAck::Accepted,
                        NodeEvent::HandshakeAccepted {
                            from: sender.clone(),
                        },
                    ),
                    Err(e) => (
                        HandshakeAck::Rejected,
                        NodeEvent::HandshakeRejected {
                            from: sender.clone(),
                            reason: e.to_string(),
                        },
                    ),
                };
                // Ack before publishing so a full event channel cannot delay it
                let written = conn.write_frame(&self.codec.to_bytes(&ack)).await;
                info!(sender = %sender, ack = ack.as_line(), "Answered handshake");
                self.publish(event).await;
                written?;
            }
            Envelope::Data { sender, message } => {
                let event = match self.messaging.receive(&sender, &message).await {
                    Ok(plaintext) => NodeEvent::MessageDelivered {
                        from: sender,
                        plaintext,
                    },
                    Err(e) => NodeEvent::MessageRejected {
                        from: sender,
                        reason: e.to_string(),
                    },
                };
                self.publish(event).await;
            }
        }
        Ok(())
    }

    async fn publish(&self, event: NodeEvent) {
        if self.events.send(event).await.is_err() {
            trace!("Event receiver dropped");
        }
    }
}

/// Reads one complete envelope: tag line, then the body lines it requires.
///
/// Returns `Ok(None)` on a clean close before a tag line.
async fn read_envelope<T: LineTransport>(conn: &mut T, codec: LineCodec) -> Result<Option<Envelope>> {
    let Some(tag) = conn.read_line().await? else {
        return Ok(None);
    };
    let kind = EnvelopeKind::from_tag(&tag).ok_or_else(|| CoreError::UnknownTag(tag.clone()))?;

    let mut lines = Vec::with_capacity(kind.body_lines() + 1);
    lines.push(tag);
    for _ in 0..kind.body_lines() {
        lines.push(conn.expect_line().await?);
    }
    codec
        .from_lines::<Envelope>(&lines)
        .map(Some)
        .map_err(|e| NodeError::invalid_message(e.to_string()))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{peer, short};
    use peerlink_core::protocol::HandshakeOffer;

    async fn read_from(text: &'static str) -> Result<Option<Envelope>> {
        let (client, server) = tokio::io::duplex(4096);
        let mut writer = LineConnection::new(client, short());
        writer.write_frame(text.as_bytes()).await.unwrap();
        writer.shutdown().await;
        let mut reader = LineConnection::new(server, short());
        read_envelope(&mut reader, LineCodec::new()).await
    }

    #[tokio::test]
    async fn test_read_envelope() {
        let envelope = read_from("HANDSHAKE\nAlice\n123 456\n").await.unwrap();
        assert_eq!(
            envelope,
            Some(Envelope::Handshake {
                sender: peer("Alice"),
                offer: HandshakeOffer {
                    encrypted_secret: 123,
                    encrypted_signature: 456,
                },
            })
        );

        let envelope = read_from("DATA\nBob\nKHOOR\n42\n").await.unwrap();
        assert!(matches!(envelope, Some(Envelope::Data { ref sender, .. }) if sender.as_str() == "Bob"));

        assert_eq!(read_from("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_envelope_errors() {
        let err = read_from("PING\nAlice\n").await.unwrap_err();
        assert!(matches!(err, NodeError::Core(CoreError::UnknownTag(ref t)) if t == "PING"));

        // Truncated body
        let err = read_from("DATA\nBob\nKHOOR\n").await.unwrap_err();
        assert!(err.is_transport_failure());

        let err = read_from("HANDSHAKE\nAlice\nnot numbers\n").await.unwrap_err();
        assert!(matches!(err, NodeError::InvalidMessage { .. }));
    }

    #[test]
    fn test_event_display() {
        let event = NodeEvent::MessageDelivered {
            from: peer("Alice"),
            plaintext: "HELLO".to_string(),
        };
        assert_eq!(event.to_string(), "Message from Alice: HELLO");
        assert_eq!(event.sender(), &peer("Alice"));

        let event = NodeEvent::HandshakeRejected {
            from: peer("Mallory"),
            reason: "Unknown peer".to_string(),
        };
        assert!(event.to_string().contains("Mallory"));
    }
}
