// ============================================
// File: crates/peerlink-node/src/services/handshake.rs
// ============================================
//! # Handshake Service
//!
//! ## Creation Reason
//! Orchestrates session agreement between two peers, coordinating key
//! resolution, the handshake crypto and the session table.
//!
//! ## Handshake Flow
//! ```text
//! Initiator (A)                                   Responder (B)
//! ─────────────                                   ─────────────
//! 1. resolve B's key (cache, then directory)
//! 2. draw secret, sign it, encrypt both under B
//! 3. connect to B's address
//! 4. HANDSHAKE / A / encS encSig  ──────────────► 5. decrypt with own key
//!                                                 6. resolve A's key
//!                                                 7. verify signature
//!                                                 8. adopt secret
//! 9. adopt secret on HS_OK       ◄────────────── HS_OK | HS_FAIL
//! ```
//!
//! ## Error Handling
//! - Unknown counterpart: `UnknownPeer`, nothing is sent
//! - `HS_FAIL`: `HandshakeRejected`, no session is created
//! - Transport failures: `PeerUnreachable` or `Timeout`
//! - No automatic retry on any path
//!
//! ## ⚠️ Important Note for Next Developer
//! - The pending mark is held by a guard so every exit path clears it
//! - The responder always answers exactly once, also when the sender
//!   cannot be resolved
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake service

use std::sync::Arc;

use peerlink_common::types::PeerId;
use peerlink_core::crypto::{HandshakeCrypto, SymmetricKey};
use peerlink_core::error::CoreError;
use peerlink_core::protocol::{Envelope, HandshakeAck, HandshakeOffer, LineCodec};
use peerlink_transport::{LineConnection, LineTransport, Timeouts};
use tracing::{debug, info, warn};

use crate::config::AddressBook;
use crate::directory::KeyResolver;
use crate::error::{NodeError, Result};
use crate::services::session::{Session, SessionManager, SessionRole};

/// High-level handshake orchestration service.
pub struct HandshakeService {
    local: PeerId,
    crypto: Arc<dyn HandshakeCrypto>,
    resolver: Arc<KeyResolver>,
    sessions: Arc<SessionManager>,
    peers: Arc<AddressBook>,
    timeouts: Timeouts,
    codec: LineCodec,
}

impl HandshakeService {
    /// Creates the service for `local`; `peers` supplies counterpart addresses.
    pub fn new(
        local: PeerId,
        crypto: Arc<dyn HandshakeCrypto>,
        resolver: Arc<KeyResolver>,
        sessions: Arc<SessionManager>,
        peers: Arc<AddressBook>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            local,
            crypto,
            resolver,
            sessions,
            peers,
            timeouts,
            codec: LineCodec::new(),
        }
    }

    /// Runs the initiator side against `counterpart`.
    ///
    /// # Errors
    /// - `UnknownPeer`, `UnknownAddress` before anything is sent
    /// - `HandshakeRejected` on `HS_FAIL`
    /// - `PeerUnreachable` or `Timeout` on transport failures
    /// - `Core(KeyMaterial)` if no secret fits the counterpart's modulus
    pub async fn initiate(&self, counterpart: &PeerId) -> Result<Arc<Session>> {
        let pending = self.sessions.begin_handshake(counterpart);

        let counterpart_key = self.resolver.resolve(counterpart).await?;
        let addr = self.peers.resolve(counterpart)?;
        let (secret, offer) = self.crypto.create_offer(&counterpart_key)?;
        debug!(counterpart = %counterpart, secret, "Session secret drawn");

        let mut conn = LineConnection::connect(addr, self.timeouts)
            .await
            .map_err(|e| NodeError::from_peer_transport(counterpart, e))?;
        let ack = self.exchange(&mut conn, counterpart, offer).await;
        conn.shutdown().await;

        match ack? {
            HandshakeAck::Accepted => {
                let session = pending.complete(SymmetricKey::from_secret(secret));
                info!(counterpart = %counterpart, addr = %addr, "Handshake accepted");
                Ok(session)
            }
            HandshakeAck::Rejected => {
                warn!(counterpart = %counterpart, "Handshake rejected");
                Err(NodeError::HandshakeRejected {
                    peer: counterpart.clone(),
                })
            }
        }
    }

    async fn exchange<T: LineTransport>(
        &self,
        conn: &mut T,
        counterpart: &PeerId,
        offer: HandshakeOffer,
    ) -> Result<HandshakeAck> {
        let envelope = Envelope::Handshake {
            sender: self.local.clone(),
            offer,
        };
        conn.write_frame(&self.codec.to_bytes(&envelope))
            .await
            .map_err(|e| NodeError::from_peer_transport(counterpart, e))?;

        let line = conn
            .expect_line()
            .await
            .map_err(|e| NodeError::from_peer_transport(counterpart, e))?;
        self.codec
            .from_lines::<HandshakeAck>(&[line])
            .map_err(|e| NodeError::invalid_message(format!("bad acknowledgement from '{counterpart}': {e}")))
    }

    /// Runs the responder side for an offer claimed to come from `sender`.
    ///
    /// The caller answers `HS_OK` on `Ok` and `HS_FAIL` on any error.
    ///
    /// # Errors
    /// - `UnknownPeer` or directory errors if `sender` cannot be resolved
    /// - `SignatureMismatch` if the decrypted signature does not verify
    pub async fn respond(&self, sender: &PeerId, offer: &HandshakeOffer) -> Result<Arc<Session>> {
        let sender_key = self.resolver.resolve(sender).await.map_err(|e| {
            warn!(sender = %sender, error = %e, "Cannot resolve handshake sender");
            e
        })?;

        let secret = self.crypto.accept_offer(offer, &sender_key).map_err(|e| match e {
            CoreError::SignatureVerification => {
                warn!(sender = %sender, "Handshake signature verification failed");
                NodeError::SignatureMismatch {
                    peer: sender.clone(),
                }
            }
            other => other.into(),
        })?;

        debug!(sender = %sender, secret, "Session secret adopted");
        Ok(self
            .sessions
            .establish(sender, SymmetricKey::from_secret(secret), SessionRole::Responder))
    }
}

impl std::fmt::Debug for HandshakeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeService")
            .field("local", &self.local)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
