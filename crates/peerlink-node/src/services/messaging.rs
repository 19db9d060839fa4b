// ============================================
// File: crates/peerlink-node/src/services/messaging.rs
// ============================================
//! # Messaging Service
//!
//! ## Creation Reason
//! Moves application text over an established session: shift-encrypted
//! and signed on the way out, verified before decryption on the way in.
//!
//! ## Main Logical Flow
//! ```text
//! send(to, text)                          receive(from, sealed)
//!   ├── session with `to`?                  ├── session with `from`?
//!   ├── encrypt with session key            ├── resolve `from`'s key
//!   ├── sign digest (own modulus)           ├── verify digest signature
//!   └── DATA / me / cipher / sig ──────►    └── decrypt, deliver
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Sending is fire-and-forget; there is no acknowledgement line
//! - Nothing is decrypted before the signature verifies
//!
//! ## Last Modified
//! v0.1.0 - Initial messaging service

use std::sync::Arc;

use peerlink_common::types::PeerId;
use peerlink_core::crypto::HandshakeCrypto;
use peerlink_core::error::CoreError;
use peerlink_core::protocol::{Envelope, LineCodec, SealedMessage, MAX_LINE_LEN};
use peerlink_transport::{LineConnection, LineTransport, Timeouts};
use tracing::{debug, info, trace, warn};

use crate::config::AddressBook;
use crate::directory::KeyResolver;
use crate::error::{NodeError, Result};
use crate::services::session::SessionManager;

/// Encrypted, signed messaging over established sessions.
pub struct MessagingService {
    local: PeerId,
    crypto: Arc<dyn HandshakeCrypto>,
    resolver: Arc<KeyResolver>,
    sessions: Arc<SessionManager>,
    peers: Arc<AddressBook>,
    timeouts: Timeouts,
    codec: LineCodec,
}

impl MessagingService {
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

    /// Checks that `plaintext` fits in one protocol line.
    ///
    /// # Errors
    /// [`NodeError::InvalidMessage`] for line breaks or oversized text.
    pub fn validate_plaintext(plaintext: &str) -> Result<()> {
        if plaintext.contains(&['\n', '\r'][..]) {
            return Err(NodeError::invalid_message("message must be a single line"));
        }
        if plaintext.len() > MAX_LINE_LEN {
            return Err(NodeError::invalid_message(format!(
                "message is {} bytes, limit is {MAX_LINE_LEN}",
                plaintext.len()
            )));
        }
        Ok(())
    }

    /// Encrypts, signs and sends `plaintext` to `counterpart`.
    ///
    /// # Errors
    /// - `InvalidMessage` if the text does not fit one line
    /// - `NoActiveSession` if no session is established
    /// - `UnknownAddress`, `PeerUnreachable` or `Timeout` on delivery
    pub async fn send(&self, counterpart: &PeerId, plaintext: &str) -> Result<()> {
        Self::validate_plaintext(plaintext)?;
        let session = self.sessions.get_or_error(counterpart)?;
        let addr = self.peers.resolve(counterpart)?;

        let message = self.crypto.seal_message(plaintext, &session.key())?;
        trace!(counterpart = %counterpart, ciphertext = %message.ciphertext, "Message sealed");
        let envelope = Envelope::Data {
            sender: self.local.clone(),
            message,
        };

        let mut conn = LineConnection::connect(addr, self.timeouts)
            .await
            .map_err(|e| NodeError::from_peer_transport(counterpart, e))?;
        let written = conn.write_frame(&self.codec.to_bytes(&envelope)).await;
        conn.shutdown().await;
        written.map_err(|e| NodeError::from_peer_transport(counterpart, e))?;

        session.record_sent();
        info!(counterpart = %counterpart, "Message sent");
        Ok(())
    }

    /// Verifies and decrypts a message claimed to come from `sender`.
    ///
    /// # Errors
    /// - `NoActiveSession` if no session with `sender` exists
    /// - `UnknownPeer` or directory errors if `sender` cannot be resolved
    /// - `SignatureMismatch` if the signature does not verify
    pub async fn receive(&self, sender: &PeerId, message: &SealedMessage) -> Result<String> {
        let session = self.sessions.get_or_error(sender).map_err(|e| {
            debug!(sender = %sender, "Data without an established session");
            e
        })?;
        let sender_key = self.resolver.resolve(sender).await?;

        match self.crypto.open_message(message, &session.key(), &sender_key) {
            Ok(plaintext) => {
                session.record_received();
                debug!(sender = %sender, plaintext = %plaintext, "Message verified");
                Ok(plaintext)
            }
            Err(CoreError::SignatureVerification) => {
                warn!(sender = %sender, "Message signature verification failed");
                Err(NodeError::SignatureMismatch {
                    peer: sender.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for MessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingService")
            .field("local", &self.local)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
