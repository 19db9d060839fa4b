// ============================================
// File: crates/peerlink-core/src/protocol/messages.rs
// ============================================
//! # Protocol Messages
//!
//! ## Creation Reason
//! Typed representations of every line-oriented message exchanged between
//! peers and between a peer and the directory.
//!
//! ## Wire Format
//! ```text
//! Peer → Peer (handshake)        Peer → Peer (data)
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ HANDSHAKE                │   │ DATA                     │
//! │ <sender identity>        │   │ <sender identity>        │
//! │ <encSecret> <encSig>     │   │ <ciphertext>             │
//! └──────────────────────────┘   │ <signature>              │
//!   reply: HS_OK | HS_FAIL       └──────────────────────────┘
//!                                  no reply
//!
//! Peer → Directory                Directory → Peer
//! REGISTER <id> <n> <e>           OK
//! GETKEY <id>                     KEY <id> <n> <e> | NOTFOUND | ERROR
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every line ends with `\n`; a ciphertext line can therefore never
//!   contain a newline, so plaintexts must be single-line
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use peerlink_common::types::PeerId;

use crate::crypto::keys::PublicKey;

// ============================================
// Constants
// ============================================

/// Tag line opening a handshake envelope.
pub const TAG_HANDSHAKE: &str = "HANDSHAKE";

/// Tag line opening a data envelope.
pub const TAG_DATA: &str = "DATA";

/// Handshake accepted.
pub const ACK_OK: &str = "HS_OK";

/// Handshake rejected.
pub const ACK_FAIL: &str = "HS_FAIL";

/// Directory command: register a key.
pub const CMD_REGISTER: &str = "REGISTER";

/// Directory command: look up a key.
pub const CMD_GETKEY: &str = "GETKEY";

/// Directory reply: registration stored.
pub const REPLY_OK: &str = "OK";

/// Directory reply: key found.
pub const REPLY_KEY: &str = "KEY";

/// Directory reply: no key for identity.
pub const REPLY_NOTFOUND: &str = "NOTFOUND";

/// Directory reply: request malformed.
pub const REPLY_ERROR: &str = "ERROR";

/// Maximum accepted line length in bytes, excluding the terminator.
pub const MAX_LINE_LEN: usize = 4096;

// ============================================
// EnvelopeKind
// ============================================

/// Peer-to-peer envelope discriminator, carried on the tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// Signed key-establishment offer
    Handshake,
    /// Encrypted, signed application message
    Data,
}

impl EnvelopeKind {
    /// Parses a tag line.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_HANDSHAKE => Some(Self::Handshake),
            TAG_DATA => Some(Self::Data),
            _ => None,
        }
    }

    /// Returns the tag line.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Handshake => TAG_HANDSHAKE,
            Self::Data => TAG_DATA,
        }
    }

    /// Number of lines that follow the tag line.
    #[must_use]
    pub const fn body_lines(self) -> usize {
        match self {
            Self::Handshake => 2,
            Self::Data => 3,
        }
    }
}

// ============================================
// HandshakeOffer
// ============================================

/// Session secret and its signature, both encrypted under the responder's
/// public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeOffer {
    /// `secret^e_B mod n_B`
    pub encrypted_secret: u64,
    /// `sign_A(secret)^e_B mod n_B`
    pub encrypted_signature: u64,
}

// ============================================
// SealedMessage
// ============================================

/// Shift-encrypted text plus the sender's signature over its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Cipher text, single line
    pub ciphertext: String,
    /// Signature over the cipher-text digest
    pub signature: u64,
}

// ============================================
// Envelope
// ============================================

/// One complete peer-to-peer message unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Handshake offer from `sender`
    Handshake {
        /// Claimed initiator identity
        sender: PeerId,
        /// Encrypted secret and signature
        offer: HandshakeOffer,
    },
    /// Application message from `sender`
    Data {
        /// Claimed sender identity
        sender: PeerId,
        /// Encrypted, signed payload
        message: SealedMessage,
    },
}

impl Envelope {
    /// Returns the envelope kind.
    #[must_use]
    pub const fn kind(&self) -> EnvelopeKind {
        match self {
            Self::Handshake { .. } => EnvelopeKind::Handshake,
            Self::Data { .. } => EnvelopeKind::Data,
        }
    }

    /// Returns the claimed sender.
    #[must_use]
    pub const fn sender(&self) -> &PeerId {
        match self {
            Self::Handshake { sender, .. } | Self::Data { sender, .. } => sender,
        }
    }
}

// ============================================
// HandshakeAck
// ============================================

/// Responder's single-line answer to a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAck {
    /// Signature verified, secret adopted
    Accepted,
    /// Verification failed or sender unknown
    Rejected,
}

impl HandshakeAck {
    /// Returns the wire line.
    #[must_use]
    pub const fn as_line(self) -> &'static str {
        match self {
            Self::Accepted => ACK_OK,
            Self::Rejected => ACK_FAIL,
        }
    }
}

// ============================================
// Directory Messages
// ============================================

/// Request sent to the directory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRequest {
    /// Store or overwrite `peer`'s public key
    Register {
        /// Identity being registered
        peer: PeerId,
        /// Its public key
        key: PublicKey,
    },
    /// Fetch `peer`'s public key
    GetKey {
        /// Identity being looked up
        peer: PeerId,
    },
}

/// Reply from the directory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryResponse {
    /// Registration stored
    Ok,
    /// Lookup hit
    Key {
        /// Identity looked up
        peer: PeerId,
        /// Its registered public key
        key: PublicKey,
    },
    /// Lookup miss
    NotFound,
    /// Request was malformed
    Error,
}
