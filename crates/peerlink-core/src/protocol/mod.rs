// ============================================
// File: crates/peerlink-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the line-oriented wire protocol: peer-to-peer envelopes, the
//! handshake acknowledgement and the directory request/reply pair.
//!
//! ### Submodules
//! - [`messages`]: Message structures and wire constants
//! - [`codec`]: Line framing, encoding and decoding
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Peer ──── REGISTER / GETKEY ──────────────────► Directory │
//! │  Peer ◄─── OK / KEY / NOTFOUND / ERROR ──────── Directory  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Initiator ──── HANDSHAKE envelope ──────────► Responder    │
//! │  Initiator ◄─── HS_OK | HS_FAIL ────────────── Responder    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Sender ══════ DATA envelope (no reply) ═════► Receiver     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;

pub use codec::{Codec, LineCodec};
pub use messages::{
    DirectoryRequest, DirectoryResponse, Envelope, EnvelopeKind, HandshakeAck,
    HandshakeOffer, SealedMessage, MAX_LINE_LEN,
};
