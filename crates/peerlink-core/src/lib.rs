// ============================================
// File: crates/peerlink-core/src/lib.rs
// ============================================
//! # PeerLink Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Holds everything about the handshake-and-messaging protocol that does
//! not touch a socket: number theory, keys, signatures, the shift cipher
//! and the line codec.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - `extended_euclid`, `mod_inverse`, `mod_pow`
//! - `KeyPair` / `PublicKey` generation from a prime pool
//! - `sign` / `verify`
//! - `shift_encrypt` / `shift_decrypt`
//! - `HandshakeCrypto` for offers and sealed messages
//!
//! ### Protocol Module ([`protocol`])
//! - `Envelope`, `HandshakeAck`, `DirectoryRequest`, `DirectoryResponse`
//! - `LineCodec` for newline-delimited framing
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                peerlink-node                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   peerlink-core  ◄──   peerlink-transport          │
//! │   You are here        │                            │
//! │         │             │                            │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │             peerlink-common                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Toy parameters only; see `crypto` module notes
//! - Private exponents implement manual zeroize-on-drop
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

pub use crypto::{DefaultHandshakeCrypto, HandshakeCrypto, KeyPair, PublicKey, SymmetricKey};
pub use error::{CoreError, Result};
pub use protocol::{
    DirectoryRequest, DirectoryResponse, Envelope, EnvelopeKind, HandshakeAck, LineCodec,
};
