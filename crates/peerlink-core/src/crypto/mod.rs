// ============================================
// File: crates/peerlink-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Collects the toy public-key and symmetric primitives used by PeerLink.
//!
//! ### Submodules
//! - [`arith`]: Extended Euclid, modular inverse, modular exponentiation
//! - [`keys`]: Key pairs and public keys
//! - [`signature`]: Sign / verify
//! - [`cipher`]: Shift cipher and symmetric key
//! - [`handshake`]: Offer creation/acceptance and message sealing
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Handshake Phase                                            │
//! │    secret ──sign(d_A)──► signature                          │
//! │    (secret, signature) ──encrypt(e_B)──► offer              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport Phase                                            │
//! │    plaintext ──shift(secret mod 26)──► ciphertext           │
//! │    Σ codes(ciphertext) mod n_A ──sign(d_A)──► signature     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - These primitives are deliberately tiny and offer no real security;
//!   they must never protect anything of value
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod arith;
pub mod cipher;
pub mod handshake;
pub mod keys;
pub mod signature;

pub use cipher::{shift_decrypt, shift_encrypt, SymmetricKey};
pub use handshake::{message_digest, DefaultHandshakeCrypto, HandshakeCrypto};
pub use keys::{KeyPair, PublicKey};
pub use signature::{sign, verify};
