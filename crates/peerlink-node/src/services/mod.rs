// ============================================
// File: crates/peerlink-node/src/services/mod.rs
// ============================================
//! # Peer Services
//!
//! ## Main Functionality
//! - [`session`]: Per-counterpart session table
//! - [`handshake`]: Initiator and responder handshake flows
//! - [`messaging`]: Signed, encrypted message send and receive
//!
//! ## Service Dependencies
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │  HandshakeService   │     │  MessagingService   │
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            ├───────────┬───────────────┤
//!            ▼           ▼               ▼
//!   ┌──────────────┐ ┌────────────┐ ┌─────────────┐
//!   │SessionManager│ │KeyResolver │ │ AddressBook │
//!   └──────────────┘ └────────────┘ └─────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial services

pub mod handshake;
pub mod messaging;
pub mod session;

pub use handshake::HandshakeService;
pub use messaging::MessagingService;
pub use session::{PendingHandshake, Session, SessionManager, SessionRole, SessionState};
