// ============================================
// File: crates/peerlink-transport/src/lib.rs
// ============================================
//! # PeerLink Transport - Line-Framed TCP
//!
//! ## Creation Reason
//! Isolates socket handling from protocol logic: binding, connecting,
//! line framing and bounded waits.
//!
//! ## Main Functionality
//! - [`traits`]: `LineTransport` abstraction
//! - [`tcp`]: `LineConnection`, `TcpLineListener`, `Timeouts`
//! - [`error`]: `TransportError`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                peerlink-node                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   peerlink-core        peerlink-transport          │
//! │         │              You are here ──►            │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │             peerlink-common                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always use the trait in services so tests can use in-memory streams
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{LineConnection, TcpLineListener, Timeouts};
pub use traits::LineTransport;
