// ============================================
// File: crates/peerlink-node/src/lib.rs
// ============================================
//! # PeerLink Node Library
//!
//! ## Creation Reason
//! Provides the peer node and the key directory service, orchestrating the
//! core crypto and the line transport into a working peer-to-peer system.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: TOML configuration and the peer address book
//! - [`node`]: Peer orchestration and inbound event publishing
//! - [`services`]: Business logic services
//!   - [`services::session`]: Session table
//!   - [`services::handshake`]: Handshake flows
//!   - [`services::messaging`]: Signed, encrypted messaging
//! - [`directory`]: Key stores, directory client, resolver and server
//! - [`error`]: Node-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           PeerNode                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐   │
//! │  │   Config    │────►│  PeerNode   │────►│  Accept loop    │   │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘   │
//! │                             │                     │            │
//! │         ┌───────────────────┼─────────────────────┤            │
//! │         ▼                   ▼                     ▼            │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐      │
//! │  │  Session    │     │  Handshake  │     │  Messaging  │      │
//! │  │  Manager    │     │  Service    │     │  Service    │      │
//! │  └─────────────┘     └──────┬──────┘     └──────┬──────┘      │
//! │                             └─────────┬─────────┘             │
//! │                                       ▼                       │
//! │                              ┌─────────────────┐              │
//! │                              │   KeyResolver   │              │
//! │                              │ cache + client  │              │
//! │                              └────────┬────────┘              │
//! └───────────────────────────────────────┼───────────────────────┘
//!                                         ▼
//!                               ┌───────────────────┐
//!                               │ DirectoryServer   │
//!                               └───────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Key pairs are generated fresh at every start; only the keyring of
//!   counterpart keys is persisted
//! - Configuration changes require restart
//!
//! ## Last Modified
//! v0.1.0 - Initial node library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod directory;
pub mod error;
pub mod node;
pub mod services;

#[cfg(test)]
mod testing;

// Re-export primary types
pub use config::{AddressBook, NodeConfig};
pub use directory::{DirectoryServer, KeyResolver};
pub use error::{NodeError, Result};
pub use node::{NodeEvent, NodeStatus, PeerNode};
