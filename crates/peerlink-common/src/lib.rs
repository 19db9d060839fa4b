// ============================================
// File: crates/peerlink-common/src/lib.rs
// ============================================
//! # PeerLink Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides the identity type, error base and time helpers shared by every
//! PeerLink crate.
//!
//! ## Main Functionality
//! - [`types`]: `PeerId`, the validated peer identity
//! - [`time`]: Lock-free timestamps for session bookkeeping
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                peerlink-node                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   peerlink-core        peerlink-transport          │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │             peerlink-common  ◄── You are here     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation; keep its dependencies minimal
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

pub use error::{CommonError, Result};
pub use types::{PeerId, PeerIdError};
