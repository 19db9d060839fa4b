// ============================================
// File: crates/peerlink-node/src/directory/mod.rs
// ============================================
//! # Directory
//!
//! ## Main Functionality
//! - [`store`]: `KeyStore` with memory and JSON-file backends
//! - [`client`]: `DirectoryClient` over TCP
//! - [`resolver`]: Cache-first key lookup used by peers
//! - [`server`]: The directory service itself
//!
//! ## Last Modified
//! v0.1.0 - Initial directory module

pub mod client;
pub mod resolver;
pub mod server;
pub mod store;

pub use client::{DirectoryClient, TcpDirectoryClient};
pub use resolver::KeyResolver;
pub use server::DirectoryServer;
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore};
