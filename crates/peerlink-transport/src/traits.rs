// ============================================
// File: crates/peerlink-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Node services talk to peers and the directory through a line-oriented
//! interface so they can be driven by in-memory streams in tests.
//!
//! ## Main Functionality
//! - `LineTransport`: Read and write newline-terminated lines
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every read and write is bounded by the implementation's timeouts
//! - `read_line` returns `Ok(None)` only on a clean close between lines
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::{Result, TransportError};

/// Abstract interface for a line-framed, bidirectional connection.
///
/// # Example
/// ```ignore
/// async fn echo<T: LineTransport>(conn: &mut T) -> Result<()> {
///     while let Some(line) = conn.read_line().await? {
///         conn.write_line(&line).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait LineTransport: Send {
    /// Reads the next line without its terminator.
    ///
    /// # Errors
    /// `Timeout`, `LineTooLong`, `InvalidUtf8` or receive failures.
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Writes pre-framed bytes and flushes.
    ///
    /// # Errors
    /// `Timeout` or send failures.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Returns the remote address, if known.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Writes `line` followed by `\n`.
    ///
    /// # Errors
    /// Same as [`LineTransport::write_frame`].
    async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        self.write_frame(&frame).await
    }

    /// Reads a line that must be present.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] if the peer closed instead.
    async fn expect_line(&mut self) -> Result<String> {
        self.read_line().await?.ok_or(TransportError::ConnectionClosed)
    }
}
