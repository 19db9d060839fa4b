// ============================================
// File: crates/peerlink-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Error type for socket setup, line framing and bounded waits.
//!
//! ## Error Categories
//! 1. **Network Errors**: bind, connect, send, receive failures
//! 2. **Framing Errors**: oversized lines, invalid UTF-8, early close
//! 3. **Wait Errors**: a bounded wait expired
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Timeout` must stay distinct from every protocol rejection so callers
//!   can tell "peer said no" from "peer said nothing"
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    /// Failed to connect.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Address we dialled
        addr: SocketAddr,
        /// Why connecting failed
        reason: String,
    },

    /// Send operation failed.
    #[error("Failed to send: {reason}")]
    SendFailed {
        /// Why send failed
        reason: String,
    },

    /// Receive operation failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// Why receive failed
        reason: String,
    },

    /// Remote side closed the connection before a full line arrived.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Invalid socket address.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    // ========================================
    // Framing Errors
    // ========================================

    /// Line exceeded the configured maximum.
    #[error("Line too long: max {max} bytes, got at least {actual}")]
    LineTooLong {
        /// Maximum allowed size
        max: usize,
        /// Bytes buffered without a terminator
        actual: usize,
    },

    /// Line was not valid UTF-8.
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,

    // ========================================
    // Wait Errors
    // ========================================

    /// Operation timed out.
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout {
        /// What operation timed out
        operation: String,
        /// How long we waited
        duration_ms: u64,
    },

    /// Listener is shutting down.
    #[error("Transport is shutting down")]
    ShuttingDown,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if a bounded wait expired.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the operation might succeed if retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. }
                | Self::SendFailed { .. }
                | Self::ReceiveFailed { .. }
                | Self::ConnectionClosed
                | Self::Timeout { .. }
                | Self::Io { .. }
        )
    }

    /// Returns `true` if the remote sent bytes that cannot be framed.
    #[must_use]
    pub const fn is_framing_error(&self) -> bool {
        matches!(self, Self::LineTooLong { .. } | Self::InvalidUtf8)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let addr: SocketAddr = "127.0.0.1:5002".parse().unwrap();
        let err = TransportError::connect_failed(addr, "connection refused");
        assert!(err.to_string().contains("127.0.0.1:5002"));

        let err = TransportError::timeout("read line", Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Operation timed out: read line after 1500ms");
    }

    #[test]
    fn test_classification() {
        let timeout = TransportError::timeout("connect", Duration::from_secs(5));
        assert!(timeout.is_timeout());
        assert!(timeout.is_retryable());

        assert!(TransportError::ConnectionClosed.is_retryable());
        assert!(!TransportError::ConnectionClosed.is_timeout());

        let framing = TransportError::LineTooLong { max: 4096, actual: 5000 };
        assert!(framing.is_framing_error());
        assert!(!framing.is_retryable());
        assert!(!TransportError::ShuttingDown.is_retryable());
    }
}
