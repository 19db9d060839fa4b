// ============================================
// File: crates/peerlink-node/src/error.rs
// ============================================
//! # Node Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial node errors

use peerlink_common::error::CommonError;
use peerlink_common::types::PeerId;
use peerlink_core::error::CoreError;
use peerlink_transport::error::TransportError;
use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

/// Node error types.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The config file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// File that failed
        path: String,
        /// Parser or I/O message
        reason: String,
    },

    /// A config value failed validation.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending key, e.g. `keys.secret_max`
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The directory has no key for this identity.
    #[error("Unknown peer: no public key registered for '{0}'")]
    UnknownPeer(PeerId),

    /// The address book has no socket address for this identity.
    #[error("No address configured for peer '{0}'")]
    UnknownAddress(PeerId),

    /// The directory could not be connected to or did not answer.
    #[error("Directory unreachable: {reason}")]
    DirectoryUnreachable {
        /// Transport failure
        reason: String,
    },

    /// The directory answered `ERROR` or something unparsable.
    #[error("Directory protocol error: {reason}")]
    DirectoryProtocol {
        /// What was wrong with the reply
        reason: String,
    },

    /// The counterpart answered `HS_FAIL`.
    #[error("Handshake rejected by '{peer}'")]
    HandshakeRejected {
        /// Counterpart that rejected
        peer: PeerId,
    },

    /// No established session with this identity.
    #[error("No active session with '{0}'")]
    NoActiveSession(PeerId),

    /// A handshake or message signature did not verify.
    #[error("Signature mismatch on message from '{peer}'")]
    SignatureMismatch {
        /// Claimed sender
        peer: PeerId,
    },

    /// A connect, read or write exceeded its bound.
    #[error("Timed out: {operation} after {duration_ms}ms")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// Configured bound
        duration_ms: u64,
    },

    /// The counterpart's address refused or dropped the connection.
    #[error("Peer '{peer}' unreachable: {reason}")]
    PeerUnreachable {
        /// Counterpart being dialled
        peer: PeerId,
        /// Transport failure
        reason: String,
    },

    /// Outbound text or an inbound envelope is unusable.
    #[error("Invalid message: {reason}")]
    InvalidMessage {
        /// What is wrong with it
        reason: String,
    },

    /// The keyring file could not be read, parsed or written.
    #[error("Key store error at '{path}': {reason}")]
    KeyStore {
        /// Keyring file
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// The node is stopping.
    #[error("Node is shutting down")]
    ShuttingDown,

    /// Shared validation error.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Crypto or codec error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Transport error not mapped to a node variant.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `DirectoryProtocol` error.
    pub fn directory_protocol(reason: impl Into<String>) -> Self {
        Self::DirectoryProtocol {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidMessage` error.
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `KeyStore` error.
    pub fn key_store(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::KeyStore {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps a transport failure while talking to the directory.
    #[must_use]
    pub fn from_directory_transport(err: TransportError) -> Self {
        match err {
            TransportError::Timeout {
                operation,
                duration_ms,
            } => Self::Timeout {
                operation: format!("directory {operation}"),
                duration_ms,
            },
            other => Self::DirectoryUnreachable {
                reason: other.to_string(),
            },
        }
    }

    /// Maps a transport failure while talking to `peer`.
    #[must_use]
    pub fn from_peer_transport(peer: &PeerId, err: TransportError) -> Self {
        match err {
            TransportError::Timeout {
                operation,
                duration_ms,
            } => Self::Timeout {
                operation: format!("{operation} with '{peer}'"),
                duration_ms,
            },
            other => Self::PeerUnreachable {
                peer: peer.clone(),
                reason: other.to_string(),
            },
        }
    }

    /// Configuration could not be loaded or validated.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// The remote side (or local state) refused the operation.
    #[must_use]
    pub const fn is_protocol_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownPeer(_)
                | Self::HandshakeRejected { .. }
                | Self::NoActiveSession(_)
                | Self::SignatureMismatch { .. }
        )
    }

    /// The remote side could not be reached or did not answer in time.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::PeerUnreachable { .. }
                | Self::DirectoryUnreachable { .. }
                | Self::Transport(_)
        )
    }

    /// A later attempt might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Timeout { .. } | Self::PeerUnreachable { .. } | Self::DirectoryUnreachable { .. } => {
                true
            }
            _ => false,
        }
    }

    /// The process cannot continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. }
                | Self::ConfigInvalid { .. }
                | Self::Core(CoreError::KeyGeneration { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = NodeError::config_load("peerlink.toml", "file not found");
        assert!(err.to_string().contains("peerlink.toml"));

        let err = NodeError::NoActiveSession(peer("Bob"));
        assert_eq!(err.to_string(), "No active session with 'Bob'");
    }

    #[test]
    fn test_error_classification() {
        let config_err = NodeError::config_invalid("keys.prime_pool", "too small");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let rejected = NodeError::HandshakeRejected { peer: peer("Bob") };
        assert!(rejected.is_protocol_rejection());
        assert!(!rejected.is_transport_failure());
        assert!(!rejected.is_retryable());

        let mismatch = NodeError::SignatureMismatch { peer: peer("Alice") };
        assert!(mismatch.is_protocol_rejection());
    }

    #[test]
    fn test_transport_mapping() {
        let timeout = TransportError::timeout("read line", Duration::from_millis(250));
        let err = NodeError::from_peer_transport(&peer("Bob"), timeout);
        assert!(matches!(err, NodeError::Timeout { duration_ms: 250, .. }));
        assert!(err.is_transport_failure());
        assert!(!err.is_protocol_rejection());

        let err = NodeError::from_peer_transport(&peer("Bob"), TransportError::ConnectionClosed);
        assert!(matches!(err, NodeError::PeerUnreachable { .. }));

        let err = NodeError::from_directory_transport(TransportError::ConnectionClosed);
        assert!(matches!(err, NodeError::DirectoryUnreachable { .. }));
        assert!(err.is_retryable());
    }
}
