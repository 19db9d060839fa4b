// ============================================
// File: crates/peerlink-node/src/services/session.rs
// ============================================
//! # Session Management Service
//!
//! ## Creation Reason
//! Tracks, per counterpart, the symmetric key agreed during the last
//! successful handshake and any handshake this peer is currently initiating.
//!
//! ## Main Functionality
//! - `Session`: Agreed key plus activity bookkeeping
//! - `SessionState`: Per-counterpart state as seen by the UI
//! - `SessionManager`: Concurrent session table
//! - `PendingHandshake`: Guard that clears the pending mark on drop
//!
//! ## Session Lifecycle
//! ```text
//! ┌───────────┐  initiate   ┌──────────────────┐   HS_OK    ┌─────────────┐
//! │ NoSession │ ──────────► │ HandshakePending │ ─────────► │ Established │
//! └───────────┘             └────────┬─────────┘            └──────┬──────┘
//!       ▲                            │ HS_FAIL / timeout           │
//!       └────────────────────────────┘                             │
//!                                                  new handshake   │
//!                                   (either side) supersedes ◄─────┘
//! ```
//! A responder goes straight from `NoSession` to `Established` when it
//! accepts an offer. There is no teardown message.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Sessions are keyed by counterpart identity, not by connection
//! - Adopting a new secret is a single map insert; readers clone the key
//! - Always go through `SessionManager`, never hold a DashMap ref across
//!   an await
//!
//! ## Last Modified
//! v0.1.0 - Initial session management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use peerlink_common::time::AtomicInstant;
use peerlink_common::types::PeerId;
use peerlink_core::crypto::SymmetricKey;
use tracing::{debug, info};

use crate::error::{NodeError, Result};

// ============================================
// Session State
// ============================================

/// Per-counterpart state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing agreed and nothing in flight.
    NoSession,
    /// We sent an offer and await the acknowledgement.
    HandshakePending,
    /// A symmetric key is agreed.
    Established,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "NoSession"),
            Self::HandshakePending => write!(f, "HandshakePending"),
            Self::Established => write!(f, "Established"),
        }
    }
}

/// Which side started the handshake that produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// We sent the offer.
    Initiator,
    /// We accepted the offer.
    Responder,
}

impl std::fmt::Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiator => write!(f, "initiator"),
            Self::Responder => write!(f, "responder"),
        }
    }
}

// ============================================
// Session
// ============================================

/// Established session with one counterpart.
pub struct Session {
    /// Peer on the other end.
    pub counterpart: PeerId,
    /// Side this peer played in the handshake.
    pub role: SessionRole,
    key: SymmetricKey,
    /// When the key was adopted.
    pub established_at: Instant,
    /// Last message sent or received.
    pub last_activity: AtomicInstant,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
}

impl Session {
    /// Creates a session stamped with the current time.
    #[must_use]
    pub fn new(counterpart: PeerId, key: SymmetricKey, role: SessionRole) -> Self {
        let now = Instant::now();
        Self {
            counterpart,
            role,
            key,
            established_at: now,
            last_activity: AtomicInstant::from_instant(now),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
        }
    }

    /// Returns a copy of the agreed key.
    #[must_use]
    pub fn key(&self) -> SymmetricKey {
        self.key.clone()
    }

    /// Counts one outbound message.
    pub fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.last_activity.touch();
    }

    /// Counts one verified inbound message.
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_activity.touch();
    }

    /// Messages sent over this session.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Messages received over this session.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Time since the session was established.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.established_at.elapsed()
    }

    /// Time since the last message in either direction.
    #[must_use]
    pub fn idle_time(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("counterpart", &self.counterpart)
            .field("role", &self.role)
            .field("age", &self.age())
            .field("sent", &self.messages_sent())
            .field("received", &self.messages_received())
            .finish_non_exhaustive()
    }
}

// ============================================
// Session Manager
// ============================================

/// Manages all sessions of this peer.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: DashMap<PeerId, Arc<Session>>,
    pending: DashMap<PeerId, Instant>,
}

impl SessionManager {
    /// Creates an empty session table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts `key` for `counterpart`, superseding any previous session.
    pub fn establish(&self, counterpart: &PeerId, key: SymmetricKey, role: SessionRole) -> Arc<Session> {
        let session = Arc::new(Session::new(counterpart.clone(), key, role));
        let previous = self.sessions.insert(counterpart.clone(), Arc::clone(&session));

        if previous.is_some() {
            info!(counterpart = %counterpart, role = %role, "Session superseded");
        } else {
            info!(counterpart = %counterpart, role = %role, "Session established");
        }
        session
    }

    /// Returns the session with `counterpart`, if any.
    #[must_use]
    pub fn get(&self, counterpart: &PeerId) -> Option<Arc<Session>> {
        self.sessions.get(counterpart).map(|r| Arc::clone(r.value()))
    }

    /// Returns the session with `counterpart`.
    ///
    /// # Errors
    /// [`NodeError::NoActiveSession`] if none is established.
    pub fn get_or_error(&self, counterpart: &PeerId) -> Result<Arc<Session>> {
        self.get(counterpart)
            .ok_or_else(|| NodeError::NoActiveSession(counterpart.clone()))
    }

    /// Returns the state towards `counterpart`. An established session wins
    /// over a pending re-handshake.
    #[must_use]
    pub fn state(&self, counterpart: &PeerId) -> SessionState {
        if self.sessions.contains_key(counterpart) {
            SessionState::Established
        } else if self.pending.contains_key(counterpart) {
            SessionState::HandshakePending
        } else {
            SessionState::NoSession
        }
    }

    /// Marks a handshake towards `counterpart` as in flight until the
    /// returned guard is dropped.
    #[must_use]
    pub fn begin_handshake(&self, counterpart: &PeerId) -> PendingHandshake<'_> {
        self.pending.insert(counterpart.clone(), Instant::now());
        debug!(counterpart = %counterpart, "Handshake pending");
        PendingHandshake {
            manager: self,
            counterpart: counterpart.clone(),
        }
    }

    /// Returns all sessions ordered by counterpart.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<_> = self.sessions.iter().map(|r| Arc::clone(r.value())).collect();
        sessions.sort_by(|a, b| a.counterpart.cmp(&b.counterpart));
        sessions
    }

    /// Returns the counterparts with a handshake in flight.
    #[must_use]
    pub fn pending(&self) -> Vec<PeerId> {
        let mut pending: Vec<_> = self.pending.iter().map(|r| r.key().clone()).collect();
        pending.sort();
        pending
    }

    /// Number of established sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// `true` when no session is established.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ============================================
// PendingHandshake
// ============================================

/// Clears the pending mark of one counterpart when dropped.
#[derive(Debug)]
pub struct PendingHandshake<'a> {
    manager: &'a SessionManager,
    counterpart: PeerId,
}

impl PendingHandshake<'_> {
    /// Adopts `key` as the initiator and clears the pending mark.
    pub fn complete(self, key: SymmetricKey) -> Arc<Session> {
        self.manager
            .establish(&self.counterpart, key, SessionRole::Initiator)
    }
}

impl Drop for PendingHandshake<'_> {
    fn drop(&mut self) {
        if let Some((_, started)) = self.manager.pending.remove(&self.counterpart) {
            debug!(
                counterpart = %self.counterpart,
                elapsed_ms = started.elapsed().as_millis(),
                "Handshake no longer pending"
            );
        }
    }
}

// ============================================
// Tests
// ============================================
