//! Matchmaking and session state for Duet.
//!
//! The [`SessionManager`] owns the waiting queue and the pairing table
//! and is the only writer of both. All mutations happen under a single
//! lock so the pairing table is never observed with only one side of a
//! pair recorded.

use crate::connection::{ConnectionId, EventSink};
use dashmap::DashMap;
use duet_protocol::{EventKind, ServerEvent};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

/// The kind of payload being relayed between partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayKind {
    /// WebRTC session offer.
    Offer,
    /// WebRTC session answer.
    Answer,
    /// Trickled ICE candidate.
    Candidate,
    /// Chat message.
    Chat,
}

impl RelayKind {
    /// The outbound event kind this relay produces.
    #[must_use]
    pub fn event_kind(&self) -> EventKind {
        match self {
            RelayKind::Offer => EventKind::Offer,
            RelayKind::Answer => EventKind::Answer,
            RelayKind::Candidate => EventKind::Candidate,
            RelayKind::Chat => EventKind::ChatMessage,
        }
    }
}

impl std::fmt::Display for RelayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_kind().as_str())
    }
}

/// Matchmaking state guarded by a single lock.
///
/// Invariants:
/// - `pairs` is symmetric: `pairs[a] == b` implies `pairs[b] == a`.
/// - a connection is never in `waiting` and `pairs` at the same time.
/// - a connection appears in `waiting` at most once.
#[derive(Debug, Default)]
struct MatchState {
    /// Connections seeking a partner, in arrival order.
    waiting: VecDeque<ConnectionId>,
    /// Active sessions as mirrored entries.
    pairs: HashMap<ConnectionId, ConnectionId>,
}

impl MatchState {
    fn remove_waiting(&mut self, id: &ConnectionId) {
        self.waiting.retain(|waiting| waiting != id);
    }

    /// Tear down the session `id` belongs to, if any.
    ///
    /// Removes both mirrored entries and returns the partner to notify.
    /// A self-referencing entry is treated as already torn down.
    fn unpair(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        let partner = self.pairs.remove(id)?;
        if partner == *id {
            warn!(connection = %id, "Removed self-referencing pairing entry");
            return None;
        }
        self.pairs.remove(&partner);
        Some(partner)
    }
}

/// Point-in-time counts of the manager's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Live registered connections.
    pub connections: usize,
    /// Connections waiting for a partner.
    pub waiting: usize,
    /// Active sessions (pairs, not entries).
    pub sessions: usize,
}

/// The central matchmaking and relay authority.
///
/// Owns the waiting queue, the pairing table, and the registry of live
/// outbound sinks. Matchmaking and teardown are the only operations that
/// mutate the queue and table; the relay only reads them.
pub struct SessionManager {
    /// Outbound sinks for live connections.
    sinks: DashMap<ConnectionId, EventSink>,
    /// Waiting queue + pairing table under one mutual-exclusion domain.
    state: Mutex<MatchState>,
}

impl SessionManager {
    /// Create a new, empty session manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: DashMap::new(),
            state: Mutex::new(MatchState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MatchState> {
        // A poisoned lock still holds consistent state: every mutation
        // below completes before the guard is dropped.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get current state counts.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let state = self.state();
        SessionStats {
            connections: self.sinks.len(),
            waiting: state.waiting.len(),
            sessions: state.pairs.len() / 2,
        }
    }

    /// Register a connection's outbound sink.
    ///
    /// Must be called before the connection's events are dispatched.
    pub fn register(&self, id: ConnectionId, sink: EventSink) {
        debug!(connection = %id, "Connection registered");
        self.sinks.insert(id, sink);
    }

    /// Handle a match request.
    ///
    /// If the requester is currently paired it is first removed from that
    /// session (its partner is notified as on leave). Then the requester
    /// is paired with the connection at the front of the waiting queue,
    /// or enqueued if nobody is waiting. Both members of a new session
    /// receive `matched` with their partner's id; an enqueued requester
    /// receives nothing.
    pub fn request_match(&self, requester: &ConnectionId) {
        let mut notifications: Vec<(ConnectionId, ServerEvent)> = Vec::new();

        {
            let mut state = self.state();

            // A paired requester implicitly leaves its current session.
            if let Some(partner) = state.unpair(requester) {
                notifications.push((partner, ServerEvent::PeerLeft));
            }
            // Re-requesting while waiting must not duplicate the entry.
            state.remove_waiting(requester);

            if let Some(partner) = state.waiting.pop_front() {
                state.pairs.insert(requester.clone(), partner.clone());
                state.pairs.insert(partner.clone(), requester.clone());

                info!(a = %requester, b = %partner, "Session formed");
                notifications.push((partner.clone(), ServerEvent::matched(requester.as_str())));
                notifications.push((requester.clone(), ServerEvent::matched(partner.as_str())));
            } else {
                debug!(connection = %requester, "No partner available, enqueued");
                state.waiting.push_back(requester.clone());
            }
        }

        for (target, event) in notifications {
            self.notify(&target, event);
        }
    }

    /// Relay an opaque payload from `sender` to `recipient`.
    ///
    /// Delivered only if the two are currently partnered; otherwise the
    /// payload is dropped silently so a stale in-flight message after a
    /// partner has left never surfaces as an error. Returns whether the
    /// payload was forwarded.
    pub fn relay(
        &self,
        sender: &ConnectionId,
        recipient: &ConnectionId,
        kind: RelayKind,
        payload: Value,
    ) -> bool {
        let partnered = {
            let state = self.state();
            state.pairs.get(sender).is_some_and(|p| p == recipient)
        };

        if !partnered {
            debug!(
                sender = %sender,
                recipient = %recipient,
                kind = %kind,
                "Dropping relay between unpartnered connections"
            );
            return false;
        }

        let event = match kind {
            RelayKind::Offer => ServerEvent::offer(payload, sender.as_str()),
            RelayKind::Answer => ServerEvent::answer(payload, sender.as_str()),
            RelayKind::Candidate => ServerEvent::candidate(payload, sender.as_str()),
            // Chat carries no sender id, matching the protocol clients expect.
            RelayKind::Chat => ServerEvent::chat_message(payload),
        };

        trace!(sender = %sender, recipient = %recipient, kind = %kind, "Relaying payload");
        self.notify(recipient, event)
    }

    /// Handle an explicit leave.
    ///
    /// Tears down the connection's session if it has one and notifies the
    /// surviving partner with `peer-left`; also removes the connection
    /// from the waiting queue. Calling this for a connection with neither
    /// is a no-op. The partner is not re-queued; re-entry is driven by
    /// its own next match request.
    pub fn leave(&self, connection: &ConnectionId) {
        let partner = {
            let mut state = self.state();
            state.remove_waiting(connection);
            state.unpair(connection)
        };

        if let Some(partner) = partner {
            debug!(connection = %connection, partner = %partner, "Session torn down");
            self.notify(&partner, ServerEvent::PeerLeft);
        }
    }

    /// Handle a transport disconnect.
    ///
    /// Performs a full [`leave`](Self::leave) and retires the
    /// connection's sink. The id is never revived.
    pub fn disconnect(&self, connection: &ConnectionId) {
        self.leave(connection);
        self.sinks.remove(connection);
        debug!(connection = %connection, "Connection retired");
    }

    /// Enqueue an event for a connection, best-effort.
    ///
    /// Delivery failure (the connection is already gone) is swallowed
    /// here and never reaches the matchmaking state.
    fn notify(&self, target: &ConnectionId, event: ServerEvent) -> bool {
        match self.sinks.get(target) {
            Some(sink) => {
                let delivered = sink.send(event);
                if !delivered {
                    debug!(connection = %target, "Dropped event for closed connection");
                }
                delivered
            }
            None => {
                debug!(connection = %target, "Dropped event for unknown connection");
                false
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
