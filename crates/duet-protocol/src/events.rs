//! Event types for the Duet protocol.
//!
//! Events are the fundamental unit of communication between a client and
//! the server. Every event is a JSON object tagged with a `type` field;
//! signaling and chat payloads are carried as opaque JSON values that the
//! server forwards without inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event kind identifiers.
///
/// Used for logging and metrics labels; the wire representation is the
/// `type` tag on [`ClientEvent`] / [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FindMatch,
    ChatMessage,
    Offer,
    Answer,
    Candidate,
    LeaveChat,
    Matched,
    PeerLeft,
}

impl EventKind {
    /// The kind as it appears in the `type` tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FindMatch => "find-match",
            EventKind::ChatMessage => "chat-message",
            EventKind::Offer => "offer",
            EventKind::Answer => "answer",
            EventKind::Candidate => "candidate",
            EventKind::LeaveChat => "leave-chat",
            EventKind::Matched => "matched",
            EventKind::PeerLeft => "peer-left",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event received from a client.
///
/// Field names are camelCase on the wire to match the browser clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Request to be paired with another waiting client.
    #[serde(rename = "find-match")]
    FindMatch,

    /// A chat message for the current partner.
    #[serde(rename = "chat-message")]
    ChatMessage {
        /// Opaque message payload.
        message: Value,
        /// The partner the sender believes it is paired with.
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A WebRTC offer for the current partner.
    #[serde(rename = "offer")]
    Offer {
        /// Opaque session description.
        offer: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A WebRTC answer for the current partner.
    #[serde(rename = "answer")]
    Answer {
        /// Opaque session description.
        answer: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A trickled ICE candidate for the current partner.
    #[serde(rename = "candidate")]
    Candidate {
        /// Opaque candidate data.
        candidate: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// Leave the current session without disconnecting.
    #[serde(rename = "leave-chat")]
    LeaveChat,
}

impl ClientEvent {
    /// Get the event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::FindMatch => EventKind::FindMatch,
            ClientEvent::ChatMessage { .. } => EventKind::ChatMessage,
            ClientEvent::Offer { .. } => EventKind::Offer,
            ClientEvent::Answer { .. } => EventKind::Answer,
            ClientEvent::Candidate { .. } => EventKind::Candidate,
            ClientEvent::LeaveChat => EventKind::LeaveChat,
        }
    }
}

/// An event sent to a client.
///
/// Relayed signaling events (`offer`, `answer`, `candidate`) carry the
/// sender's id as `peerId`. `chat-message` deliberately does not: the
/// original protocol delivers chat as the bare payload, and clients
/// depend on that shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A session was formed; `peer_id` is the new partner.
    #[serde(rename = "matched")]
    Matched {
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A chat message from the partner (no sender id attached).
    #[serde(rename = "chat-message")]
    ChatMessage {
        /// Opaque message payload, forwarded unchanged.
        message: Value,
    },

    /// A relayed WebRTC offer; `peer_id` is the sender.
    #[serde(rename = "offer")]
    Offer {
        offer: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A relayed WebRTC answer; `peer_id` is the sender.
    #[serde(rename = "answer")]
    Answer {
        answer: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// A relayed ICE candidate; `peer_id` is the sender.
    #[serde(rename = "candidate")]
    Candidate {
        candidate: Value,
        #[serde(rename = "peerId")]
        peer_id: String,
    },

    /// The partner left or disconnected; the session is gone.
    #[serde(rename = "peer-left")]
    PeerLeft,
}

impl ServerEvent {
    /// Get the event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Matched { .. } => EventKind::Matched,
            ServerEvent::ChatMessage { .. } => EventKind::ChatMessage,
            ServerEvent::Offer { .. } => EventKind::Offer,
            ServerEvent::Answer { .. } => EventKind::Answer,
            ServerEvent::Candidate { .. } => EventKind::Candidate,
            ServerEvent::PeerLeft => EventKind::PeerLeft,
        }
    }

    /// Create a new Matched event.
    #[must_use]
    pub fn matched(peer_id: impl Into<String>) -> Self {
        ServerEvent::Matched {
            peer_id: peer_id.into(),
        }
    }

    /// Create a new ChatMessage event.
    #[must_use]
    pub fn chat_message(message: Value) -> Self {
        ServerEvent::ChatMessage { message }
    }

    /// Create a new Offer event tagged with the sender's id.
    #[must_use]
    pub fn offer(offer: Value, peer_id: impl Into<String>) -> Self {
        ServerEvent::Offer {
            offer,
            peer_id: peer_id.into(),
        }
    }

    /// Create a new Answer event tagged with the sender's id.
    #[must_use]
    pub fn answer(answer: Value, peer_id: impl Into<String>) -> Self {
        ServerEvent::Answer {
            answer,
            peer_id: peer_id.into(),
        }
    }

    /// Create a new Candidate event tagged with the sender's id.
    #[must_use]
    pub fn candidate(candidate: Value, peer_id: impl Into<String>) -> Self {
        ServerEvent::Candidate {
            candidate,
            peer_id: peer_id.into(),
        }
    }
}
