//! Codec for encoding and decoding Duet events.
//!
//! Events travel as JSON text frames over the WebSocket, one event per
//! frame, so no additional length framing is needed here.

use thiserror::Error;

use crate::events::{ClientEvent, ServerEvent};

/// Maximum encoded event size (64 KiB).
///
/// Signaling payloads are small; anything larger is a misbehaving client.
pub const MAX_EVENT_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Event exceeds maximum size.
    #[error("Event size {0} exceeds maximum {MAX_EVENT_SIZE}")]
    EventTooLarge(usize),

    /// JSON serialization error.
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a server event to a JSON text frame.
///
/// # Errors
///
/// Returns an error if the event is too large or serialization fails.
pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(event)?;
    if text.len() > MAX_EVENT_SIZE {
        return Err(ProtocolError::EventTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a client event from a JSON text frame.
///
/// # Errors
///
/// Returns an error if the frame is too large, not valid JSON, or not a
/// known event kind.
pub fn decode(text: &str) -> Result<ClientEvent, ProtocolError> {
    if text.len() > MAX_EVENT_SIZE {
        return Err(ProtocolError::EventTooLarge(text.len()));
    }
    let event = serde_json::from_str(text)?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_each_client_kind() {
        let cases = [
            (r#"{"type":"find-match"}"#, ClientEvent::FindMatch),
            (
                r#"{"type":"chat-message","message":"hi","peerId":"b"}"#,
                ClientEvent::ChatMessage {
                    message: json!("hi"),
                    peer_id: "b".into(),
                },
            ),
            (
                r#"{"type":"offer","offer":{"sdp":"v=0"},"peerId":"b"}"#,
                ClientEvent::Offer {
                    offer: json!({"sdp": "v=0"}),
                    peer_id: "b".into(),
                },
            ),
            (
                r#"{"type":"answer","answer":{"sdp":"v=0"},"peerId":"a"}"#,
                ClientEvent::Answer {
                    answer: json!({"sdp": "v=0"}),
                    peer_id: "a".into(),
                },
            ),
            (
                r#"{"type":"candidate","candidate":{"sdpMid":"0"},"peerId":"a"}"#,
                ClientEvent::Candidate {
                    candidate: json!({"sdpMid": "0"}),
                    peer_id: "a".into(),
                },
            ),
            (r#"{"type":"leave-chat"}"#, ClientEvent::LeaveChat),
        ];

        for (text, expected) in cases {
            assert_eq!(decode(text).unwrap(), expected);
        }
    }

    #[test]
    fn test_decode_unknown_kind() {
        assert!(matches!(
            decode(r#"{"type":"shutdown-server"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_not_json() {
        assert!(matches!(
            decode("find-match"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_oversized() {
        let huge = format!(
            r#"{{"type":"chat-message","message":"{}","peerId":"b"}}"#,
            "x".repeat(MAX_EVENT_SIZE)
        );
        assert!(matches!(
            decode(&huge),
            Err(ProtocolError::EventTooLarge(_))
        ));
    }

    #[test]
    fn test_encode_matched() {
        let text = encode(&ServerEvent::matched("conn-7")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"type": "matched", "peerId": "conn-7"}));
    }

    #[test]
    fn test_encode_peer_left() {
        let text = encode(&ServerEvent::PeerLeft).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"type": "peer-left"}));
    }
}
