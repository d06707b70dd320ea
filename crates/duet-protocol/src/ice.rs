//! ICE server descriptors handed to clients.
//!
//! The server never computes or validates these; they are pre-resolved
//! configuration data passed through opaquely so clients can establish
//! their peer-to-peer media transport.

use serde::{Deserialize, Serialize};

/// One or more STUN/TURN URLs for a single server entry.
///
/// Providers emit either a single URL string or an array; both shapes
/// are accepted and preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IceUrls {
    One(String),
    Many(Vec<String>),
}

/// An ICE server descriptor in the shape browsers expect for
/// `RTCPeerConnection` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// STUN/TURN URL(s).
    pub urls: IceUrls,
    /// TURN username, if the server requires credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// TURN credential, if the server requires credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// Create a credential-less descriptor (typical for public STUN).
    #[must_use]
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: IceUrls::One(url.into()),
            username: None,
            credential: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stun_descriptor_shape() {
        let server = IceServer::stun("stun:stun.l.google.com:19302");
        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(value, json!({"urls": "stun:stun.l.google.com:19302"}));
    }

    #[test]
    fn test_turn_descriptor_with_credentials() {
        let value = json!({
            "urls": ["turn:turn.example.com:3478?transport=udp",
                     "turn:turn.example.com:3478?transport=tcp"],
            "username": "user",
            "credential": "secret"
        });
        let server: IceServer = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(server.username.as_deref(), Some("user"));
        assert_eq!(serde_json::to_value(&server).unwrap(), value);
    }
}
