//! # duet-protocol
//!
//! Wire event definitions for the Duet pairing server.
//!
//! This crate defines the JSON events exchanged between clients and the
//! server, the text codec, and the ICE server descriptor type.
//!
//! ## Event Kinds
//!
//! - `find-match` / `leave-chat` - Session lifecycle requests
//! - `offer` / `answer` / `candidate` - Relayed WebRTC signaling
//! - `chat-message` - Relayed chat payloads
//! - `matched` / `peer-left` - Server notifications
//!
//! ## Example
//!
//! ```rust
//! use duet_protocol::{codec, ClientEvent, ServerEvent};
//!
//! let event = codec::decode(r#"{"type":"find-match"}"#).unwrap();
//! assert_eq!(event, ClientEvent::FindMatch);
//!
//! let text = codec::encode(&ServerEvent::matched("conn-42")).unwrap();
//! assert!(text.contains("matched"));
//! ```

pub mod codec;
pub mod events;
pub mod ice;

pub use codec::{decode, encode, ProtocolError};
pub use events::{ClientEvent, EventKind, ServerEvent};
pub use ice::{IceServer, IceUrls};
