//! # duet-core
//!
//! Matchmaking, pairing state, and relay core for the Duet server.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **ConnectionId / EventSink** - Connection identity and outbound delivery
//! - **SessionManager** - Waiting queue, pairing table, matchmaking, teardown
//! - **RelayKind** - The payload kinds forwarded between partners
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌─────────────┐
//! │  Connection │────▶│ SessionManager │────▶│  EventSink  │
//! └─────────────┘     └────────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                ┌───────────────────────┐
//!                │ waiting queue + pairs │
//!                └───────────────────────┘
//! ```
//!
//! All state lives in process memory and resets on restart.

pub mod connection;
pub mod session;

pub use connection::{ConnectionId, EventSink};
pub use session::{RelayKind, SessionManager, SessionStats};
