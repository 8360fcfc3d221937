//! WebSocket layer: connection handling, frame classification, routing.
//!
//! The WebSocket endpoint at `/ws` is the only client-facing transport:
//! chat, presence, call lifecycle, and signaling all flow through it as
//! one JSON object per text frame.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod router;
