//! # parley-gateway
//!
//! Real-time chat relay and WebRTC call-signaling gateway.
//!
//! Clients connect over a persistent WebSocket, exchange text and media
//! messages broadcast to every participant, and negotiate direct
//! audio/video sessions through an opaque signaling relay: the server
//! forwards offer/answer/ice-candidate payloads between the two call
//! members without ever interpreting them. Media bytes never touch the
//! server.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, REST)
//!     │
//!     ├── WS Handler + Connection Loop (ws/)
//!     ├── Frame Router (ws/router)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── RelayService (service/)
//!     │     ├── chat: connect, messages, rename, typing
//!     │     └── call: lifecycle + signaling relay, ring timers
//!     │
//!     └── RelayState, one RwLock around:
//!           ├── ParticipantRegistry (domain/)
//!           ├── MessageHistory (domain/)
//!           └── CallBoard (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
