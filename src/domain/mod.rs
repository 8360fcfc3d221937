//! Domain layer: identities, participants, messages, calls, and events.
//!
//! This module contains the server-side domain model: typed identifiers,
//! the participant registry, the bounded message history, the live-call
//! board with its state machine, and the outbound event vocabulary. All
//! containers here are lock-free; the service layer guards them with a
//! single `RwLock` (see `crate::service`).

pub mod call;
pub mod call_board;
pub mod event;
pub mod history;
pub mod ids;
pub mod message;
pub mod participant;
pub mod registry;

pub use call::{Call, CallStatus};
pub use call_board::CallBoard;
pub use event::{ServerEvent, SignalKind};
pub use history::{DEFAULT_HISTORY_CAPACITY, MessageHistory};
pub use ids::{CallId, ClientId, MessageId};
pub use message::{ChatMessage, MediaAttachment, MediaKind, MessageBody};
pub use participant::{OutboundSender, Participant, PresenceEntry};
pub use registry::ParticipantRegistry;
