//! Inbound WebSocket frame types.
//!
//! [`ClientFrame`] is the closed vocabulary of structured frames a client
//! can send, discriminated by the `type` field with camelCase field names.
//! Call lifecycle and WebRTC signaling share the `call` discriminant on
//! the wire (discriminated further by `action`); signaling additionally
//! has its own `webrtc` spelling. Anything that fails to decode never
//! reaches these types; see [`super::router`].

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{CallId, ClientId, MediaKind, SignalKind};

/// A structured frame received from a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Text chat message.
    #[serde(rename_all = "camelCase")]
    Message {
        /// Text content to record and broadcast.
        content: String,
    },

    /// Media chat message with an inline-encoded payload.
    #[serde(rename_all = "camelCase")]
    Media {
        /// Attachment kind.
        media_type: MediaKind,
        /// Inline-encoded payload, treated as opaque.
        media_data: String,
        /// Original file name.
        file_name: String,
        /// Original file size in bytes.
        file_size: u64,
    },

    /// Ephemeral typing indicator.
    #[serde(rename_all = "camelCase")]
    Typing {
        /// Whether typing started or stopped.
        is_typing: bool,
    },

    /// Display name change request.
    #[serde(rename_all = "camelCase")]
    ChangeUsername {
        /// The requested new display name.
        new_username: String,
    },

    /// Call lifecycle or signaling action (see [`CallAction`]).
    Call(CallAction),

    /// WebRTC signaling under its dedicated discriminant.
    #[serde(rename_all = "camelCase")]
    Webrtc {
        /// Signaling action.
        action: SignalKind,
        /// Opaque signaling payload.
        data: Value,
        /// Explicit target, or `None` to address the current call peer.
        #[serde(default)]
        target_user_id: Option<ClientId>,
    },
}

/// Actions multiplexed under the `call` discriminant.
///
/// The browser client sends its WebRTC payloads under `type: "call"` too,
/// so the signaling actions live here alongside the lifecycle ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CallAction {
    /// Dial another participant.
    #[serde(rename_all = "camelCase")]
    Start {
        /// The participant to ring.
        target_user_id: ClientId,
    },

    /// Accept a ringing call.
    #[serde(rename_all = "camelCase")]
    Accept {
        /// The call being accepted.
        call_id: CallId,
    },

    /// Reject a ringing call.
    #[serde(rename_all = "camelCase")]
    Reject {
        /// The call being rejected.
        call_id: CallId,
    },

    /// Hang up a ringing or active call.
    #[serde(rename_all = "camelCase")]
    End {
        /// The call being ended.
        call_id: CallId,
    },

    /// Relay an SDP offer to the call peer.
    #[serde(rename_all = "camelCase")]
    Offer {
        /// Opaque session description.
        data: Value,
        /// Explicit target, or `None` to address the current call peer.
        #[serde(default)]
        target_user_id: Option<ClientId>,
    },

    /// Relay an SDP answer to the call peer.
    #[serde(rename_all = "camelCase")]
    Answer {
        /// Opaque session description.
        data: Value,
        /// Explicit target, or `None` to address the current call peer.
        #[serde(default)]
        target_user_id: Option<ClientId>,
    },

    /// Relay an ICE candidate to the call peer.
    #[serde(rename = "ice-candidate", rename_all = "camelCase")]
    IceCandidate {
        /// Opaque candidate description.
        data: Value,
        /// Explicit target, or `None` to address the current call peer.
        #[serde(default)]
        target_user_id: Option<ClientId>,
    },
}
