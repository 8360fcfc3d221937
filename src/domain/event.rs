//! Server-to-client events.
//!
//! Every state change emits a [`ServerEvent`], delivered either to a single
//! participant's outbound queue (targeted) or fanned out to all registered
//! participants (broadcast). Events serialize to one JSON object per
//! WebSocket frame with a `type` discriminant and camelCase fields, the
//! exact shapes the browser client consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, MessageBody};
use super::participant::PresenceEntry;
use super::{CallId, ClientId, MediaKind, MessageId};

/// WebRTC signaling action relayed between two call members.
///
/// The relay never inspects the accompanying payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    /// SDP offer.
    Offer,
    /// SDP answer.
    Answer,
    /// ICE candidate.
    IceCandidate,
}

impl SignalKind {
    /// Returns the action as its wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
        }
    }
}

/// Outbound event as serialized onto the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once to a newly connected participant: identity, assigned
    /// display name, the retained history window verbatim, and who is
    /// online.
    #[serde(rename_all = "camelCase")]
    Welcome {
        /// The new participant's identity.
        client_id: ClientId,
        /// The assigned display name.
        username: String,
        /// Retained history window in original insertion order, as the
        /// same `message`/`media` events a live broadcast would carry.
        history: Vec<ServerEvent>,
        /// Presence records for everyone else currently online.
        online_users: Vec<PresenceEntry>,
    },

    /// A text chat message, broadcast to all participants.
    #[serde(rename_all = "camelCase")]
    Message {
        /// Message identifier.
        id: MessageId,
        /// Author identity.
        user_id: ClientId,
        /// Author display name at send time.
        username: String,
        /// Text content.
        content: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A media chat message, broadcast to all participants.
    #[serde(rename_all = "camelCase")]
    Media {
        /// Message identifier.
        id: MessageId,
        /// Author identity.
        user_id: ClientId,
        /// Author display name at send time.
        username: String,
        /// Attachment kind.
        media_type: MediaKind,
        /// Inline-encoded payload, relayed opaque.
        media_data: String,
        /// Original file name.
        file_name: String,
        /// Original file size in bytes.
        file_size: u64,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A participant joined, broadcast to everyone already present.
    #[serde(rename_all = "camelCase")]
    UserJoined {
        /// Joining participant's identity.
        user_id: ClientId,
        /// Joining participant's display name.
        username: String,
        /// When the join happened.
        timestamp: DateTime<Utc>,
    },

    /// A participant left, broadcast to everyone remaining.
    #[serde(rename_all = "camelCase")]
    UserLeft {
        /// Leaving participant's identity.
        user_id: ClientId,
        /// Leaving participant's display name.
        username: String,
        /// When the leave happened.
        timestamp: DateTime<Utc>,
    },

    /// A participant changed display name, broadcast to all.
    #[serde(rename_all = "camelCase")]
    UsernameChanged {
        /// Renamed participant's identity.
        user_id: ClientId,
        /// Display name before the change.
        old_username: String,
        /// Display name after the change.
        new_username: String,
    },

    /// Ephemeral typing indicator, relayed to everyone except the typist.
    /// Never retained in history.
    #[serde(rename_all = "camelCase")]
    Typing {
        /// Typist identity.
        user_id: ClientId,
        /// Typist display name.
        username: String,
        /// Whether typing started or stopped.
        is_typing: bool,
    },

    /// Targeted ring notification for the callee.
    #[serde(rename_all = "camelCase")]
    IncomingCall {
        /// Call identifier.
        call_id: CallId,
        /// Caller identity.
        caller_id: ClientId,
        /// Caller display name.
        caller_name: String,
        /// When the call started ringing.
        timestamp: DateTime<Utc>,
    },

    /// A call entered `ringing`, broadcast to all participants.
    #[serde(rename_all = "camelCase")]
    CallStarted {
        /// Call identifier.
        call_id: CallId,
        /// Caller identity.
        caller_id: ClientId,
        /// Callee identity.
        target_user_id: ClientId,
        /// When the call started ringing.
        timestamp: DateTime<Utc>,
    },

    /// A call was accepted: targeted to the caller and broadcast to the
    /// rest.
    #[serde(rename_all = "camelCase")]
    CallAccepted {
        /// Call identifier.
        call_id: CallId,
        /// Accepting participant's identity.
        accepter_id: ClientId,
        /// When the call was accepted.
        timestamp: DateTime<Utc>,
    },

    /// A ringing call was rejected: targeted to the caller and broadcast
    /// to the rest.
    #[serde(rename_all = "camelCase")]
    CallRejected {
        /// Call identifier.
        call_id: CallId,
        /// Rejecting participant's identity.
        rejecter_id: ClientId,
        /// When the call was rejected.
        timestamp: DateTime<Utc>,
    },

    /// A call ended: targeted to both members and broadcast to the rest.
    #[serde(rename_all = "camelCase")]
    CallEnded {
        /// Call identifier.
        call_id: CallId,
        /// Identity that ended the call (hang-up or disconnect).
        ended_by: ClientId,
        /// When the call ended.
        timestamp: DateTime<Utc>,
    },

    /// Targeted busy notification for a caller whose target is unknown or
    /// already in a call.
    #[serde(rename_all = "camelCase")]
    CallBusy {
        /// The identity the caller tried to reach.
        target_user_id: ClientId,
        /// When the attempt was refused.
        timestamp: DateTime<Utc>,
    },

    /// Relayed WebRTC signaling payload, targeted to one call member.
    #[serde(rename_all = "camelCase")]
    Webrtc {
        /// Signaling action.
        action: SignalKind,
        /// Opaque signaling payload, forwarded verbatim.
        data: serde_json::Value,
        /// Identity of the sending call member.
        from_user_id: ClientId,
    },
}

impl ServerEvent {
    /// Returns the wire discriminant as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Message { .. } => "message",
            Self::Media { .. } => "media",
            Self::UserJoined { .. } => "userJoined",
            Self::UserLeft { .. } => "userLeft",
            Self::UsernameChanged { .. } => "usernameChanged",
            Self::Typing { .. } => "typing",
            Self::IncomingCall { .. } => "incomingCall",
            Self::CallStarted { .. } => "callStarted",
            Self::CallAccepted { .. } => "callAccepted",
            Self::CallRejected { .. } => "callRejected",
            Self::CallEnded { .. } => "callEnded",
            Self::CallBusy { .. } => "callBusy",
            Self::Webrtc { .. } => "webrtc",
        }
    }
}

impl From<&ChatMessage> for ServerEvent {
    fn from(msg: &ChatMessage) -> Self {
        match &msg.body {
            MessageBody::Text(content) => Self::Message {
                id: msg.id,
                user_id: msg.author,
                username: msg.username.clone(),
                content: content.clone(),
                timestamp: msg.timestamp,
            },
            MessageBody::Media(attachment) => Self::Media {
                id: msg.id,
                user_id: msg.author,
                username: msg.username.clone(),
                media_type: attachment.media_type,
                media_data: attachment.media_data.clone(),
                file_name: attachment.file_name.clone(),
                file_size: attachment.file_size,
                timestamp: msg.timestamp,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn discriminant_is_camel_case() {
        let event = ServerEvent::UserJoined {
            user_id: ClientId::new(),
            username: "alice".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"type\":\"userJoined\""));
        assert!(json.contains("\"userId\""));
        assert_eq!(event.event_type_str(), "userJoined");
    }

    #[test]
    fn signal_kind_uses_kebab_case() {
        let json = serde_json::to_string(&SignalKind::IceCandidate).ok();
        assert_eq!(json.as_deref(), Some("\"ice-candidate\""));
        assert_eq!(SignalKind::IceCandidate.as_str(), "ice-candidate");
    }

    #[test]
    fn text_message_converts_to_message_event() {
        let msg = ChatMessage::text(ClientId::new(), "bob".to_string(), "hello".to_string());
        let event = ServerEvent::from(&msg);
        assert_eq!(event.event_type_str(), "message");
        let ServerEvent::Message { content, username, .. } = event else {
            panic!("expected message event");
        };
        assert_eq!(content, "hello");
        assert_eq!(username, "bob");
    }

    #[test]
    fn media_message_converts_with_flattened_fields() {
        let msg = ChatMessage::media(
            ClientId::new(),
            "carol".to_string(),
            crate::domain::MediaAttachment {
                media_type: MediaKind::Image,
                media_data: "data:image/png;base64,AAAA".to_string(),
                file_name: "cat.png".to_string(),
                file_size: 42,
            },
        );
        let json = serde_json::to_string(&ServerEvent::from(&msg)).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"type\":\"media\""));
        assert!(json.contains("\"mediaType\":\"image\""));
        assert!(json.contains("\"fileName\":\"cat.png\""));
    }

    #[test]
    fn welcome_embeds_history_events() {
        let msg = ChatMessage::text(ClientId::new(), "dan".to_string(), "first".to_string());
        let event = ServerEvent::Welcome {
            client_id: ClientId::new(),
            username: "user-abcd1234".to_string(),
            history: vec![ServerEvent::from(&msg)],
            online_users: Vec::new(),
        };
        let json = serde_json::to_string(&event).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"type\":\"welcome\""));
        assert!(json.contains("\"history\":[{\"type\":\"message\""));
        assert!(json.contains("\"onlineUsers\":[]"));
    }
}
