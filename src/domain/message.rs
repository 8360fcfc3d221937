//! Chat message records retained in the history window.
//!
//! A [`ChatMessage`] is immutable once created: the author's display name
//! is snapshotted at send time so later renames and disconnects do not
//! rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientId, MessageId};

/// Kind of an inline media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image, rendered inline.
    Image,
    /// Video clip with playback controls.
    Video,
    /// Audio clip with playback controls.
    Audio,
    /// Any other file, offered for download.
    File,
}

impl MediaKind {
    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}

/// Inline media payload carried by a media message.
///
/// `media_data` is an opaque inline-encoded payload (the client sends a
/// data URL); the relay never decodes it and enforces no size cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    /// Attachment kind.
    pub media_type: MediaKind,
    /// Inline-encoded payload, opaque to the relay.
    pub media_data: String,
    /// Original file name.
    pub file_name: String,
    /// Original file size in bytes.
    pub file_size: u64,
}

/// Payload of a chat message: plain text or an inline media attachment.
#[derive(Debug, Clone)]
pub enum MessageBody {
    /// Plain text content.
    Text(String),
    /// Inline media attachment.
    Media(MediaAttachment),
}

/// One retained chat message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Identity of the author at send time.
    pub author: ClientId,
    /// Display name of the author at send time.
    pub username: String,
    /// Text or media payload.
    pub body: MessageBody,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a text message stamped with the current time.
    #[must_use]
    pub fn text(author: ClientId, username: String, content: String) -> Self {
        Self {
            id: MessageId::new(),
            author,
            username,
            body: MessageBody::Text(content),
            timestamp: Utc::now(),
        }
    }

    /// Creates a media message stamped with the current time.
    #[must_use]
    pub fn media(author: ClientId, username: String, attachment: MediaAttachment) -> Self {
        Self {
            id: MessageId::new(),
            author,
            username,
            body: MessageBody::Media(attachment),
            timestamp: Utc::now(),
        }
    }

    /// Returns the wire discriminant for this message's kind.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self.body {
            MessageBody::Text(_) => "message",
            MessageBody::Media(_) => "media",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn text_message_kind() {
        let msg = ChatMessage::text(ClientId::new(), "alice".to_string(), "hi".to_string());
        assert_eq!(msg.kind_str(), "message");
        let MessageBody::Text(content) = &msg.body else {
            panic!("expected text body");
        };
        assert_eq!(content, "hi");
    }

    #[test]
    fn media_message_kind() {
        let attachment = MediaAttachment {
            media_type: MediaKind::Image,
            media_data: "data:image/png;base64,AAAA".to_string(),
            file_name: "cat.png".to_string(),
            file_size: 1024,
        };
        let msg = ChatMessage::media(ClientId::new(), "bob".to_string(), attachment);
        assert_eq!(msg.kind_str(), "media");
    }

    #[test]
    fn media_kind_serializes_lowercase() {
        let json = serde_json::to_string(&MediaKind::Image).ok();
        assert_eq!(json.as_deref(), Some("\"image\""));
        assert_eq!(MediaKind::File.as_str(), "file");
    }

    #[test]
    fn attachment_uses_camel_case_fields() {
        let attachment = MediaAttachment {
            media_type: MediaKind::Audio,
            media_data: "data:audio/ogg;base64,BBBB".to_string(),
            file_name: "note.ogg".to_string(),
            file_size: 2048,
        };
        let json = serde_json::to_string(&attachment).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"mediaType\":\"audio\""));
        assert!(json.contains("\"fileName\":\"note.ogg\""));
        assert!(json.contains("\"fileSize\":2048"));
    }

    #[test]
    fn username_is_snapshotted() {
        let author = ClientId::new();
        let msg = ChatMessage::text(author, "carol".to_string(), "hello".to_string());
        assert_eq!(msg.username, "carol");
        assert_eq!(msg.author, author);
    }
}
