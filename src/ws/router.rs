//! Inbound frame classification and dispatch.
//!
//! Two-stage classification keeps malformed input from ever dropping a
//! connection: a frame that is not JSON at all is treated as a plain chat
//! text message, while valid JSON that does not decode into a known
//! [`ClientFrame`] (unrecognized discriminant, wrong fields) is ignored.
//! Decoded frames are dispatched through an exhaustive match, so adding a
//! frame variant without handling it here fails to compile.

use std::sync::Arc;

use super::messages::{CallAction, ClientFrame};
use crate::domain::{ClientId, SignalKind};
use crate::service::RelayService;

/// Classification outcome for one inbound text frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A structured frame.
    Frame(ClientFrame),
    /// Not JSON; treated as a plain chat text message.
    PlainText(String),
    /// Valid JSON that matches no known frame shape; dropped.
    Ignored,
}

/// Classifies a raw text frame.
#[must_use]
pub fn classify(raw: &str) -> Inbound {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return Inbound::PlainText(raw.to_string());
    };
    match serde_json::from_value::<ClientFrame>(value) {
        Ok(frame) => Inbound::Frame(frame),
        Err(err) => {
            tracing::debug!(error = %err, "unrecognized frame ignored");
            Inbound::Ignored
        }
    }
}

/// Classifies `raw` and runs the matching relay operation for `client_id`.
///
/// Operation failures stay off the wire: a best-effort relay cannot tell
/// the sender anything useful about an entity that is already gone. They
/// are logged at debug level instead.
pub async fn dispatch(relay: &Arc<RelayService>, client_id: ClientId, raw: &str) {
    let outcome = match classify(raw) {
        Inbound::PlainText(text) => relay.chat_text(client_id, text).await,
        Inbound::Ignored => Ok(()),
        Inbound::Frame(frame) => match frame {
            ClientFrame::Message { content } => relay.chat_text(client_id, content).await,
            ClientFrame::Media {
                media_type,
                media_data,
                file_name,
                file_size,
            } => {
                relay
                    .chat_media(
                        client_id,
                        crate::domain::MediaAttachment {
                            media_type,
                            media_data,
                            file_name,
                            file_size,
                        },
                    )
                    .await
            }
            ClientFrame::Typing { is_typing } => relay.typing(client_id, is_typing).await,
            ClientFrame::ChangeUsername { new_username } => {
                relay.rename(client_id, &new_username).await
            }
            ClientFrame::Call(action) => match action {
                CallAction::Start { target_user_id } => relay
                    .start_call(client_id, target_user_id)
                    .await
                    .map(|_| ()),
                CallAction::Accept { call_id } => relay.accept_call(client_id, call_id).await,
                CallAction::Reject { call_id } => relay.reject_call(client_id, call_id).await,
                CallAction::End { call_id } => relay.end_call(client_id, call_id).await,
                CallAction::Offer {
                    data,
                    target_user_id,
                } => {
                    relay
                        .relay_signal(client_id, target_user_id, SignalKind::Offer, data)
                        .await
                }
                CallAction::Answer {
                    data,
                    target_user_id,
                } => {
                    relay
                        .relay_signal(client_id, target_user_id, SignalKind::Answer, data)
                        .await
                }
                CallAction::IceCandidate {
                    data,
                    target_user_id,
                } => {
                    relay
                        .relay_signal(client_id, target_user_id, SignalKind::IceCandidate, data)
                        .await
                }
            },
            ClientFrame::Webrtc {
                action,
                data,
                target_user_id,
            } => {
                relay
                    .relay_signal(client_id, target_user_id, action, data)
                    .await
            }
        },
    };

    if let Err(err) = outcome {
        tracing::debug!(client_id = %client_id, error = %err, "relay operation was a no-op");
    }
}
