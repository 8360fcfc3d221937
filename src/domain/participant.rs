//! Participant records and presence snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use super::event::ServerEvent;
use super::{CallId, ClientId};

/// Outbound event queue handle for one connected participant.
///
/// The socket loop owns the receiving half; dropping the participant drops
/// the sender, which lets the loop wind down.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

/// One connected chat/call actor.
///
/// Created when the connection is accepted, destroyed on disconnect. The
/// outbound sender is exclusively owned by the participant; there is no
/// reverse lookup from transport to identity anywhere in the crate.
#[derive(Debug)]
pub struct Participant {
    /// Unique identity for the connection's lifetime.
    pub id: ClientId,
    /// Mutable display name; defaults to a label derived from the identity.
    pub username: String,
    /// Outbound event queue into the participant's socket loop.
    pub sender: OutboundSender,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
    /// Whether the participant currently counts as busy for call starts.
    pub in_call: bool,
    /// The live call this participant has joined, if any.
    pub current_call: Option<CallId>,
}

impl Participant {
    /// Creates a participant with the default display name and no call
    /// state.
    #[must_use]
    pub fn new(id: ClientId, sender: OutboundSender) -> Self {
        Self {
            id,
            username: id.default_username(),
            sender,
            connected_at: Utc::now(),
            in_call: false,
            current_call: None,
        }
    }

    /// Marks the participant as joined to `call_id`.
    pub fn join_call(&mut self, call_id: CallId) {
        self.in_call = true;
        self.current_call = Some(call_id);
    }

    /// Clears all call state.
    pub fn leave_call(&mut self) {
        self.in_call = false;
        self.current_call = None;
    }

    /// Returns the presence record broadcast to other participants.
    #[must_use]
    pub fn presence(&self) -> PresenceEntry {
        PresenceEntry {
            id: self.id,
            username: self.username.clone(),
            is_in_call: self.in_call,
        }
    }
}

/// Presence record as it appears in `welcome.onlineUsers`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    /// Participant identity.
    #[schema(value_type = uuid::Uuid)]
    pub id: ClientId,
    /// Current display name.
    pub username: String,
    /// Whether the participant is in a call.
    pub is_in_call: bool,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_participant() -> (Participant, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Participant::new(ClientId::new(), sender), receiver)
    }

    #[test]
    fn new_participant_has_default_name_and_no_call() {
        let (participant, _rx) = make_participant();
        assert_eq!(participant.username, participant.id.default_username());
        assert!(!participant.in_call);
        assert!(participant.current_call.is_none());
    }

    #[test]
    fn join_and_leave_call_round_trip() {
        let (mut participant, _rx) = make_participant();
        let call_id = CallId::new();
        participant.join_call(call_id);
        assert!(participant.in_call);
        assert_eq!(participant.current_call, Some(call_id));

        participant.leave_call();
        assert!(!participant.in_call);
        assert!(participant.current_call.is_none());
    }

    #[test]
    fn presence_uses_camel_case_in_call_flag() {
        let (mut participant, _rx) = make_participant();
        participant.in_call = true;
        let json = serde_json::to_string(&participant.presence()).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"isInCall\":true"));
        assert!(json.contains("\"username\""));
    }
}
