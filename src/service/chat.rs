//! Chat and presence operations: connect, disconnect, messages, rename,
//! typing relay.

use chrono::Utc;

use super::RelayService;
use crate::domain::{ChatMessage, ClientId, MediaAttachment, Participant, ServerEvent};
use crate::error::GatewayError;

impl RelayService {
    /// Registers a new participant and returns its identity.
    ///
    /// The welcome (identity, assigned display name, full retained history
    /// in insertion order, presence list of everyone else) is snapshotted
    /// and enqueued under the same write lock that performs the
    /// registration, so the replay reflects exactly the messages recorded
    /// before the welcome was constructed. Everyone already present
    /// receives a `userJoined` broadcast; the joiner does not; the
    /// welcome already carries their state.
    pub async fn connect(&self, sender: crate::domain::OutboundSender) -> ClientId {
        let mut state = self.state().write().await;

        let participant = Participant::new(ClientId::new(), sender);
        let id = participant.id;
        let username = participant.username.clone();

        let history: Vec<ServerEvent> = state.history.iter().map(ServerEvent::from).collect();
        let online_users = state.registry.presence(None);
        let welcome = ServerEvent::Welcome {
            client_id: id,
            username: username.clone(),
            history,
            online_users,
        };
        // The socket loop has not started draining yet; an unbounded queue
        // makes this send infallible short of a dropped receiver.
        let _ = participant.sender.send(welcome);

        state.registry.insert(participant);
        state.broadcast(
            &ServerEvent::UserJoined {
                user_id: id,
                username: username.clone(),
                timestamp: Utc::now(),
            },
            Some(id),
        );

        tracing::info!(client_id = %id, %username, online = state.registry.len(), "participant connected");
        id
    }

    /// Deregisters a participant after tearing down its live call.
    ///
    /// The call teardown (found by membership scan, so a rung target that
    /// never accepted is covered) and the removal happen under one lock
    /// acquisition: no call ever references a deregistered participant,
    /// and the other party's flags are reset in the same logical step.
    /// Idempotent: a second disconnect for the same identity is a no-op.
    pub async fn disconnect(&self, id: ClientId) {
        let mut state = self.state().write().await;

        let live_call = state.calls.call_for(id).map(|call| call.id);
        if let Some(call_id) = live_call {
            self.finish_call_locked(&mut state, call_id, id);
        }

        let Some(participant) = state.registry.remove(id) else {
            return;
        };
        state.broadcast(
            &ServerEvent::UserLeft {
                user_id: id,
                username: participant.username.clone(),
                timestamp: Utc::now(),
            },
            None,
        );

        tracing::info!(client_id = %id, username = %participant.username, online = state.registry.len(), "participant disconnected");
    }

    /// Records a text message and fans it out to every participant,
    /// author included (the client filters its own echoes at display
    /// time).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] if the author is
    /// unknown; the frame is dropped silently on the wire.
    pub async fn chat_text(&self, author: ClientId, content: String) -> Result<(), GatewayError> {
        let mut state = self.state().write().await;
        let Some(participant) = state.registry.get(author) else {
            return Err(GatewayError::ParticipantNotFound(author));
        };
        let message = ChatMessage::text(author, participant.username.clone(), content);
        let event = ServerEvent::from(&message);
        state.history.push(message);
        state.broadcast(&event, None);
        Ok(())
    }

    /// Records a media message and fans it out to every participant.
    ///
    /// The attachment payload is relayed opaque; no size cap is enforced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] if the author is
    /// unknown.
    pub async fn chat_media(
        &self,
        author: ClientId,
        attachment: MediaAttachment,
    ) -> Result<(), GatewayError> {
        let mut state = self.state().write().await;
        let Some(participant) = state.registry.get(author) else {
            return Err(GatewayError::ParticipantNotFound(author));
        };
        let message = ChatMessage::media(author, participant.username.clone(), attachment);
        let event = ServerEvent::from(&message);
        state.history.push(message);
        state.broadcast(&event, None);
        Ok(())
    }

    /// Renames a participant and broadcasts the change with the old name.
    ///
    /// Empty or whitespace-only names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] if the identity is
    /// unknown (silent no-op on the wire).
    pub async fn rename(&self, id: ClientId, new_username: &str) -> Result<(), GatewayError> {
        let new_username = new_username.trim();
        if new_username.is_empty() {
            return Ok(());
        }

        let mut state = self.state().write().await;
        let Some(old_username) = state.registry.rename(id, new_username) else {
            return Err(GatewayError::ParticipantNotFound(id));
        };
        state.broadcast(
            &ServerEvent::UsernameChanged {
                user_id: id,
                old_username,
                new_username: new_username.to_string(),
            },
            None,
        );
        Ok(())
    }

    /// Relays a typing indicator to everyone except the typist.
    ///
    /// Ephemeral: never recorded in history. Mutates nothing, so only the
    /// read lock is taken.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] if the typist is
    /// unknown.
    pub async fn typing(&self, id: ClientId, is_typing: bool) -> Result<(), GatewayError> {
        let state = self.state().read().await;
        let Some(participant) = state.registry.get(id) else {
            return Err(GatewayError::ParticipantNotFound(id));
        };
        state.broadcast(
            &ServerEvent::Typing {
                user_id: id,
                username: participant.username.clone(),
                is_typing,
            },
            Some(id),
        );
        Ok(())
    }
}
