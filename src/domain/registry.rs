//! Identity-indexed participant storage.
//!
//! [`ParticipantRegistry`] is an arena-style map keyed by [`ClientId`].
//! It is deliberately lock-free: the single `RwLock` guarding all shared
//! relay state lives in the service layer, so compound operations
//! (register + welcome snapshot, call teardown + deregister) stay atomic
//! without multi-lock choreography.

use std::collections::HashMap;

use super::participant::{Participant, PresenceEntry};
use super::ClientId;

/// Central store for all connected participants.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ClientId, Participant>,
}

impl ParticipantRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a participant under its identity.
    pub fn insert(&mut self, participant: Participant) {
        self.participants.insert(participant.id, participant);
    }

    /// Removes and returns the participant, or `None` if unknown.
    pub fn remove(&mut self, id: ClientId) -> Option<Participant> {
        self.participants.remove(&id)
    }

    /// Looks up a participant by identity.
    #[must_use]
    pub fn get(&self, id: ClientId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Looks up a participant mutably by identity.
    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// Renames a participant in place, returning the old name.
    ///
    /// A silent no-op (`None`) when the identity is unknown.
    pub fn rename(&mut self, id: ClientId, new_name: &str) -> Option<String> {
        let participant = self.participants.get_mut(&id)?;
        let old = std::mem::replace(&mut participant.username, new_name.to_string());
        Some(old)
    }

    /// Returns presence records for everyone except `exclude`, ordered by
    /// connection time (ties broken by identity for a stable order).
    #[must_use]
    pub fn presence(&self, exclude: Option<ClientId>) -> Vec<PresenceEntry> {
        let mut entries: Vec<(&Participant, PresenceEntry)> = self
            .participants
            .values()
            .filter(|p| Some(p.id) != exclude)
            .map(|p| (p, p.presence()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Iterates all participants in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Returns the number of connected participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns `true` if nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
