//! Live-call storage.
//!
//! [`CallBoard`] holds every call that is currently ringing or active. A
//! call is removed the moment it reaches `ended`, so the board never
//! contains terminal entries. Teardown paths look calls up by membership
//! ([`CallBoard::call_for`]) rather than through a participant's
//! current-call reference, since a rung target that never accepted carries no
//! such reference but must still be found.

use std::collections::HashMap;

use super::call::Call;
use super::{CallId, ClientId};

/// The set of live calls, keyed by call identifier.
#[derive(Debug, Default)]
pub struct CallBoard {
    calls: HashMap<CallId, Call>,
}

impl CallBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a live call under its identity.
    pub fn insert(&mut self, call: Call) {
        self.calls.insert(call.id, call);
    }

    /// Removes and returns a call, or `None` if unknown.
    pub fn remove(&mut self, id: CallId) -> Option<Call> {
        self.calls.remove(&id)
    }

    /// Looks up a call by identity.
    #[must_use]
    pub fn get(&self, id: CallId) -> Option<&Call> {
        self.calls.get(&id)
    }

    /// Looks up a call mutably by identity.
    pub fn get_mut(&mut self, id: CallId) -> Option<&mut Call> {
        self.calls.get_mut(&id)
    }

    /// Finds the live call that `member` is part of, if any.
    #[must_use]
    pub fn call_for(&self, member: ClientId) -> Option<&Call> {
        self.calls.values().find(|call| call.is_member(member))
    }

    /// Returns `true` if `a` and `b` are the two members of one live call.
    #[must_use]
    pub fn share_call(&self, a: ClientId, b: ClientId) -> bool {
        self.calls
            .values()
            .any(|call| call.is_member(a) && call.is_member(b))
    }

    /// Iterates all live calls in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Call> {
        self.calls.values()
    }

    /// Returns the number of live calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if no call is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
