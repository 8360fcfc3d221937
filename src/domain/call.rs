//! Call records and their lifecycle state machine.
//!
//! A call progresses `ringing -> active -> ended`; `ended` is terminal and
//! a rejection is equivalent to ending without ever reaching `active`. No
//! other transitions exist; [`Call::accept`] and [`Call::end`] refuse
//! anything else.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CallId, ClientId};

/// Lifecycle status of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// The target has been notified and has not answered yet.
    Ringing,
    /// Both members joined; signaling may flow.
    Active,
    /// Terminal: hung up, rejected, or torn down by a disconnect.
    Ended,
}

impl CallStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ringing => "ringing",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signaling session between exactly two participants.
#[derive(Debug, Clone)]
pub struct Call {
    /// Unique call identifier.
    pub id: CallId,
    /// The participant who dialed.
    pub caller: ClientId,
    /// The participant being dialed.
    pub target: ClientId,
    /// Current lifecycle status.
    pub status: CallStatus,
    /// When the call started ringing.
    pub started_at: DateTime<Utc>,
    /// When the call was accepted, if it ever was.
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Call {
    /// Creates a new call in `ringing`.
    #[must_use]
    pub fn ringing(caller: ClientId, target: ClientId) -> Self {
        Self {
            id: CallId::new(),
            caller,
            target,
            status: CallStatus::Ringing,
            started_at: Utc::now(),
            accepted_at: None,
        }
    }

    /// Transitions `ringing -> active`, stamping the accept time.
    ///
    /// Returns `false` (and mutates nothing) if the call is not ringing.
    pub fn accept(&mut self) -> bool {
        if self.status != CallStatus::Ringing {
            return false;
        }
        self.status = CallStatus::Active;
        self.accepted_at = Some(Utc::now());
        true
    }

    /// Transitions `ringing | active -> ended`.
    ///
    /// Returns `false` (and mutates nothing) if the call already ended.
    pub fn end(&mut self) -> bool {
        if self.status == CallStatus::Ended {
            return false;
        }
        self.status = CallStatus::Ended;
        true
    }

    /// Returns `true` if `id` is the caller or the target.
    #[must_use]
    pub fn is_member(&self, id: ClientId) -> bool {
        self.caller == id || self.target == id
    }

    /// Returns the other member, or `None` if `id` is not a member.
    #[must_use]
    pub fn peer_of(&self, id: ClientId) -> Option<ClientId> {
        if id == self.caller {
            Some(self.target)
        } else if id == self.target {
            Some(self.caller)
        } else {
            None
        }
    }
}
