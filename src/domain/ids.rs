//! Type-safe identifiers for participants, calls, and messages.
//!
//! Each identifier is a newtype wrapper around [`uuid::Uuid`] (v4) so the
//! three id spaces cannot be confused with one another. V4 ids are
//! collision-free within a process lifetime and unpredictable enough that
//! a client cannot enumerate other participants for targeted signaling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a connected participant.
///
/// Generated once when the connection is accepted and immutable for the
/// connection's lifetime. Used as the dictionary key in
/// [`super::ParticipantRegistry`] and as the wire-level `userId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(uuid::Uuid);

/// Unique identifier for a call between two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(uuid::Uuid);

/// Unique identifier for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(uuid::Uuid);

macro_rules! id_impls {
    ($name:ident) => {
        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_impls!(ClientId);
id_impls!(CallId);
id_impls!(MessageId);

impl ClientId {
    /// Returns the default display name derived from this identity:
    /// `user-` followed by the first 8 hex characters of the UUID.
    #[must_use]
    pub fn default_username(&self) -> String {
        let hex = self.0.simple().to_string();
        let prefix: String = hex.chars().take(8).collect();
        format!("user-{prefix}")
    }
}
