//! Service layer: relay orchestration over a single shared state object.
//!
//! [`RelayService`] owns every piece of shared relay state (the
//! participant registry, the bounded message history, and the live-call
//! board) behind one `tokio::sync::RwLock`. Each mutating operation takes
//! the write lock for its full duration, so registration + welcome
//! snapshot, history append + fan-out, and call teardown + deregistration
//! are each atomic with respect to every other participant's flow. The
//! contention profile of a chat relay is low enough that a single lock is
//! the right trade against multi-lock choreography.
//!
//! Chat and presence operations live in [`chat`]; call lifecycle and
//! signaling relay live in [`call`].

pub mod call;
pub mod chat;

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::AbortHandle;

use crate::domain::{
    CallBoard, CallId, CallStatus, ClientId, MessageHistory, ParticipantRegistry, PresenceEntry,
    ServerEvent,
};

/// Default ringing duration before a call is implicitly rejected.
pub const DEFAULT_RING_TIMEOUT: Duration = Duration::from_secs(30);

/// All shared relay state, guarded as one unit.
///
/// Handler operations receive this explicitly via the service lock; there
/// are no ambient globals anywhere in the crate.
#[derive(Debug, Default)]
pub struct RelayState {
    /// Connected participants keyed by identity.
    pub registry: ParticipantRegistry,
    /// Bounded chat history window.
    pub history: MessageHistory,
    /// Ringing and active calls.
    pub calls: CallBoard,
}

impl RelayState {
    /// Delivers `event` to every registered participant except `exclude`.
    ///
    /// Best-effort fan-out: per-target failures are collected and reported
    /// in aggregate without interrupting sibling deliveries, and nothing
    /// is retried. Returns the number of successful deliveries.
    pub fn broadcast(&self, event: &ServerEvent, exclude: Option<ClientId>) -> usize {
        match exclude {
            Some(id) => self.broadcast_except(event, &[id]),
            None => self.broadcast_except(event, &[]),
        }
    }

    /// Delivers `event` to one participant's transport only.
    ///
    /// Unknown targets and closed transports are logged and dropped;
    /// targeted delivery is as best-effort as the broadcast path. Returns
    /// `true` on successful enqueue.
    pub fn send_to(&self, id: ClientId, event: &ServerEvent) -> bool {
        let Some(participant) = self.registry.get(id) else {
            tracing::debug!(
                target_id = %id,
                event = event.event_type_str(),
                "targeted delivery to unknown participant dropped"
            );
            return false;
        };
        if participant.sender.send(event.clone()).is_err() {
            tracing::warn!(
                target_id = %id,
                event = event.event_type_str(),
                "targeted delivery failed; transport closed"
            );
            return false;
        }
        true
    }

    /// Fan-out with an arbitrary exclusion set: the call coordinator
    /// excludes both members after notifying them directly, so nobody
    /// sees the same transition twice.
    pub fn broadcast_except(&self, event: &ServerEvent, exclude: &[ClientId]) -> usize {
        let mut delivered = 0usize;
        let mut failed: Vec<ClientId> = Vec::new();
        for participant in self.registry.iter() {
            if exclude.contains(&participant.id) {
                continue;
            }
            if participant.sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                failed.push(participant.id);
            }
        }
        if !failed.is_empty() {
            tracing::warn!(
                event = event.event_type_str(),
                delivered,
                failed = failed.len(),
                "broadcast delivery failed for some participants"
            );
        }
        delivered
    }
}

/// Point-in-time relay counters for the observability surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Connected participants.
    pub online_users: usize,
    /// Live calls (ringing + active).
    pub live_calls: usize,
    /// Calls currently ringing.
    pub ringing_calls: usize,
    /// Retained history messages.
    pub history_len: usize,
    /// Configured history capacity.
    pub history_capacity: usize,
}

/// Orchestration layer for the chat relay and call coordinator.
///
/// Every operation follows the pattern: acquire the state lock → consult
/// or mutate the registry / history / call board → emit targeted and
/// broadcast events → return. Ring timers are the only piece that lives
/// outside the state lock: one spawned task per ringing call, disarmed on
/// any transition out of `ringing`.
#[derive(Debug)]
pub struct RelayService {
    state: RwLock<RelayState>,
    ring_timers: StdMutex<HashMap<CallId, AbortHandle>>,
    ring_timeout: Duration,
}

impl RelayService {
    /// Creates a relay with the given history capacity and ring timeout.
    #[must_use]
    pub fn new(history_capacity: usize, ring_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(RelayState {
                registry: ParticipantRegistry::new(),
                history: MessageHistory::new(history_capacity),
                calls: CallBoard::new(),
            }),
            ring_timers: StdMutex::new(HashMap::new()),
            ring_timeout,
        }
    }

    /// Returns the shared state lock.
    ///
    /// Exposed for the handler layer and tests; production code outside
    /// this module goes through the operation methods instead.
    pub const fn state(&self) -> &RwLock<RelayState> {
        &self.state
    }

    /// Returns the configured ring timeout.
    #[must_use]
    pub const fn ring_timeout(&self) -> Duration {
        self.ring_timeout
    }

    /// Returns point-in-time counters for the observability endpoints.
    pub async fn stats(&self) -> RelayStats {
        let state = self.state.read().await;
        RelayStats {
            online_users: state.registry.len(),
            live_calls: state.calls.len(),
            ringing_calls: state
                .calls
                .iter()
                .filter(|call| call.status == CallStatus::Ringing)
                .count(),
            history_len: state.history.len(),
            history_capacity: state.history.capacity(),
        }
    }

    /// Returns the full presence list.
    pub async fn presence(&self) -> Vec<PresenceEntry> {
        let state = self.state.read().await;
        state.registry.presence(None)
    }

    /// Returns one participant's presence record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::ParticipantNotFound`] if the
    /// identity is unknown.
    pub async fn presence_of(
        &self,
        id: ClientId,
    ) -> Result<PresenceEntry, crate::error::GatewayError> {
        let state = self.state.read().await;
        state
            .registry
            .get(id)
            .map(crate::domain::Participant::presence)
            .ok_or(crate::error::GatewayError::ParticipantNotFound(id))
    }

    fn disarm_ring_timer(&self, call_id: CallId) {
        if let Ok(mut timers) = self.ring_timers.lock()
            && let Some(handle) = timers.remove(&call_id)
        {
            handle.abort();
        }
    }

    fn store_ring_timer(&self, call_id: CallId, handle: AbortHandle) {
        if let Ok(mut timers) = self.ring_timers.lock() {
            timers.insert(call_id, handle);
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new(crate::domain::DEFAULT_HISTORY_CAPACITY, DEFAULT_RING_TIMEOUT)
    }
}
