//! DTOs for the system endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::service::RelayStats;

/// Relay counters as returned by `GET /api/v1/system/stats`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
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

impl From<RelayStats> for StatsResponse {
    fn from(stats: RelayStats) -> Self {
        Self {
            online_users: stats.online_users,
            live_calls: stats.live_calls,
            ringing_calls: stats.ringing_calls,
            history_len: stats.history_len,
            history_capacity: stats.history_capacity,
        }
    }
}
