//! Presence handlers: who is online and whether they are in a call.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{ClientId, PresenceEntry};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /participants` — List all connected participants.
#[utoipa::path(
    get,
    path = "/api/v1/participants",
    tag = "Participants",
    summary = "List connected participants",
    description = "Returns the presence record of every connected participant, ordered by connection time.",
    responses(
        (status = 200, description = "Presence list", body = Vec<PresenceEntry>),
    )
)]
pub async fn list_participants(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.presence().await)
}

/// `GET /participants/{id}` — One participant's presence record.
///
/// # Errors
///
/// Returns [`GatewayError::ParticipantNotFound`] for an unknown identity.
#[utoipa::path(
    get,
    path = "/api/v1/participants/{id}",
    tag = "Participants",
    summary = "Get one participant",
    description = "Returns the presence record for the given participant identity.",
    params(
        ("id" = uuid::Uuid, Path, description = "Participant identity"),
    ),
    responses(
        (status = 200, description = "Presence record", body = PresenceEntry),
        (status = 404, description = "Unknown participant", body = ErrorResponse),
    )
)]
pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<PresenceEntry>, GatewayError> {
    let presence = state.relay.presence_of(ClientId::from_uuid(id)).await?;
    Ok(Json(presence))
}

/// Participant routes mounted under /api/v1.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/participants", get(list_participants))
        .route("/participants/{id}", get(get_participant))
}
