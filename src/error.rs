//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. On the
//! WebSocket side most variants resolve to silent no-ops (a best-effort
//! relay cannot tell "already gone" from "never existed", so nothing is
//! surfaced to the actor); the typed variants exist so the service layer
//! and its tests can observe exactly why an operation did nothing. On the
//! REST side each variant maps to an HTTP status code and a structured
//! JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{CallId, CallStatus, ClientId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "participant not found: ...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category       | HTTP Status                             |
/// |-----------|----------------|-----------------------------------------|
/// | 2000–2999 | Unknown entity | 404 Not Found                           |
/// | 4000–4999 | Call state     | 409 Conflict / 422 Unprocessable Entity |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No participant with the given identity is registered.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ClientId),

    /// No live call with the given identity exists.
    #[error("call not found: {0}")]
    CallNotFound(CallId),

    /// The dialed target is unknown or already in a call; the caller has
    /// already been sent a `callBusy` notification.
    #[error("target is busy or unknown: {0}")]
    TargetBusy(ClientId),

    /// The acting participant is not a member of the referenced call.
    #[error("participant {0} is not a member of the call")]
    NotCallMember(ClientId),

    /// The call is not in a status that permits the requested transition.
    #[error("illegal call transition from status {0}")]
    InvalidTransition(CallStatus),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::ParticipantNotFound(_) => 2001,
            Self::CallNotFound(_) => 2002,
            Self::TargetBusy(_) => 4001,
            Self::NotCallMember(_) => 4002,
            Self::InvalidTransition(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ParticipantNotFound(_) | Self::CallNotFound(_) => StatusCode::NOT_FOUND,
            Self::TargetBusy(_) | Self::NotCallMember(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let not_found = GatewayError::ParticipantNotFound(ClientId::new());
        assert_eq!(not_found.error_code(), 2001);
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let busy = GatewayError::TargetBusy(ClientId::new());
        assert_eq!(busy.error_code(), 4001);
        assert_eq!(busy.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let transition = GatewayError::InvalidTransition(CallStatus::Ended);
        assert_eq!(transition.error_code(), 4003);
        assert_eq!(transition.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn messages_name_the_entity() {
        let id = CallId::new();
        let err = GatewayError::CallNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn body_skips_empty_details() {
        let body = ErrorBody {
            code: 2001,
            message: "gone".to_string(),
            details: None,
        };
        let json = serde_json::to_string(&body).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(!json.contains("details"));
    }
}
