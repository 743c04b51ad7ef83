//! Error taxonomy of the contest backend and its mapping onto HTTP.
//!
//! Every failure is recoverable at the request boundary: the response body
//! carries a stable `code` string so clients can tell "poll again" from
//! "retry with backoff" from "give up and show a message".

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, providers::ProviderError};

/// Failures raised by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No room carries the requested code.
    #[error("not found: {0}")]
    NotFound(String),
    /// Room creation gave up after the code-generation retry budget.
    #[error("room creation failed: {0}")]
    Creation(String),
    /// Both slots of the room are already taken.
    #[error("room is already full")]
    RoomFull,
    /// The caller's session is seated in neither slot.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// A request field did not survive validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The room is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Another caller holds the judgment claim; poll for the result.
    #[error("judgment is being processed by another request")]
    AlreadyProcessing,
    /// The provider deadline or the judgment wait window elapsed.
    #[error("operation timed out")]
    Timeout,
    /// Talking to the judge/prompt provider failed outright.
    #[error("provider call failed")]
    Provider(#[source] ProviderError),
    /// The provider answered, but no valid verdict could be extracted.
    #[error("malformed judgment: {0}")]
    MalformedJudgment(String),
    /// A storage operation failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No storage backend is installed (degraded mode).
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Request-boundary errors, each with an HTTP status and a stable code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload or path parameter was rejected.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller is not a participant of the room.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Room code unknown.
    #[error("not found: {0}")]
    NotFound(String),
    /// Join lost against a full room.
    #[error("room is already full")]
    RoomFull,
    /// Judgment claim is held elsewhere; the caller should poll.
    #[error("judgment is being processed by another request")]
    AlreadyProcessing,
    /// Operation conflicts with the current room state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Upstream judge provider did not answer in time.
    #[error("judgment timed out")]
    Timeout,
    /// Upstream judge provider produced an unusable verdict.
    #[error("malformed judgment: {0}")]
    MalformedJudgment(String),
    /// Upstream provider call failed.
    #[error("provider error: {0}")]
    Provider(String),
    /// Storage backend unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Anything that should never surface in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        use ServiceError::*;
        match err {
            NotFound(message) => AppError::NotFound(message),
            Creation(message) => AppError::Internal(message),
            RoomFull => AppError::RoomFull,
            Unauthorized(message) => AppError::Unauthorized(message),
            InvalidInput(message) => AppError::BadRequest(message),
            InvalidState(message) => AppError::Conflict(message),
            AlreadyProcessing => AppError::AlreadyProcessing,
            Timeout => AppError::Timeout,
            Provider(source) => AppError::Provider(source.to_string()),
            MalformedJudgment(message) => AppError::MalformedJudgment(message),
            Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            Degraded => AppError::ServiceUnavailable("degraded mode".into()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    /// Stable machine-readable code so clients can pick a retry strategy.
    code: &'static str,
    message: String,
}

impl AppError {
    /// HTTP status plus the stable code carried in the body. Clients branch
    /// on the code to choose between polling (`already_processing`), backoff
    /// (`timeout`, `provider_error`), and a terminal message.
    fn parts(&self) -> (StatusCode, &'static str) {
        use AppError::*;
        match self {
            BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            RoomFull => (StatusCode::CONFLICT, "room_full"),
            AlreadyProcessing => (StatusCode::CONFLICT, "already_processing"),
            Conflict(_) => (StatusCode::CONFLICT, "invalid_state"),
            Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            MalformedJudgment(_) => (StatusCode::BAD_GATEWAY, "malformed_judgment"),
            Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
            Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.parts();
        let body = Json(ErrorBody {
            code,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_loss_maps_to_conflict_with_its_own_code() {
        let err: AppError = ServiceError::AlreadyProcessing.into();
        assert_eq!(err.parts(), (StatusCode::CONFLICT, "already_processing"));
    }

    #[test]
    fn room_full_and_invalid_state_share_status_but_not_code() {
        let full: AppError = ServiceError::RoomFull.into();
        let state: AppError = ServiceError::InvalidState("not started".into()).into();
        assert_eq!(full.parts().1, "room_full");
        assert_eq!(state.parts().1, "invalid_state");
        assert_eq!(full.parts().0, state.parts().0);
    }
}
