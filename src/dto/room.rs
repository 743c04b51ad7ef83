use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{EvaluationStatus, ParticipantStatus, RoomEntity},
    dto::{
        format_system_time,
        judgment::JudgmentView,
        validation::{validate_room_code, validate_session_id},
    },
};

/// Payload used to create a brand-new room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Session id of the creator; becomes participant 1.
    pub session_id: String,
}

impl Validate for CreateRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_session_id(&self.session_id) {
            errors.add("session_id", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    /// Session id of the joiner; becomes participant 2.
    pub session_id: String,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_session_id(&self.session_id) {
            errors.add("session_id", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Query parameters of the room status probe.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoomStatusQuery {
    /// Session id of the caller, used only to compute `is_creator`.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Minimal role probe answered without exposing session identifiers.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomStatusResponse {
    /// Whether the room code refers to an existing room.
    pub exists: bool,
    /// Whether the supplied session id created the room.
    pub is_creator: bool,
}

/// Participant progress as exposed on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatusDto {
    /// Slot not yet occupied.
    Unjoined,
    /// Participant opened the room.
    Joined,
    /// Participant is ready to start.
    Ready,
    /// Drawing submitted manually.
    Submitted,
    /// Drawing submitted by the deadline handler.
    AutoSubmitted,
}

impl From<ParticipantStatus> for ParticipantStatusDto {
    fn from(value: ParticipantStatus) -> Self {
        match value {
            ParticipantStatus::Unjoined => Self::Unjoined,
            ParticipantStatus::Joined => Self::Joined,
            ParticipantStatus::Ready => Self::Ready,
            ParticipantStatus::Submitted => Self::Submitted,
            ParticipantStatus::AutoSubmitted => Self::AutoSubmitted,
        }
    }
}

impl From<ParticipantStatusDto> for ParticipantStatus {
    fn from(value: ParticipantStatusDto) -> Self {
        match value {
            ParticipantStatusDto::Unjoined => Self::Unjoined,
            ParticipantStatusDto::Joined => Self::Joined,
            ParticipantStatusDto::Ready => Self::Ready,
            ParticipantStatusDto::Submitted => Self::Submitted,
            ParticipantStatusDto::AutoSubmitted => Self::AutoSubmitted,
        }
    }
}

/// Judgment claim state as exposed on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatusDto {
    /// No judgment generated yet.
    Pending,
    /// A judgment request is in flight.
    Processing,
    /// The verdict is persisted.
    Completed,
}

impl From<EvaluationStatus> for EvaluationStatusDto {
    fn from(value: EvaluationStatus) -> Self {
        match value {
            EvaluationStatus::Pending => Self::Pending,
            EvaluationStatus::Processing => Self::Processing,
            EvaluationStatus::Completed => Self::Completed,
        }
    }
}

/// Status/submission/start update for the caller's own slot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateParticipantRequest {
    /// Session id of the caller; resolves which slot is written.
    pub session_id: String,
    /// New status for the caller's slot.
    pub status: ParticipantStatusDto,
    /// Start the drawing phase; only honoured from the creator.
    #[serde(default)]
    pub game_started: Option<bool>,
    /// Optional client-side start timestamp (RFC3339); the server stamps
    /// its own clock when absent.
    #[serde(default)]
    pub game_start_time: Option<String>,
    /// Rendered drawing reference accompanying a submission.
    #[serde(default)]
    pub submission_url: Option<String>,
}

impl Validate for UpdateParticipantRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_session_id(&self.session_id) {
            errors.add("session_id", e);
        }
        if let Some(url) = &self.submission_url {
            if url.trim().is_empty() {
                let mut err = validator::ValidationError::new("submission_url_empty");
                err.message = Some("Submission URL must not be empty".into());
                errors.add("submission_url", err);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Full room projection returned by the lifecycle endpoints and the SSE
/// stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Shareable room code.
    pub room_code: String,
    /// Drawing prompt shared by both participants.
    pub prompt: String,
    /// Session id of the creator.
    pub host_id: String,
    /// Session id of the joiner, if seated.
    pub guest_id: Option<String>,
    /// Creator's progress.
    pub host_status: ParticipantStatusDto,
    /// Joiner's progress.
    pub guest_status: ParticipantStatusDto,
    /// Creator's drawing, once submitted.
    pub host_submission_url: Option<String>,
    /// Joiner's drawing, once submitted.
    pub guest_submission_url: Option<String>,
    /// Whether the drawing phase has started.
    pub game_started: bool,
    /// Synchronized countdown origin (RFC3339), once started.
    pub game_start_time: Option<String>,
    /// Length of the drawing window in seconds.
    pub draw_seconds: u64,
    /// Judgment claim state.
    pub evaluation_status: EvaluationStatusDto,
    /// Structured verdict, once judged.
    pub judgment: Option<JudgmentView>,
    /// Session id of the winner, once judged.
    pub winner_id: Option<String>,
    /// Creation timestamp (RFC3339).
    pub created_at: String,
    /// Last update timestamp (RFC3339).
    pub updated_at: String,
}

impl From<(RoomEntity, u64)> for RoomSummary {
    fn from((entity, draw_seconds): (RoomEntity, u64)) -> Self {
        Self {
            room_code: entity.room_code,
            prompt: entity.prompt,
            host_id: entity.host_id,
            guest_id: entity.guest_id,
            host_status: entity.host_status.into(),
            guest_status: entity.guest_status.into(),
            host_submission_url: entity.host_submission_url,
            guest_submission_url: entity.guest_submission_url,
            game_started: entity.game_started,
            game_start_time: entity.game_start_time.map(format_system_time),
            draw_seconds,
            evaluation_status: entity.evaluation_status.into(),
            judgment: entity.judgment.map(Into::into),
            winner_id: entity.winner_id,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Path-level validation for a room code; returns a message suitable for a
/// 400 response.
pub fn check_room_code(code: &str) -> Result<(), String> {
    validate_room_code(code).map_err(|err| {
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| "invalid room code".to_string())
    })
}
