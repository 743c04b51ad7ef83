use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{
    EvaluationStatus, JudgmentEntity, ParticipantSlot, ParticipantStatus, RoomEntity, WinnerSlot,
};

/// Wire value of [`EvaluationStatus::Pending`], used in query filters.
pub const EVALUATION_PENDING: &str = "pending";
/// Wire value of [`EvaluationStatus::Processing`], used in query filters.
pub const EVALUATION_PROCESSING: &str = "processing";
/// Wire value of [`EvaluationStatus::Completed`], used in query filters.
pub const EVALUATION_COMPLETED: &str = "completed";

/// Room document stored in the `rooms` collection. The room code doubles as
/// `_id`, so code uniqueness rides on the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    room_code: String,
    host_id: String,
    guest_id: Option<String>,
    host_status: ParticipantStatus,
    guest_status: ParticipantStatus,
    prompt: String,
    host_submission_url: Option<String>,
    guest_submission_url: Option<String>,
    game_started: bool,
    game_start_time: Option<DateTime>,
    evaluation_status: EvaluationStatus,
    judgment: Option<JudgmentEntity>,
    winner_id: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            room_code: value.room_code,
            host_id: value.host_id,
            guest_id: value.guest_id,
            host_status: value.host_status,
            guest_status: value.guest_status,
            prompt: value.prompt,
            host_submission_url: value.host_submission_url,
            guest_submission_url: value.guest_submission_url,
            game_started: value.game_started,
            game_start_time: value.game_start_time.map(DateTime::from_system_time),
            evaluation_status: value.evaluation_status,
            judgment: value.judgment,
            winner_id: value.winner_id,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoRoomDocument> for RoomEntity {
    fn from(value: MongoRoomDocument) -> Self {
        Self {
            room_code: value.room_code,
            host_id: value.host_id,
            guest_id: value.guest_id,
            host_status: value.host_status,
            guest_status: value.guest_status,
            prompt: value.prompt,
            host_submission_url: value.host_submission_url,
            guest_submission_url: value.guest_submission_url,
            game_started: value.game_started,
            game_start_time: value.game_start_time.map(DateTime::to_system_time),
            evaluation_status: value.evaluation_status,
            judgment: value.judgment,
            winner_id: value.winner_id,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Filter selecting a room by its code.
pub fn doc_id(code: &str) -> Document {
    doc! {"_id": code}
}

/// Field name of the status column for a slot.
pub fn status_field(slot: ParticipantSlot) -> &'static str {
    match slot {
        ParticipantSlot::Host => "host_status",
        ParticipantSlot::Guest => "guest_status",
    }
}

/// Field name of the submission column for a slot.
pub fn submission_field(slot: ParticipantSlot) -> &'static str {
    match slot {
        ParticipantSlot::Host => "host_submission_url",
        ParticipantSlot::Guest => "guest_submission_url",
    }
}

/// Wire value of a participant status, matching its serde representation.
pub fn participant_status_str(status: ParticipantStatus) -> &'static str {
    match status {
        ParticipantStatus::Unjoined => "unjoined",
        ParticipantStatus::Joined => "joined",
        ParticipantStatus::Ready => "ready",
        ParticipantStatus::Submitted => "submitted",
        ParticipantStatus::AutoSubmitted => "auto_submitted",
    }
}

/// Embedded BSON document for a verdict, matching the serde layout of
/// [`JudgmentEntity`] so it round-trips through document deserialization.
pub fn judgment_doc(judgment: &JudgmentEntity) -> Document {
    let winner = match judgment.winner {
        WinnerSlot::Host => "1",
        WinnerSlot::Guest => "2",
    };
    doc! {
        "winner": winner,
        "critique1": &judgment.critique1,
        "critique2": &judgment.critique2,
        "roast": &judgment.roast,
        "prompt": &judgment.prompt,
    }
}
