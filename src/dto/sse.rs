use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{judgment::JudgmentView, room::RoomSummary};

/// One frame of a room's SSE stream: an optional event name plus the
/// serialized data field.
#[derive(Clone, Debug)]
pub struct RoomEvent {
    /// SSE event name; unnamed frames arrive as plain `message` events.
    pub name: Option<String>,
    /// Serialized data field.
    pub payload: String,
}

impl RoomEvent {
    /// Serialize `payload` into the data field of a named event.
    pub fn json<N, T>(name: N, payload: &T) -> serde_json::Result<Self>
    where
        N: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            name: name.into(),
            payload: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// First frame of every new subscription.
pub struct Handshake {
    /// Room whose events this stream carries.
    pub room_code: String,
    /// Confirmation text for debugging by hand.
    pub message: String,
    /// Whether the backend currently lacks a storage connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast after every durable room mutation.
pub struct RoomUpdatedEvent(pub RoomSummary);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast the instant both submission URLs become non-null.
pub struct AllSubmittedEvent {
    /// Creator's drawing.
    pub host_submission_url: String,
    /// Joiner's drawing.
    pub guest_submission_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once the verdict has been persisted.
pub struct JudgmentCompletedEvent {
    /// The persisted verdict.
    pub judgment: JudgmentView,
    /// Session id of the winner.
    pub winner_id: Option<String>,
}
