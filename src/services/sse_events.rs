use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::RoomEntity,
    dto::{
        room::RoomSummary,
        sse::{AllSubmittedEvent, JudgmentCompletedEvent, RoomEvent, RoomUpdatedEvent},
    },
    state::SharedState,
};

const EVENT_ROOM: &str = "room";
const EVENT_ALL_SUBMITTED: &str = "all_submitted";
const EVENT_JUDGMENT: &str = "judgment";

/// Broadcast the full room projection after a durable mutation.
pub fn broadcast_room_updated(state: &SharedState, room: &RoomEntity) {
    let summary: RoomSummary = (room.clone(), state.config().draw_seconds).into();
    send_room_event(state, &room.room_code, EVENT_ROOM, &RoomUpdatedEvent(summary));
}

/// Broadcast the both-submitted edge trigger.
pub fn broadcast_all_submitted(state: &SharedState, room: &RoomEntity) {
    let (Some(host_url), Some(guest_url)) = (
        room.host_submission_url.clone(),
        room.guest_submission_url.clone(),
    ) else {
        return;
    };
    let payload = AllSubmittedEvent {
        host_submission_url: host_url,
        guest_submission_url: guest_url,
    };
    send_room_event(state, &room.room_code, EVENT_ALL_SUBMITTED, &payload);
}

/// Broadcast the persisted verdict.
pub fn broadcast_judgment(state: &SharedState, room: &RoomEntity) {
    let Some(judgment) = room.judgment.clone() else {
        return;
    };
    let payload = JudgmentCompletedEvent {
        judgment: judgment.into(),
        winner_id: room.winner_id.clone(),
    };
    send_room_event(state, &room.room_code, EVENT_JUDGMENT, &payload);
}

fn send_room_event(state: &SharedState, room_code: &str, event: &str, payload: &impl Serialize) {
    match RoomEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.room_events().broadcast(room_code, event),
        Err(err) => warn!(room = room_code, event, error = %err, "failed to serialize SSE payload"),
    }
}
