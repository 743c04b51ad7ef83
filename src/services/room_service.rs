//! Room lifecycle: creation, joining, role probing, and per-participant
//! status updates.

use std::time::SystemTime;

use rand::Rng;
use tracing::{info, warn};

use crate::{
    dao::{
        models::{ParticipantSlot, RoomEntity},
        room_store::{InsertOutcome, ParticipantUpdate},
    },
    dto::{
        parse_rfc3339,
        room::{
            CreateRoomRequest, JoinRoomRequest, RoomStatusResponse, RoomSummary,
            UpdateParticipantRequest,
        },
        validation::ROOM_CODE_LENGTH,
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Create a room with a fresh code and prompt, seating the caller as host.
///
/// Code collisions surface as duplicate-key rejections from the store and
/// are retried with a new code up to the configured attempt budget.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_room_store().await?;
    let prompt = obtain_prompt(state).await;

    for _ in 0..state.config().code_attempts {
        let code = generate_room_code();
        let room = RoomEntity::new(code.clone(), request.session_id.clone(), prompt.clone());

        match store.insert_room(room.clone()).await? {
            InsertOutcome::Inserted => {
                info!(room = %code, "room created");
                return Ok((room, state.config().draw_seconds).into());
            }
            InsertOutcome::CodeTaken => {
                warn!(room = %code, "room code collision; regenerating");
            }
        }
    }

    Err(ServiceError::Creation(format!(
        "could not allocate a unique room code after {} attempts",
        state.config().code_attempts
    )))
}

/// Seat the caller in the guest slot of an existing room.
///
/// The slot is taken with a conditional update on `guest_id` still being
/// null, so of two concurrent joins exactly one succeeds and the other
/// observes a full room.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    // Re-entry from a participant already seated is answered idempotently.
    if room.slot_of(&request.session_id).is_some() {
        return Ok((room, state.config().draw_seconds).into());
    }

    if let Some(joined) = store
        .claim_guest_slot(code.to_string(), request.session_id.clone())
        .await?
    {
        info!(room = %code, "guest joined");
        sse_events::broadcast_room_updated(state, &joined);
        return Ok((joined, state.config().draw_seconds).into());
    }

    // The conditional update matched nothing: either the room vanished or
    // we lost the race for the slot.
    match store.find_room(code.to_string()).await? {
        Some(room) if room.guest_id.as_deref() == Some(request.session_id.as_str()) => {
            Ok((room, state.config().draw_seconds).into())
        }
        Some(_) => Err(ServiceError::RoomFull),
        None => Err(ServiceError::NotFound(format!("room `{code}` not found"))),
    }
}

/// Role probe answering `{exists, is_creator}` without leaking the other
/// participant's session id.
pub async fn room_status(
    state: &SharedState,
    code: &str,
    session_id: Option<&str>,
) -> Result<RoomStatusResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(code.to_string()).await? else {
        return Ok(RoomStatusResponse {
            exists: false,
            is_creator: false,
        });
    };

    let is_creator = session_id.is_some_and(|session| room.host_id == session);
    Ok(RoomStatusResponse {
        exists: true,
        is_creator,
    })
}

/// Apply a status/submission/start update to the caller's own slot.
pub async fn update_participant(
    state: &SharedState,
    code: &str,
    request: UpdateParticipantRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    let Some(slot) = room.slot_of(&request.session_id) else {
        return Err(ServiceError::Unauthorized(
            "session is not a participant of this room".into(),
        ));
    };

    let wants_start = request.game_started == Some(true);
    if wants_start && slot != ParticipantSlot::Host {
        return Err(ServiceError::Unauthorized(
            "only the creator can start the game".into(),
        ));
    }

    if request.submission_url.is_some() && room.submission_url(slot).is_some() {
        return Err(ServiceError::InvalidState(
            "drawing already submitted for this participant".into(),
        ));
    }

    let start_game_at = if wants_start && !room.game_started {
        Some(resolve_start_time(request.game_start_time.as_deref())?)
    } else {
        None
    };

    let update = ParticipantUpdate {
        status: Some(request.status.into()),
        submission_url: request.submission_url.clone(),
        start_game_at,
    };

    let Some(updated) = store
        .update_participant(code.to_string(), slot, update)
        .await?
    else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    sse_events::broadcast_room_updated(state, &updated);

    // Edge trigger: the write that lands the second drawing announces the
    // end of the contest.
    if request.submission_url.is_some() && updated.both_submitted() {
        info!(room = %code, "both drawings submitted");
        sse_events::broadcast_all_submitted(state, &updated);
    }

    Ok((updated, state.config().draw_seconds).into())
}

/// Ask the prompt provider for a phrase, falling back to the built-in list
/// so creation never fails on provider trouble.
async fn obtain_prompt(state: &SharedState) -> String {
    match state.prompt_provider().drawing_prompt().await {
        Ok(prompt) if !prompt.trim().is_empty() => prompt,
        Ok(_) => {
            warn!("prompt provider returned an empty prompt; using fallback");
            state.config().fallback_prompt()
        }
        Err(err) => {
            warn!(error = %err, "prompt provider failed; using fallback");
            state.config().fallback_prompt()
        }
    }
}

fn resolve_start_time(supplied: Option<&str>) -> Result<SystemTime, ServiceError> {
    match supplied {
        Some(raw) => parse_rfc3339(raw).ok_or_else(|| {
            ServiceError::InvalidInput(format!("invalid RFC3339 start time `{raw}`"))
        }),
        None => Ok(SystemTime::now()),
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}
