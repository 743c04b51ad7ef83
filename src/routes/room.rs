use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::room::{
        CreateRoomRequest, JoinRoomRequest, RoomStatusQuery, RoomStatusResponse, RoomSummary,
        UpdateParticipantRequest, check_room_code,
    },
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Configure the room lifecycle endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}/join", put(join_room))
        .route("/rooms/{code}/status", get(room_status))
        .route("/rooms/{code}/participants", patch(update_participant))
}

#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomSummary)
    )
)]
/// Create a fresh room with a generated code and prompt.
pub async fn create_room(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoomRequest>>,
) -> Result<(StatusCode, Json<RoomSummary>), AppError> {
    let summary = room_service::create_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    put,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code to join")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined the room", body = RoomSummary),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room already full")
    )
)]
/// Seat the caller in the guest slot of an existing room.
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinRoomRequest>>,
) -> Result<Json<RoomSummary>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let summary = room_service::join_room(&state, &code, payload).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/status",
    tag = "rooms",
    params(
        ("code" = String, Path, description = "Room code to probe"),
        ("session_id" = Option<String>, Query, description = "Caller's session id")
    ),
    responses(
        (status = 200, description = "Existence and role information", body = RoomStatusResponse)
    )
)]
/// Answer whether the room exists and whether the caller created it.
pub async fn room_status(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<RoomStatusQuery>,
) -> Result<Json<RoomStatusResponse>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let status = room_service::room_status(&state, &code, query.session_id.as_deref()).await?;
    Ok(Json(status))
}

#[utoipa::path(
    patch,
    path = "/rooms/{code}/participants",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code to update")),
    request_body = UpdateParticipantRequest,
    responses(
        (status = 200, description = "Updated room state", body = RoomSummary),
        (status = 401, description = "Session is not a participant"),
        (status = 404, description = "Room not found")
    )
)]
/// Apply a status/submission/start update to the caller's own slot.
pub async fn update_participant(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateParticipantRequest>>,
) -> Result<Json<RoomSummary>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let summary = room_service::update_participant(&state, &code, payload).await?;
    Ok(Json(summary))
}
