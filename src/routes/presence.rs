use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{
    dto::room::check_room_code, error::AppError, services::presence_service, state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{code}/presence",
    tag = "presence",
    params(("code" = String, Path, description = "Room code of the presence topic")),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a presence WebSocket session.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let shared_state = state.clone();
    Ok(ws.on_upgrade(move |socket| presence_service::handle_socket(shared_state, socket, code)))
}

/// Configure the presence WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{code}/presence", get(ws_handler))
}
