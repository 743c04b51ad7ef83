use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        judgment::{JudgmentRequest, JudgmentStatusResponse, JudgmentView},
        room::check_room_code,
    },
    error::AppError,
    services::judgment_service,
    state::SharedState,
};

/// Configure the judgment endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route(
            "/rooms/{code}/judgment",
            post(request_judgment).get(judgment_status),
        )
        .route("/rooms/{code}/judgment/wait", get(await_judgment))
}

#[utoipa::path(
    post,
    path = "/rooms/{code}/judgment",
    tag = "judgment",
    params(("code" = String, Path, description = "Room code to judge")),
    request_body = JudgmentRequest,
    responses(
        (status = 200, description = "The verdict", body = JudgmentView),
        (status = 409, description = "Judgment already being processed"),
        (status = 502, description = "Provider failed or answered nonsense"),
        (status = 504, description = "Provider deadline exceeded")
    )
)]
/// Trigger judgment generation; safe to call concurrently from both
/// participants thanks to the claim protocol.
pub async fn request_judgment(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JudgmentRequest>>,
) -> Result<Json<JudgmentView>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let view = judgment_service::request_judgment(&state, &code, payload).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/judgment",
    tag = "judgment",
    params(("code" = String, Path, description = "Room code to poll")),
    responses(
        (status = 200, description = "Claim state plus verdict once available", body = JudgmentStatusResponse)
    )
)]
/// Non-blocking poll of the judgment state.
pub async fn judgment_status(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<JudgmentStatusResponse>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let status = judgment_service::judgment_status(&state, &code).await?;
    Ok(Json(status))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/judgment/wait",
    tag = "judgment",
    params(("code" = String, Path, description = "Room code to wait on")),
    responses(
        (status = 200, description = "The verdict", body = JudgmentView),
        (status = 504, description = "Bounded polling window elapsed")
    )
)]
/// Block (boundedly) until the verdict lands.
pub async fn await_judgment(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<JudgmentView>, AppError> {
    check_room_code(&code).map_err(AppError::BadRequest)?;
    let view = judgment_service::await_judgment(&state, &code).await?;
    Ok(Json(view))
}
