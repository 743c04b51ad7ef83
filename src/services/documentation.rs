use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Sketch Duel Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::room::room_status,
        crate::routes::room::update_participant,
        crate::routes::judgment::request_judgment,
        crate::routes::judgment::judgment_status,
        crate::routes::judgment::await_judgment,
        crate::routes::presence::ws_handler,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::RoomStatusResponse,
            crate::dto::room::UpdateParticipantRequest,
            crate::dto::room::RoomSummary,
            crate::dto::room::ParticipantStatusDto,
            crate::dto::room::EvaluationStatusDto,
            crate::dto::judgment::JudgmentRequest,
            crate::dto::judgment::JudgmentView,
            crate::dto::judgment::JudgmentStatusResponse,
            crate::dto::presence::PresenceInboundMessage,
            crate::dto::presence::PresenceSyncMessage,
            crate::dto::presence::PresenceMemberDto,
            crate::dto::presence::PeerStatus,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle operations"),
        (name = "judgment", description = "AI judgment generation and polling"),
        (name = "presence", description = "WebSocket presence channel"),
        (name = "sse", description = "Server-sent room event streams"),
    )
)]
pub struct ApiDoc;
