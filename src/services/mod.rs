/// OpenAPI document assembly.
pub mod documentation;
/// Health status reporting.
pub mod health_service;
/// Exactly-once judgment coordination.
pub mod judgment_service;
/// Presence WebSocket handling.
pub mod presence_service;
/// Room lifecycle operations.
pub mod room_service;
/// Typed SSE broadcast helpers.
pub mod sse_events;
/// SSE stream plumbing.
pub mod sse_service;
/// Storage connection supervision.
pub mod storage_supervisor;
/// Verdict extraction from freeform judge output.
pub mod verdict;
