use serde::Serialize;
use utoipa::ToSchema;

/// Overall service condition reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Storage is reachable and requests are served normally.
    Ok,
    /// The backend is running without a working storage connection.
    Degraded,
}

/// Body of the `/healthcheck` answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current service condition.
    pub status: HealthStatus,
}

impl From<HealthStatus> for HealthResponse {
    fn from(status: HealthStatus) -> Self {
        Self { status }
    }
}
