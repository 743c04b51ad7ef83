use tracing::warn;

use crate::{dto::health::HealthStatus, state::SharedState};

/// Probe the storage backend and report the overall service condition.
///
/// A failed ping here is only logged; the storage supervisor owns the
/// degraded flag, so the probe and the flag cannot disagree about who
/// decides.
pub async fn probe(state: &SharedState) -> HealthStatus {
    match state.room_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage ping failed during healthcheck");
            }
        }
        None => warn!("healthcheck while no storage backend is installed"),
    }

    if state.is_degraded().await {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    }
}
