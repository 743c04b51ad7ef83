use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod judgment;
pub mod presence;
pub mod room;
pub mod sse;

/// Compose all route trees and wire in the shared state.
pub fn router(state: SharedState) -> Router<()> {
    Router::<SharedState>::new()
        .merge(room::router())
        .merge(judgment::router())
        .merge(presence::router())
        .merge(sse::router())
        .merge(health::router())
        .merge(docs::router())
        .with_state(state)
}
