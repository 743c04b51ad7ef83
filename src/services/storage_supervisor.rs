//! Supervision of the storage backend connection.
//!
//! One background task owns the MongoDB link for the whole process: it
//! dials the backend, installs the store into the shared state, pings it on
//! an interval, and tears it back down into degraded mode when the backend
//! stops answering. Room operations answer 503 while no store is installed.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{room_store::RoomStore, storage::StorageError},
    state::SharedState,
};

const PING_INTERVAL: Duration = Duration::from_secs(5);
const RECONNECT_BUDGET: u32 = 3;

/// Exponential backoff starting at one second, capped at ten.
struct Backoff(Duration);

impl Backoff {
    fn new() -> Self {
        Self(Duration::from_secs(1))
    }

    async fn wait(&mut self) {
        sleep(self.0).await;
        self.0 = (self.0 * 2).min(Duration::from_secs(10));
    }
}

/// Keep the shared state supplied with a working room store, entering
/// degraded mode whenever the backend is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RoomStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                backoff.wait().await;
                continue;
            }
        };

        state.set_room_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        backoff = Backoff::new();

        monitor(&state, store.as_ref()).await;

        state.clear_room_store().await;
        backoff.wait().await;
    }
}

/// Ping the store on an interval until the connection is lost for good
/// (failed health check and an exhausted reconnect budget).
async fn monitor(state: &SharedState, store: &dyn RoomStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("storage healthy again; leaving degraded mode");
                state.set_degraded(false);
            }
            sleep(PING_INTERVAL).await;
            continue;
        }

        if reconnect(state, store).await {
            state.set_degraded(false);
            sleep(PING_INTERVAL).await;
        } else {
            warn!("exhausted storage reconnect attempts; dropping the connection");
            return;
        }
    }
}

/// Bounded reconnect attempts after a failed health check. The first
/// failure already flips the degraded flag so requests answer 503 right
/// away instead of only after the whole budget is spent.
async fn reconnect(state: &SharedState, store: &dyn RoomStore) -> bool {
    let mut backoff = Backoff::new();

    for attempt in 0..RECONNECT_BUDGET {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    state.set_degraded(true);
                }
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                backoff.wait().await;
            }
        }
    }

    false
}
