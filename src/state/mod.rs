/// Per-room SSE broadcast channels.
pub mod events;
/// Ephemeral per-room presence registry.
pub mod presence;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::{
    config::AppConfig,
    dao::room_store::RoomStore,
    error::ServiceError,
    providers::{JudgeProvider, PromptProvider},
};

pub use self::events::RoomEventsHub;
pub use self::presence::{PresenceMember, PresenceRegistry, PresenceSync};

/// Cheaply clonable handle on the application state.
pub type SharedState = Arc<AppState>;

/// External collaborators injected at startup (or mocked in tests).
pub struct Providers {
    /// Verdict generator over two drawings.
    pub judge: Arc<dyn JudgeProvider>,
    /// Drawing prompt generator.
    pub prompt: Arc<dyn PromptProvider>,
}

/// Central application state: the store handle, the realtime registries,
/// and the external provider adapters.
pub struct AppState {
    config: AppConfig,
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    providers: Providers,
    presence: PresenceRegistry,
    room_events: RoomEventsHub,
    degraded: AtomicBool,
}

impl AppState {
    /// Build the shared state. The application starts degraded until the
    /// storage supervisor installs a backend.
    pub fn new(config: AppConfig, providers: Providers) -> SharedState {
        Arc::new(Self {
            config,
            room_store: RwLock::new(None),
            providers,
            presence: PresenceRegistry::new(),
            room_events: RoomEventsHub::new(),
            degraded: AtomicBool::new(true),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle on the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        self.room_store.read().await.clone()
    }

    /// Room store handle, or [`ServiceError::Degraded`] when none is
    /// installed.
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a room store and leave degraded mode.
    pub async fn set_room_store(&self, store: Arc<dyn RoomStore>) {
        *self.room_store.write().await = Some(store);
        self.set_degraded(false);
    }

    /// Drop the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        self.room_store.write().await.take();
        self.set_degraded(true);
    }

    /// Whether the backend currently lacks a usable storage connection.
    pub async fn is_degraded(&self) -> bool {
        self.room_store.read().await.is_none() || self.degraded.load(Ordering::Relaxed)
    }

    /// Flip the degraded flag; owned by the storage supervisor.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.store(value, Ordering::Relaxed);
    }

    /// Ephemeral presence registry backing the per-room WebSocket channel.
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Per-room broadcast hubs backing the SSE streams.
    pub fn room_events(&self) -> &RoomEventsHub {
        &self.room_events
    }

    /// Judge provider adapter.
    pub fn judge_provider(&self) -> Arc<dyn JudgeProvider> {
        self.providers.judge.clone()
    }

    /// Prompt provider adapter.
    pub fn prompt_provider(&self) -> Arc<dyn PromptProvider> {
        self.providers.prompt.clone()
    }
}
