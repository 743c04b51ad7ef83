//! Sketch Duel backend entrypoint: REST + WebSocket + SSE over axum, rooms
//! in MongoDB, verdicts and prompts from Gemini.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketch_duel_back::{
    config::AppConfig,
    dao::room_store::{RoomStore, mongodb::MongoRoomStore, mongodb::config::MongoConfig},
    providers::gemini::{GeminiConfig, GeminiProvider},
    routes,
    services::storage_supervisor,
    state::{AppState, Providers, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gemini = GeminiProvider::new(GeminiConfig::from_env().context("loading Gemini configuration")?)
        .context("building Gemini client")?;
    let state = AppState::new(
        AppConfig::load(),
        Providers {
            judge: Arc::new(gemini.clone()),
            prompt: Arc::new(gemini),
        },
    );

    spawn_storage_supervisor(state.clone());

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port()));
    let listener = TcpListener::bind(addr).await.context("binding server")?;
    info!(%addr, "starting server");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")
}

/// Hand the MongoDB link to the supervisor, which re-dials the same URI on
/// every attempt and keeps the shared state in degraded mode in between.
fn spawn_storage_supervisor(state: SharedState) {
    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db = env::var("MONGO_DB").ok();

    tokio::spawn(storage_supervisor::run(state, move || {
        let (uri, db) = (uri.clone(), db.clone());
        async move {
            let config = MongoConfig::from_uri(&uri, db.as_deref()).await?;
            let store = MongoRoomStore::connect(config).await?;
            Ok(Arc::new(store) as Arc<dyn RoomStore>)
        }
    }));
}

fn listen_port() -> u16 {
    env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080)
}

/// Wait for Ctrl+C or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
