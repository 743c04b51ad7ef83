//! WebSocket handling for the per-room presence channel.
//!
//! Presence is connection-scoped and never touches the room store: a
//! participant is "present" exactly while its socket is open. Every
//! membership or readiness change fans the full member set out to all
//! subscribers of the room.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::broadcast::error::RecvError, sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::presence::{PresenceInboundMessage, PresenceSyncMessage},
    dto::validation::validate_session_id,
    state::{SharedState, presence::PresenceSync},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle of one presence WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket, room_code: String) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound syncs flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(room = %room_code, error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!(room = %room_code, "presence identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let session_id = match PresenceInboundMessage::from_json_str(&initial_message) {
        Ok(PresenceInboundMessage::Hello { session_id })
            if validate_session_id(&session_id).is_ok() =>
        {
            session_id
        }
        Ok(_) => {
            warn!(room = %room_code, "first presence message was not a valid hello");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(room = %room_code, error = %err, "failed to parse presence message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let (mut sync_rx, initial_sync) = state.presence().join(&room_code, &session_id);
    info!(room = %room_code, session = %session_id, "presence connected");

    if send_sync(&outbound_tx, initial_sync).is_err() {
        state.presence().leave(&room_code, &session_id);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    loop {
        tokio::select! {
            sync = sync_rx.recv() => {
                match sync {
                    Ok(sync) => {
                        if send_sync(&outbound_tx, sync).is_err() {
                            break;
                        }
                    }
                    // A lagged subscriber only missed stale snapshots; the
                    // next sync carries the full state again.
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match PresenceInboundMessage::from_json_str(&text) {
                            Ok(PresenceInboundMessage::Ready { ready }) => {
                                state.presence().set_ready(&room_code, &session_id, ready);
                            }
                            Ok(PresenceInboundMessage::Hello { .. }) => {
                                warn!(room = %room_code, session = %session_id, "ignoring duplicate hello");
                            }
                            Ok(PresenceInboundMessage::Unknown) => {}
                            Err(err) => {
                                warn!(room = %room_code, session = %session_id, error = %err, "failed to parse presence message");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = outbound_tx.send(Message::Pong(payload));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let _ = outbound_tx.send(Message::Close(frame));
                        break;
                    }
                    Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Err(err)) => {
                        warn!(room = %room_code, session = %session_id, error = %err, "websocket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.presence().leave(&room_code, &session_id);
    info!(room = %room_code, session = %session_id, "presence disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Serialize a sync frame and queue it on the writer channel.
fn send_sync(tx: &mpsc::UnboundedSender<Message>, sync: PresenceSync) -> Result<(), ()> {
    let message: PresenceSyncMessage = sync.into();
    let payload = match serde_json::to_string(&message) {
        Ok(payload) => payload,
        Err(err) => {
            // Serialization failure is permanent; drop the frame but keep
            // the connection.
            warn!(error = %err, "failed to serialize presence sync");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
