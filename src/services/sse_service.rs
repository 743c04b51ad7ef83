use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    dto::sse::{Handshake, RoomEvent},
    state::SharedState,
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe to a room's event stream.
pub fn subscribe_room(state: &SharedState, room_code: &str) -> broadcast::Receiver<RoomEvent> {
    state.room_events().subscribe(room_code)
}

/// Handshake event emitted as the first frame of a new subscription.
pub async fn handshake_event(state: &SharedState, room_code: &str) -> Option<RoomEvent> {
    let payload = Handshake {
        room_code: room_code.to_string(),
        message: "room stream connected".to_string(),
        degraded: state.is_degraded().await,
    };
    RoomEvent::json(Some("handshake".to_string()), &payload).ok()
}

/// Turn a broadcast subscription into an SSE response.
///
/// A lagged receiver only missed frames that later frames supersede, so lag
/// is swallowed instead of terminating the stream.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<RoomEvent>,
    first: Option<RoomEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let live = BroadcastStream::new(receiver)
        .filter_map(|received| async move { received.ok().map(|event| Ok(into_sse(event))) });

    let stream = stream::iter(first.map(|event| Ok::<_, Infallible>(into_sse(event)))).chain(live);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

fn into_sse(frame: RoomEvent) -> Event {
    let mut event = Event::default().data(frame.payload);
    if let Some(name) = frame.name {
        event = event.event(name);
    }
    event
}
