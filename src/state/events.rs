use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::RoomEvent;

/// Channel capacity for per-room event streams.
const EVENT_CAPACITY: usize = 16;

/// Registry of per-room broadcast channels backing the SSE streams.
///
/// Channels are created lazily on first subscription and pruned once a
/// broadcast finds no remaining subscriber, so idle rooms cost nothing.
#[derive(Default)]
pub struct RoomEventsHub {
    channels: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl RoomEventsHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for a room's event stream.
    pub fn subscribe(&self, room_code: &str) -> broadcast::Receiver<RoomEvent> {
        self.channels
            .entry(room_code.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CAPACITY).0)
            .subscribe()
    }

    /// Send an event to all current subscribers of a room, dropping the
    /// channel when nobody is listening anymore.
    pub fn broadcast(&self, room_code: &str, event: RoomEvent) {
        let orphaned = match self.channels.get(room_code) {
            Some(sender) => sender.send(event).is_err(),
            None => return,
        };
        if orphaned {
            self.channels
                .remove_if(room_code, |_, sender| sender.receiver_count() == 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> RoomEvent {
        RoomEvent {
            name: Some(name.to_string()),
            payload: "{}".to_string(),
        }
    }

    #[test]
    fn subscribers_receive_room_events() {
        let hub = RoomEventsHub::new();
        let mut rx = hub.subscribe("ROOM01");
        hub.broadcast("ROOM01", event("room"));
        let received = rx.try_recv().expect("event delivered");
        assert_eq!(received.name.as_deref(), Some("room"));
    }

    #[test]
    fn events_do_not_leak_across_rooms() {
        let hub = RoomEventsHub::new();
        let mut rx = hub.subscribe("ROOM01");
        hub.subscribe("ROOM02");
        hub.broadcast("ROOM02", event("room"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn orphaned_channels_are_pruned() {
        let hub = RoomEventsHub::new();
        drop(hub.subscribe("ROOM01"));
        hub.broadcast("ROOM01", event("room"));
        assert!(hub.channels.get("ROOM01").is_none());
    }
}
