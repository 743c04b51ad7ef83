use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::broadcast;

/// Channel capacity for per-room presence syncs; a lagging subscriber only
/// needs the latest snapshot anyway.
const SYNC_CAPACITY: usize = 16;

/// One connected participant as seen by the presence channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMember {
    /// Opaque session id of the connection.
    pub session_id: String,
    /// Whether this participant signalled readiness.
    pub ready: bool,
}

/// Full membership snapshot pushed to every subscriber on any change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSync {
    /// All currently connected members, ordered by session id.
    pub members: Vec<PresenceMember>,
}

struct RoomPresence {
    members: HashMap<String, bool>,
    sender: broadcast::Sender<PresenceSync>,
}

impl RoomPresence {
    fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(SYNC_CAPACITY);
        Self {
            members: HashMap::new(),
            sender,
        }
    }

    fn snapshot(&self) -> PresenceSync {
        let mut members: Vec<PresenceMember> = self
            .members
            .iter()
            .map(|(session_id, ready)| PresenceMember {
                session_id: session_id.clone(),
                ready: *ready,
            })
            .collect();
        members.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        PresenceSync { members }
    }

    fn broadcast(&self) {
        let _ = self.sender.send(self.snapshot());
    }
}

/// Ephemeral, per-room registry of connected participants.
///
/// Presence is connection-scoped: a member exists exactly while its socket
/// is open, and nothing here ever touches durable room state. Every change
/// fans the full member set out to all subscribers (sync semantics, no
/// diffs).
#[derive(Default)]
pub struct PresenceRegistry {
    rooms: DashMap<String, RoomPresence>,
}

impl PresenceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and subscribe it to the room's sync stream.
    /// Returns the receiver plus the snapshot that includes the new member.
    pub fn join(
        &self,
        room_code: &str,
        session_id: &str,
    ) -> (broadcast::Receiver<PresenceSync>, PresenceSync) {
        let mut room = self
            .rooms
            .entry(room_code.to_string())
            .or_insert_with(RoomPresence::new);
        room.members.insert(session_id.to_string(), false);
        let receiver = room.sender.subscribe();
        let snapshot = room.snapshot();
        room.broadcast();
        (receiver, snapshot)
    }

    /// Update a member's readiness flag; no-op for unknown members.
    pub fn set_ready(&self, room_code: &str, session_id: &str, ready: bool) {
        let Some(mut room) = self.rooms.get_mut(room_code) else {
            return;
        };
        if let Some(flag) = room.members.get_mut(session_id) {
            *flag = ready;
            room.broadcast();
        }
    }

    /// Drop a member on disconnect, removing the room entry once empty.
    pub fn leave(&self, room_code: &str, session_id: &str) {
        let mut emptied = false;
        if let Some(mut room) = self.rooms.get_mut(room_code) {
            if room.members.remove(session_id).is_some() {
                room.broadcast();
            }
            emptied = room.members.is_empty();
        }
        if emptied {
            self.rooms
                .remove_if(room_code, |_, room| room.members.is_empty());
        }
    }

    /// Current snapshot of a room, empty when nobody is connected.
    pub fn snapshot(&self, room_code: &str) -> PresenceSync {
        self.rooms
            .get(room_code)
            .map(|room| room.snapshot())
            .unwrap_or(PresenceSync {
                members: Vec::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_broadcasts_full_member_set() {
        let registry = PresenceRegistry::new();
        let (mut rx_a, snapshot) = registry.join("ROOM01", "alice");
        assert_eq!(snapshot.members.len(), 1);

        let (_rx_b, snapshot) = registry.join("ROOM01", "bob");
        assert_eq!(snapshot.members.len(), 2);

        // alice sees the sync triggered by bob's join
        let sync = rx_a.try_recv().expect("own join sync");
        assert_eq!(sync.members.len(), 1);
        let sync = rx_a.try_recv().expect("bob join sync");
        assert_eq!(sync.members.len(), 2);
        assert!(sync.members.iter().any(|m| m.session_id == "bob"));
    }

    #[test]
    fn ready_flag_propagates() {
        let registry = PresenceRegistry::new();
        let (mut rx, _) = registry.join("ROOM01", "alice");
        let _ = rx.try_recv();
        registry.join("ROOM01", "bob");
        let _ = rx.try_recv();

        registry.set_ready("ROOM01", "bob", true);
        let sync = rx.try_recv().expect("ready sync");
        let bob = sync
            .members
            .iter()
            .find(|m| m.session_id == "bob")
            .expect("bob present");
        assert!(bob.ready);
    }

    #[test]
    fn leave_shrinks_membership_and_drops_empty_rooms() {
        let registry = PresenceRegistry::new();
        let (mut rx, _) = registry.join("ROOM01", "alice");
        let _ = rx.try_recv();
        registry.join("ROOM01", "bob");
        let _ = rx.try_recv();

        registry.leave("ROOM01", "bob");
        let sync = rx.try_recv().expect("leave sync");
        assert_eq!(sync.members.len(), 1);

        registry.leave("ROOM01", "alice");
        assert!(registry.snapshot("ROOM01").members.is_empty());
    }

    #[test]
    fn ready_for_unknown_member_is_ignored() {
        let registry = PresenceRegistry::new();
        registry.join("ROOM01", "alice");
        registry.set_ready("ROOM01", "ghost", true);
        let snapshot = registry.snapshot("ROOM01");
        assert_eq!(snapshot.members.len(), 1);
        assert!(!snapshot.members[0].ready);
    }

    #[test]
    fn rooms_are_isolated() {
        let registry = PresenceRegistry::new();
        registry.join("ROOM01", "alice");
        registry.join("ROOM02", "bob");
        assert_eq!(registry.snapshot("ROOM01").members.len(), 1);
        assert_eq!(registry.snapshot("ROOM02").members.len(), 1);
    }
}
