use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::presence::{PresenceMember, PresenceSync};

/// Messages accepted from presence WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PresenceInboundMessage {
    /// Identification; must be the first frame on the socket.
    #[serde(rename = "hello")]
    Hello {
        /// Opaque session id of the connecting participant.
        session_id: String,
    },
    /// Readiness toggle.
    #[serde(rename = "ready")]
    Ready {
        /// New readiness flag.
        ready: bool,
    },
    /// Anything unrecognised; ignored by the handler.
    #[serde(other)]
    Unknown,
}

impl PresenceInboundMessage {
    /// Parse a text frame into a presence message.
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Full membership snapshot sent to every subscriber on any change.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "type", rename = "sync")]
pub struct PresenceSyncMessage {
    /// All currently connected members.
    pub members: Vec<PresenceMemberDto>,
}

impl From<PresenceSync> for PresenceSyncMessage {
    fn from(sync: PresenceSync) -> Self {
        Self {
            members: sync.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// One connected member in a sync frame.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PresenceMemberDto {
    /// Opaque session id.
    pub session_id: String,
    /// Whether this member signalled readiness.
    pub ready: bool,
}

impl From<PresenceMember> for PresenceMemberDto {
    fn from(member: PresenceMember) -> Self {
        Self {
            session_id: member.session_id,
            ready: member.ready,
        }
    }
}

/// Connection state of the other participant, derived from a sync frame.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    /// No other member present.
    Disconnected,
    /// Present but not ready.
    Connected,
    /// Present and ready to start.
    Ready,
}

/// Derive the other participant's status from a membership snapshot.
///
/// Faster and more volatile than the durable room record: presence drops to
/// `Disconnected` the moment the peer's socket closes, without touching the
/// store.
pub fn derive_peer_status(members: &[PresenceMemberDto], own_session: &str) -> PeerStatus {
    let peers: Vec<&PresenceMemberDto> = members
        .iter()
        .filter(|member| member.session_id != own_session)
        .collect();

    if peers.is_empty() {
        PeerStatus::Disconnected
    } else if peers.iter().any(|member| member.ready) {
        PeerStatus::Ready
    } else {
        PeerStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(session_id: &str, ready: bool) -> PresenceMemberDto {
        PresenceMemberDto {
            session_id: session_id.to_string(),
            ready,
        }
    }

    #[test]
    fn alone_means_disconnected_peer() {
        let members = vec![member("me", true)];
        assert_eq!(derive_peer_status(&members, "me"), PeerStatus::Disconnected);
    }

    #[test]
    fn present_but_not_ready_peer() {
        let members = vec![member("me", false), member("them", false)];
        assert_eq!(derive_peer_status(&members, "me"), PeerStatus::Connected);
    }

    #[test]
    fn ready_peer_wins_over_connected() {
        let members = vec![member("me", false), member("them", true)];
        assert_eq!(derive_peer_status(&members, "me"), PeerStatus::Ready);
    }

    #[test]
    fn own_readiness_does_not_count() {
        let members = vec![member("me", true)];
        assert_eq!(derive_peer_status(&members, "me"), PeerStatus::Disconnected);
    }

    #[test]
    fn inbound_messages_parse_by_tag() {
        let hello = PresenceInboundMessage::from_json_str(
            r#"{"type":"hello","session_id":"abc123"}"#,
        )
        .unwrap();
        assert!(matches!(
            hello,
            PresenceInboundMessage::Hello { session_id } if session_id == "abc123"
        ));

        let ready =
            PresenceInboundMessage::from_json_str(r#"{"type":"ready","ready":true}"#).unwrap();
        assert!(matches!(
            ready,
            PresenceInboundMessage::Ready { ready: true }
        ));

        let unknown =
            PresenceInboundMessage::from_json_str(r#"{"type":"wave"}"#).unwrap();
        assert!(matches!(unknown, PresenceInboundMessage::Unknown));
    }
}
