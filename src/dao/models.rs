use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Progress of a single participant through the contest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Slot exists but nobody occupies it yet.
    Unjoined,
    /// Participant has opened the room.
    Joined,
    /// Participant signalled they are ready to start drawing.
    Ready,
    /// Participant submitted their drawing before the deadline.
    Submitted,
    /// Drawing was submitted automatically when the deadline elapsed.
    AutoSubmitted,
}

impl ParticipantStatus {
    /// Whether this status carries a finished drawing.
    pub fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted | Self::AutoSubmitted)
    }
}

/// Claim field gating judgment generation; the only mutual-exclusion
/// primitive in the system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    /// No judgment yet; the claim is free to take.
    Pending,
    /// A caller holds the claim and is talking to the judge provider.
    Processing,
    /// A judgment has been persisted; terminal.
    Completed,
}

/// Which of the two drawings the judge picked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WinnerSlot {
    /// The creator's drawing won.
    #[serde(rename = "1")]
    Host,
    /// The joiner's drawing won.
    #[serde(rename = "2")]
    Guest,
}

/// Structured verdict produced by the judge provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JudgmentEntity {
    /// Winning slot ("1" = host, "2" = guest on the wire).
    pub winner: WinnerSlot,
    /// What the judge saw in the host's drawing.
    pub critique1: String,
    /// What the judge saw in the guest's drawing.
    pub critique2: String,
    /// Joke at the loser's expense.
    pub roast: String,
    /// Prompt echoed back by the judge.
    #[serde(default)]
    pub prompt: String,
}

/// One of the two participant slots of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantSlot {
    /// Slot 1, always the room creator.
    Host,
    /// Slot 2, filled by the joiner.
    Guest,
}

/// One contest instance, persisted by the storage layer and keyed by its
/// human-shareable room code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Short shareable identifier; primary lookup key.
    pub room_code: String,
    /// Session id of the creator (participant 1).
    pub host_id: String,
    /// Session id of the joiner (participant 2), empty until someone joins.
    pub guest_id: Option<String>,
    /// Creator's progress through the contest.
    pub host_status: ParticipantStatus,
    /// Joiner's progress through the contest.
    pub guest_status: ParticipantStatus,
    /// Drawing prompt shared by both participants; immutable after creation.
    pub prompt: String,
    /// Rendered drawing of the creator, set exactly once.
    pub host_submission_url: Option<String>,
    /// Rendered drawing of the joiner, set exactly once.
    pub guest_submission_url: Option<String>,
    /// Whether the creator started the drawing phase.
    pub game_started: bool,
    /// Synchronized countdown origin, stamped once by the start action.
    pub game_start_time: Option<SystemTime>,
    /// Claim field for the exactly-once judgment protocol.
    pub evaluation_status: EvaluationStatus,
    /// Structured verdict, set exactly once.
    pub judgment: Option<JudgmentEntity>,
    /// Session id of the winner, derived from the judgment.
    pub winner_id: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time this room was updated.
    pub updated_at: SystemTime,
}

impl RoomEntity {
    /// Fresh room with the creator seated in the host slot.
    pub fn new(room_code: String, host_id: String, prompt: String) -> Self {
        let now = SystemTime::now();
        Self {
            room_code,
            host_id,
            guest_id: None,
            host_status: ParticipantStatus::Joined,
            guest_status: ParticipantStatus::Unjoined,
            prompt,
            host_submission_url: None,
            guest_submission_url: None,
            game_started: false,
            game_start_time: None,
            evaluation_status: EvaluationStatus::Pending,
            judgment: None,
            winner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Resolve which slot a session occupies, if any.
    pub fn slot_of(&self, session_id: &str) -> Option<ParticipantSlot> {
        if self.host_id == session_id {
            Some(ParticipantSlot::Host)
        } else if self.guest_id.as_deref() == Some(session_id) {
            Some(ParticipantSlot::Guest)
        } else {
            None
        }
    }

    /// Session id seated in the given slot.
    pub fn participant_id(&self, slot: ParticipantSlot) -> Option<&str> {
        match slot {
            ParticipantSlot::Host => Some(self.host_id.as_str()),
            ParticipantSlot::Guest => self.guest_id.as_deref(),
        }
    }

    /// Submission URL belonging to the given slot.
    pub fn submission_url(&self, slot: ParticipantSlot) -> Option<&str> {
        match slot {
            ParticipantSlot::Host => self.host_submission_url.as_deref(),
            ParticipantSlot::Guest => self.guest_submission_url.as_deref(),
        }
    }

    /// The contest is finished once both drawings are in.
    pub fn both_submitted(&self) -> bool {
        self.host_submission_url.is_some() && self.guest_submission_url.is_some()
    }

    /// Session id that should be recorded as winner for a verdict.
    pub fn winner_session(&self, winner: WinnerSlot) -> Option<String> {
        match winner {
            WinnerSlot::Host => Some(self.host_id.clone()),
            WinnerSlot::Guest => self.guest_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomEntity {
        let mut room = RoomEntity::new("AB12CD".into(), "host-token".into(), "Draw a cat".into());
        room.guest_id = Some("guest-token".into());
        room
    }

    #[test]
    fn slot_resolution() {
        let room = room();
        assert_eq!(room.slot_of("host-token"), Some(ParticipantSlot::Host));
        assert_eq!(room.slot_of("guest-token"), Some(ParticipantSlot::Guest));
        assert_eq!(room.slot_of("stranger"), None);
    }

    #[test]
    fn both_submitted_requires_two_urls() {
        let mut room = room();
        assert!(!room.both_submitted());
        room.host_submission_url = Some("https://cdn/host.png".into());
        assert!(!room.both_submitted());
        room.guest_submission_url = Some("https://cdn/guest.png".into());
        assert!(room.both_submitted());
    }

    #[test]
    fn winner_session_maps_slots_to_ids() {
        let room = room();
        assert_eq!(
            room.winner_session(WinnerSlot::Host).as_deref(),
            Some("host-token")
        );
        assert_eq!(
            room.winner_session(WinnerSlot::Guest).as_deref(),
            Some("guest-token")
        );
    }

    #[test]
    fn winner_slot_uses_numeric_wire_format() {
        assert_eq!(serde_json::to_string(&WinnerSlot::Guest).unwrap(), "\"2\"");
        let parsed: WinnerSlot = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(parsed, WinnerSlot::Host);
    }
}
