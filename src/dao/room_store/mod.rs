//! Persistence abstraction for rooms.
//!
//! The conditional methods (`claim_guest_slot`, `claim_evaluation`,
//! `complete_evaluation`, and the guarded parts of `update_participant`)
//! must be atomic at the row level: a single UPDATE-WHERE, never a
//! read-then-write pair. Everything the exactly-once judgment protocol
//! guarantees rests on that property.

pub mod mongodb;

#[cfg(test)]
pub mod memory;

use futures::future::BoxFuture;
use std::time::SystemTime;

use crate::dao::models::{JudgmentEntity, ParticipantSlot, ParticipantStatus, RoomEntity};
use crate::dao::storage::StorageResult;

/// Result of inserting a freshly generated room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The room was written with its generated code.
    Inserted,
    /// Another room already owns this code; the caller should regenerate.
    CodeTaken,
}

/// Mutation applied to exactly one participant slot.
#[derive(Debug, Clone, Default)]
pub struct ParticipantUpdate {
    /// New status for the slot.
    pub status: Option<ParticipantStatus>,
    /// Drawing artifact reference; only written while the slot's URL is
    /// still unset.
    pub submission_url: Option<String>,
    /// Start the drawing phase; only honoured while the room has not
    /// started yet.
    pub start_game_at: Option<SystemTime>,
}

/// Abstraction over the persistence layer for contest rooms.
pub trait RoomStore: Send + Sync {
    /// Insert a new room, reporting a code collision instead of failing.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>>;

    /// Fetch a room by its code.
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Seat a joiner in the guest slot, conditioned on the slot still being
    /// empty. Returns the updated room, or `None` when no row matched
    /// (unknown code or slot already taken — the caller re-reads to tell
    /// the two apart).
    fn claim_guest_slot(
        &self,
        code: String,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Apply a status/submission/start update to one participant slot.
    /// Returns `None` when the room does not exist.
    fn update_participant(
        &self,
        code: String,
        slot: ParticipantSlot,
        update: ParticipantUpdate,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Atomically move `evaluation_status` from pending to processing.
    /// Returns the claimed room, or `None` when the claim was not free.
    fn claim_evaluation(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Persist the verdict, the derived winner, and the completed status in
    /// one update, conditioned on the claim still being held. Returns
    /// `None` when the room was not in processing state.
    fn complete_evaluation(
        &self,
        code: String,
        judgment: JudgmentEntity,
        winner_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Release a held claim so a later call can retry
    /// (processing back to pending).
    fn release_evaluation(&self, code: String) -> BoxFuture<'static, StorageResult<()>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
