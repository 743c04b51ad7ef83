//! In-memory [`RoomStore`] used by unit tests.
//!
//! Mirrors the conditional-update semantics of the MongoDB backend: every
//! guarded mutation checks its precondition and applies the write under one
//! lock acquisition, so races between concurrent tasks resolve the same way
//! a single-document UPDATE-WHERE would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures::future::BoxFuture;

use crate::dao::models::{
    EvaluationStatus, JudgmentEntity, ParticipantSlot, ParticipantStatus, RoomEntity,
};
use crate::dao::room_store::{InsertOutcome, ParticipantUpdate, RoomStore};
use crate::dao::storage::StorageResult;

/// Thread-safe map of rooms keyed by room code.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    rooms: Arc<Mutex<HashMap<String, RoomEntity>>>,
}

impl MemoryRoomStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct snapshot of a room, bypassing the trait for test assertions.
    pub fn get(&self, code: &str) -> Option<RoomEntity> {
        self.rooms.lock().unwrap().get(code).cloned()
    }

    /// Seed a room directly, bypassing code generation.
    pub fn put(&self, room: RoomEntity) {
        self.rooms
            .lock()
            .unwrap()
            .insert(room.room_code.clone(), room);
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            if guard.contains_key(&room.room_code) {
                return Ok(InsertOutcome::CodeTaken);
            }
            guard.insert(room.room_code.clone(), room);
            Ok(InsertOutcome::Inserted)
        })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move { Ok(rooms.lock().unwrap().get(&code).cloned()) })
    }

    fn claim_guest_slot(
        &self,
        code: String,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            let Some(room) = guard.get_mut(&code) else {
                return Ok(None);
            };
            if room.guest_id.is_some() {
                return Ok(None);
            }
            room.guest_id = Some(session_id);
            room.guest_status = ParticipantStatus::Joined;
            room.updated_at = SystemTime::now();
            Ok(Some(room.clone()))
        })
    }

    fn update_participant(
        &self,
        code: String,
        slot: ParticipantSlot,
        update: ParticipantUpdate,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            let Some(room) = guard.get_mut(&code) else {
                return Ok(None);
            };

            if let Some(status) = update.status {
                match slot {
                    ParticipantSlot::Host => room.host_status = status,
                    ParticipantSlot::Guest => room.guest_status = status,
                }
            }

            if let Some(url) = update.submission_url {
                let target = match slot {
                    ParticipantSlot::Host => &mut room.host_submission_url,
                    ParticipantSlot::Guest => &mut room.guest_submission_url,
                };
                if target.is_none() {
                    *target = Some(url);
                }
            }

            if let Some(at) = update.start_game_at {
                if !room.game_started {
                    room.game_started = true;
                    room.game_start_time = Some(at);
                }
            }

            room.updated_at = SystemTime::now();
            Ok(Some(room.clone()))
        })
    }

    fn claim_evaluation(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            let Some(room) = guard.get_mut(&code) else {
                return Ok(None);
            };
            if room.evaluation_status != EvaluationStatus::Pending {
                return Ok(None);
            }
            room.evaluation_status = EvaluationStatus::Processing;
            room.updated_at = SystemTime::now();
            Ok(Some(room.clone()))
        })
    }

    fn complete_evaluation(
        &self,
        code: String,
        judgment: JudgmentEntity,
        winner_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            let Some(room) = guard.get_mut(&code) else {
                return Ok(None);
            };
            if room.evaluation_status != EvaluationStatus::Processing {
                return Ok(None);
            }
            room.judgment = Some(judgment);
            room.winner_id = winner_id;
            room.evaluation_status = EvaluationStatus::Completed;
            room.updated_at = SystemTime::now();
            Ok(Some(room.clone()))
        })
    }

    fn release_evaluation(&self, code: String) -> BoxFuture<'static, StorageResult<()>> {
        let rooms = self.rooms.clone();
        Box::pin(async move {
            let mut guard = rooms.lock().unwrap();
            if let Some(room) = guard.get_mut(&code) {
                if room.evaluation_status == EvaluationStatus::Processing {
                    room.evaluation_status = EvaluationStatus::Pending;
                    room.updated_at = SystemTime::now();
                }
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
