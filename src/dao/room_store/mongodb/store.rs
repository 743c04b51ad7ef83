use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, DateTime, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ReturnDocument,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        EVALUATION_COMPLETED, EVALUATION_PENDING, EVALUATION_PROCESSING, MongoRoomDocument,
        doc_id, judgment_doc, participant_status_str, status_field, submission_field,
    },
};
use crate::dao::{
    models::{JudgmentEntity, ParticipantSlot, RoomEntity},
    room_store::{InsertOutcome, ParticipantUpdate, RoomStore},
    storage::StorageResult,
};

const ROOM_COLLECTION_NAME: &str = "rooms";

/// MongoDB-backed [`RoomStore`].
///
/// Every guarded mutation is a single `findOneAndUpdate`/`updateOne` whose
/// filter carries the precondition, so concurrent callers race on the
/// server's document-level atomicity rather than on a read-then-write.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoRoomDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<InsertOutcome> {
        let code = room.room_code.clone();
        let document: MongoRoomDocument = room.into();
        let collection = self.collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::CodeTaken),
            Err(source) => Err(MongoDaoError::InsertRoom { code, source }),
        }
    }

    async fn find_room(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection().await;
        let document = collection
            .find_one(doc_id(&code))
            .await
            .map_err(|source| MongoDaoError::LoadRoom { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn claim_guest_slot(
        &self,
        code: String,
        session_id: String,
    ) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection().await;
        let filter = doc! {"_id": &code, "guest_id": Bson::Null};
        let update = doc! {"$set": {
            "guest_id": session_id,
            "guest_status": "joined",
            "updated_at": DateTime::now(),
        }};

        let document = collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateRoom { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn update_participant(
        &self,
        code: String,
        slot: ParticipantSlot,
        update: ParticipantUpdate,
    ) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection().await;

        // Each guarded field gets its own conditional write so a failed
        // precondition (already submitted, already started) never blocks
        // the unguarded status update.
        if let Some(status) = update.status {
            let set = doc! {"$set": {
                status_field(slot): participant_status_str(status),
                "updated_at": DateTime::now(),
            }};
            collection
                .update_one(doc_id(&code), set)
                .await
                .map_err(|source| MongoDaoError::UpdateRoom {
                    code: code.clone(),
                    source,
                })?;
        }

        if let Some(url) = update.submission_url {
            let filter = doc! {"_id": &code, submission_field(slot): Bson::Null};
            let set = doc! {"$set": {
                submission_field(slot): url,
                "updated_at": DateTime::now(),
            }};
            collection
                .update_one(filter, set)
                .await
                .map_err(|source| MongoDaoError::UpdateRoom {
                    code: code.clone(),
                    source,
                })?;
        }

        if let Some(at) = update.start_game_at {
            let filter = doc! {"_id": &code, "game_started": false};
            let set = doc! {"$set": {
                "game_started": true,
                "game_start_time": DateTime::from_system_time(at),
                "updated_at": DateTime::now(),
            }};
            collection
                .update_one(filter, set)
                .await
                .map_err(|source| MongoDaoError::UpdateRoom {
                    code: code.clone(),
                    source,
                })?;
        }

        self.find_room(code).await
    }

    async fn claim_evaluation(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection().await;
        let filter = doc! {"_id": &code, "evaluation_status": EVALUATION_PENDING};
        let update = doc! {"$set": {
            "evaluation_status": EVALUATION_PROCESSING,
            "updated_at": DateTime::now(),
        }};

        let document = collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateRoom { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn complete_evaluation(
        &self,
        code: String,
        judgment: JudgmentEntity,
        winner_id: Option<String>,
    ) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection().await;
        let filter = doc! {"_id": &code, "evaluation_status": EVALUATION_PROCESSING};
        let winner: Bson = match winner_id {
            Some(id) => Bson::String(id),
            None => Bson::Null,
        };
        let update = doc! {"$set": {
            "evaluation_status": EVALUATION_COMPLETED,
            "judgment": judgment_doc(&judgment),
            "winner_id": winner,
            "updated_at": DateTime::now(),
        }};

        let document = collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::UpdateRoom { code, source })?;
        Ok(document.map(Into::into))
    }

    async fn release_evaluation(&self, code: String) -> MongoResult<()> {
        let collection = self.collection().await;
        let filter = doc! {"_id": &code, "evaluation_status": EVALUATION_PROCESSING};
        let update = doc! {"$set": {
            "evaluation_status": EVALUATION_PENDING,
            "updated_at": DateTime::now(),
        }};

        collection
            .update_one(filter, update)
            .await
            .map_err(|source| MongoDaoError::UpdateRoom { code, source })?;
        Ok(())
    }
}

impl RoomStore for MongoRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(code).await.map_err(Into::into) })
    }

    fn claim_guest_slot(
        &self,
        code: String,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .claim_guest_slot(code, session_id)
                .await
                .map_err(Into::into)
        })
    }

    fn update_participant(
        &self,
        code: String,
        slot: ParticipantSlot,
        update: ParticipantUpdate,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_participant(code, slot, update)
                .await
                .map_err(Into::into)
        })
    }

    fn claim_evaluation(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.claim_evaluation(code).await.map_err(Into::into) })
    }

    fn complete_evaluation(
        &self,
        code: String,
        judgment: JudgmentEntity,
        winner_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .complete_evaluation(code, judgment, winner_id)
                .await
                .map_err(Into::into)
        })
    }

    fn release_evaluation(&self, code: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.release_evaluation(code).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}
