//! Exactly-once judgment generation.
//!
//! The claim-then-generate protocol: an atomic `pending → processing`
//! transition on the room's `evaluation_status` elects a single writer;
//! everyone else either surfaces the finished verdict or is told to poll.
//! Every failure path after a successful claim releases it, so a room can
//! never wedge in `processing`.

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::{
    dto::judgment::{JudgmentRequest, JudgmentStatusResponse, JudgmentView},
    error::ServiceError,
    providers::JudgeRequest,
    services::{sse_events, verdict},
    state::SharedState,
};

/// Run the judgment protocol for a room, safe to call concurrently from
/// both participants and from retries.
pub async fn request_judgment(
    state: &SharedState,
    code: &str,
    request: JudgmentRequest,
) -> Result<JudgmentView, ServiceError> {
    let store = state.require_room_store().await?;

    // Step 1: the claim. A single conditional update is the only arbiter;
    // two concurrent callers cannot both see `pending`.
    let Some(room) = store.claim_evaluation(code.to_string()).await? else {
        // Claim miss: either somebody already finished (surface their
        // verdict) or somebody is mid-flight (tell the caller to poll).
        let Some(room) = store.find_room(code.to_string()).await? else {
            return Err(ServiceError::NotFound(format!("room `{code}` not found")));
        };
        if let Some(judgment) = room.judgment {
            return Ok(judgment.into());
        }
        return Err(ServiceError::AlreadyProcessing);
    };

    // Defensive re-check: if a verdict slipped in through another path,
    // hand it back rather than generating a second one.
    if let Some(judgment) = room.judgment.clone() {
        release_claim(state, code).await;
        return Ok(judgment.into());
    }

    if !room.both_submitted() {
        release_claim(state, code).await;
        return Err(ServiceError::InvalidState(
            "both drawings must be submitted before judging".into(),
        ));
    }

    let judge_request = JudgeRequest {
        prompt: room.prompt.clone(),
        host_drawing: request.host_drawing,
        guest_drawing: request.guest_drawing,
        tone: state.config().roast_tone,
    };

    // Step 3: the provider call under a hard deadline. On expiry the
    // in-flight future is dropped; a late provider answer is discarded.
    let judge = state.judge_provider();
    let response = match timeout(state.config().judge_timeout, judge.judge(judge_request)).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!(room = code, error = %err, "judge provider call failed");
            release_claim(state, code).await;
            return Err(ServiceError::Provider(err));
        }
        Err(_elapsed) => {
            warn!(room = code, "judge provider call timed out");
            release_claim(state, code).await;
            return Err(ServiceError::Timeout);
        }
    };

    // Step 4: tolerant parse + validation.
    let judgment = match verdict::parse_verdict(&response) {
        Ok(judgment) => judgment,
        Err(err) => {
            warn!(room = code, error = %err, "judge response did not validate");
            release_claim(state, code).await;
            return Err(err);
        }
    };

    // Step 5: verdict, derived winner, and completed status in one update.
    let winner_id = room.winner_session(judgment.winner);
    let completed = match store
        .complete_evaluation(code.to_string(), judgment, winner_id)
        .await
    {
        Ok(completed) => completed,
        Err(err) => {
            release_claim(state, code).await;
            return Err(err.into());
        }
    };

    let Some(completed) = completed else {
        // The claim was not ours anymore when persisting; somebody else
        // must have finished meanwhile.
        let room = store.find_room(code.to_string()).await?;
        if let Some(judgment) = room.and_then(|room| room.judgment) {
            return Ok(judgment.into());
        }
        return Err(ServiceError::InvalidState(
            "judgment claim was lost before completion".into(),
        ));
    };

    info!(room = code, winner = ?completed.winner_id, "judgment persisted");
    sse_events::broadcast_room_updated(state, &completed);
    sse_events::broadcast_judgment(state, &completed);

    completed
        .judgment
        .map(Into::into)
        .ok_or_else(|| ServiceError::InvalidState("completed room carries no judgment".into()))
}

/// Non-blocking poll of the claim state and the verdict.
pub async fn judgment_status(
    state: &SharedState,
    code: &str,
) -> Result<JudgmentStatusResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let Some(room) = store.find_room(code.to_string()).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };

    Ok(JudgmentStatusResponse {
        evaluation_status: room.evaluation_status.into(),
        judgment: room.judgment.map(Into::into),
        winner_id: room.winner_id,
    })
}

/// Bounded wait for the verdict to land: at most `poll_attempts` store
/// reads spaced by `poll_interval`, then a timeout the client can retry.
pub async fn await_judgment(
    state: &SharedState,
    code: &str,
) -> Result<JudgmentView, ServiceError> {
    let store = state.require_room_store().await?;
    let attempts = state.config().poll_attempts;
    let interval = state.config().poll_interval;

    for attempt in 0..attempts {
        let Some(room) = store.find_room(code.to_string()).await? else {
            return Err(ServiceError::NotFound(format!("room `{code}` not found")));
        };
        if let Some(judgment) = room.judgment {
            return Ok(judgment.into());
        }
        if attempt + 1 < attempts {
            sleep(interval).await;
        }
    }

    Err(ServiceError::Timeout)
}

/// Step 6: put the claim back so a future call can retry. Failure to
/// release is logged, not propagated — the caller already has the primary
/// error.
async fn release_claim(state: &SharedState, code: &str) {
    let Ok(store) = state.require_room_store().await else {
        warn!(room = code, "cannot release judgment claim: storage unavailable");
        return;
    };
    if let Err(err) = store.release_evaluation(code.to_string()).await {
        warn!(room = code, error = %err, "failed to release judgment claim");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::models::{EvaluationStatus, RoomEntity},
        dao::room_store::memory::MemoryRoomStore,
        providers::{
            JudgeProvider, JudgeRequest, PromptProvider, ProviderError, ProviderResult,
        },
        state::{AppState, Providers, SharedState},
    };

    const VERDICT_GUEST_WINS: &str = r#"{
        "winner": "2",
        "critique1": "an ambitious scribble",
        "critique2": "a recognisable cat in a hat",
        "roast": "drawing 1 looks like the pencil fought back",
        "prompt": "Draw a cat"
    }"#;

    /// Scripted judge: pops one behavior per call and counts invocations.
    #[derive(Clone)]
    struct ScriptedJudge {
        calls: Arc<AtomicUsize>,
        script: Arc<Mutex<Vec<JudgeBehavior>>>,
    }

    #[derive(Clone)]
    enum JudgeBehavior {
        Respond(String),
        Fail,
        Hang,
    }

    impl ScriptedJudge {
        fn new(script: Vec<JudgeBehavior>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                script: Arc::new(Mutex::new(script)),
            }
        }

        fn always(text: &str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                script: Arc::new(Mutex::new(vec![JudgeBehavior::Respond(text.to_string())])),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JudgeProvider for ScriptedJudge {
        fn judge(&self, _request: JudgeRequest) -> BoxFuture<'static, ProviderResult<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let behavior = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    script[0].clone()
                }
            };
            Box::pin(async move {
                match behavior {
                    JudgeBehavior::Respond(text) => Ok(text),
                    JudgeBehavior::Fail => Err(ProviderError::Empty),
                    JudgeBehavior::Hang => {
                        sleep(Duration::from_secs(30)).await;
                        Err(ProviderError::Empty)
                    }
                }
            })
        }
    }

    struct FixedPrompt;

    impl PromptProvider for FixedPrompt {
        fn drawing_prompt(&self) -> BoxFuture<'static, ProviderResult<String>> {
            Box::pin(async { Ok("Draw a cat".to_string()) })
        }
    }

    async fn test_state(store: MemoryRoomStore, judge: ScriptedJudge) -> SharedState {
        let mut config = AppConfig::default();
        config.judge_timeout = Duration::from_millis(200);
        config.poll_attempts = 5;
        config.poll_interval = Duration::from_millis(10);
        let state = AppState::new(
            config,
            Providers {
                judge: Arc::new(judge),
                prompt: Arc::new(FixedPrompt),
            },
        );
        state.set_room_store(Arc::new(store)).await;
        state
    }

    fn finished_room() -> RoomEntity {
        let mut room = RoomEntity::new("AB12CD".into(), "host-token".into(), "Draw a cat".into());
        room.guest_id = Some("guest-token".into());
        room.host_submission_url = Some("https://cdn/host.png".into());
        room.guest_submission_url = Some("https://cdn/guest.png".into());
        room
    }

    fn drawings() -> JudgmentRequest {
        JudgmentRequest {
            host_drawing: "data:image/png;base64,AAAA".into(),
            guest_drawing: "data:image/png;base64,BBBB".into(),
        }
    }

    #[tokio::test]
    async fn happy_path_persists_judgment_and_winner() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge.clone()).await;

        let view = request_judgment(&state, "AB12CD", drawings()).await.unwrap();
        assert_eq!(view.winner, "2");

        let room = store.get("AB12CD").unwrap();
        assert_eq!(room.evaluation_status, EvaluationStatus::Completed);
        assert_eq!(room.winner_id.as_deref(), Some("guest-token"));
        assert!(room.judgment.is_some());
        assert_eq!(judge.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_invoke_provider_exactly_once() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge.clone()).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                request_judgment(&state, "AB12CD", drawings()).await
            }));
        }

        let mut successes = 0;
        let mut already_processing = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(view) => {
                    assert_eq!(view.winner, "2");
                    successes += 1;
                }
                Err(ServiceError::AlreadyProcessing) => already_processing += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(judge.call_count(), 1);
        assert!(successes >= 1);
        assert_eq!(successes + already_processing, 4);

        let room = store.get("AB12CD").unwrap();
        assert_eq!(room.evaluation_status, EvaluationStatus::Completed);
    }

    #[tokio::test]
    async fn provider_failure_releases_claim_and_retry_succeeds() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::new(vec![
            JudgeBehavior::Fail,
            JudgeBehavior::Respond(VERDICT_GUEST_WINS.to_string()),
        ]);
        let state = test_state(store.clone(), judge.clone()).await;

        let err = request_judgment(&state, "AB12CD", drawings())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Provider(_)));
        assert_eq!(
            store.get("AB12CD").unwrap().evaluation_status,
            EvaluationStatus::Pending
        );

        let view = request_judgment(&state, "AB12CD", drawings()).await.unwrap();
        assert_eq!(view.winner, "2");
        assert_eq!(judge.call_count(), 2);
    }

    #[tokio::test]
    async fn provider_timeout_releases_claim() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::new(vec![JudgeBehavior::Hang]);
        let state = test_state(store.clone(), judge.clone()).await;

        let err = request_judgment(&state, "AB12CD", drawings())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
        assert_eq!(
            store.get("AB12CD").unwrap().evaluation_status,
            EvaluationStatus::Pending
        );
    }

    #[tokio::test]
    async fn malformed_response_releases_claim() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always("I refuse to answer in JSON.");
        let state = test_state(store.clone(), judge.clone()).await;

        let err = request_judgment(&state, "AB12CD", drawings())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedJudgment(_)));
        assert_eq!(
            store.get("AB12CD").unwrap().evaluation_status,
            EvaluationStatus::Pending
        );
    }

    #[tokio::test]
    async fn judging_before_both_submissions_is_rejected() {
        let store = MemoryRoomStore::new();
        let mut room = finished_room();
        room.guest_submission_url = None;
        store.put(room);
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge.clone()).await;

        let err = request_judgment(&state, "AB12CD", drawings())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(judge.call_count(), 0);
        assert_eq!(
            store.get("AB12CD").unwrap().evaluation_status,
            EvaluationStatus::Pending
        );
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let store = MemoryRoomStore::new();
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store, judge).await;

        let err = request_judgment(&state, "ZZZZZZ", drawings())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_call_surfaces_existing_judgment_without_provider() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge.clone()).await;

        request_judgment(&state, "AB12CD", drawings()).await.unwrap();
        let view = request_judgment(&state, "AB12CD", drawings()).await.unwrap();
        assert_eq!(view.winner, "2");
        assert_eq!(judge.call_count(), 1);
    }

    #[tokio::test]
    async fn await_judgment_returns_once_verdict_lands() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge).await;

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { await_judgment(&state, "AB12CD").await })
        };

        sleep(Duration::from_millis(20)).await;
        request_judgment(&state, "AB12CD", drawings()).await.unwrap();

        let view = waiter.await.unwrap().unwrap();
        assert_eq!(view.winner, "2");
    }

    #[tokio::test]
    async fn await_judgment_times_out_after_bounded_attempts() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store, judge).await;

        let err = await_judgment(&state, "AB12CD").await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
    }

    #[tokio::test]
    async fn status_poll_reports_claim_state() {
        let store = MemoryRoomStore::new();
        store.put(finished_room());
        let judge = ScriptedJudge::always(VERDICT_GUEST_WINS);
        let state = test_state(store.clone(), judge).await;

        let status = judgment_status(&state, "AB12CD").await.unwrap();
        assert!(status.judgment.is_none());

        request_judgment(&state, "AB12CD", drawings()).await.unwrap();
        let status = judgment_status(&state, "AB12CD").await.unwrap();
        assert!(status.judgment.is_some());
        assert_eq!(status.winner_id.as_deref(), Some("guest-token"));
    }
}
