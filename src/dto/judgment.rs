use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{JudgmentEntity, WinnerSlot},
    dto::room::EvaluationStatusDto,
};

/// Both rendered drawings, shipped by whichever client triggers judging.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JudgmentRequest {
    /// Creator's drawing as base64 PNG (data-URL prefix tolerated).
    pub host_drawing: String,
    /// Joiner's drawing as base64 PNG (data-URL prefix tolerated).
    pub guest_drawing: String,
}

impl Validate for JudgmentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("host_drawing", &self.host_drawing),
            ("guest_drawing", &self.guest_drawing),
        ] {
            if value.trim().is_empty() {
                let mut err = ValidationError::new("drawing_empty");
                err.message = Some("Drawing payload must not be empty".into());
                errors.add(field, err);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Verdict as exposed on the wire; `winner` keeps the "1"/"2" convention of
/// the judge response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JudgmentView {
    /// Winning drawing: "1" (creator) or "2" (joiner).
    pub winner: String,
    /// What the judge saw in drawing 1.
    pub critique1: String,
    /// What the judge saw in drawing 2.
    pub critique2: String,
    /// Joke at the loser's expense.
    pub roast: String,
    /// Prompt echoed back by the judge.
    pub prompt: String,
}

impl From<JudgmentEntity> for JudgmentView {
    fn from(entity: JudgmentEntity) -> Self {
        Self {
            winner: match entity.winner {
                WinnerSlot::Host => "1".to_string(),
                WinnerSlot::Guest => "2".to_string(),
            },
            critique1: entity.critique1,
            critique2: entity.critique2,
            roast: entity.roast,
            prompt: entity.prompt,
        }
    }
}

/// Poll answer: the claim state plus the verdict once it exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct JudgmentStatusResponse {
    /// Judgment claim state.
    pub evaluation_status: EvaluationStatusDto,
    /// Structured verdict, present once completed.
    pub judgment: Option<JudgmentView>,
    /// Session id of the winner, present once completed.
    pub winner_id: Option<String>,
}
