//! Adapters for the external AI collaborators.
//!
//! The judge adapter ships two drawings and a rubric and hands back the
//! model's freeform answer untouched; all timeout, parsing, and validation
//! logic lives in the judgment service.

/// Gemini-backed implementations of the provider traits.
pub mod gemini;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::config::RoastTone;

/// Result alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while talking to an external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request could not be sent.
    #[error("provider request failed")]
    Request {
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The provider answered with a non-success status.
    #[error("provider returned status {status}")]
    Status {
        /// HTTP status received.
        status: reqwest::StatusCode,
    },
    /// The response body could not be decoded.
    #[error("failed to decode provider response")]
    Decode {
        /// Transport/decode error.
        #[source]
        source: reqwest::Error,
    },
    /// The provider returned no usable candidate text, e.g. after a
    /// safety-filter rejection.
    #[error("provider returned an empty response")]
    Empty,
    /// Required environment variable is not set.
    #[error("missing required environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
}

/// Everything the judge needs to rule on one contest.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    /// What both participants were asked to draw.
    pub prompt: String,
    /// Host drawing as base64 PNG (a data-URL prefix is tolerated).
    pub host_drawing: String,
    /// Guest drawing as base64 PNG (a data-URL prefix is tolerated).
    pub guest_drawing: String,
    /// Tone of the roast requested from the judge.
    pub tone: RoastTone,
}

/// External collaborator producing a freeform verdict over two drawings.
pub trait JudgeProvider: Send + Sync {
    /// Submit both drawings and the rubric; returns the raw response text.
    fn judge(&self, request: JudgeRequest) -> BoxFuture<'static, ProviderResult<String>>;
}

/// External collaborator producing a short drawable phrase.
pub trait PromptProvider: Send + Sync {
    /// Generate one drawing prompt, used verbatim as the room's prompt.
    fn drawing_prompt(&self) -> BoxFuture<'static, ProviderResult<String>>;
}
