use futures::future::BoxFuture;
use reqwest::Client;

use super::{
    config::GeminiConfig,
    models::{
        Content, GenerateContentRequest, GenerateContentResponse, Part,
        permissive_safety_settings,
    },
};
use crate::providers::{JudgeProvider, JudgeRequest, PromptProvider, ProviderError,
    ProviderResult};

const PROMPT_INSTRUCTION: &str = "Create a simple and fun drawing prompt that players can easily \
draw in 2 minutes. Make it straightforward but entertaining - things like 'a happy cat wearing \
a hat', 'a dog riding a bicycle', 'a house with a smiling sun', or 'a pizza with sunglasses'. \
Keep it simple, clear, and easy to draw. Just write the prompt itself, nothing else.";

/// Gemini REST client implementing both provider traits.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Build a provider from its configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|source| ProviderError::Request { source })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }

    async fn generate(&self, request: GenerateContentRequest) -> ProviderResult<String> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Request { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { status });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::Decode { source })?;

        body.first_text().ok_or(ProviderError::Empty)
    }
}

/// Rubric handed to the vision model together with both drawings.
fn judge_rubric(request: &JudgeRequest) -> String {
    format!(
        r#"You're an art judge looking at drawings from a 2-minute drawing game.
The players were asked to draw: "{prompt}"

Important judging rules:
1. Text-only submissions should not be considered valid drawings
2. Simple stick figures and basic drawings are okay - this is a quick drawing game
3. The drawing should attempt to illustrate the prompt, not just write it
4. If both submissions are text-only, declare a draw

Please:
1. Pick which drawing better matches the prompt and shows more effort in actually drawing
2. Give a specific comment about what you see in each drawing
3. Make {tone} about the losing drawing, especially if it's just text instead of a drawing

Write your response as JSON like this:
{{
  "winner": "1" or "2",
  "critique1": "your comment about what drawing 1 actually shows",
  "critique2": "your comment about what drawing 2 actually shows",
  "roast": "your joke about the losing drawing",
  "prompt": "what they were asked to draw"
}}"#,
        prompt = request.prompt,
        tone = request.tone.as_rubric_phrase(),
    )
}

impl JudgeProvider for GeminiProvider {
    fn judge(&self, request: JudgeRequest) -> BoxFuture<'static, ProviderResult<String>> {
        let provider = self.clone();
        Box::pin(async move {
            let body = GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![
                        Part::text(judge_rubric(&request)),
                        Part::png(&request.host_drawing),
                        Part::png(&request.guest_drawing),
                    ],
                }],
                safety_settings: permissive_safety_settings(),
            };
            provider.generate(body).await
        })
    }
}

impl PromptProvider for GeminiProvider {
    fn drawing_prompt(&self) -> BoxFuture<'static, ProviderResult<String>> {
        let provider = self.clone();
        Box::pin(async move {
            let body = GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![Part::text(PROMPT_INSTRUCTION)],
                }],
                safety_settings: Vec::new(),
            };
            let text = provider.generate(body).await?;
            Ok(text.trim().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoastTone;

    #[test]
    fn rubric_carries_prompt_and_tone() {
        let request = JudgeRequest {
            prompt: "a dragon toasting marshmallows".into(),
            host_drawing: "AAAA".into(),
            guest_drawing: "BBBB".into(),
            tone: RoastTone::Harsh,
        };
        let rubric = judge_rubric(&request);
        assert!(rubric.contains("a dragon toasting marshmallows"));
        assert!(rubric.contains("merciless"));
        assert!(rubric.contains("\"winner\": \"1\" or \"2\""));
    }
}
