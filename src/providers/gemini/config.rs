use crate::providers::ProviderError;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection settings for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Model identifier used for both prompt generation and judging.
    pub model: String,
    /// API root, overridable for tests and proxies.
    pub base_url: String,
}

impl GeminiConfig {
    /// Build the configuration from `GEMINI_API_KEY` (required) plus
    /// optional `GEMINI_MODEL` / `GEMINI_BASE_URL` overrides.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ProviderError::MissingEnvVar {
                var: "GEMINI_API_KEY",
            }
        })?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            model,
            base_url,
        })
    }
}
