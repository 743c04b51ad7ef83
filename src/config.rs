//! Application-level configuration loading, including the fallback drawing
//! prompts used when the text provider is unavailable.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use rand::prelude::IndexedRandom;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SKETCH_DUEL_BACK_CONFIG_PATH";

const DEFAULT_DRAW_SECONDS: u64 = 120;
const DEFAULT_JUDGE_TIMEOUT_SECS: u64 = 45;
const DEFAULT_POLL_ATTEMPTS: u32 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_CODE_ATTEMPTS: u32 = 5;

/// Voice the judge uses when roasting the losing drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoastTone {
    /// Friendly teasing, safe for anyone.
    Lighthearted,
    /// No mercy.
    Harsh,
}

impl RoastTone {
    /// Phrase spliced into the judge rubric.
    pub fn as_rubric_phrase(self) -> &'static str {
        match self {
            RoastTone::Lighthearted => "a playful, friendly joke",
            RoastTone::Harsh => "a merciless, cutting joke",
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Length of the drawing window communicated to clients.
    pub draw_seconds: u64,
    /// Hard deadline on a single judge provider call.
    pub judge_timeout: Duration,
    /// Upper bound on judgment-wait polling iterations.
    pub poll_attempts: u32,
    /// Delay between judgment-wait polling iterations.
    pub poll_interval: Duration,
    /// Room code regenerations tolerated before creation fails.
    pub code_attempts: u32,
    /// Tone of the judge's roast.
    pub roast_tone: RoastTone,
    fallback_prompts: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to
    /// baked-in defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file; using built-in defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config unreadable; using built-in defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration from file");
                raw.into()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config did not parse; using built-in defaults");
                Self::default()
            }
        }
    }

    /// Pick a prompt from the fallback list; used when the text provider
    /// fails so room creation still succeeds.
    pub fn fallback_prompt(&self) -> String {
        self.fallback_prompts
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| "a happy cat wearing a hat".to_string())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            draw_seconds: DEFAULT_DRAW_SECONDS,
            judge_timeout: Duration::from_secs(DEFAULT_JUDGE_TIMEOUT_SECS),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            code_attempts: DEFAULT_CODE_ATTEMPTS,
            roast_tone: RoastTone::Lighthearted,
            fallback_prompts: default_prompts(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    draw_seconds: Option<u64>,
    judge_timeout_secs: Option<u64>,
    poll_attempts: Option<u32>,
    poll_interval_ms: Option<u64>,
    code_attempts: Option<u32>,
    roast_tone: Option<RoastTone>,
    fallback_prompts: Option<Vec<String>>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            draw_seconds: raw.draw_seconds.unwrap_or(defaults.draw_seconds),
            judge_timeout: raw
                .judge_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.judge_timeout),
            poll_attempts: raw.poll_attempts.unwrap_or(defaults.poll_attempts),
            poll_interval: raw
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            code_attempts: raw.code_attempts.unwrap_or(defaults.code_attempts),
            roast_tone: raw.roast_tone.unwrap_or(defaults.roast_tone),
            fallback_prompts: raw
                .fallback_prompts
                .filter(|prompts| !prompts.is_empty())
                .unwrap_or(defaults.fallback_prompts),
        }
    }
}

/// Configuration path, honouring the environment override.
fn resolve_config_path() -> PathBuf {
    match env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Built-in prompt list shipped with the binary.
fn default_prompts() -> Vec<String> {
    [
        "a happy cat wearing a hat",
        "a dog riding a bicycle",
        "a house with a smiling sun",
        "a pizza with sunglasses",
        "a penguin ordering coffee",
        "a dinosaur walking a tiny dog",
        "a robot watering flowers",
        "a snail racing a turtle",
        "an octopus juggling donuts",
        "a dragon toasting marshmallows",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
