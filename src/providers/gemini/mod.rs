mod client;
mod models;

/// Connection settings for the Gemini REST API.
pub mod config;

pub use client::GeminiProvider;
pub use config::GeminiConfig;
