pub mod gemini;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// Single-turn prompt/response access to a generative-language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
