use crate::error::MediChatError;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The completion provider. Takes a fully rendered prompt and returns the
/// generated text. Model identity, credentials and transport belong to the
/// implementation.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, MediChatError>;

    /// Short human-readable name, e.g. `azure/gpt-4o`.
    fn describe(&self) -> String;
}
