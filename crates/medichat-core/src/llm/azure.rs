use crate::error::MediChatError;
use crate::llm::openai::{parse_chat_completion, ChatCompletionRequest};
use crate::llm::traits::*;

pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Client for an Azure OpenAI deployment. The deployment name selects the
/// model, so the request body carries no `model` field.
pub struct AzureOpenAIClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    deployment: String,
    api_version: String,
    temperature: f32,
}

impl AzureOpenAIClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            temperature: 0.5,
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.base_url.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[async_trait::async_trait]
impl LlmClient for AzureOpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, MediChatError> {
        let request_body = ChatCompletionRequest::single_prompt(None, prompt, self.temperature);

        let response = self
            .client
            .post(self.endpoint())
            .header("api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        parse_chat_completion("Azure OpenAI", response).await
    }

    fn describe(&self) -> String {
        format!("azure/{}", self.deployment)
    }
}
