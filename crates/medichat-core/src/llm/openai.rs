use crate::error::MediChatError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};

pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.5,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: Vec<RequestMessage<'a>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct RequestMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    /// The whole rendered template goes out as a single user message.
    pub fn single_prompt(model: Option<&'a str>, prompt: &'a str, temperature: f32) -> Self {
        Self {
            model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        }
    }
}

/// Turns a raw chat-completions reply into an [`LlmResponse`], mapping HTTP
/// failures and empty choice lists to [`MediChatError::Llm`].
pub(super) async fn parse_chat_completion(
    provider: &str,
    response: reqwest::Response,
) -> Result<LlmResponse, MediChatError> {
    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        return Err(MediChatError::Llm(format!(
            "{} API error ({}): {}",
            provider, status, response_text
        )));
    }

    let api_response: ChatCompletionResponse = serde_json::from_str(&response_text)
        .map_err(|e| MediChatError::Llm(format!("Failed to parse response: {e}")))?;

    let choice = api_response
        .choices
        .first()
        .ok_or_else(|| MediChatError::Llm("No response from API".into()))?;

    Ok(LlmResponse {
        content: choice.message.content.clone().unwrap_or_default(),
        usage: api_response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

#[async_trait::async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, MediChatError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request_body =
            ChatCompletionRequest::single_prompt(Some(self.model.as_str()), prompt, self.temperature);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        parse_chat_completion("OpenAI", response).await
    }

    fn describe(&self) -> String {
        format!("openai/{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest::single_prompt(Some("gpt-4o"), "Hello\nthere", 0.5);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello\nthere");
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_request_body_omits_model_when_none() {
        let body = ChatCompletionRequest::single_prompt(None, "hi", 0.5);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_describe() {
        let client = OpenAIClient::new("sk-test").with_model("gpt-4o-mini");
        assert_eq!(client.describe(), "openai/gpt-4o-mini");
    }
}
