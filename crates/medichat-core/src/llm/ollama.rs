use crate::error::MediChatError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};

/// Client for a local Ollama server using the non-streaming generate endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.5,
        }
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

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, MediChatError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(MediChatError::Llm(format!(
                "Ollama error ({}): {}",
                status, response_text
            )));
        }

        let generated: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| MediChatError::Llm(format!("Failed to parse Ollama response: {e}")))?;

        let usage = match (generated.prompt_eval_count, generated.eval_count) {
            (Some(input), Some(output)) => Some(Usage {
                input_tokens: input,
                output_tokens: output,
            }),
            _ => None,
        };

        Ok(LlmResponse {
            content: generated.response,
            usage,
        })
    }

    fn describe(&self) -> String {
        format!("ollama/{}", self.model)
    }
}
